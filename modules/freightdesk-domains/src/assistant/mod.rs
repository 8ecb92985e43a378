pub mod activities;
pub mod models;

pub use activities::send_message::{send_message, AssistantContext};
pub use models::message::{ChatMessage, ChatRole};
pub use models::session::ChatSession;
