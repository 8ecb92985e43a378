pub mod claude;
pub mod error;
pub mod schema;
pub mod traits;
pub mod util;

pub use claude::Claude;
pub use error::AiError;
pub use schema::StructuredOutput;
pub use traits::{ChatAgent, Message, MessageRole};
pub use util::truncate_to_char_boundary;
