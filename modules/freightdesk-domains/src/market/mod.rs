pub mod activities;
pub mod feed;
pub mod models;

pub use activities::poll::{poll_market, MarketPollStats};
pub use feed::{HttpIndexFeed, IndexFeed, IndexQuote};
pub use models::index::{IndexPoint, IndexSnapshot, MarketIndex};
