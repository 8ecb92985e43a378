pub mod activities;
pub mod analyzer;
pub mod category;
pub mod collector;
pub mod dedup;
pub mod models;

pub use activities::pipeline::{CollectedArticle, NewsPipeline, NewsRunStats};
pub use category::{ClassifiedBy, NewsCategory};
pub use collector::{NewsCollector, RawArticle, RssCollector};
pub use models::article::{CategoryCount, NewArticle, NewsArticle};
pub use models::source::{NewNewsSource, NewsSource};
