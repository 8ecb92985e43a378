pub mod config;
pub mod deps;
pub mod error;
pub mod file_config;
pub mod template;
pub mod types;

pub use config::AppConfig;
pub use deps::ServerDeps;
pub use error::DomainError;
pub use file_config::FileConfig;
pub use types::*;
