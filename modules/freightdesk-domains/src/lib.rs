pub mod assistant;
pub mod bidding;
pub mod contracts;
pub mod directory;
pub mod jobs;
pub mod market;
pub mod news;
pub mod quotations;
pub mod rfqs;
pub mod shipments;

#[cfg(feature = "test-utils")]
pub mod testutil;

/// Migrations for the whole schema, embedded at compile time.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
