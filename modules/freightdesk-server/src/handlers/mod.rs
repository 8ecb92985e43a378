pub mod assistant;
pub mod contracts;
pub mod directory;
pub mod market;
pub mod news;
pub mod rfqs;

use std::sync::Arc;

use axum::extract::State;
use freightdesk_core::ServerDeps;

pub type AppState = State<Arc<ServerDeps>>;

pub async fn health() -> &'static str {
    "ok"
}
