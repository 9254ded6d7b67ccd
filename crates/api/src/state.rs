use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool and HTTP client are reference-counted internally.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: promptvault_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Shared connection pool for upstream provider calls.
    pub http: reqwest::Client,
}
