use axum::routing::delete;
use axum::Router;

use crate::handlers::test_history;
use crate::state::AppState;

/// Routes mounted at `/test-histories`.
///
/// ```text
/// DELETE /{id}    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", delete(test_history::delete))
}
