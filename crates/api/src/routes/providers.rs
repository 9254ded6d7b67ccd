use axum::routing::get;
use axum::Router;

use crate::handlers::providers;
use crate::state::AppState;

/// Routes mounted at `/llm-providers`.
///
/// ```text
/// GET    /    -> list
/// POST   /    -> replace (whole list)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(providers::list).post(providers::replace))
}
