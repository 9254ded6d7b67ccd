use axum::routing::get;
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Routes mounted at `/settings`.
///
/// ```text
/// GET    /    -> list (key/value map)
/// POST   /    -> upsert
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(settings::list).post(settings::upsert))
}
