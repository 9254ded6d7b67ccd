use axum::routing::post;
use axum::Router;

use crate::handlers::export;
use crate::state::AppState;

/// Routes merged at the `/api` root.
///
/// ```text
/// POST   /export    -> export (json, csv or yaml download)
/// POST   /import    -> import (multipart `file`, optional `format`)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/export", post(export::export))
        .route("/import", post(export::import))
}
