//! Prompt test and optimize endpoints.
//!
//! Both answer with JSON, or with a server-sent-event stream when the request
//! sets `stream: true`.

use axum::routing::post;
use axum::Router;

use crate::handlers::playground;
use crate::state::AppState;

/// Routes merged at the `/api` root.
///
/// ```text
/// POST   /test-prompt        -> test_prompt
/// POST   /optimize-prompt    -> optimize_prompt
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/test-prompt", post(playground::test_prompt))
        .route("/optimize-prompt", post(playground::optimize_prompt))
}
