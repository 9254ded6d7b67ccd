//! Route definitions for individual prompt records.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{prompts, test_history};
use crate::state::AppState;

/// Routes mounted at `/prompts`.
///
/// ```text
/// GET    /{id}                       -> get_by_id
/// PUT    /{id}                       -> update
/// DELETE /{id}                       -> delete
/// GET    /{id}/history               -> history
/// GET    /{id}/diff/{target_id}      -> diff
/// POST   /{id}/rollback              -> rollback
/// GET    /{id}/test-histories        -> test_history::list_for_prompt
/// POST   /{id}/test-histories        -> test_history::create
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(prompts::get_by_id)
                .put(prompts::update)
                .delete(prompts::delete),
        )
        .route("/{id}/history", get(prompts::history))
        .route("/{id}/diff/{target_id}", get(prompts::diff))
        .route("/{id}/rollback", post(prompts::rollback))
        .route(
            "/{id}/test-histories",
            get(test_history::list_for_prompt).post(test_history::create),
        )
}
