//! Route definitions for the `/projects` resource.
//!
//! Also nests the project-scoped prompt routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::{projects, prompts};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// GET    /{id}                              -> get_by_id
/// PUT    /{id}                              -> update
/// DELETE /{id}                              -> delete
///
/// GET    /{id}/prompts                      -> list_by_project
/// POST   /{id}/prompts                      -> create
/// GET    /{id}/sdk/prompt                   -> sdk_prompt
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list).post(projects::create))
        .route(
            "/{id}",
            get(projects::get_by_id)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route(
            "/{id}/prompts",
            get(prompts::list_by_project).post(prompts::create),
        )
        .route("/{id}/sdk/prompt", get(prompts::sdk_prompt))
}
