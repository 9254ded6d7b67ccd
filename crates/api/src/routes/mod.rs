pub mod categories;
pub mod export;
pub mod health;
pub mod playground;
pub mod projects;
pub mod prompts;
pub mod providers;
pub mod settings;
pub mod tags;
pub mod test_history;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects                                        list, create
/// /projects/{id}                                   get, update, delete
/// /projects/{id}/prompts                           list (filtered), create
/// /projects/{id}/sdk/prompt                        latest matching content
///
/// /prompts/{id}                                    get, update, delete
/// /prompts/{id}/history                            content history
/// /prompts/{id}/diff/{target_id}                   diff against another record
/// /prompts/{id}/rollback                           restore as a new version
/// /prompts/{id}/test-histories                     list, record a test run
/// /test-histories/{id}                             delete
///
/// /test-prompt                                     run a prompt (JSON or SSE)
/// /optimize-prompt                                 optimize a prompt (JSON or SSE)
///
/// /tags                                            list, create
/// /tags/{id}                                       get, update, delete
/// /categories                                      list, create
/// /categories/{id}                                 get, update, delete
///
/// /settings                                        key/value map, upsert
/// /llm-providers                                   list, replace
///
/// /export                                          export projects
/// /import                                          import projects (multipart)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", projects::router())
        .nest("/prompts", prompts::router())
        .nest("/test-histories", test_history::router())
        .nest("/tags", tags::router())
        .nest("/categories", categories::router())
        .nest("/settings", settings::router())
        .nest("/llm-providers", providers::router())
        // Playground relay endpoints.
        .merge(playground::router())
        // Export and import share the root of /api.
        .merge(export::router())
}
