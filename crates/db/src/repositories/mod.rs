//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! `&PgPool`, or any `PgExecutor` when the call must join a caller's
//! transaction.

pub mod category_repo;
pub mod project_repo;
pub mod prompt_history_repo;
pub mod prompt_repo;
pub mod provider_repo;
pub mod setting_repo;
pub mod tag_repo;
pub mod test_history_repo;

pub use category_repo::CategoryRepo;
pub use project_repo::ProjectRepo;
pub use prompt_history_repo::PromptHistoryRepo;
pub use prompt_repo::PromptRepo;
pub use provider_repo::ProviderRepo;
pub use setting_repo::SettingRepo;
pub use tag_repo::TagRepo;
pub use test_history_repo::TestHistoryRepo;
