//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` struct matching the database row
//! - `Deserialize` DTOs for request bodies where the handler reads one

pub mod category;
pub mod llm_provider;
pub mod project;
pub mod prompt;
pub mod prompt_history;
pub mod setting;
pub mod tag;
pub mod test_history;
