pub mod categories;
pub mod export;
pub mod playground;
pub mod projects;
pub mod prompts;
pub mod providers;
pub mod settings;
pub mod tags;
pub mod test_history;
