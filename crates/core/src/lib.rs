//! Domain logic for the prompt manager.
//!
//! Nothing in this crate performs I/O: it holds the error type, id and
//! timestamp aliases, the version bump rule, the diff engine, playground
//! helpers (variables, token and cost estimates, retention), provider
//! resolution, and the export/import serializers. Both the repository layer
//! and the HTTP layer build on it.

pub mod chat;
pub mod diff;
pub mod error;
pub mod export;
pub mod playground;
pub mod provider;
pub mod types;
pub mod validation;
pub mod versioning;
