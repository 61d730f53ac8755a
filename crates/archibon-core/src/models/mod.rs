//! Data models and configuration.

pub mod config;
pub mod document;

pub use config::ArchibonConfig;
pub use document::{DocumentRef, ExtractedFields, GroupKey};
