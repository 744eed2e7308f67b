//! Core module - fundamental types and utilities

pub mod config;
pub mod identity;
pub mod store;
pub mod workspace;

pub use config::Config;
pub use identity::{ContactId, IdParseError, Owner};
pub use store::{ContactStore, MemoryStore, SqliteStore, StoreError};
pub use workspace::{Workspace, WorkspaceError};
