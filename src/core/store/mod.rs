//! Contact persistence
//!
//! The import pipeline never reaches for a global connection: every stage
//! that touches persisted contacts receives a [`ContactStore`] explicitly.
//! [`SqliteStore`] backs the CLI; [`MemoryStore`] is an in-process fake
//! with failure injection for tests.

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::core::identity::{ContactId, Owner};
use crate::entities::contact::{Contact, NewContact};

/// Row-level access to an owner's contacts
pub trait ContactStore {
    /// Insert a batch atomically, returning the created records in input order
    fn insert_contacts(
        &mut self,
        owner: &Owner,
        batch: &[NewContact],
    ) -> Result<Vec<Contact>, StoreError>;

    /// Stored emails (case-insensitive match) among `emails` for this owner
    fn existing_emails(&self, owner: &Owner, emails: &[String]) -> Result<Vec<String>, StoreError>;

    /// Delete the owner's contacts with these ids, returning how many went
    fn delete_contacts(&mut self, owner: &Owner, ids: &[ContactId]) -> Result<usize, StoreError>;

    /// All of the owner's contacts, ordered by name
    fn list_contacts(&self, owner: &Owner) -> Result<Vec<Contact>, StoreError>;
}

/// Errors raised by a contact store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to encode tags: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("A contact with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Corrupt contact record {id}: {message}")]
    Corrupt { id: String, message: String },

    #[error("Unsupported store schema version {found} (this build understands {expected})")]
    SchemaVersion { found: i32, expected: i32 },
}
