//! Database schema initialization

use rusqlite::{params, OptionalExtension};

use super::sqlite::SqliteStore;
use super::StoreError;

/// Current schema version
pub(super) const SCHEMA_VERSION: i32 = 1;

impl SqliteStore {
    /// Create tables on a fresh database and verify the version of an old one
    pub(super) fn init_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Contacts; email is never NULL (blank emails get a placeholder)
            CREATE TABLE IF NOT EXISTS contacts (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL COLLATE NOCASE,
                role TEXT,
                company TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                date_of_contact TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Not Started',
                linkedin_url TEXT,
                created TEXT NOT NULL,
                updated TEXT NOT NULL,
                UNIQUE (owner, email)
            );
            CREATE INDEX IF NOT EXISTS idx_contacts_owner ON contacts(owner);
            CREATE INDEX IF NOT EXISTS idx_contacts_status ON contacts(owner, status);
            "#,
        )?;

        let found: Option<i32> = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .optional()?
            .flatten();

        match found {
            None => {
                self.conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
                Ok(())
            }
            Some(SCHEMA_VERSION) => Ok(()),
            Some(found) => Err(StoreError::SchemaVersion {
                found,
                expected: SCHEMA_VERSION,
            }),
        }
    }
}
