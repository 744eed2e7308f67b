//! SQLite-backed contact store

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::fs;
use std::path::Path;

use super::{ContactStore, StoreError};
use crate::core::identity::{ContactId, Owner};
use crate::entities::contact::{Contact, ContactStatus, NewContact};

/// Local part prefix and domain of synthesized addresses for contacts
/// imported without an email; `.invalid` can never be a real domain
const PLACEHOLDER_PREFIX: &str = "no-email-";
const PLACEHOLDER_DOMAIN: &str = "@placeholder.invalid";

const CONTACT_COLUMNS: &str = "id, owner, name, email, role, company, tags, \
     date_of_contact, status, linkedin_url, created, updated";

/// The contact store backed by SQLite
pub struct SqliteStore {
    pub(super) conn: Connection,
}

impl SqliteStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let mut store = Self { conn };
        store.init_schema()?;
        tracing::debug!(target: "outreach::store", path = %path.display(), "opened contact store");
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }
}

/// Synthesized unique address for a contact without email
fn placeholder_email(id: &ContactId) -> String {
    format!(
        "{}{}{}",
        PLACEHOLDER_PREFIX,
        id.ulid().to_string().to_lowercase(),
        PLACEHOLDER_DOMAIN
    )
}

fn is_placeholder_email(email: &str) -> bool {
    email.starts_with(PLACEHOLDER_PREFIX) && email.ends_with(PLACEHOLDER_DOMAIN)
}

/// Raw column values, converted to a [`Contact`] outside the row callback
struct ContactRecord {
    id: String,
    owner: String,
    name: String,
    email: String,
    role: Option<String>,
    company: Option<String>,
    tags: String,
    date_of_contact: String,
    status: String,
    linkedin_url: Option<String>,
    created: String,
    updated: String,
}

impl ContactRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            role: row.get(4)?,
            company: row.get(5)?,
            tags: row.get(6)?,
            date_of_contact: row.get(7)?,
            status: row.get(8)?,
            linkedin_url: row.get(9)?,
            created: row.get(10)?,
            updated: row.get(11)?,
        })
    }

    fn into_contact(self) -> Result<Contact, StoreError> {
        let corrupt = |message: String| StoreError::Corrupt {
            id: self.id.clone(),
            message,
        };

        let id = ContactId::parse(&self.id).map_err(|e| corrupt(e.to_string()))?;
        let tags: Vec<String> =
            serde_json::from_str(&self.tags).map_err(|e| corrupt(format!("tags: {}", e)))?;
        let date_of_contact = NaiveDate::parse_from_str(&self.date_of_contact, "%Y-%m-%d")
            .map_err(|e| corrupt(format!("date_of_contact: {}", e)))?;
        let status: ContactStatus = self.status.parse().map_err(corrupt)?;
        let created =
            parse_timestamp(&self.created).map_err(|e| corrupt(format!("created: {}", e)))?;
        let updated =
            parse_timestamp(&self.updated).map_err(|e| corrupt(format!("updated: {}", e)))?;

        let email = if is_placeholder_email(&self.email) {
            None
        } else {
            Some(self.email)
        };

        Ok(Contact {
            id,
            owner: Owner::new(self.owner),
            name: self.name,
            email,
            role: self.role,
            company: self.company,
            tags,
            date_of_contact,
            status,
            linkedin_url: self.linkedin_url,
            created,
            updated,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// `?2, ?3, ...` for `count` values following the owner parameter
fn placeholders(count: usize) -> String {
    (2..count + 2)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ContactStore for SqliteStore {
    fn insert_contacts(
        &mut self,
        owner: &Owner,
        batch: &[NewContact],
    ) -> Result<Vec<Contact>, StoreError> {
        let tx = self.conn.transaction()?;
        let mut created = Vec::with_capacity(batch.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO contacts (id, owner, name, email, role, company, tags, \
                 date_of_contact, status, linkedin_url, created, updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;

            for new in batch {
                let id = ContactId::new();
                let now = Utc::now();
                let email = new
                    .email
                    .clone()
                    .unwrap_or_else(|| placeholder_email(&id));
                let tags = serde_json::to_string(&new.tags)?;
                let timestamp = now.to_rfc3339();

                stmt.execute(params![
                    id.to_string(),
                    owner.as_str(),
                    new.name,
                    email,
                    new.role,
                    new.company,
                    tags,
                    new.date_of_contact.format("%Y-%m-%d").to_string(),
                    new.status.as_str(),
                    new.linkedin_url,
                    timestamp,
                    timestamp,
                ])?;

                created.push(Contact::from_new(id, owner.clone(), new.clone(), now));
            }
        }
        tx.commit()?;

        tracing::debug!(target: "outreach::store", count = created.len(), "inserted contacts");
        Ok(created)
    }

    fn existing_emails(&self, owner: &Owner, emails: &[String]) -> Result<Vec<String>, StoreError> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT email FROM contacts WHERE owner = ?1 AND email IN ({})",
            placeholders(emails.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let values = std::iter::once(owner.as_str()).chain(emails.iter().map(String::as_str));
        let found = stmt
            .query_map(params_from_iter(values), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(found)
    }

    fn delete_contacts(&mut self, owner: &Owner, ids: &[ContactId]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM contacts WHERE owner = ?1 AND id IN ({})",
            placeholders(ids.len())
        );
        let id_strings: Vec<String> = ids.iter().map(ContactId::to_string).collect();
        let values = std::iter::once(owner.as_str()).chain(id_strings.iter().map(String::as_str));
        let deleted = self.conn.execute(&sql, params_from_iter(values))?;

        tracing::debug!(
            target: "outreach::store",
            requested = ids.len(),
            deleted,
            "deleted contacts"
        );
        Ok(deleted)
    }

    fn list_contacts(&self, owner: &Owner) -> Result<Vec<Contact>, StoreError> {
        let sql = format!(
            "SELECT {} FROM contacts WHERE owner = ?1 ORDER BY name COLLATE NOCASE, created",
            CONTACT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![owner.as_str()], ContactRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        records.into_iter().map(ContactRecord::into_contact).collect()
    }
}
