//! Duplicate detection against the owner's stored contacts

use serde::Serialize;

use super::validator::MappedRow;
use crate::core::identity::Owner;
use crate::core::store::{ContactStore, StoreError};

/// Candidate emails that already exist for the owner
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateReport {
    /// Colliding emails, spelled as they appear in the import
    pub duplicates: Vec<String>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.duplicates.len()
    }

    /// Case-insensitive membership test
    pub fn contains(&self, email: &str) -> bool {
        self.duplicates
            .iter()
            .any(|d| d.eq_ignore_ascii_case(email.trim()))
    }

    /// Rows whose email is not a duplicate (rows without email always pass)
    pub fn filter_rows(&self, rows: &[MappedRow]) -> Vec<MappedRow> {
        rows.iter()
            .filter(|row| row.email().map_or(true, |email| !self.contains(&email)))
            .cloned()
            .collect()
    }
}

/// Emails of validated rows, in row order
pub fn emails_of(rows: &[MappedRow]) -> Vec<String> {
    rows.iter().filter_map(MappedRow::email).collect()
}

/// Look up which candidate emails the owner already has, in one query.
///
/// Blank candidates never reach the store and are never reported.
pub fn check_for_duplicates<S: ContactStore + ?Sized>(
    store: &S,
    owner: &Owner,
    emails: &[String],
) -> Result<DuplicateReport, StoreError> {
    let mut candidates: Vec<String> = Vec::new();
    for email in emails.iter().map(|e| e.trim()).filter(|e| !e.is_empty()) {
        if !candidates.iter().any(|c| c.eq_ignore_ascii_case(email)) {
            candidates.push(email.to_string());
        }
    }

    if candidates.is_empty() {
        return Ok(DuplicateReport::default());
    }

    let existing = store.existing_emails(owner, &candidates)?;
    let duplicates: Vec<String> = candidates
        .into_iter()
        .filter(|c| existing.iter().any(|e| e.eq_ignore_ascii_case(c)))
        .collect();

    tracing::debug!(
        target: "outreach::import",
        duplicates = duplicates.len(),
        "duplicate check finished"
    );

    Ok(DuplicateReport { duplicates })
}
