//! Batched insertion of validated rows

use serde::Serialize;

use super::dates::coerce_date;
use super::validator::MappedRow;
use super::value::CellValue;
use crate::core::identity::{ContactId, Owner};
use crate::core::store::ContactStore;
use crate::entities::contact::{ContactField, ContactStatus, NewContact};

/// Rows per store round-trip, for both inserts and undo deletes
pub const IMPORT_BATCH_SIZE: usize = 50;

/// Outcome of an import run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportResult {
    pub success: bool,
    pub imported: usize,
    pub errors: Vec<String>,
    /// Every id created by this run; the unit an undo reverses
    pub imported_ids: Vec<ContactId>,
    /// Batches the store rejected (row-level skips are not counted)
    pub failed_batches: usize,
}

impl ImportResult {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![message.into()],
            ..Default::default()
        }
    }
}

/// Project a validated row onto an insert payload
pub fn to_new_contact(row: &MappedRow) -> Result<NewContact, String> {
    let date_value = row.get(ContactField::DateOfContact);
    let date_of_contact = coerce_date(date_value)
        .ok_or_else(|| format!("Invalid dateOfContact: {}", date_value))?;

    let status = match row.text(ContactField::Status) {
        Some(s) => s.parse::<ContactStatus>()?,
        None => ContactStatus::default(),
    };

    let mut tags: Vec<String> = Vec::new();
    let raw_tags = match row.get(ContactField::Tags) {
        CellValue::List(items) => items.clone(),
        CellValue::Text(s) => super::mapping::split_tags(s),
        _ => Vec::new(),
    };
    for tag in raw_tags {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let mut contact = NewContact::new(
        row.text(ContactField::Name).unwrap_or_default(),
        date_of_contact,
    );
    contact.email = row.email();
    contact.role = row.text(ContactField::Role);
    contact.company = row.text(ContactField::Company);
    contact.linkedin_url = row.text(ContactField::LinkedinUrl);
    contact.tags = tags;
    contact.status = status;
    Ok(contact)
}

/// Insert rows in batches of [`IMPORT_BATCH_SIZE`].
///
/// A failed batch is recorded as `Batch <k>: <message>` and the loop moves
/// on; ids from every successful batch are kept.
pub fn import_contacts<S: ContactStore + ?Sized>(
    store: &mut S,
    owner: &Owner,
    rows: &[MappedRow],
) -> ImportResult {
    if rows.is_empty() {
        return ImportResult::failed("No valid contacts to import");
    }

    let mut result = ImportResult::default();
    let mut contacts = Vec::with_capacity(rows.len());
    for row in rows {
        match to_new_contact(row) {
            Ok(contact) => contacts.push(contact),
            Err(e) => result.errors.push(format!("Row {}: {}", row.row_number, e)),
        }
    }

    for (idx, batch) in contacts.chunks(IMPORT_BATCH_SIZE).enumerate() {
        let batch_number = idx + 1;
        match store.insert_contacts(owner, batch) {
            Ok(created) => {
                result.imported += created.len();
                result.imported_ids.extend(created.iter().map(|c| c.id));
            }
            Err(e) => {
                tracing::warn!(
                    target: "outreach::import",
                    batch = batch_number,
                    error = %e,
                    "batch insert failed"
                );
                result.errors.push(format!("Batch {}: {}", batch_number, e));
                result.failed_batches += 1;
            }
        }
    }

    result.success = result.errors.is_empty();
    tracing::info!(
        target: "outreach::import",
        imported = result.imported,
        errors = result.errors.len(),
        "import finished"
    );
    result
}
