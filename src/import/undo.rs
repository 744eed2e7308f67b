//! Reversing an import by deleting the ids it created

use serde::Serialize;

use super::importer::IMPORT_BATCH_SIZE;
use crate::core::identity::{ContactId, Owner};
use crate::core::store::ContactStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UndoResult {
    pub success: bool,
    /// Sum of deletions the store reported
    pub undone: usize,
    pub errors: Vec<String>,
}

/// Delete `ids` for `owner` in batches, tolerating failed batches
pub fn undo_import<S: ContactStore + ?Sized>(
    store: &mut S,
    owner: &Owner,
    ids: &[ContactId],
) -> UndoResult {
    if ids.is_empty() {
        return UndoResult {
            success: false,
            undone: 0,
            errors: vec!["No contacts to undo".to_string()],
        };
    }

    let mut result = UndoResult::default();
    for (idx, batch) in ids.chunks(IMPORT_BATCH_SIZE).enumerate() {
        match store.delete_contacts(owner, batch) {
            Ok(deleted) => result.undone += deleted,
            Err(e) => {
                tracing::warn!(
                    target: "outreach::import",
                    batch = idx + 1,
                    error = %e,
                    "undo batch failed"
                );
                result.errors.push(format!("Batch {}: {}", idx + 1, e));
            }
        }
    }

    result.success = result.errors.is_empty();
    tracing::info!(target: "outreach::import", undone = result.undone, "undo finished");
    result
}
