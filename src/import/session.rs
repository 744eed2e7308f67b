//! The import flow as an explicit stage machine
//!
//! Each stage owns exactly the data that is meaningful in it, so an
//! import cannot start without a validation result and an undo cannot
//! run without the ids of a finished import. `start_import` and `undo`
//! are guarded: a second import or a second undo is refused.

use serde::Serialize;
use thiserror::Error;

use super::duplicates::{check_for_duplicates, emails_of, DuplicateReport};
use super::importer::{import_contacts, ImportResult};
use super::mapping::{build_default_mappings, MappingEdit, MappingError, MappingSet};
use super::parser::ParsedFile;
use super::undo::{undo_import, UndoResult};
use super::validator::{ValidationResult, Validator};
use crate::core::identity::Owner;
use crate::core::store::{ContactStore, StoreError};

/// Where an import currently stands
#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Upload,
    Mapping {
        parsed: ParsedFile,
        mappings: MappingSet,
    },
    Validation {
        parsed: ParsedFile,
        mappings: MappingSet,
        validation: ValidationResult,
        duplicates: DuplicateReport,
    },
    /// Batches are being written
    Importing,
    Complete {
        result: ImportResult,
        undo: Option<UndoResult>,
    },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Upload => "upload",
            Stage::Mapping { .. } => "mapping",
            Stage::Validation { .. } => "validation",
            Stage::Importing => "importing",
            Stage::Complete { .. } => "complete",
        }
    }
}

/// Errors raised by session transitions
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot {action} while in the {from} stage")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("An import has already been started for this file")]
    ImportAlreadyStarted,

    #[error("This import has already been undone")]
    AlreadyUndone,

    #[error("No valid rows to import")]
    NothingToImport,

    #[error("Validation reported {0} error(s); fix them or import without strict mode")]
    NotValid(usize),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One file's journey from upload to (optionally undone) import
#[derive(Debug)]
pub struct ImportSession {
    owner: Owner,
    validator: Validator,
    stage: Stage,
}

impl ImportSession {
    pub fn new(owner: Owner) -> Self {
        Self::with_validator(owner, Validator::default())
    }

    /// Use a fixed validator, e.g. one pinned to a specific "today"
    pub fn with_validator(owner: Owner, validator: Validator) -> Self {
        Self {
            owner,
            validator,
            stage: Stage::Upload,
        }
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn parsed(&self) -> Option<&ParsedFile> {
        match &self.stage {
            Stage::Mapping { parsed, .. } | Stage::Validation { parsed, .. } => Some(parsed),
            _ => None,
        }
    }

    pub fn mappings(&self) -> Option<&MappingSet> {
        match &self.stage {
            Stage::Mapping { mappings, .. } | Stage::Validation { mappings, .. } => Some(mappings),
            _ => None,
        }
    }

    pub fn validation(&self) -> Option<(&ValidationResult, &DuplicateReport)> {
        match &self.stage {
            Stage::Validation {
                validation,
                duplicates,
                ..
            } => Some((validation, duplicates)),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ImportResult> {
        match &self.stage {
            Stage::Complete { result, .. } => Some(result),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.stage.name(),
            action,
        }
    }

    /// Accept a parsed file and propose default mappings
    pub fn load(&mut self, parsed: ParsedFile) -> Result<&MappingSet, SessionError> {
        if !matches!(self.stage, Stage::Upload) {
            return Err(self.invalid("load a file"));
        }

        let mappings = build_default_mappings(&parsed.headers);
        tracing::debug!(
            target: "outreach::import",
            file = %parsed.file_name,
            rows = parsed.rows.len(),
            mapped = mappings.len(),
            "file loaded"
        );
        self.stage = Stage::Mapping { parsed, mappings };
        match &self.stage {
            Stage::Mapping { mappings, .. } => Ok(mappings),
            _ => Err(self.invalid("load a file")),
        }
    }

    /// Edit the mapping list; editing after validation discards the result
    pub fn edit_mappings(&mut self, edit: MappingEdit) -> Result<(), SessionError> {
        let (parsed, mut mappings) = match std::mem::take(&mut self.stage) {
            Stage::Mapping { parsed, mappings } | Stage::Validation { parsed, mappings, .. } => {
                (parsed, mappings)
            }
            other => {
                self.stage = other;
                return Err(self.invalid("edit mappings"));
            }
        };

        let outcome = mappings.apply(edit);
        self.stage = Stage::Mapping { parsed, mappings };
        outcome.map_err(SessionError::from)
    }

    /// Validate rows and check their emails against the store
    pub fn validate<S: ContactStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<&ValidationResult, SessionError> {
        let (parsed, mappings) = match &self.stage {
            Stage::Mapping { parsed, mappings } | Stage::Validation { parsed, mappings, .. } => {
                (parsed, mappings)
            }
            _ => return Err(self.invalid("validate")),
        };

        let validation = self.validator.validate(&parsed.rows, mappings);
        let duplicates =
            check_for_duplicates(store, &self.owner, &emails_of(&validation.valid_rows))?;

        let (parsed, mappings) = match std::mem::take(&mut self.stage) {
            Stage::Mapping { parsed, mappings } | Stage::Validation { parsed, mappings, .. } => {
                (parsed, mappings)
            }
            _ => return Err(self.invalid("validate")),
        };
        self.stage = Stage::Validation {
            parsed,
            mappings,
            validation,
            duplicates,
        };

        match &self.stage {
            Stage::Validation { validation, .. } => Ok(validation),
            _ => Err(self.invalid("validate")),
        }
    }

    /// Insert the validated rows. Accepted once per loaded file.
    ///
    /// `strict` refuses to import unless every row validated cleanly.
    pub fn start_import<S: ContactStore + ?Sized>(
        &mut self,
        store: &mut S,
        skip_duplicates: bool,
        strict: bool,
    ) -> Result<&ImportResult, SessionError> {
        let (validation, duplicates) = match &self.stage {
            Stage::Validation {
                validation,
                duplicates,
                ..
            } => (validation, duplicates),
            Stage::Importing | Stage::Complete { .. } => {
                return Err(SessionError::ImportAlreadyStarted)
            }
            _ => return Err(self.invalid("start an import")),
        };

        if !validation.can_proceed() {
            return Err(SessionError::NothingToImport);
        }
        if strict && !validation.valid {
            return Err(SessionError::NotValid(validation.errors.len()));
        }

        let rows = if skip_duplicates {
            duplicates.filter_rows(&validation.valid_rows)
        } else {
            validation.valid_rows.clone()
        };

        self.stage = Stage::Importing;
        let result = import_contacts(store, &self.owner, &rows);
        self.stage = Stage::Complete { result, undo: None };

        match &self.stage {
            Stage::Complete { result, .. } => Ok(result),
            _ => Err(self.invalid("start an import")),
        }
    }

    /// Delete everything the finished import created. Single-shot.
    pub fn undo<S: ContactStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<&UndoResult, SessionError> {
        let owner = &self.owner;
        match &mut self.stage {
            Stage::Complete { undo: Some(_), .. } => Err(SessionError::AlreadyUndone),
            Stage::Complete { result, undo } => {
                let outcome = undo_import(store, owner, &result.imported_ids);
                Ok(undo.insert(outcome))
            }
            other => Err(SessionError::InvalidTransition {
                from: other.name(),
                action: "undo",
            }),
        }
    }

    /// Drop all state and return to upload; any pending undo is lost
    pub fn reset(&mut self) {
        self.stage = Stage::Upload;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{MemoryStore, SqliteStore};
    use crate::entities::contact::{ContactField, ContactStatus, NewContact};
    use crate::import::mapping::FieldMapping;
    use crate::import::parser::parse_bytes;
    use chrono::NaiveDate;

    const JANE_CSV: &str = "Name,Email,Company,Role,Tags,Status,Last Contacted\n\
        Jane Doe,jane@acme.com,Acme,CTO,\"investor, warm\",Reached Out,2024-03-15\n";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn session() -> ImportSession {
        ImportSession::with_validator(Owner::new("me"), Validator::new(today()))
    }

    fn parsed(csv: &str) -> ParsedFile {
        parse_bytes("contacts.csv", csv.as_bytes()).unwrap()
    }

    fn many_rows(count: usize) -> String {
        let mut csv = String::from("name,email,date\n");
        for i in 0..count {
            csv.push_str(&format!("P{i},p{i}@x.com,2024-01-01\n"));
        }
        csv
    }

    #[test]
    fn test_jane_doe_end_to_end() {
        let mut store = MemoryStore::new();
        let mut session = session();

        let mappings = session.load(parsed(JANE_CSV)).unwrap();
        assert_eq!(mappings.len(), 7);

        let validation = session.validate(&store).unwrap();
        assert!(validation.valid);
        assert_eq!(validation.valid_rows.len(), 1);

        let result = session.start_import(&mut store, false, true).unwrap();
        assert!(result.success);
        assert_eq!(result.imported, 1);

        let contacts = store.list_contacts(&Owner::new("me")).unwrap();
        let jane = &contacts[0];
        assert_eq!(jane.name, "Jane Doe");
        assert_eq!(jane.email.as_deref(), Some("jane@acme.com"));
        assert_eq!(jane.company.as_deref(), Some("Acme"));
        assert_eq!(jane.role.as_deref(), Some("CTO"));
        assert_eq!(jane.tags, vec!["investor", "warm"]);
        assert_eq!(jane.status, ContactStatus::ReachedOut);
        assert_eq!(
            jane.date_of_contact,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_file_without_date_column_imports_with_today() {
        let mut store = MemoryStore::new();
        let mut session = session();
        let csv = "name,email,job title,tags\nJane Doe,jane@x.com,Engineer,\"ops,lead\"\n";

        let mappings = session.load(parsed(csv)).unwrap();
        assert!(mappings.for_target(ContactField::DateOfContact).is_none());

        let validation = session.validate(&store).unwrap();
        assert!(validation.valid, "{:?}", validation.errors);
        assert_eq!(validation.valid_rows.len(), 1);

        let result = session.start_import(&mut store, false, true).unwrap();
        assert!(result.success);
        assert_eq!(result.imported, 1);

        let contacts = store.list_contacts(&Owner::new("me")).unwrap();
        let jane = &contacts[0];
        assert_eq!(jane.name, "Jane Doe");
        assert_eq!(jane.email.as_deref(), Some("jane@x.com"));
        assert_eq!(jane.role.as_deref(), Some("Engineer"));
        assert_eq!(jane.tags, vec!["ops", "lead"]);
        assert_eq!(jane.status, ContactStatus::NotStarted);
        assert_eq!(jane.date_of_contact, today());
    }

    #[test]
    fn test_repeated_email_does_not_sink_its_batch() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut session = session();
        let mut csv = String::from("name,email\nDup,p0@x.com\n");
        for i in 0..50 {
            csv.push_str(&format!("P{i},p{i}@x.com\n"));
        }

        session.load(parsed(&csv)).unwrap();
        let validation = session.validate(&store).unwrap();
        assert_eq!(validation.valid_rows.len(), 50);
        assert_eq!(validation.rejected_rows, vec![2]);
        assert_eq!(validation.errors, vec!["Row 2: Email p0@x.com repeats row 1"]);

        let result = session.start_import(&mut store, true, false).unwrap();
        assert_eq!(result.imported, 50);
        assert_eq!(result.failed_batches, 0);
        assert_eq!(store.list_contacts(&Owner::new("me")).unwrap().len(), 50);
    }

    #[test]
    fn test_second_import_is_refused() {
        let mut store = MemoryStore::new();
        let mut session = session();
        session.load(parsed(JANE_CSV)).unwrap();
        session.validate(&store).unwrap();
        session.start_import(&mut store, false, false).unwrap();

        let err = session.start_import(&mut store, false, false).unwrap_err();
        assert!(matches!(err, SessionError::ImportAlreadyStarted));
        assert_eq!(store.insert_calls(), 1);
    }

    #[test]
    fn test_undo_is_single_shot() {
        let mut store = MemoryStore::new();
        let mut session = session();
        session.load(parsed(&many_rows(60))).unwrap();
        session.validate(&store).unwrap();
        session.start_import(&mut store, false, false).unwrap();

        let undo = session.undo(&mut store).unwrap();
        assert!(undo.success);
        assert_eq!(undo.undone, 60);
        assert_eq!(store.delete_calls(), 2);

        assert!(matches!(session.undo(&mut store), Err(SessionError::AlreadyUndone)));
        assert_eq!(store.delete_calls(), 2);
    }

    #[test]
    fn test_reset_discards_undo() {
        let mut store = MemoryStore::new();
        let mut session = session();
        session.load(parsed(JANE_CSV)).unwrap();
        session.validate(&store).unwrap();
        session.start_import(&mut store, false, false).unwrap();
        session.reset();

        let err = session.undo(&mut store).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { from: "upload", .. }));
        assert_eq!(store.contacts().len(), 1);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut store = MemoryStore::new();
        let mut session = session();

        assert!(matches!(
            session.validate(&store),
            Err(SessionError::InvalidTransition { from: "upload", action: "validate" })
        ));
        assert!(matches!(
            session.start_import(&mut store, false, false),
            Err(SessionError::InvalidTransition { .. })
        ));

        session.load(parsed(JANE_CSV)).unwrap();
        assert!(matches!(
            session.load(parsed(JANE_CSV)),
            Err(SessionError::InvalidTransition { from: "mapping", .. })
        ));
        assert!(matches!(
            session.start_import(&mut store, false, false),
            Err(SessionError::InvalidTransition { from: "mapping", .. })
        ));
    }

    #[test]
    fn test_editing_after_validation_returns_to_mapping() {
        let store = MemoryStore::new();
        let mut session = session();
        session.load(parsed(JANE_CSV)).unwrap();
        session.validate(&store).unwrap();

        session
            .edit_mappings(MappingEdit::Unmap("Company".to_string()))
            .unwrap();
        assert_eq!(session.stage().name(), "mapping");
        assert!(session
            .mappings()
            .unwrap()
            .for_target(ContactField::Company)
            .is_none());
    }

    #[test]
    fn test_duplicate_target_edit_rejected_but_stage_kept() {
        let mut session = session();
        session.load(parsed(JANE_CSV)).unwrap();

        let err = session
            .edit_mappings(MappingEdit::Add(FieldMapping::new("Role", ContactField::Name)))
            .unwrap_err();
        assert!(matches!(err, SessionError::Mapping(MappingError::DuplicateTarget { .. })));
        assert_eq!(session.stage().name(), "mapping");
    }

    #[test]
    fn test_strict_and_nothing_to_import_gates() {
        let mut store = MemoryStore::new();
        let csv = "name,email,status,date\nA,a@x.com,Ghosted,\nB,b@x.com,Chatted,\n";

        let mut session = session();
        session.load(parsed(csv)).unwrap();
        let validation = session.validate(&store).unwrap();
        assert!(!validation.valid);
        assert!(validation.can_proceed());
        assert!(matches!(
            session.start_import(&mut store, false, true),
            Err(SessionError::NotValid(1))
        ));
        assert_eq!(session.start_import(&mut store, false, false).unwrap().imported, 1);

        let mut empty = ImportSession::with_validator(Owner::new("me"), Validator::new(today()));
        empty.load(parsed("email\nx@y.com\n")).unwrap();
        empty.validate(&store).unwrap();
        assert!(matches!(
            empty.start_import(&mut store, false, false),
            Err(SessionError::NothingToImport)
        ));
    }

    #[test]
    fn test_skip_duplicates_filters_existing() {
        let owner = Owner::new("me");
        let mut store = MemoryStore::new();
        let mut existing = NewContact::new("Old Jane", today());
        existing.email = Some("JANE@acme.com".to_string());
        store.seed(&owner, [existing]);

        let mut session = session();
        session.load(parsed(JANE_CSV)).unwrap();
        session.validate(&store).unwrap();
        let (_, duplicates) = session.validation().unwrap();
        assert_eq!(duplicates.duplicates, vec!["jane@acme.com"]);

        let result = session.start_import(&mut store, true, false).unwrap();
        assert_eq!(result.imported, 0);
        assert_eq!(result.errors, vec!["No valid contacts to import"]);
        assert_eq!(store.insert_calls(), 0);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let store = MemoryStore::new();
        let mut session = session();
        session.load(parsed("name,date\nA,\nB,1/2/2024\n")).unwrap();
        let first = session.validate(&store).unwrap().clone();
        let second = session.validate(&store).unwrap().clone();
        assert_eq!(first, second);
    }
}
