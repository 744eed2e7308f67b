//! Contact import pipeline
//!
//! File Parser -> Mapping Builder -> Validator -> Duplicate Detector ->
//! Importer -> (optional) Undo. Only the last three stages touch a
//! [`ContactStore`](crate::core::store::ContactStore), and each receives it
//! as an explicit argument. [`ImportSession`] sequences the stages.

pub mod dates;
pub mod duplicates;
pub mod importer;
pub mod mapping;
pub mod parser;
pub mod session;
pub mod template;
pub mod undo;
pub mod validator;
pub mod value;

pub use duplicates::{check_for_duplicates, emails_of, DuplicateReport};
pub use importer::{import_contacts, ImportResult, IMPORT_BATCH_SIZE};
pub use mapping::{
    build_default_mappings, FieldMapping, MappingEdit, MappingError, MappingSet, Transform,
};
pub use parser::{parse_bytes, parse_file, FileKind, ParseError, ParsedFile, Row};
pub use session::{ImportSession, SessionError, Stage};
pub use undo::{undo_import, UndoResult};
pub use validator::{validate, MappedRow, ValidationResult, Validator};
pub use value::CellValue;
