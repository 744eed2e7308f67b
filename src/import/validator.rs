//! Row validation: apply mappings, enforce required fields, normalize values

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::mapping::{fallback_transform, split_tags, MappingSet};
use super::parser::Row;
use super::value::CellValue;
use crate::entities::contact::{ContactField, ContactStatus};

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A validated row keyed by contact field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedRow {
    /// 1-based position among the file's data rows
    pub row_number: usize,
    pub fields: BTreeMap<ContactField, CellValue>,
}

impl MappedRow {
    pub fn get(&self, field: ContactField) -> &CellValue {
        self.fields.get(&field).unwrap_or(&EMPTY_CELL)
    }

    /// Non-empty string form of a field
    pub fn text(&self, field: ContactField) -> Option<String> {
        self.get(field).to_opt_string()
    }

    pub fn email(&self) -> Option<String> {
        self.text(ContactField::Email)
    }
}

/// Outcome of validating a parsed file against a mapping set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    /// True only when no error of any kind was recorded
    pub valid: bool,
    pub errors: Vec<String>,
    /// Clean rows, in file order
    pub valid_rows: Vec<MappedRow>,
    /// 1-based numbers of rows excluded for errors
    pub rejected_rows: Vec<usize>,
    pub total_rows: usize,
}

impl ValidationResult {
    /// At least one row is importable
    pub fn can_proceed(&self) -> bool {
        !self.valid_rows.is_empty()
    }
}

/// Validates rows with a fixed notion of "today" for date fallbacks
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    today: NaiveDate,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl Validator {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn validate(&self, rows: &[Row], mappings: &MappingSet) -> ValidationResult {
        let missing = mappings.missing_required();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(ContactField::as_str).collect();
            return ValidationResult {
                valid: false,
                errors: vec![format!(
                    "Required fields must be mapped: {}",
                    names.join(", ")
                )],
                valid_rows: Vec::new(),
                rejected_rows: Vec::new(),
                total_rows: rows.len(),
            };
        }

        let mut result = ValidationResult {
            total_rows: rows.len(),
            ..Default::default()
        };

        // first row number seen per case-folded email
        let mut seen_emails: HashMap<String, usize> = HashMap::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            let validated = self.validate_row(row, mappings).and_then(|fields| {
                let mapped = MappedRow { row_number, fields };
                match mapped.email() {
                    Some(email) => match seen_emails.get(&email.to_ascii_lowercase()) {
                        Some(first) => Err(vec![format!("Email {} repeats row {}", email, first)]),
                        None => {
                            seen_emails.insert(email.to_ascii_lowercase(), row_number);
                            Ok(mapped)
                        }
                    },
                    None => Ok(mapped),
                }
            });
            match validated {
                Ok(mapped) => result.valid_rows.push(mapped),
                Err(messages) => {
                    result
                        .errors
                        .push(format!("Row {}: {}", row_number, messages.join(", ")));
                    result.rejected_rows.push(row_number);
                }
            }
        }

        result.valid = result.errors.is_empty();

        tracing::debug!(
            target: "outreach::import",
            total = result.total_rows,
            accepted = result.valid_rows.len(),
            rejected = result.rejected_rows.len(),
            "validation finished"
        );

        result
    }

    fn validate_row(
        &self,
        row: &Row,
        mappings: &MappingSet,
    ) -> Result<BTreeMap<ContactField, CellValue>, Vec<String>> {
        let mut fields = BTreeMap::new();
        let mut errors = Vec::new();

        for mapping in mappings {
            let raw = row.get(&mapping.source);
            let value = match &mapping.transform {
                Some(transform) => match transform.apply(raw, self.today) {
                    Ok(value) => value,
                    Err(e) => {
                        errors.push(format!(
                            "Transform '{}' failed for {}: {}",
                            transform.name(),
                            mapping.target,
                            e
                        ));
                        continue;
                    }
                },
                None => raw.clone(),
            };
            fields.insert(mapping.target, value);
        }

        for field in ContactField::required() {
            if mappings.for_target(*field).is_some() {
                continue;
            }
            if let Some(fallback) = fallback_transform(*field) {
                match fallback.apply(&CellValue::Empty, self.today) {
                    Ok(value) => {
                        fields.insert(*field, value);
                    }
                    Err(e) => errors.push(format!("Default for {} failed: {}", field, e)),
                }
            }
        }

        for field in ContactField::required() {
            if fields.get(field).map_or(true, CellValue::is_empty) {
                errors.push(format!("Missing required field: {}", field));
            }
        }

        let status = match fields.get(&ContactField::Status) {
            None => Ok(ContactStatus::default()),
            Some(value) if value.is_empty() => Ok(ContactStatus::default()),
            Some(CellValue::Text(s)) => s.parse::<ContactStatus>(),
            Some(other) => Err(format!("Invalid status: {}", other)),
        };
        match status {
            Ok(status) => {
                fields.insert(ContactField::Status, CellValue::Text(status.to_string()));
            }
            Err(e) => errors.push(e),
        }

        let tags = match fields.get(&ContactField::Tags) {
            None | Some(CellValue::Empty) => Ok(Vec::new()),
            Some(CellValue::List(items)) => Ok(items.clone()),
            Some(CellValue::Text(s)) => Ok(split_tags(s)),
            Some(_) => Err("Tags must be an array or comma-separated string".to_string()),
        };
        match tags {
            Ok(tags) => {
                fields.insert(ContactField::Tags, CellValue::List(tags));
            }
            Err(e) => errors.push(e),
        }

        if errors.is_empty() {
            Ok(fields)
        } else {
            Err(errors)
        }
    }
}

/// Validate with today's local date
pub fn validate(rows: &[Row], mappings: &MappingSet) -> ValidationResult {
    Validator::default().validate(rows, mappings)
}
