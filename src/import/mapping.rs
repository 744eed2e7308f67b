//! Field mappings: which source column feeds which contact field
//!
//! Default mappings come from a fixed synonym table keyed by normalized
//! header text. Each target field may be mapped at most once; attempts to
//! map a second column onto an already-mapped field are rejected instead of
//! letting the later column silently win.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::dates::{coerce_date, to_iso};
use super::value::CellValue;
use crate::entities::contact::ContactField;

/// Header synonyms, already normalized (lowercase, single spaces)
const SYNONYMS: &[(&str, ContactField)] = &[
    ("name", ContactField::Name),
    ("full name", ContactField::Name),
    ("fullname", ContactField::Name),
    ("contact name", ContactField::Name),
    ("contact", ContactField::Name),
    ("person", ContactField::Name),
    ("email", ContactField::Email),
    ("e mail", ContactField::Email),
    ("email address", ContactField::Email),
    ("e mail address", ContactField::Email),
    ("mail", ContactField::Email),
    ("role", ContactField::Role),
    ("job title", ContactField::Role),
    ("title", ContactField::Role),
    ("position", ContactField::Role),
    ("job", ContactField::Role),
    ("company", ContactField::Company),
    ("company name", ContactField::Company),
    ("organization", ContactField::Company),
    ("organisation", ContactField::Company),
    ("employer", ContactField::Company),
    ("tags", ContactField::Tags),
    ("tag", ContactField::Tags),
    ("labels", ContactField::Tags),
    ("categories", ContactField::Tags),
    ("date of contact", ContactField::DateOfContact),
    ("dateofcontact", ContactField::DateOfContact),
    ("last contacted", ContactField::DateOfContact),
    ("last contact", ContactField::DateOfContact),
    ("last contact date", ContactField::DateOfContact),
    ("contact date", ContactField::DateOfContact),
    ("date contacted", ContactField::DateOfContact),
    ("date", ContactField::DateOfContact),
    ("status", ContactField::Status),
    ("stage", ContactField::Status),
    ("outreach status", ContactField::Status),
    ("linkedin", ContactField::LinkedinUrl),
    ("linkedin url", ContactField::LinkedinUrl),
    ("linkedinurl", ContactField::LinkedinUrl),
    ("linkedin profile", ContactField::LinkedinUrl),
    ("linkedin profile url", ContactField::LinkedinUrl),
];

/// Normalize header text for synonym lookup
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look up the contact field a header conventionally names
pub fn suggest_target(header: &str) -> Option<ContactField> {
    let normalized = normalize_header(header);
    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == normalized)
        .map(|(_, field)| *field)
}

type CustomFn = dyn Fn(&CellValue) -> Result<CellValue, String> + Send + Sync;

/// A value transform applied to a column before assignment
#[derive(Clone)]
pub enum Transform {
    /// Comma-split text into a trimmed, non-empty list
    SplitTags,
    /// Reformat as an ISO calendar date, falling back to today
    IsoDate,
    Trim,
    Lowercase,
    /// Caller-supplied function
    Custom { name: String, func: Arc<CustomFn> },
}

impl Transform {
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&CellValue) -> Result<CellValue, String> + Send + Sync + 'static,
    {
        Transform::Custom {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Parse a built-in transform name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "tags" | "split-tags" | "split_tags" => Some(Transform::SplitTags),
            "date" | "iso-date" | "iso_date" => Some(Transform::IsoDate),
            "trim" => Some(Transform::Trim),
            "lower" | "lowercase" => Some(Transform::Lowercase),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Transform::SplitTags => "split-tags",
            Transform::IsoDate => "iso-date",
            Transform::Trim => "trim",
            Transform::Lowercase => "lowercase",
            Transform::Custom { name, .. } => name,
        }
    }

    /// Apply the transform; `today` backs the date fallback
    pub fn apply(&self, value: &CellValue, today: NaiveDate) -> Result<CellValue, String> {
        match self {
            Transform::SplitTags => Ok(match value {
                CellValue::Text(s) => CellValue::List(split_tags(s)),
                other => other.clone(),
            }),
            Transform::IsoDate => {
                let date = coerce_date(value).unwrap_or(today);
                Ok(CellValue::Text(to_iso(date)))
            }
            Transform::Trim => Ok(match value {
                CellValue::Text(s) => CellValue::text(s.trim()),
                other => other.clone(),
            }),
            Transform::Lowercase => Ok(match value {
                CellValue::Text(s) => CellValue::Text(s.to_lowercase()),
                other => other.clone(),
            }),
            Transform::Custom { func, .. } => func(value),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transform({})", self.name())
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Transform::Custom { func: a, .. }, Transform::Custom { func: b, .. }) => {
                Arc::ptr_eq(a, b)
            }
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl Serialize for Transform {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

/// Comma-split, trim and drop empty entries
pub fn split_tags(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Transform every mapping onto `target` receives by default
pub fn default_transform(target: ContactField) -> Option<Transform> {
    match target {
        ContactField::Tags => Some(Transform::SplitTags),
        ContactField::DateOfContact => Some(Transform::IsoDate),
        _ => None,
    }
}

/// Transform that fills a required field when no column is mapped onto it.
/// It is applied to an empty cell, so `IsoDate` yields today's date.
pub fn fallback_transform(target: ContactField) -> Option<Transform> {
    match target {
        ContactField::DateOfContact => Some(Transform::IsoDate),
        _ => None,
    }
}

/// One source column mapped onto one contact field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMapping {
    pub source: String,
    pub target: ContactField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

impl FieldMapping {
    /// Mapping with the target's default transform
    pub fn new(source: impl Into<String>, target: ContactField) -> Self {
        Self {
            source: source.into(),
            target,
            transform: default_transform(target),
        }
    }

    /// Mapping with no transform at all
    pub fn raw(source: impl Into<String>, target: ContactField) -> Self {
        Self {
            source: source.into(),
            target,
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: Option<Transform>) -> Self {
        self.transform = transform;
        self
    }

    /// Parse `Source Column=field[:transform]`
    ///
    /// The split happens at the last `=`, so source headers may contain one.
    /// A transform of `none` clears the default.
    pub fn from_spec(spec: &str) -> Result<Self, MappingError> {
        let (source, rest) = spec
            .rsplit_once('=')
            .ok_or_else(|| MappingError::InvalidSpec(spec.to_string()))?;
        let source = source.trim();
        if source.is_empty() {
            return Err(MappingError::InvalidSpec(spec.to_string()));
        }

        let (field, transform) = match rest.split_once(':') {
            Some((field, transform)) => (field, Some(transform.trim())),
            None => (rest, None),
        };
        let target: ContactField = field.parse().map_err(MappingError::UnknownField)?;

        let mapping = FieldMapping::new(source, target);
        match transform {
            None => Ok(mapping),
            Some(name) if name.eq_ignore_ascii_case("none") => Ok(mapping.with_transform(None)),
            Some(name) => {
                let transform = Transform::from_name(name)
                    .ok_or_else(|| MappingError::UnknownTransform(name.to_string()))?;
                Ok(mapping.with_transform(Some(transform)))
            }
        }
    }
}

/// A single user edit to the mapping list
#[derive(Debug, Clone)]
pub enum MappingEdit {
    Add(FieldMapping),
    Remove(usize),
    Update(usize, FieldMapping),
    SetTransform(usize, Option<Transform>),
    /// Point `mapping.source` at `mapping.target`, replacing whatever
    /// previously used that source or that target
    Remap(FieldMapping),
    /// Drop every mapping reading from this source column
    Unmap(String),
}

/// Errors raised by mapping edits
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("Field '{target}' is already mapped from column '{existing_source}'")]
    DuplicateTarget {
        target: ContactField,
        existing_source: String,
    },

    #[error("No mapping at position {index} (have {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid mapping '{0}'. Expected 'Source Column=field[:transform]'")]
    InvalidSpec(String),

    #[error("{0}")]
    UnknownField(String),

    #[error("Unknown transform '{0}'. Valid transforms: split-tags, iso-date, trim, lowercase, none")]
    UnknownTransform(String),
}

/// Ordered list of field mappings with at most one mapping per target
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MappingSet {
    mappings: Vec<FieldMapping>,
}

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FieldMapping> {
        self.mappings.get(index)
    }

    /// The mapping feeding `target`, if any
    pub fn for_target(&self, target: ContactField) -> Option<&FieldMapping> {
        self.mappings.iter().find(|m| m.target == target)
    }

    /// Required fields no mapping targets and no fallback can fill
    pub fn missing_required(&self) -> Vec<ContactField> {
        ContactField::required()
            .iter()
            .copied()
            .filter(|field| {
                self.for_target(*field).is_none() && fallback_transform(*field).is_none()
            })
            .collect()
    }

    fn check_target(&self, target: ContactField, skip: Option<usize>) -> Result<(), MappingError> {
        match self
            .mappings
            .iter()
            .enumerate()
            .find(|(idx, m)| m.target == target && Some(*idx) != skip)
        {
            Some((_, existing)) => Err(MappingError::DuplicateTarget {
                target,
                existing_source: existing.source.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_index(&self, index: usize) -> Result<(), MappingError> {
        if index < self.mappings.len() {
            Ok(())
        } else {
            Err(MappingError::IndexOutOfRange {
                index,
                len: self.mappings.len(),
            })
        }
    }

    pub fn add(&mut self, mapping: FieldMapping) -> Result<(), MappingError> {
        self.check_target(mapping.target, None)?;
        self.mappings.push(mapping);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<FieldMapping, MappingError> {
        self.check_index(index)?;
        Ok(self.mappings.remove(index))
    }

    pub fn update(&mut self, index: usize, mapping: FieldMapping) -> Result<(), MappingError> {
        self.check_index(index)?;
        self.check_target(mapping.target, Some(index))?;
        self.mappings[index] = mapping;
        Ok(())
    }

    pub fn set_transform(
        &mut self,
        index: usize,
        transform: Option<Transform>,
    ) -> Result<(), MappingError> {
        self.check_index(index)?;
        self.mappings[index].transform = transform;
        Ok(())
    }

    pub fn unmap(&mut self, source: &str) -> usize {
        let before = self.mappings.len();
        self.mappings.retain(|m| m.source != source);
        before - self.mappings.len()
    }

    pub fn remap(&mut self, mapping: FieldMapping) {
        self.mappings
            .retain(|m| m.source != mapping.source && m.target != mapping.target);
        self.mappings.push(mapping);
    }

    /// Apply one edit
    pub fn apply(&mut self, edit: MappingEdit) -> Result<(), MappingError> {
        match edit {
            MappingEdit::Add(mapping) => self.add(mapping),
            MappingEdit::Remove(index) => self.remove(index).map(|_| ()),
            MappingEdit::Update(index, mapping) => self.update(index, mapping),
            MappingEdit::SetTransform(index, transform) => self.set_transform(index, transform),
            MappingEdit::Remap(mapping) => {
                self.remap(mapping);
                Ok(())
            }
            MappingEdit::Unmap(source) => {
                self.unmap(&source);
                Ok(())
            }
        }
    }
}

impl<'a> IntoIterator for &'a MappingSet {
    type Item = &'a FieldMapping;
    type IntoIter = std::slice::Iter<'a, FieldMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}

/// Propose mappings for recognized headers
///
/// The first header naming a field claims it; later synonyms for the same
/// field are left unmapped.
pub fn build_default_mappings<S: AsRef<str>>(headers: &[S]) -> MappingSet {
    let mut set = MappingSet::new();
    for header in headers {
        let header = header.as_ref();
        if let Some(target) = suggest_target(header) {
            if set.for_target(target).is_none() {
                set.mappings.push(FieldMapping::new(header, target));
            }
        }
    }
    set
}
