//! Contact entity type

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::identity::{ContactId, Owner};

/// Outreach status of a contact
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum ContactStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "Reached Out")]
    ReachedOut,
    #[serde(rename = "Responded")]
    Responded,
    #[serde(rename = "Chatted")]
    Chatted,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::NotStarted => "Not Started",
            ContactStatus::ReachedOut => "Reached Out",
            ContactStatus::Responded => "Responded",
            ContactStatus::Chatted => "Chatted",
        }
    }

    pub fn all() -> &'static [ContactStatus] {
        &[
            ContactStatus::NotStarted,
            ContactStatus::ReachedOut,
            ContactStatus::Responded,
            ContactStatus::Chatted,
        ]
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContactStatus {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Invalid status: {}", wanted))
    }
}

/// The contact attributes an import column can be mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContactField {
    Name,
    Email,
    Role,
    Company,
    Tags,
    DateOfContact,
    Status,
    LinkedinUrl,
}

impl ContactField {
    /// Wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
            ContactField::Role => "role",
            ContactField::Company => "company",
            ContactField::Tags => "tags",
            ContactField::DateOfContact => "dateOfContact",
            ContactField::Status => "status",
            ContactField::LinkedinUrl => "linkedinUrl",
        }
    }

    pub fn all() -> &'static [ContactField] {
        &[
            ContactField::Name,
            ContactField::Email,
            ContactField::Role,
            ContactField::Company,
            ContactField::Tags,
            ContactField::DateOfContact,
            ContactField::Status,
            ContactField::LinkedinUrl,
        ]
    }

    /// Fields every imported contact must carry
    pub fn required() -> &'static [ContactField] {
        &[ContactField::Name, ContactField::DateOfContact]
    }

    pub fn is_required(&self) -> bool {
        Self::required().contains(self)
    }
}

impl std::fmt::Display for ContactField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContactField {
    type Err = String;

    /// Accepts the wire name in any case, plus snake_case spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|field| field.as_str().to_lowercase() == folded)
            .ok_or_else(|| {
                format!(
                    "Unknown contact field: '{}'. Valid fields: {}",
                    s,
                    Self::all()
                        .iter()
                        .map(|f| f.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// A contact ready to be inserted (no identity yet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub date_of_contact: NaiveDate,

    #[serde(default)]
    pub status: ContactStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
}

impl NewContact {
    pub fn new(name: impl Into<String>, date_of_contact: NaiveDate) -> Self {
        Self {
            name: name.into(),
            email: None,
            role: None,
            company: None,
            tags: Vec::new(),
            date_of_contact,
            status: ContactStatus::default(),
            linkedin_url: None,
        }
    }
}

/// A stored contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,

    pub owner: Owner,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    pub date_of_contact: NaiveDate,

    #[serde(default)]
    pub status: ContactStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,
}

impl Contact {
    /// Materialize a new contact under the given identity
    pub fn from_new(id: ContactId, owner: Owner, new: NewContact, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner,
            name: new.name,
            email: new.email,
            role: new.role,
            company: new.company,
            tags: new.tags,
            date_of_contact: new.date_of_contact,
            status: new.status,
            linkedin_url: new.linkedin_url,
            created: now,
            updated: now,
        }
    }

    /// Whole days elapsed since the last recorded contact
    pub fn days_since_contact(&self, today: NaiveDate) -> i64 {
        (today - self.date_of_contact).num_days()
    }
}
