//! Embedded starter files for imports

use rust_embed::Embed;
use thiserror::Error;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

/// File name of the CSV import template
pub const CONTACTS_TEMPLATE: &str = "contacts.csv";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template {0} is not valid UTF-8")]
    Encoding(String),
}

/// Contents of an embedded template
pub fn template(name: &str) -> Result<String, TemplateError> {
    let file =
        EmbeddedTemplates::get(name).ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
    String::from_utf8(file.data.into_owned()).map_err(|_| TemplateError::Encoding(name.to_string()))
}

/// The CSV template whose headers all map by default
pub fn contacts_template() -> Result<String, TemplateError> {
    template(CONTACTS_TEMPLATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::contact::ContactField;
    use crate::import::mapping::build_default_mappings;
    use crate::import::parser::parse_bytes;

    #[test]
    fn test_template_headers_map_every_field() {
        let csv = contacts_template().unwrap();
        let parsed = parse_bytes(CONTACTS_TEMPLATE, csv.as_bytes()).unwrap();
        let mappings = build_default_mappings(&parsed.headers);

        assert_eq!(mappings.len(), ContactField::all().len());
        assert!(mappings.missing_required().is_empty());
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn test_unknown_template() {
        assert!(matches!(template("nope.csv"), Err(TemplateError::NotFound(_))));
    }
}
