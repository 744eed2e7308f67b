//! Styled summaries shared by `import` and `preview`

use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::import::duplicates::DuplicateReport;
use crate::import::importer::ImportResult;
use crate::entities::contact::ContactField;
use crate::import::mapping::MappingSet;
use crate::import::parser::ParsedFile;
use crate::import::undo::UndoResult;
use crate::import::validator::ValidationResult;

/// Errors listed before the rest are collapsed into a count
const MAX_LISTED_ERRORS: usize = 10;

fn rule() {
    println!("{}", style("─".repeat(50)).dim());
}

pub fn print_file(parsed: &ParsedFile) {
    println!(
        "{} Read {} row(s) from {} ({})",
        style("→").blue(),
        style(parsed.rows.len()).cyan(),
        style(&parsed.file_name).yellow(),
        parsed.kind.as_str()
    );
}

/// Table of proposed mappings plus the headers left unmapped
pub fn print_mappings(parsed: &ParsedFile, mappings: &MappingSet) {
    let mut table = Builder::default();
    table.push_record(["Column", "Field", "Transform"]);
    for mapping in mappings {
        table.push_record([
            mapping.source.clone(),
            mapping.target.to_string(),
            mapping
                .transform
                .as_ref()
                .map(|t| t.name().to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!();
    println!("{}", table.build().with(Style::rounded()).to_string());

    let unmapped: Vec<&str> = parsed
        .headers
        .iter()
        .filter(|h| !mappings.iter().any(|m| &m.source == *h))
        .map(String::as_str)
        .collect();
    if !unmapped.is_empty() {
        println!(
            "  {} {}",
            style("Unmapped columns:").dim(),
            style(unmapped.join(", ")).dim()
        );
    }

    if mappings.for_target(ContactField::DateOfContact).is_none() {
        println!(
            "  {}",
            style("No date column mapped; dateOfContact defaults to today").dim()
        );
    }

    let missing = mappings.missing_required();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
        println!(
            "  {} required field(s) not mapped: {}",
            style("!").yellow(),
            style(names.join(", ")).yellow()
        );
    }
}

fn print_errors(errors: &[String]) {
    for error in errors.iter().take(MAX_LISTED_ERRORS) {
        println!("    {} {}", style("✗").red(), error);
    }
    if errors.len() > MAX_LISTED_ERRORS {
        println!(
            "    {}",
            style(format!("... and {} more", errors.len() - MAX_LISTED_ERRORS)).dim()
        );
    }
}

pub fn print_validation(validation: &ValidationResult, duplicates: Option<&DuplicateReport>) {
    println!();
    rule();
    println!("{}", style("Validation").bold());
    rule();
    println!("  Rows:      {}", style(validation.total_rows).cyan());
    println!("  Valid:     {}", style(validation.valid_rows.len()).green());
    if !validation.rejected_rows.is_empty() {
        println!("  Rejected:  {}", style(validation.rejected_rows.len()).red());
    }
    if let Some(report) = duplicates {
        if !report.is_empty() {
            println!("  Duplicates: {}", style(report.len()).yellow());
        }
    }

    if !validation.errors.is_empty() {
        println!();
        print_errors(&validation.errors);
    }
}

pub fn print_import(result: &ImportResult) {
    println!();
    rule();
    println!("{}", style("Import Summary").bold());
    rule();
    println!("  Contacts imported: {}", style(result.imported).green());
    if result.failed_batches > 0 {
        println!("  Failed batches:    {}", style(result.failed_batches).red());
    }
    if !result.errors.is_empty() {
        println!();
        print_errors(&result.errors);
    }
}

pub fn print_undo(undo: &UndoResult) {
    println!();
    if undo.success {
        println!(
            "{} Undid import: removed {} contact(s)",
            style("✓").green(),
            style(undo.undone).cyan()
        );
    } else {
        println!(
            "{} Undo removed {} contact(s) with {} error(s)",
            style("!").yellow(),
            style(undo.undone).cyan(),
            undo.errors.len()
        );
        print_errors(&undo.errors);
    }
}
