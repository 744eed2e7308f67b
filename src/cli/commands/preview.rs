//! `outreach preview` command - dry look at mapping and validation

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::commands::summary;
use crate::cli::helpers::{mapping_edits, truncate_str};
use crate::cli::GlobalOpts;
use crate::entities::contact::ContactField;
use crate::import::mapping::{build_default_mappings, MappingSet};
use crate::import::parser::{parse_file, FileKind};
use crate::import::validator::{ValidationResult, Validator};

/// Valid rows shown in the sample table
const SAMPLE_ROWS: usize = 5;

#[derive(clap::Args, Debug)]
pub struct PreviewArgs {
    /// CSV or Excel file to inspect
    pub file: PathBuf,

    /// Map a column onto a field: "Source Column=field[:transform]"
    #[arg(long = "map", value_name = "SPEC")]
    pub map: Vec<String>,

    /// Leave a column unmapped
    #[arg(long = "unmap", value_name = "COLUMN")]
    pub unmap: Vec<String>,
}

#[derive(Serialize)]
struct Preview<'a> {
    file: &'a str,
    kind: FileKind,
    headers: &'a [String],
    mappings: &'a MappingSet,
    validation: &'a ValidationResult,
}

pub fn run(args: PreviewArgs, global: &GlobalOpts) -> Result<()> {
    if !args.file.exists() {
        return Err(miette::miette!("File not found: {}", args.file.display()));
    }

    let parsed = parse_file(&args.file).map_err(|e| miette::miette!("{}", e))?;
    let mut mappings = build_default_mappings(&parsed.headers);
    for edit in mapping_edits(&args.map, &args.unmap)? {
        mappings.apply(edit).map_err(|e| miette::miette!("{}", e))?;
    }
    let validation = Validator::default().validate(&parsed.rows, &mappings);

    if global.is_json() {
        let preview = Preview {
            file: &parsed.file_name,
            kind: parsed.kind,
            headers: &parsed.headers,
            mappings: &mappings,
            validation: &validation,
        };
        let json = serde_json::to_string_pretty(&preview).into_diagnostic()?;
        println!("{}", json);
        return Ok(());
    }

    if global.quiet {
        println!("{}", validation.valid_rows.len());
        return Ok(());
    }

    summary::print_file(&parsed);
    summary::print_mappings(&parsed, &mappings);
    summary::print_validation(&validation, None);

    if !validation.valid_rows.is_empty() {
        let mut table = Builder::default();
        table.push_record(["Row", "Name", "Email", "Date", "Status", "Tags"]);
        for row in validation.valid_rows.iter().take(SAMPLE_ROWS) {
            table.push_record([
                row.row_number.to_string(),
                truncate_str(&row.get(ContactField::Name).to_plain_string(), 24),
                truncate_str(&row.get(ContactField::Email).to_plain_string(), 28),
                row.get(ContactField::DateOfContact).to_plain_string(),
                row.get(ContactField::Status).to_plain_string(),
                truncate_str(&row.get(ContactField::Tags).to_plain_string(), 24),
            ]);
        }
        println!();
        println!("{}", table.build().with(Style::rounded()).to_string());
        if validation.valid_rows.len() > SAMPLE_ROWS {
            println!(
                "  {}",
                style(format!(
                    "... {} more valid row(s)",
                    validation.valid_rows.len() - SAMPLE_ROWS
                ))
                .dim()
            );
        }
    }

    Ok(())
}
