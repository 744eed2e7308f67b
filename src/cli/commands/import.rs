//! `outreach import` command - Import contacts from CSV or Excel files

use console::{style, Term};
use dialoguer::Confirm;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::commands::summary;
use crate::cli::helpers::{mapping_edits, open_workspace};
use crate::cli::GlobalOpts;
use crate::import::duplicates::DuplicateReport;
use crate::import::importer::ImportResult;
use crate::import::parser::parse_file;
use crate::import::session::{ImportSession, SessionError};
use crate::import::template::contacts_template;
use crate::import::undo::UndoResult;
use crate::import::validator::ValidationResult;

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV or Excel file to import (.csv, .xlsx, .xls)
    #[arg(required_unless_present = "template")]
    pub file: Option<PathBuf>,

    /// Print a CSV template whose columns all map automatically
    #[arg(long, conflicts_with = "file")]
    pub template: bool,

    /// Map a column onto a field: "Source Column=field[:transform]"
    #[arg(long = "map", value_name = "SPEC")]
    pub map: Vec<String>,

    /// Leave a column unmapped
    #[arg(long = "unmap", value_name = "COLUMN")]
    pub unmap: Vec<String>,

    /// Skip rows whose email already exists
    #[arg(long)]
    pub skip_duplicates: bool,

    /// Refuse to import unless every row is valid
    #[arg(long)]
    pub strict: bool,

    /// Validate and check duplicates without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not offer to undo the import
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Undo the import immediately after it finishes
    #[arg(long, conflicts_with = "dry_run")]
    pub undo: bool,
}

#[derive(Serialize)]
struct ImportReport<'a> {
    file: &'a str,
    dry_run: bool,
    validation: &'a ValidationResult,
    duplicates: &'a DuplicateReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a ImportResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    undo: Option<&'a UndoResult>,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if args.template {
        return print_template();
    }

    let file_path = args
        .file
        .clone()
        .ok_or_else(|| miette::miette!("File required. Usage: outreach import contacts.csv"))?;
    if !file_path.exists() {
        return Err(miette::miette!("File not found: {}", file_path.display()));
    }

    let (_workspace, config, mut store) = open_workspace(global)?;
    let owner = config.owner();
    let skip_duplicates = args.skip_duplicates || config.skip_duplicates();

    let parsed = parse_file(&file_path).map_err(|e| miette::miette!("{}", e))?;
    let file_name = parsed.file_name.clone();
    if global.chatty() {
        summary::print_file(&parsed);
    }

    let mut session = ImportSession::new(owner);
    session.load(parsed).map_err(|e| miette::miette!("{}", e))?;
    for edit in mapping_edits(&args.map, &args.unmap)? {
        session
            .edit_mappings(edit)
            .map_err(|e| miette::miette!("{}", e))?;
    }
    if global.chatty() {
        if let (Some(parsed), Some(mappings)) = (session.parsed(), session.mappings()) {
            summary::print_mappings(parsed, mappings);
        }
    }

    session
        .validate(&store)
        .map_err(|e| miette::miette!("{}", e))?;
    let (validation, duplicates) = match session.validation() {
        Some((v, d)) => (v.clone(), d.clone()),
        None => return Err(miette::miette!("Validation did not run")),
    };
    if global.chatty() {
        summary::print_validation(&validation, Some(&duplicates));
        if !duplicates.is_empty() && !skip_duplicates {
            println!(
                "  {} {} email(s) already exist; use {} to leave them out",
                style("!").yellow(),
                duplicates.len(),
                style("--skip-duplicates").yellow()
            );
        }
    }

    if args.dry_run {
        check_gates(&validation, args.strict)?;
        if global.is_json() {
            print_json(&ImportReport {
                file: &file_name,
                dry_run: true,
                validation: &validation,
                duplicates: &duplicates,
                result: None,
                undo: None,
            })?;
        } else if !global.quiet {
            let count = if skip_duplicates {
                duplicates.filter_rows(&validation.valid_rows).len()
            } else {
                validation.valid_rows.len()
            };
            println!();
            println!("  Would import {} contact(s)", style(count).cyan());
            println!();
            println!("{}", style("Dry run complete. No contacts were written.").yellow());
        }
        return Ok(());
    }

    let result = session
        .start_import(&mut store, skip_duplicates, args.strict)
        .map_err(session_error)?
        .clone();
    if global.chatty() {
        summary::print_import(&result);
    }

    if args.undo && result.imported == 0 && global.chatty() {
        println!("  Nothing was imported, so there is nothing to undo");
    }
    let undo = if result.imported > 0 && (args.undo || offer_undo(&args, global)?) {
        let undo = session
            .undo(&mut store)
            .map_err(|e| miette::miette!("{}", e))?
            .clone();
        if global.chatty() {
            summary::print_undo(&undo);
        }
        Some(undo)
    } else {
        None
    };

    if global.is_json() {
        print_json(&ImportReport {
            file: &file_name,
            dry_run: false,
            validation: &validation,
            duplicates: &duplicates,
            result: Some(&result),
            undo: undo.as_ref(),
        })?;
    } else if global.quiet {
        println!("{}", result.imported);
    }

    if result.failed_batches > 0 {
        return Err(miette::miette!(
            "Import completed with {} failed batch(es)",
            result.failed_batches
        ));
    }
    if let Some(undo) = undo.filter(|u| !u.success) {
        return Err(miette::miette!("Undo completed with {} error(s)", undo.errors.len()));
    }

    Ok(())
}

fn check_gates(validation: &ValidationResult, strict: bool) -> Result<()> {
    if !validation.can_proceed() {
        return Err(session_error(SessionError::NothingToImport));
    }
    if strict && !validation.valid {
        return Err(session_error(SessionError::NotValid(validation.errors.len())));
    }
    Ok(())
}

fn session_error(e: SessionError) -> miette::Report {
    match e {
        SessionError::NotValid(_) => miette::miette!(
            help = "Fix the listed rows, or drop --strict to import the valid rows only",
            "{}",
            e
        ),
        other => miette::miette!("{}", other),
    }
}

/// Interactive single-shot undo while the import result is in memory
fn offer_undo(args: &ImportArgs, global: &GlobalOpts) -> Result<bool> {
    if args.yes || !global.chatty() || !Term::stdout().is_term() {
        return Ok(false);
    }

    println!();
    Confirm::new()
        .with_prompt("Undo this import?")
        .default(false)
        .interact()
        .into_diagnostic()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

/// Print the embedded CSV template
fn print_template() -> Result<()> {
    let template = contacts_template().map_err(|e| miette::miette!("{}", e))?;

    // Output to stdout (can be redirected to file)
    print!("{}", template);

    // Usage hint goes to stderr so it doesn't interfere with redirected output
    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: outreach import --template > contacts.csv",
        style("→").blue()
    );

    Ok(())
}
