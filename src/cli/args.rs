//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, contacts::ContactsCommands, import::ImportArgs, init::InitArgs,
    preview::PreviewArgs,
};

#[derive(Parser)]
#[command(name = "outreach")]
#[command(author, version, about = "Outreach CRM")]
#[command(long_about = "Track professional contacts and import them from CSV or Excel files.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .outreach/)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,
}

impl GlobalOpts {
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Human-facing progress output is wanted
    pub fn chatty(&self) -> bool {
        !self.quiet && !self.is_json()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new outreach workspace
    Init(InitArgs),

    /// Import contacts from a CSV or Excel file
    Import(ImportArgs),

    /// Show how a file would be mapped and validated, without importing
    Preview(PreviewArgs),

    /// Browse stored contacts
    #[command(subcommand)]
    Contacts(ContactsCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Styled text for terminals
    #[default]
    Auto,
    /// JSON format (for programming)
    Json,
}
