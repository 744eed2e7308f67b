//! `outreach init` command - Initialize a new workspace

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::core::workspace::{Workspace, WorkspaceError, DATABASE_FILE, WORKSPACE_DIR};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Owner recorded on imported contacts
    #[arg(long)]
    pub owner: Option<String>,

    /// Rewrite the config even if .outreach/ already exists (contacts are kept)
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let workspace = if args.force {
        Workspace::init_force(&path, args.owner.as_deref())
    } else {
        Workspace::init(&path, args.owner.as_deref())
    };

    match workspace {
        Ok(workspace) => {
            println!(
                "{} Initialized outreach workspace at {}",
                style("✓").green(),
                style(workspace.root().display()).cyan()
            );
            println!();
            print_structure(workspace.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Get a CSV template",
                style("outreach import --template > contacts.csv").yellow()
            );
            println!(
                "  {} Check how a file will be mapped",
                style("outreach preview contacts.csv").yellow()
            );
            println!(
                "  {} Import it",
                style("outreach import contacts.csv").yellow()
            );
            Ok(())
        }
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} Outreach workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to rewrite its config",
                style("outreach init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn print_structure(root: &Path) {
    let entries = [
        format!("{}/", WORKSPACE_DIR),
        format!("{}/config.yaml", WORKSPACE_DIR),
        format!("{}/{}", WORKSPACE_DIR, DATABASE_FILE),
    ];

    for entry in entries {
        if root.join(&entry).exists() {
            println!("  {}", style(entry).dim());
        }
    }
}
