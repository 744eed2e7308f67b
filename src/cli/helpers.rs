//! Shared helper functions for CLI commands

use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::identity::ContactId;
use crate::core::store::SqliteStore;
use crate::core::workspace::Workspace;
use crate::core::Config;
use crate::import::mapping::{FieldMapping, MappingEdit};

/// Format a ContactId for display, truncating if too long
///
/// IDs are 30 characters; tables show the prefix and the first ULID chars.
pub fn format_short_id(id: &ContactId) -> String {
    truncate_str(&id.to_string(), 16)
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Workspace, layered config and open store for a command
pub fn open_workspace(global: &GlobalOpts) -> Result<(Workspace, Config, SqliteStore)> {
    let workspace = match &global.workspace {
        Some(path) => Workspace::discover_from(path),
        None => Workspace::discover(),
    }
    .map_err(|e| miette::miette!("{}", e))?;

    let config = Config::load_for(Some(&workspace));
    let store = workspace
        .open_store(config.database.as_deref())
        .map_err(|e| miette::miette!("{}", e))?;

    tracing::debug!(root = %workspace.root().display(), "workspace opened");
    Ok((workspace, config, store))
}

/// Turn `--unmap` and `--map` flags into mapping edits, unmaps first
pub fn mapping_edits(maps: &[String], unmaps: &[String]) -> Result<Vec<MappingEdit>> {
    let mut edits: Vec<MappingEdit> = unmaps
        .iter()
        .map(|source| MappingEdit::Unmap(source.clone()))
        .collect();

    for spec in maps {
        let mapping = FieldMapping::from_spec(spec).map_err(|e| miette::miette!("{}", e))?;
        edits.push(MappingEdit::Remap(mapping));
    }

    Ok(edits)
}
