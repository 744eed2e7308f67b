//! Workspace discovery and layout

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::store::{SqliteStore, StoreError};

/// Name of the directory that marks a workspace root
pub const WORKSPACE_DIR: &str = ".outreach";

/// Default database file inside the workspace directory
pub const DATABASE_FILE: &str = "contacts.db";

/// Represents an outreach workspace
#[derive(Debug)]
pub struct Workspace {
    /// Directory containing `.outreach/`
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current = std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path, owner: Option<&str>) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }
        Self::create(root, owner)
    }

    /// Initialize even if `.outreach/` exists; the config is rewritten but
    /// stored contacts are kept
    pub fn init_force(path: &Path, owner: Option<&str>) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create(root, owner)
    }

    fn create(root: PathBuf, owner: Option<&str>) -> Result<Self, WorkspaceError> {
        let dir = root.join(WORKSPACE_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        std::fs::write(dir.join("config.yaml"), Self::default_config(owner))
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        let workspace = Self { root };
        // Opening creates the file and its schema
        workspace.open_store(None)?;
        Ok(workspace)
    }

    fn default_config(owner: Option<&str>) -> String {
        let owner_line = match owner {
            Some(name) => format!("owner: \"{}\"", name.replace('"', "\\\"")),
            None => "# owner: \"\"".to_string(),
        };

        format!(
            r#"# Outreach workspace configuration

# Owner recorded on imported contacts (default: git user.name, then $USER)
{}

# Database file, relative to this directory
# database: contacts.db

# Drop rows whose email already exists when importing
# skip_duplicates: false
"#,
            owner_line
        )
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the `.outreach` directory
    pub fn outreach_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.outreach_dir().join("config.yaml")
    }

    /// Resolve the database path; relative overrides are taken from `.outreach/`
    pub fn database_path(&self, configured: Option<&Path>) -> PathBuf {
        match configured {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.outreach_dir().join(path),
            None => self.outreach_dir().join(DATABASE_FILE),
        }
    }

    /// Open (creating if needed) the workspace contact store
    pub fn open_store(&self, configured: Option<&Path>) -> Result<SqliteStore, WorkspaceError> {
        Ok(SqliteStore::open(&self.database_path(configured))?)
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not an outreach workspace (searched from {searched_from:?}). Run 'outreach init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("outreach workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
