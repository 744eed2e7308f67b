//! CLI command implementations

pub mod completions;
pub mod contacts;
pub mod import;
pub mod init;
pub mod preview;
pub mod summary;
