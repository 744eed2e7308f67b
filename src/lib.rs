//! Outreach CRM
//!
//! Personal contact tracking with a CSV/Excel import pipeline: parse a file,
//! map its columns onto contact fields, validate, flag duplicates, insert in
//! batches and optionally undo.

pub mod cli;
pub mod core;
pub mod entities;
pub mod import;
