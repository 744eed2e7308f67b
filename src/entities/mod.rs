//! Entity types

pub mod contact;

pub use contact::{Contact, ContactField, ContactStatus, NewContact};
