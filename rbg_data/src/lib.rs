//! Shared data model for the RBG state table.

pub mod defs;
pub mod validate;

pub use defs::*;
pub use validate::{ValidationError, validate_table};
