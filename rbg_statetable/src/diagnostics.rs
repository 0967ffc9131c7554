//! Recoverable problems found while compiling a sheet.
//!
//! None of these stop the compile. They are logged where they are detected
//! and returned alongside the table so the caller can decide what to do.

use std::fmt;

use rbg_data::Address;
use thiserror::Error;

/// How loudly a diagnostic should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Failure to close a block; the close is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockClosureError {
    #[error("tried to close a block at address {} but no block is open", fmt_address(.at))]
    NotOpen { at: Option<Address> },
    #[error("tried to close block '{name}' at address {at} but '{name}' is not in the symbol table")]
    UnknownSymbol { name: String, at: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("spreadsheet row {sheet_row}: {error}")]
    BlockClosure { sheet_row: usize, error: BlockClosureError },
    #[error("spreadsheet row {sheet_row}: block '{name}' reopened; it was first defined at address {first_start}")]
    DuplicateBlock {
        name: String,
        sheet_row: usize,
        first_start: Address,
    },
    #[error("jump target '{name}' is not in the symbol table (spreadsheet rows {})", fmt_rows(.rows))]
    UnresolvedTarget { name: String, rows: Vec<usize> },
    #[error("table has {rows} rows; only {max} are addressable before mUNDEFINED/mNONE")]
    TableTooLarge { rows: usize, max: usize },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::BlockClosure { .. } => Severity::Warning,
            Diagnostic::DuplicateBlock { .. }
            | Diagnostic::UnresolvedTarget { .. }
            | Diagnostic::TableTooLarge { .. } => Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

fn fmt_address(at: &Option<Address>) -> String {
    at.map_or_else(|| "(none yet)".to_string(), |a| a.to_string())
}

fn fmt_rows(rows: &[usize]) -> String {
    rows.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
