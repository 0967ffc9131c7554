use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Structural problem found in a compiled table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateSymbol { name: String },
    OpenBlock { name: String },
    BadBlockRange { name: String, start: Address, end: Address, rows: usize },
    MisplacedFlag { row: Address, expected: BlockFlags, found: BlockFlags },
    MissingTarget { name: String, row: Address, column: Column },
    StaleTarget { name: String, context: String },
    TooManyRows { rows: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateSymbol { name } => {
                write!(f, "duplicate symbol '{name}'")
            },
            ValidationError::OpenBlock { name } => {
                write!(f, "block '{name}' was never closed")
            },
            ValidationError::BadBlockRange { name, start, end, rows } => {
                write!(f, "block '{name}' spans rows {start}..={end} in a table of {rows} rows")
            },
            ValidationError::MisplacedFlag { row, expected, found } => {
                write!(
                    f,
                    "row {row} has blkFlags {} but block boundaries require {}",
                    found.token(),
                    expected.token()
                )
            },
            ValidationError::MissingTarget { name, row, column } => {
                write!(f, "row {row} {column} refers to '{name}' which is not in the target list")
            },
            ValidationError::StaleTarget { name, context } => {
                write!(f, "target '{name}' is inconsistent ({context})")
            },
            ValidationError::TooManyRows { rows } => {
                write!(f, "table has {rows} rows; at most {MAX_ROWS} are addressable")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate block boundaries, flags and jump targets in a compiled table.
///
/// ```
/// use rbg_data::{BlockFlags, CompiledTable, RowEntry, Symbol, validate_table};
///
/// let table = CompiledTable {
///     rows: vec![RowEntry {
///         index: Some("oPEN".into()),
///         blk_flags: BlockFlags::BLOCKSTART | BlockFlags::BLOCKEND,
///         ..RowEntry::default()
///     }],
///     symbols: vec![Symbol {
///         name: "oPEN".into(),
///         block_start: 0,
///         block_end: Some(0),
///     }],
///     ..CompiledTable::default()
/// };
/// assert!(validate_table(&table).is_empty());
/// ```
pub fn validate_table(table: &CompiledTable) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let rows = table.rows.len();

    if rows > MAX_ROWS {
        errors.push(ValidationError::TooManyRows { rows });
    }

    let mut names = HashSet::new();
    let mut expected = vec![BlockFlags::empty(); rows];
    for symbol in &table.symbols {
        if !names.insert(symbol.name.as_str()) {
            errors.push(ValidationError::DuplicateSymbol {
                name: symbol.name.clone(),
            });
        }
        let Some(end) = symbol.block_end else {
            errors.push(ValidationError::OpenBlock {
                name: symbol.name.clone(),
            });
            continue;
        };
        if symbol.block_start > end || end >= rows {
            errors.push(ValidationError::BadBlockRange {
                name: symbol.name.clone(),
                start: symbol.block_start,
                end,
                rows,
            });
            continue;
        }
        expected[symbol.block_start] |= BlockFlags::BLOCKSTART;
        expected[end] |= BlockFlags::BLOCKEND;
    }

    for (row, (entry, want)) in table.rows.iter().zip(&expected).enumerate() {
        if entry.blk_flags != *want {
            errors.push(ValidationError::MisplacedFlag {
                row,
                expected: *want,
                found: entry.blk_flags,
            });
        }
    }

    for target in &table.targets {
        match target {
            JumpTarget::None => errors.push(ValidationError::StaleTarget {
                name: crate::NONE_TOKEN.to_string(),
                context: "blank entries do not belong in the target list".to_string(),
            }),
            JumpTarget::Resolved { name, address } => match table.symbol(name) {
                Some(symbol) if symbol.block_start == *address => {},
                Some(symbol) => errors.push(ValidationError::StaleTarget {
                    name: name.clone(),
                    context: format!("resolved to {address} but block starts at {}", symbol.block_start),
                }),
                None => errors.push(ValidationError::StaleTarget {
                    name: name.clone(),
                    context: "resolved but no such symbol".to_string(),
                }),
            },
            JumpTarget::Undefined { name } => {
                if table.symbol(name).is_some() {
                    errors.push(ValidationError::StaleTarget {
                        name: name.clone(),
                        context: "marked undefined but the symbol exists".to_string(),
                    });
                }
            },
        }
    }

    for (row, entry) in table.rows.iter().enumerate() {
        for column in Column::JUMP_TARGETS {
            if let Some(name) = entry.cell(column)
                && table.target(name).is_none()
            {
                errors.push(ValidationError::MissingTarget {
                    name: name.to_string(),
                    row,
                    column,
                });
            }
        }
    }

    errors
}
