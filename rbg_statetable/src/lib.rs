//! rbg_statetable: compiler from a spreadsheet state description to the RBG
//! firmware state table.
//!
//! Compilation runs in two passes over one sheet:
//!
//! 1. rows are grouped into named blocks by their `index` column, normalized
//!    and placed in a flat row table;
//! 2. block boundaries are flagged, unknown effects are collected and every
//!    `gotoOnInput` / `gotoWithoutInput` name is resolved to its block's
//!    first row.
//!
//! Problems that do not prevent a table from being produced are returned as
//! [`Diagnostic`]s next to the table; the C output is still syntax-valid and
//! marks unresolved jumps as `mUNDEFINED`.

pub mod blocks;
pub mod columns;
pub mod config;
pub mod diagnostics;
pub mod effects;
pub mod emit;
pub mod normalize;
pub mod pass1;
pub mod resolve;
pub mod source;
pub mod state;

pub use config::{CompileOptions, Config, ConfigError, EmitOptions, InitStyle};
pub use diagnostics::{BlockClosureError, Diagnostic, Severity};
pub use emit::{emit_header, emit_ron};
pub use source::{DelimitedSheet, RowSource, Sheet, SheetRow, SourceError, TomlWorkbook};

use log::info;
use rbg_data::{Column, CompiledTable, MAX_ROWS};
use thiserror::Error;

use crate::columns::ColumnMap;
use crate::state::CompilerState;

/// Errors that stop a compile from producing a table.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("sheet '{sheet}' is missing required column(s): {}", join_columns(.missing))]
    MissingColumns { sheet: String, missing: Vec<Column> },
    /// Strict mode only: the run produced error diagnostics.
    #[error("compile rejected with {} error(s)", .errors.len())]
    Rejected { errors: Vec<Diagnostic> },
}

fn join_columns(columns: &[Column]) -> String {
    columns.iter().map(|c| c.name()).collect::<Vec<_>>().join(", ")
}

/// A compiled table and everything reported while building it.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub table: CompiledTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Fetch the configured sheet from `source` and compile it.
///
/// # Errors
/// See [`compile_sheet`]; additionally any `SourceError` from fetching the sheet.
pub fn compile(source: &impl RowSource, options: &CompileOptions) -> Result<Compilation, CompileError> {
    let sheet = source.sheet(&options.sheet)?;
    compile_sheet(&sheet, options)
}

/// Compile one sheet into a state table.
///
/// # Errors
/// - `CompileError::MissingColumns` if any required column is absent.
/// - `CompileError::Rejected` in strict mode when an error diagnostic was raised.
pub fn compile_sheet(sheet: &Sheet, options: &CompileOptions) -> Result<Compilation, CompileError> {
    let columns = ColumnMap::resolve(sheet)?;
    let mut state = CompilerState::new();

    pass1::build_blocks(&mut state, &columns, &sheet.rows);
    info!(
        "pass 1: {} rows in {} blocks from sheet '{}'",
        state.rows.len(),
        state.symbols.len(),
        sheet.name
    );
    if state.rows.len() > MAX_ROWS {
        let rows = state.rows.len();
        state.report(Diagnostic::TableTooLarge { rows, max: MAX_ROWS });
    }

    blocks::annotate_blocks(&mut state);
    let effects = effects::collect_effects(&state.rows);
    let targets = resolve::resolve_targets(&mut state);
    info!("pass 2: {} jump targets referenced", targets.len());

    let (table, diagnostics) = state.finish(effects, targets);
    let compilation = Compilation { table, diagnostics };
    if options.strict && compilation.has_errors() {
        return Err(CompileError::Rejected {
            errors: compilation.errors().cloned().collect(),
        });
    }
    Ok(compilation)
}
