//! Tables owned by a single compile run.

use std::collections::HashMap;

use log::{error, warn};
use rbg_data::{Address, Column, EffectSlots, JumpTarget, RowEntry, Symbol};

use crate::diagnostics::{BlockClosureError, Diagnostic, Severity};

/// Block symbols in the order they were opened, with name lookup.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_name: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name).map(|&i| &self.symbols[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Open a new block named `name` starting at `start`.
    ///
    /// # Errors
    /// Returns the existing symbol's start address if `name` is already taken.
    pub fn open(&mut self, name: &str, start: Address) -> Result<(), Address> {
        if let Some(existing) = self.get(name) {
            return Err(existing.block_start);
        }
        self.by_name.insert(name.to_string(), self.symbols.len());
        self.symbols.push(Symbol::open(name, start));
        Ok(())
    }

    /// Record `end` as the last row of block `name`.
    ///
    /// # Errors
    /// Returns `BlockClosureError::UnknownSymbol` if there is no such block.
    pub fn close(&mut self, name: &str, end: Address) -> Result<(), BlockClosureError> {
        let Some(&i) = self.by_name.get(name) else {
            return Err(BlockClosureError::UnknownSymbol {
                name: name.to_string(),
                at: end,
            });
        };
        self.symbols[i].block_end = Some(end);
        Ok(())
    }

    pub fn into_vec(self) -> Vec<Symbol> {
        self.symbols
    }
}

/// Distinct values seen per column, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Discovered {
    seen: HashMap<Column, Vec<String>>,
}

impl Discovered {
    pub fn record(&mut self, column: Column, value: &str) {
        let values = self.seen.entry(column).or_default();
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }

    pub fn values(&self, column: Column) -> &[String] {
        self.seen.get(&column).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Everything a compile run builds up: the symbol table, the flat row table,
/// the per-column discovery sets and the diagnostics reported so far.
///
/// Each phase borrows the state it needs; pass 2 only reads what pass 1 left.
#[derive(Debug, Default)]
pub struct CompilerState {
    pub symbols: SymbolTable,
    pub rows: Vec<RowEntry>,
    pub discovered: Discovered,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a diagnostic at the matching level and keep it for the caller.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => warn!("{diagnostic}"),
            Severity::Error => error!("{diagnostic}"),
        }
        self.diagnostics.push(diagnostic);
    }

    /// Place `entry` at `address`, which must be the next free row.
    pub fn place_row(&mut self, address: Address, entry: RowEntry) {
        debug_assert_eq!(address, self.rows.len(), "rows are placed densely");
        self.rows.push(entry);
    }

    /// Consume the state into the emitted table plus its diagnostics.
    pub fn finish(self, effects: EffectSlots, targets: Vec<JumpTarget>) -> (rbg_data::CompiledTable, Vec<Diagnostic>) {
        let table = rbg_data::CompiledTable {
            rows: self.rows,
            symbols: self.symbols.into_vec(),
            effects,
            targets,
        };
        (table, self.diagnostics)
    }
}
