//! Symbol Table Builder: pass 1 block segmentation.
//!
//! Rows are consumed strictly in sheet order. A row whose `index` differs
//! from the open block closes that block and opens a new one; a row with the
//! same `index` extends it. Rows with a blank `index` are not part of any
//! block and are dropped.

use log::debug;
use rbg_data::{Address, Column};

use crate::columns::ColumnMap;
use crate::diagnostics::{BlockClosureError, Diagnostic};
use crate::normalize::{clean_cell, normalize_row};
use crate::source::SheetRow;
use crate::state::CompilerState;

#[derive(Debug)]
struct OpenBlock {
    name: String,
    /// False when the name was already taken; such a block is never closed.
    registered: bool,
}

/// Walks the sheet rows and fills the symbol and row tables.
pub struct BlockBuilder<'a> {
    state: &'a mut CompilerState,
    columns: &'a ColumnMap,
    cursor: Option<Address>,
    open: Option<OpenBlock>,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(state: &'a mut CompilerState, columns: &'a ColumnMap) -> Self {
        Self {
            state,
            columns,
            cursor: None,
            open: None,
        }
    }

    /// Consume one row.
    pub fn consume(&mut self, row: &SheetRow) {
        let Some(name) = clean_cell(self.columns.cell(row, Column::Index), Column::Index) else {
            self.blank_index(row.number);
            return;
        };

        if self.open.as_ref().is_some_and(|b| b.name == name) {
            let address = self.advance();
            debug!("row {address} extends block '{name}'");
            self.place(address, row);
            return;
        }

        self.close_open(row.number);
        let address = self.advance();
        let registered = match self.state.symbols.open(&name, address) {
            Ok(()) => {
                debug!("block '{name}' opened at row {address}");
                true
            },
            Err(first_start) => {
                self.state.report(Diagnostic::DuplicateBlock {
                    name: name.clone(),
                    sheet_row: row.number,
                    first_start,
                });
                false
            },
        };
        self.open = Some(OpenBlock { name, registered });
        self.place(address, row);
    }

    /// Close whatever block is still open at the end of input.
    pub fn finish(mut self, last_sheet_row: usize) {
        if self.open.is_some() {
            self.close_open(last_sheet_row);
        }
    }

    fn blank_index(&mut self, sheet_row: usize) {
        match &self.open {
            Some(block) => debug!("spreadsheet row {sheet_row} has no index; block '{}' stays open", block.name),
            None => self.state.report(Diagnostic::BlockClosure {
                sheet_row,
                error: BlockClosureError::NotOpen { at: self.cursor },
            }),
        }
    }

    fn close_open(&mut self, sheet_row: usize) {
        let Some(block) = self.open.take() else {
            return;
        };
        if !block.registered {
            debug!("duplicate block '{}' ends; first definition kept", block.name);
            return;
        }
        let result = match self.cursor {
            Some(end) => self.state.symbols.close(&block.name, end),
            None => Err(BlockClosureError::NotOpen { at: None }),
        };
        match result {
            Ok(()) => debug!("block '{}' closed at row {:?}", block.name, self.cursor),
            Err(error) => self.state.report(Diagnostic::BlockClosure { sheet_row, error }),
        }
    }

    fn advance(&mut self) -> Address {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.cursor = Some(next);
        next
    }

    fn place(&mut self, address: Address, row: &SheetRow) {
        let entry = normalize_row(self.columns, row, &mut self.state.discovered);
        self.state.place_row(address, entry);
    }
}

/// Run pass 1 over `rows`.
pub fn build_blocks(state: &mut CompilerState, columns: &ColumnMap, rows: &[SheetRow]) {
    let mut builder = BlockBuilder::new(state, columns);
    for row in rows {
        builder.consume(row);
    }
    builder.finish(rows.last().map_or(0, |r| r.number));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Sheet;

    fn run(indices: &[&str]) -> CompilerState {
        let mut sheet = Sheet::new("StateTable", Column::ALL.map(Column::name));
        for index in indices {
            sheet.push_row([*index]).expect("row");
        }
        let columns = ColumnMap::resolve(&sheet).expect("columns");
        let mut state = CompilerState::new();
        build_blocks(&mut state, &columns, &sheet.rows);
        state
    }

    fn span(state: &CompilerState, name: &str) -> (Address, Option<Address>) {
        let s = state.symbols.get(name).expect("symbol");
        (s.block_start, s.block_end)
    }

    #[test]
    fn open_open_lock_makes_two_blocks() {
        let state = run(&["open", "open", "lock"]);
        assert_eq!(state.rows.len(), 3);
        assert_eq!(span(&state, "oPEN"), (0, Some(1)));
        assert_eq!(span(&state, "lOCK"), (2, Some(2)));
        assert!(state.diagnostics.is_empty());
    }

    #[test]
    fn case_variants_extend_the_same_block() {
        let state = run(&["Open", "OPEN", "oPEN"]);
        assert_eq!(state.symbols.len(), 1);
        assert_eq!(span(&state, "oPEN"), (0, Some(2)));
    }

    #[test]
    fn blank_rows_inside_block_are_dropped() {
        let state = run(&["open", "", "open", "lock", ""]);
        assert_eq!(state.rows.len(), 3);
        assert_eq!(span(&state, "oPEN"), (0, Some(1)));
        assert_eq!(span(&state, "lOCK"), (2, Some(2)));
        assert!(state.diagnostics.is_empty());
    }

    #[test]
    fn blank_row_before_any_block_warns() {
        let state = run(&["", "open"]);
        assert_eq!(state.rows.len(), 1);
        assert_eq!(
            state.diagnostics,
            vec![Diagnostic::BlockClosure {
                sheet_row: 2,
                error: BlockClosureError::NotOpen { at: None },
            }]
        );
    }

    #[test]
    fn reopened_block_is_an_error_and_keeps_first_definition() {
        let state = run(&["open", "lock", "open", "open"]);
        assert_eq!(state.rows.len(), 4);
        assert_eq!(span(&state, "oPEN"), (0, Some(0)));
        assert_eq!(span(&state, "lOCK"), (1, Some(1)));
        assert_eq!(
            state.diagnostics,
            vec![Diagnostic::DuplicateBlock {
                name: "oPEN".into(),
                sheet_row: 4,
                first_start: 0,
            }]
        );
        assert_eq!(state.rows[3].index.as_deref(), Some("oPEN"));
    }

    #[test]
    fn every_block_is_closed_in_order() {
        let state = run(&["a", "b", "b", "c", "", "c", "d"]);
        for symbol in state.symbols.iter() {
            let end = symbol.block_end.expect("closed");
            assert!(symbol.block_start <= end, "{symbol:?}");
        }
        assert_eq!(span(&state, "c"), (3, Some(4)));
    }

    #[test]
    fn empty_sheet_builds_nothing() {
        let state = run(&[]);
        assert!(state.rows.is_empty());
        assert!(state.symbols.is_empty());
        assert!(state.diagnostics.is_empty());
    }
}
