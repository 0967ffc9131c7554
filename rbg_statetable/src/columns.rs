//! Column Resolver: locate the required columns in a sheet header.

use rbg_data::Column;

use crate::CompileError;
use crate::source::{Sheet, SheetRow};

/// Position of every required column within the sheet rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    positions: [usize; Column::ALL.len()],
}

impl ColumnMap {
    /// Map each required column to its header position. Extra columns are ignored.
    ///
    /// # Errors
    /// Returns `CompileError::MissingColumns` naming every required column the
    /// header lacks.
    pub fn resolve(sheet: &Sheet) -> Result<Self, CompileError> {
        let mut positions = [0; Column::ALL.len()];
        let mut missing = Vec::new();
        for column in Column::ALL {
            match sheet.header.iter().position(|h| h.trim() == column.name()) {
                Some(pos) => positions[column as usize] = pos,
                None => missing.push(column),
            }
        }
        if !missing.is_empty() {
            return Err(CompileError::MissingColumns {
                sheet: sheet.name.clone(),
                missing,
            });
        }
        Ok(Self { positions })
    }

    pub fn position(&self, column: Column) -> usize {
        self.positions[column as usize]
    }

    /// Raw text of `column` in `row`; empty if the row is short.
    pub fn cell<'r>(&self, row: &'r SheetRow, column: Column) -> &'r str {
        row.cells.get(self.position(column)).map_or("", String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_without(skip: &[Column]) -> Vec<&'static str> {
        Column::ALL
            .into_iter()
            .rev()
            .filter(|c| !skip.contains(c))
            .map(Column::name)
            .collect()
    }

    #[test]
    fn order_in_sheet_is_irrelevant() {
        let sheet = Sheet::new("StateTable", header_without(&[]));
        let map = ColumnMap::resolve(&sheet).expect("all columns present");
        assert_eq!(map.position(Column::GotoWithoutInput), 0);
        assert_eq!(map.position(Column::Index), Column::ALL.len() - 1);
    }

    #[test]
    fn reports_every_missing_column() {
        let sheet = Sheet::new("StateTable", header_without(&[Column::StoreAddr, Column::EfctLed]));
        let err = ColumnMap::resolve(&sheet).unwrap_err();
        match err {
            CompileError::MissingColumns { sheet, missing } => {
                assert_eq!(sheet, "StateTable");
                assert_eq!(missing, vec![Column::EfctLed, Column::StoreAddr]);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_cells_are_trimmed() {
        let mut header: Vec<String> = header_without(&[]).into_iter().map(String::from).collect();
        header[3] = format!("  {} ", header[3]);
        let sheet = Sheet::new("StateTable", header);
        assert!(ColumnMap::resolve(&sheet).is_ok());
    }
}
