//! Row Normalizer: raw sheet cells to a [`RowEntry`].

use rbg_data::{Column, InputMask, NONE_TOKEN, RowEntry, normalize_symbol};

use crate::columns::ColumnMap;
use crate::source::SheetRow;
use crate::state::Discovered;

/// Normalize one sheet row.
///
/// Cells are trimmed and empty cells become `None`. Block-name columns get
/// the capitalization rule and `inputRBG` is translated to its mask. Every
/// distinct value is recorded in `discovered` before translation.
pub fn normalize_row(columns: &ColumnMap, row: &SheetRow, discovered: &mut Discovered) -> RowEntry {
    let mut entry = RowEntry {
        source_row: row.number,
        ..RowEntry::default()
    };
    for column in Column::ALL {
        let Some(text) = clean_cell(columns.cell(row, column), column) else {
            continue;
        };
        discovered.record(column, &text);
        match column {
            Column::Index => entry.index = Some(text),
            Column::Special => entry.special = Some(text),
            Column::EfctSound => entry.efct_sound = Some(text),
            Column::EfctLed => entry.efct_led = Some(text),
            Column::InputRbg => entry.input_rbg = Some(InputMask::from_raw(&text)),
            Column::StoreVal => entry.store_val = Some(text),
            Column::StoreAddr => entry.store_addr = Some(text),
            Column::GotoOnInput => entry.goto_on_input = Some(text),
            Column::GotoWithoutInput => entry.goto_without_input = Some(text),
        }
    }
    entry
}

/// Trim a cell; blank (or an explicit `mNONE`) is absent.
pub fn clean_cell(raw: &str, column: Column) -> Option<String> {
    let text = raw.trim();
    if text.is_empty() || text == NONE_TOKEN {
        return None;
    }
    if column.is_symbolic() {
        Some(normalize_symbol(text))
    } else {
        Some(text.to_string())
    }
}
