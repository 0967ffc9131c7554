//! Row sources: where the raw state table rows come from.
//!
//! The compiler only needs a header and ordered rows of text cells. A
//! workbook saved as TOML, a tab-delimited export of a single sheet, or an
//! in-memory [`Sheet`] all provide that.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Spreadsheet row number of the first data row (row 1 holds the column titles).
pub const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unable to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid workbook: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("sheet '{0}' not found")]
    MissingSheet(String),
    #[error("sheet '{sheet}' row {sheet_row} has {found} cells but the header has only {expected}")]
    RaggedRow {
        sheet: String,
        sheet_row: usize,
        found: usize,
        expected: usize,
    },
}

/// One data row with its spreadsheet row number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub number: usize,
    pub cells: Vec<String>,
}

/// A single sheet: header cells plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<SheetRow>,
}

impl Sheet {
    pub fn new<I, S>(name: impl Into<String>, header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a data row, numbering it after the previous one.
    ///
    /// Rows shorter than the header are padded with empty cells.
    ///
    /// # Errors
    /// Returns `SourceError::RaggedRow` if the row is longer than the header.
    pub fn push_row<I, S>(&mut self, cells: I) -> Result<(), SourceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let number = self.rows.last().map_or(FIRST_DATA_ROW, |r| r.number + 1);
        self.push_numbered(number, cells.into_iter().map(Into::into).collect())
    }

    /// Builder form of [`Sheet::push_row`] for literals in tests and embedding code.
    ///
    /// # Errors
    /// Same as [`Sheet::push_row`].
    pub fn with_row<I, S>(mut self, cells: I) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(cells)?;
        Ok(self)
    }

    fn push_numbered(&mut self, number: usize, mut cells: Vec<String>) -> Result<(), SourceError> {
        if cells.len() > self.header.len() {
            return Err(SourceError::RaggedRow {
                sheet: self.name.clone(),
                sheet_row: number,
                found: cells.len(),
                expected: self.header.len(),
            });
        }
        cells.resize(self.header.len(), String::new());
        self.rows.push(SheetRow { number, cells });
        Ok(())
    }
}

/// Anything that can hand out a named sheet.
pub trait RowSource {
    /// Fetch the sheet called `name`.
    ///
    /// # Errors
    /// Returns `SourceError::MissingSheet` if there is no such sheet, or any
    /// error from decoding it.
    fn sheet(&self, name: &str) -> Result<Sheet, SourceError>;
}

impl RowSource for Sheet {
    fn sheet(&self, name: &str) -> Result<Sheet, SourceError> {
        if self.name == name {
            Ok(self.clone())
        } else {
            Err(SourceError::MissingSheet(name.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSheet {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<toml::Value>>,
}

/// A workbook stored as TOML, one table per sheet:
///
/// ```toml
/// [StateTable]
/// columns = ["index", "SPECIAL", "efctSound"]
/// rows = [
///   ["mROW_POWERON", "", "mEFCT_PWRON"],
/// ]
/// ```
#[derive(Debug)]
pub struct TomlWorkbook {
    sheets: BTreeMap<String, RawSheet>,
}

impl TomlWorkbook {
    /// Parse workbook text.
    ///
    /// # Errors
    /// Returns `SourceError::Toml` when the text is not a valid workbook.
    pub fn parse(text: &str) -> Result<Self, SourceError> {
        let sheets: BTreeMap<String, RawSheet> = toml::from_str(text)?;
        debug!("workbook parsed with {} sheet(s)", sheets.len());
        Ok(Self { sheets })
    }

    /// Read and parse a workbook file.
    ///
    /// # Errors
    /// Returns `SourceError::Io` if the file cannot be read, or any parse error.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let text = read_file(path)?;
        Self::parse(&text)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }
}

impl RowSource for TomlWorkbook {
    fn sheet(&self, name: &str) -> Result<Sheet, SourceError> {
        let raw = self
            .sheets
            .get(name)
            .ok_or_else(|| SourceError::MissingSheet(name.to_string()))?;
        let mut sheet = Sheet::new(name, raw.columns.iter().cloned());
        for cells in &raw.rows {
            sheet.push_row(cells.iter().map(cell_text))?;
        }
        Ok(sheet)
    }
}

fn cell_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// A delimited text export of one sheet; the first non-empty line is the header.
///
/// The export holds exactly one sheet, so it answers to any sheet name.
#[derive(Debug, Clone)]
pub struct DelimitedSheet {
    text: String,
    delimiter: char,
}

impl DelimitedSheet {
    /// Tab-delimited text, as produced by "save as tab-delimited text".
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delimiter: '\t',
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read an export from disk.
    ///
    /// # Errors
    /// Returns `SourceError::Io` if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        Ok(Self::new(read_file(path)?))
    }
}

impl RowSource for DelimitedSheet {
    fn sheet(&self, name: &str) -> Result<Sheet, SourceError> {
        let mut lines = self
            .text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.trim().is_empty());
        let Some((_, header)) = lines.next() else {
            return Err(SourceError::MissingSheet(name.to_string()));
        };
        let mut sheet = Sheet::new(name, header.split(self.delimiter));
        for (number, line) in lines {
            let cells = line.split(self.delimiter).map(str::to_string).collect();
            sheet.push_numbered(number, cells)?;
        }
        Ok(sheet)
    }
}

fn read_file(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_workbook_stringifies_cells() {
        let src = r#"
[StateTable]
columns = ["index", "storeVal", "inputRBG"]
rows = [
  ["open", 5, "trigOnly"],
  ["open", 2.5],
]
"#;
        let book = TomlWorkbook::parse(src).expect("parse ok");
        let sheet = book.sheet("StateTable").expect("sheet");
        assert_eq!(sheet.header, vec!["index", "storeVal", "inputRBG"]);
        assert_eq!(sheet.rows[0].cells, vec!["open", "5", "trigOnly"]);
        assert_eq!(sheet.rows[0].number, 2);
        assert_eq!(sheet.rows[1].cells, vec!["open", "2.5", ""]);
        assert_eq!(sheet.rows[1].number, 3);
    }

    #[test]
    fn toml_workbook_missing_sheet() {
        let book = TomlWorkbook::parse("[Other]\ncolumns = [\"index\"]\n").expect("parse ok");
        assert_eq!(book.sheet_names().collect::<Vec<_>>(), vec!["Other"]);
        let err = book.sheet("StateTable").unwrap_err();
        assert!(matches!(err, SourceError::MissingSheet(name) if name == "StateTable"));
    }

    #[test]
    fn delimited_sheet_keeps_line_numbers_across_empty_lines() {
        let text = "index\tgotoOnInput\r\nopen\tlock\n\n\nlock\t\n";
        let sheet = DelimitedSheet::new(text).sheet("StateTable").expect("sheet");
        assert_eq!(sheet.header, vec!["index", "gotoOnInput"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].number, 2);
        assert_eq!(sheet.rows[1].number, 5);
        assert_eq!(sheet.rows[1].cells, vec!["lock", ""]);
    }

    #[test]
    fn delimited_sheet_rejects_long_rows() {
        let sheet = DelimitedSheet::new("a,b\n1,2,3\n").with_delimiter(',');
        let err = sheet.sheet("StateTable").unwrap_err();
        assert!(matches!(
            err,
            SourceError::RaggedRow {
                sheet_row: 2,
                found: 3,
                expected: 2,
                ..
            }
        ));
    }

    #[test]
    fn in_memory_sheet_pads_short_rows() {
        let sheet = Sheet::new("StateTable", ["index", "SPECIAL"])
            .with_row(["open"])
            .expect("row");
        assert_eq!(sheet.rows[0].cells, vec!["open", ""]);
        assert!(sheet.sheet("Elsewhere").is_err());
    }
}
