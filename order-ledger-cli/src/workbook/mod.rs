//! Workbook I/O
//!
//! Reading goes through calamine into [`SheetData`]: a sheet's used range held
//! in memory, addressed by absolute 0-based (row, column) positions. Writing
//! patches the edited worksheet parts of the xlsx package in place and copies
//! every other part unchanged.

pub mod cells;
mod package;
mod reader;
mod sheet_xml;
mod writer;

pub use reader::{SheetData, UsedRow, read_workbook};
pub use writer::{CellEdit, save_edits};

/// Absolute position of a single cell in a named sheet (0-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub sheet: String,
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(sheet: impl Into<String>, row: u32, col: u32) -> Self {
        CellRef {
            sheet: sheet.into(),
            row,
            col,
        }
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'!{}", self.sheet, cell_name(self.row, self.col))
    }
}

/// A1-style name of a 0-based (row, col) position
fn cell_name(row: u32, col: u32) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

/// 0-based (row, col) of an A1-style name, `None` if it is not one
fn parse_cell_name(name: &str) -> Option<(u32, u32)> {
    let digits_at = name.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = name.split_at(digits_at);
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }

    let col = letters
        .bytes()
        .try_fold(0u32, |acc, b| acc.checked_mul(26)?.checked_add(u32::from(b - b'A') + 1))?;
    let row: u32 = digits.parse().ok()?;
    Some((row.checked_sub(1)?, col - 1))
}

/// Spreadsheet column letters for a 0-based column index (0 -> A, 27 -> AB)
fn column_letters(col: u32) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
