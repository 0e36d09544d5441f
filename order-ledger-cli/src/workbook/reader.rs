//! Read every sheet of an xlsx workbook into memory

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Xlsx, open_workbook};

/// A worksheet's used range, owned
#[derive(Debug, Clone)]
pub struct SheetData {
    pub name: String,
    pub range: Range<Data>,
}

/// A row holding at least one non-blank cell
#[derive(Debug, Clone, Copy)]
pub struct UsedRow<'a> {
    /// Absolute 0-based row index in the sheet
    pub row: u32,
    /// Cells from the first column of the used range onwards
    pub cells: &'a [Data],
}

impl SheetData {
    /// Absolute (row, col) of the top-left cell of the used range
    pub fn origin(&self) -> (u32, u32) {
        self.range.start().unwrap_or((0, 0))
    }

    /// Rows with data, in sheet order. Blank rows inside the range are skipped.
    pub fn used_rows(&self) -> impl Iterator<Item = UsedRow<'_>> {
        let first_row = self.origin().0;
        self.range
            .rows()
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(|c| !is_blank(c)))
            .map(move |(idx, cells)| UsedRow {
                row: first_row + idx as u32,
                cells,
            })
    }

    /// Value at an absolute position, `None` outside the used range
    pub fn cell(&self, row: u32, col: u32) -> Option<&Data> {
        self.range.get_value((row, col))
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Read all sheets of an xlsx workbook, in workbook order.
///
/// The file handle is dropped before this returns.
pub fn read_workbook(path: &Path) -> Result<Vec<SheetData>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("Failed to read sheet: {}", name))?;

        log::debug!(
            "Read sheet '{}' ({} rows x {} columns)",
            name,
            range.height(),
            range.width()
        );
        sheets.push(SheetData { name, range });
    }

    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Cell, WorkbookFixture};

    #[test]
    fn test_read_workbook_keeps_sheet_order() {
        let fixture = WorkbookFixture::new()
            .sheet("Заявки", vec![vec![Cell::Text("Код заявки")]])
            .sheet("Товары", vec![vec![Cell::Text("Код товара")]])
            .write();

        let sheets = read_workbook(fixture.path()).unwrap();
        let names: Vec<_> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Заявки", "Товары"]);
    }

    #[test]
    fn test_used_rows_skip_blank_rows_and_keep_absolute_index() {
        let fixture = WorkbookFixture::new()
            .sheet(
                "Товары",
                vec![
                    vec![Cell::Text("Код"), Cell::Text("Название")],
                    vec![Cell::Int(1), Cell::Text("Widget")],
                    vec![],
                    vec![Cell::Int(2), Cell::Text("Gadget")],
                ],
            )
            .write();

        let sheets = read_workbook(fixture.path()).unwrap();
        let rows: Vec<u32> = sheets[0].used_rows().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 1, 3]);
    }

    #[test]
    fn test_used_rows_offset_range() {
        let fixture = WorkbookFixture::new()
            .sheet_at(
                "Клиенты",
                (2, 1),
                vec![
                    vec![Cell::Text("Код"), Cell::Text("Организация")],
                    vec![Cell::Int(7), Cell::Text("Acme")],
                ],
            )
            .write();

        let sheets = read_workbook(fixture.path()).unwrap();
        let sheet = &sheets[0];
        assert_eq!(sheet.origin(), (2, 1));

        let rows: Vec<_> = sheet.used_rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row, 3);
        assert_eq!(rows[1].cells[1], Data::String("Acme".to_string()));
        assert_eq!(sheet.cell(3, 2), Some(&Data::String("Acme".to_string())));
    }

    #[test]
    fn test_read_workbook_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_workbook(&dir.path().join("missing.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Failed to open Excel file"));
    }
}
