//! Save cell edits back into an xlsx file

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::Data;
use unicode_width::UnicodeWidthStr;

use super::sheet_xml::{self, SheetPatch};
use super::{CellRef, SheetData, cells, package};

/// Extra character units added to the widest text of a fitted column
const COLUMN_PADDING: f64 = 2.0;
/// Widest column the format allows
const MAX_COLUMN_WIDTH: f64 = 255.0;

/// Replacement text for a single cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    pub at: CellRef,
    pub value: String,
}

/// Write `edits` into the workbook at `path`.
///
/// `sheets` is the workbook as read from `path`. Only the worksheet parts
/// holding edited cells are rewritten, and every edited sheet gets its
/// columns fitted to the content. All other parts (styles, formulas, merged
/// cells, other sheets) are kept byte for byte.
pub fn save_edits(path: &Path, sheets: &[SheetData], edits: &[CellEdit]) -> Result<()> {
    let mut patches: BTreeMap<&str, (&SheetData, SheetPatch)> = BTreeMap::new();
    for edit in edits {
        let Some(sheet) = sheets.iter().find(|s| s.name == edit.at.sheet) else {
            bail!("Cannot edit {}: sheet not found in workbook", edit.at);
        };
        let (_, patch) = patches
            .entry(sheet.name.as_str())
            .or_insert_with(|| (sheet, SheetPatch::default()));
        patch
            .cells
            .entry(edit.at.row)
            .or_default()
            .insert(edit.at.col, edit.value.clone());
    }
    if patches.is_empty() {
        return Ok(());
    }

    let parts = package::sheet_parts(path)?;
    let mut replacements = HashMap::new();

    for (name, (sheet, mut patch)) in patches {
        patch.widths = fitted_widths(&with_edits(sheet, &patch));

        let part = parts
            .get(name)
            .with_context(|| format!("Sheet '{}' has no worksheet part", name))?;
        let xml = package::read_part(path, part)?;
        let patched = sheet_xml::patch_sheet(&xml, &patch)
            .with_context(|| format!("Failed to edit sheet '{}'", name))?;
        log::debug!("Patched {} ({} bytes -> {} bytes)", part, xml.len(), patched.len());
        replacements.insert(part.clone(), patched);
    }

    package::replace_parts(path, &replacements)?;

    log::info!("Saved {} cell edit(s) to {}", edits.len(), path.display());
    Ok(())
}

/// Copy of `sheet` with the patched cells applied in memory
fn with_edits(sheet: &SheetData, patch: &SheetPatch) -> SheetData {
    let mut edited = sheet.clone();
    let (first_row, first_col) = edited.origin();
    for (&row, cols) in &patch.cells {
        for (&col, value) in cols {
            if row >= first_row && col >= first_col {
                edited.range.set_value((row, col), Data::String(value.clone()));
            }
        }
    }
    edited
}

/// Width per absolute 0-based column: the widest line of text in it, padded
fn fitted_widths(sheet: &SheetData) -> BTreeMap<u32, f64> {
    let first_col = sheet.origin().1;
    let mut widths = BTreeMap::new();

    for (_, col, value) in sheet.range.used_cells() {
        let text = cells::text(value);
        let Some(chars) = text.lines().map(|line| line.width()).max().filter(|w| *w > 0) else {
            continue;
        };
        let width = (chars as f64 + COLUMN_PADDING).min(MAX_COLUMN_WIDTH);
        let entry = widths.entry(first_col + col as u32).or_insert(0.0);
        if width > *entry {
            *entry = width;
        }
    }

    widths
}
