//! Streaming edits of one worksheet XML part
//!
//! Events are copied through as read. Only the edited cells, the rows that
//! hold them, the `<cols>` block and the `<dimension>` are rewritten.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{cell_name, parse_cell_name};

/// Changes to one worksheet, 0-based positions
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct SheetPatch {
    /// row -> col -> new text
    pub cells: BTreeMap<u32, BTreeMap<u32, String>>,
    /// col -> width in character units
    pub widths: BTreeMap<u32, f64>,
}

/// One `<col>` element: a 1-based inclusive column span and its other attributes
#[derive(Debug, Clone, PartialEq)]
struct ColSpan {
    min: u32,
    max: u32,
    attrs: Vec<(String, String)>,
}

/// Apply `patch` to a worksheet part.
///
/// Edited cells become inline strings and keep their other attributes (style
/// included). Missing cells and rows are inserted in order.
pub(super) fn patch_sheet(xml: &[u8], patch: &SheetPatch) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 512));

    let mut pending = patch.cells.clone();
    let mut row_edits: Option<BTreeMap<u32, String>> = None;
    let mut current_row = 0;
    let mut next_row = 0;
    let mut next_col = 0;
    let mut cols_written = false;
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .context("Malformed worksheet XML")?;

        match event {
            Event::Eof => break,

            Event::Start(e) if e.name().as_ref() == b"cols" => {
                let existing = read_cols(&mut reader)?;
                write_cols(&mut writer, fit_columns(existing, &patch.widths))?;
                cols_written = true;
            }
            Event::Empty(e) if e.name().as_ref() == b"cols" => {
                write_cols(&mut writer, fit_columns(Vec::new(), &patch.widths))?;
                cols_written = true;
            }
            Event::Empty(e) if e.name().as_ref() == b"dimension" => {
                match widen_dimension(&e, &patch.cells)? {
                    Some(wider) => writer.write_event(Event::Empty(wider))?,
                    None => writer.write_event(Event::Empty(e))?,
                }
            }

            Event::Start(e) if e.name().as_ref() == b"sheetData" => {
                if !cols_written {
                    write_cols(&mut writer, fit_columns(Vec::new(), &patch.widths))?;
                    cols_written = true;
                }
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) if e.name().as_ref() == b"sheetData" => {
                if !cols_written {
                    write_cols(&mut writer, fit_columns(Vec::new(), &patch.widths))?;
                    cols_written = true;
                }
                if pending.is_empty() {
                    writer.write_event(Event::Empty(e))?;
                } else {
                    writer.write_event(Event::Start(e))?;
                    write_new_rows(&mut writer, &mut pending, None)?;
                    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
                }
            }
            Event::End(e) if e.name().as_ref() == b"sheetData" => {
                write_new_rows(&mut writer, &mut pending, None)?;
                writer.write_event(Event::End(e))?;
            }

            Event::Start(e) if e.name().as_ref() == b"row" => {
                let row = row_index(&e)?.unwrap_or(next_row);
                write_new_rows(&mut writer, &mut pending, Some(row))?;
                current_row = row;
                next_row = row + 1;
                next_col = 0;

                row_edits = pending.remove(&row);
                if row_edits.is_some() {
                    writer.write_event(Event::Start(without_attr(&e, b"spans")?))?;
                } else {
                    writer.write_event(Event::Start(e))?;
                }
            }
            Event::Empty(e) if e.name().as_ref() == b"row" => {
                let row = row_index(&e)?.unwrap_or(next_row);
                write_new_rows(&mut writer, &mut pending, Some(row))?;
                next_row = row + 1;

                match pending.remove(&row) {
                    Some(edits) => {
                        writer.write_event(Event::Start(without_attr(&e, b"spans")?))?;
                        for (col, value) in &edits {
                            write_cell(&mut writer, row, *col, value, None)?;
                        }
                        writer.write_event(Event::End(BytesEnd::new("row")))?;
                    }
                    None => writer.write_event(Event::Empty(e))?,
                }
            }
            Event::End(e) if e.name().as_ref() == b"row" => {
                if let Some(mut edits) = row_edits.take() {
                    write_new_cells(&mut writer, current_row, &mut edits, None)?;
                }
                writer.write_event(Event::End(e))?;
            }

            Event::Start(e) if e.name().as_ref() == b"c" => match row_edits.as_mut() {
                Some(edits) => {
                    let col = cell_col(&e)?.unwrap_or(next_col);
                    next_col = col + 1;
                    write_new_cells(&mut writer, current_row, edits, Some(col))?;
                    match edits.remove(&col) {
                        Some(value) => {
                            let end = e.to_end().into_owned();
                            reader.read_to_end_into(end.name(), &mut skip_buf)?;
                            skip_buf.clear();
                            write_cell(&mut writer, current_row, col, &value, Some(&e))?;
                        }
                        None => writer.write_event(Event::Start(e))?,
                    }
                }
                None => writer.write_event(Event::Start(e))?,
            },
            Event::Empty(e) if e.name().as_ref() == b"c" => match row_edits.as_mut() {
                Some(edits) => {
                    let col = cell_col(&e)?.unwrap_or(next_col);
                    next_col = col + 1;
                    write_new_cells(&mut writer, current_row, edits, Some(col))?;
                    match edits.remove(&col) {
                        Some(value) => write_cell(&mut writer, current_row, col, &value, Some(&e))?,
                        None => writer.write_event(Event::Empty(e))?,
                    }
                }
                None => writer.write_event(Event::Empty(e))?,
            },

            other => writer.write_event(other)?,
        }
        buf.clear();
    }

    if !pending.is_empty() {
        bail!("Worksheet has no sheetData element; {} edited row(s) not written", pending.len());
    }

    Ok(writer.into_inner())
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.decode_and_unescape_value(e.decoder())?.into_owned()));
        }
    }
    Ok(None)
}

/// 0-based row index from a `<row r="...">`
fn row_index(e: &BytesStart<'_>) -> Result<Option<u32>> {
    let Some(r) = attr_value(e, b"r")? else {
        return Ok(None);
    };
    let number: u32 = r.parse().with_context(|| format!("Invalid row number '{}'", r))?;
    Ok(number.checked_sub(1))
}

/// 0-based column index from a `<c r="...">`
fn cell_col(e: &BytesStart<'_>) -> Result<Option<u32>> {
    Ok(attr_value(e, b"r")?
        .and_then(|r| parse_cell_name(&r))
        .map(|(_, col)| col))
}

fn without_attr(e: &BytesStart<'_>, key: &[u8]) -> Result<BytesStart<'static>> {
    let mut out = BytesStart::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() != key {
            out.push_attribute(attr);
        }
    }
    Ok(out)
}

/// Inline string cell at (row, col). Attributes of `template` other than the
/// position, type and metadata indexes are kept.
fn write_cell(
    writer: &mut Writer<Vec<u8>>,
    row: u32,
    col: u32,
    value: &str,
    template: Option<&BytesStart<'_>>,
) -> Result<()> {
    let reference = cell_name(row, col);
    let mut start = BytesStart::new("c");
    start.push_attribute(("r", reference.as_str()));
    if let Some(template) = template {
        for attr in template.attributes() {
            let attr = attr?;
            if !matches!(attr.key.as_ref(), b"r" | b"t" | b"cm" | b"vm") {
                start.push_attribute(attr);
            }
        }
    }
    start.push_attribute(("t", "inlineStr"));

    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Start(BytesStart::new("is")))?;
    writer.write_event(Event::Start(BytesStart::new("t")))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("t")))?;
    writer.write_event(Event::End(BytesEnd::new("is")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

/// Write and drop the edits of `row` left of `before` (all of them for `None`)
fn write_new_cells(
    writer: &mut Writer<Vec<u8>>,
    row: u32,
    edits: &mut BTreeMap<u32, String>,
    before: Option<u32>,
) -> Result<()> {
    let earlier = match before {
        Some(col) => {
            let later = edits.split_off(&col);
            std::mem::replace(edits, later)
        }
        None => std::mem::take(edits),
    };
    for (col, value) in &earlier {
        write_cell(writer, row, *col, value, None)?;
    }
    Ok(())
}

/// Write and drop pending rows above `before` (all of them for `None`)
fn write_new_rows(
    writer: &mut Writer<Vec<u8>>,
    pending: &mut BTreeMap<u32, BTreeMap<u32, String>>,
    before: Option<u32>,
) -> Result<()> {
    let earlier = match before {
        Some(row) => {
            let later = pending.split_off(&row);
            std::mem::replace(pending, later)
        }
        None => std::mem::take(pending),
    };
    for (row, cells) in &earlier {
        let number = (row + 1).to_string();
        let mut start = BytesStart::new("row");
        start.push_attribute(("r", number.as_str()));
        writer.write_event(Event::Start(start))?;
        for (col, value) in cells {
            write_cell(writer, *row, *col, value, None)?;
        }
        writer.write_event(Event::End(BytesEnd::new("row")))?;
    }
    Ok(())
}

fn read_cols(reader: &mut Reader<&[u8]>) -> Result<Vec<ColSpan>> {
    let mut buf = Vec::new();
    let mut spans = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"col" => {
                let mut min = None;
                let mut max = None;
                let mut attrs = Vec::new();
                for attr in e.attributes() {
                    let attr = attr?;
                    let value = attr.decode_and_unescape_value(e.decoder())?.into_owned();
                    match attr.key.as_ref() {
                        b"min" => min = value.parse().ok(),
                        b"max" => max = value.parse().ok(),
                        key => attrs.push((String::from_utf8_lossy(key).into_owned(), value)),
                    }
                }
                if let (Some(min), Some(max)) = (min, max) {
                    spans.push(ColSpan { min, max, attrs });
                }
            }
            Event::End(e) if e.name().as_ref() == b"cols" => break,
            Event::Eof => bail!("Unterminated <cols> element"),
            _ => {}
        }
        buf.clear();
    }

    Ok(spans)
}

fn set_attr(attrs: &mut Vec<(String, String)>, key: &str, value: String) {
    match attrs.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value,
        None => attrs.push((key.to_string(), value)),
    }
}

/// Give every column in `widths` its own span with a custom width, splitting
/// any existing span that covers it. Other span attributes carry over.
fn fit_columns(mut spans: Vec<ColSpan>, widths: &BTreeMap<u32, f64>) -> Vec<ColSpan> {
    for (&col, &width) in widths {
        let col = col + 1;
        let mut attrs = match spans.iter().position(|s| s.min <= col && col <= s.max) {
            Some(idx) => {
                let span = spans.remove(idx);
                if span.min < col {
                    spans.push(ColSpan {
                        min: span.min,
                        max: col - 1,
                        attrs: span.attrs.clone(),
                    });
                }
                if col < span.max {
                    spans.push(ColSpan {
                        min: col + 1,
                        max: span.max,
                        attrs: span.attrs.clone(),
                    });
                }
                span.attrs
            }
            None => Vec::new(),
        };
        set_attr(&mut attrs, "width", format!("{:.2}", width));
        set_attr(&mut attrs, "customWidth", "1".to_string());
        spans.push(ColSpan {
            min: col,
            max: col,
            attrs,
        });
    }
    spans.sort_by_key(|s| s.min);
    spans
}

fn write_cols(writer: &mut Writer<Vec<u8>>, spans: Vec<ColSpan>) -> Result<()> {
    // An empty <cols> is invalid
    if spans.is_empty() {
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("cols")))?;
    for span in &spans {
        let (min, max) = (span.min.to_string(), span.max.to_string());
        let mut col = BytesStart::new("col");
        col.push_attribute(("min", min.as_str()));
        col.push_attribute(("max", max.as_str()));
        for (key, value) in &span.attrs {
            col.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Empty(col))?;
    }
    writer.write_event(Event::End(BytesEnd::new("cols")))?;
    Ok(())
}

/// `<dimension>` grown to cover the edited cells, `None` when it already does
/// or cannot be parsed
fn widen_dimension(
    e: &BytesStart<'_>,
    cells: &BTreeMap<u32, BTreeMap<u32, String>>,
) -> Result<Option<BytesStart<'static>>> {
    let Some(reference) = attr_value(e, b"ref")? else {
        return Ok(None);
    };
    let (first, last) = reference
        .split_once(':')
        .unwrap_or((reference.as_str(), reference.as_str()));
    let (Some(first), Some(last)) = (parse_cell_name(first), parse_cell_name(last)) else {
        return Ok(None);
    };

    let (mut top, mut left) = first;
    let (mut bottom, mut right) = last;
    for (&row, cols) in cells {
        for &col in cols.keys() {
            top = top.min(row);
            bottom = bottom.max(row);
            left = left.min(col);
            right = right.max(col);
        }
    }
    if (top, left) == first && (bottom, right) == last {
        return Ok(None);
    }

    let range = format!("{}:{}", cell_name(top, left), cell_name(bottom, right));
    let mut wider = without_attr(e, b"ref")?;
    wider.push_attribute(("ref", range.as_str()));
    Ok(Some(wider))
}
