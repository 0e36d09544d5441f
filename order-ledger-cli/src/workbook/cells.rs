//! Positional cell reads with type coercion
//!
//! Columns are 1-based and relative to the first column of the row slice
//! handed in (the sheet's used range). A column past the end of the row reads
//! as an empty cell.

use std::str::FromStr;

use calamine::Data;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

static EMPTY: Data = Data::Empty;

/// Type a cell was expected to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Integer,
    Decimal,
    Date,
}

impl std::fmt::Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellKind::Integer => write!(f, "an integer"),
            CellKind::Decimal => write!(f, "a decimal number"),
            CellKind::Date => write!(f, "a date"),
        }
    }
}

/// A cell whose content could not be coerced to the expected type
#[derive(Debug, Clone, PartialEq)]
pub struct CellError {
    /// 1-based column within the used range
    pub column: usize,
    pub expected: CellKind,
    pub found: String,
}

impl CellError {
    fn new(column: usize, expected: CellKind, cell: &Data) -> Self {
        CellError {
            column,
            expected,
            found: text(cell),
        }
    }
}

impl std::fmt::Display for CellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.found.is_empty() {
            write!(f, "column {}: expected {}, found an empty cell", self.column, self.expected)
        } else {
            write!(
                f,
                "column {}: expected {}, found '{}'",
                self.column, self.expected, self.found
            )
        }
    }
}

impl std::error::Error for CellError {}

/// Cell at a 1-based column
pub fn cell_at(cells: &[Data], column: usize) -> &Data {
    column
        .checked_sub(1)
        .and_then(|idx| cells.get(idx))
        .unwrap_or(&EMPTY)
}

/// Text form of any cell. Never fails; empty cells give an empty string.
pub fn text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) if dt.is_datetime() => match serial_to_date(dt.as_f64()) {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => format_float(dt.as_f64()),
        },
        other => other.to_string(),
    }
}

/// String at a 1-based column
pub fn string(cells: &[Data], column: usize) -> String {
    text(cell_at(cells, column))
}

/// Integer at a 1-based column. Floats must be whole numbers.
pub fn integer(cells: &[Data], column: usize) -> Result<i64, CellError> {
    let cell = cell_at(cells, column);
    let value = match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) => float_to_i64(*f),
        Data::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    value.ok_or_else(|| CellError::new(column, CellKind::Integer, cell))
}

/// Decimal at a 1-based column, parsed from the cell's text form.
///
/// A comma is accepted as the decimal separator.
pub fn decimal(cells: &[Data], column: usize) -> Result<Decimal, CellError> {
    let cell = cell_at(cells, column);
    let value = match cell {
        Data::Int(i) => Some(Decimal::from(*i)),
        Data::Float(f) => Decimal::from_str(&f.to_string()).ok(),
        Data::String(s) => Decimal::from_str(&s.trim().replace(',', ".")).ok(),
        _ => None,
    };
    value.ok_or_else(|| CellError::new(column, CellKind::Decimal, cell))
}

/// Date at a 1-based column.
///
/// Accepts date cells, plain numbers as serial dates, and `YYYY-MM-DD`
/// (optionally followed by a time) or `DD.MM.YYYY` strings.
pub fn date(cells: &[Data], column: usize) -> Result<NaiveDate, CellError> {
    let cell = cell_at(cells, column);
    let value = match cell {
        Data::DateTime(dt) => serial_to_date(dt.as_f64()),
        Data::Float(f) => serial_to_date(*f),
        Data::Int(i) => serial_to_date(*i as f64),
        Data::DateTimeIso(s) | Data::String(s) => parse_date_text(s),
        _ => None,
    };
    value.ok_or_else(|| CellError::new(column, CellKind::Date, cell))
}

/// Convert a 1900-system serial date to a calendar date.
///
/// Serial 1 is 1900-01-01; serial 60 is the non-existent 1900-02-29 kept by
/// spreadsheet applications, so dates from 61 on are offset by one day.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let days = serial.floor() as i64;
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_signed(Duration::try_days(days)?)
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d.%m.%Y"))
        .ok()
}

fn float_to_i64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn format_float(f: f64) -> String {
    match float_to_i64(f) {
        Some(i) => i.to_string(),
        None => f.to_string(),
    }
}
