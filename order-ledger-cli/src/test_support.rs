//! Workbook fixtures generated at test time

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use tempfile::TempDir;

/// A fixture cell value
#[derive(Debug, Clone)]
pub enum Cell {
    Int(i64),
    Num(f64),
    Text(&'static str),
    Date(i32, u32, u32),
    /// Formula text, e.g. `=B2*2`
    Formula(&'static str),
    Bold(&'static str),
    Empty,
}

struct FixtureSheet {
    name: String,
    origin: (u32, u16),
    rows: Vec<Vec<Cell>>,
}

/// Builder for an xlsx workbook written into a temporary directory
#[derive(Default)]
pub struct WorkbookFixture {
    sheets: Vec<FixtureSheet>,
}

/// A workbook on disk; the file is removed when this is dropped
pub struct FixtureFile {
    _dir: TempDir,
    path: PathBuf,
}

impl FixtureFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkbookFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet whose first row lands in A1
    pub fn sheet(self, name: &str, rows: Vec<Vec<Cell>>) -> Self {
        self.sheet_at(name, (0, 0), rows)
    }

    /// Add a sheet whose first row starts at an absolute (row, col)
    pub fn sheet_at(mut self, name: &str, origin: (u32, u16), rows: Vec<Vec<Cell>>) -> Self {
        self.sheets.push(FixtureSheet {
            name: name.to_string(),
            origin,
            rows,
        });
        self
    }

    pub fn write(self) -> FixtureFile {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("dd.mm.yyyy");
        let bold = Format::new().set_bold();

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name).unwrap();

            for (row_idx, cells) in sheet.rows.iter().enumerate() {
                let row = sheet.origin.0 + row_idx as u32;
                for (col_idx, cell) in cells.iter().enumerate() {
                    let col = sheet.origin.1 + col_idx as u16;
                    match cell {
                        Cell::Int(i) => {
                            worksheet.write_number(row, col, *i as f64).unwrap();
                        }
                        Cell::Num(n) => {
                            worksheet.write_number(row, col, *n).unwrap();
                        }
                        Cell::Text(s) => {
                            worksheet.write_string(row, col, *s).unwrap();
                        }
                        Cell::Date(y, m, d) => {
                            let date = NaiveDate::from_ymd_opt(*y, *m, *d).unwrap();
                            worksheet
                                .write_number_with_format(row, col, date_serial(date), &date_format)
                                .unwrap();
                        }
                        Cell::Formula(f) => {
                            worksheet.write_formula(row, col, *f).unwrap();
                        }
                        Cell::Bold(s) => {
                            worksheet.write_string_with_format(row, col, *s, &bold).unwrap();
                        }
                        Cell::Empty => {}
                    }
                }
            }
        }

        workbook.save(&path).unwrap();
        FixtureFile { _dir: dir, path }
    }
}

/// 1900-system serial number for dates after 1900-02-28
pub fn date_serial(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    (date - epoch).num_days() as f64
}

pub fn product_header() -> Vec<Cell> {
    vec![
        Cell::Text("Код товара"),
        Cell::Text("Наименование"),
        Cell::Text("Ед. измерения"),
        Cell::Text("Цена товара за единицу"),
    ]
}

pub fn customer_header() -> Vec<Cell> {
    vec![
        Cell::Text("Код клиента"),
        Cell::Text("Наименование организации"),
        Cell::Text("Адрес"),
        Cell::Text("Контактное лицо (ФИО)"),
    ]
}

pub fn order_header() -> Vec<Cell> {
    vec![
        Cell::Text("Код заявки"),
        Cell::Text("Код товара"),
        Cell::Text("Код клиента"),
        Cell::Text("Номер заявки"),
        Cell::Text("Требуемое количество"),
        Cell::Text("Дата размещения"),
    ]
}

pub fn product(code: i64, name: &'static str, units: &'static str, price: f64) -> Vec<Cell> {
    vec![Cell::Int(code), Cell::Text(name), Cell::Text(units), Cell::Num(price)]
}

pub fn customer(
    code: i64,
    organization: &'static str,
    address: &'static str,
    contact: &'static str,
) -> Vec<Cell> {
    vec![
        Cell::Int(code),
        Cell::Text(organization),
        Cell::Text(address),
        Cell::Text(contact),
    ]
}

pub fn order(
    code: i64,
    product_code: i64,
    customer_code: i64,
    number: i64,
    quantity: i64,
    date: (i32, u32, u32),
) -> Vec<Cell> {
    vec![
        Cell::Int(code),
        Cell::Int(product_code),
        Cell::Int(customer_code),
        Cell::Int(number),
        Cell::Int(quantity),
        Cell::Date(date.0, date.1, date.2),
    ]
}

/// One product, one customer, one order in March 2024
pub fn example_workbook() -> FixtureFile {
    WorkbookFixture::new()
        .sheet("Товары", vec![product_header(), product(1, "Widget", "pcs", 9.99)])
        .sheet(
            "Клиенты",
            vec![customer_header(), customer(1, "Acme", "1 Main St", "Jane Doe")],
        )
        .sheet(
            "Заявки",
            vec![order_header(), order(1, 1, 1, 100, 5, (2024, 3, 10))],
        )
        .write()
}

/// Three products, four customers (two sharing a contact name), eight orders
/// spread over March and April 2024
pub fn ledger_workbook() -> FixtureFile {
    WorkbookFixture::new()
        .sheet(
            "Товары",
            vec![
                product_header(),
                product(10, "Widget", "pcs", 9.99),
                product(20, "Gadget", "pcs", 24.5),
                product(30, "Sprocket", "kg", 3.0),
            ],
        )
        .sheet(
            "Клиенты",
            vec![
                customer_header(),
                customer(1, "Acme", "1 Main St", "Jane Doe"),
                customer(2, "Globex", "2 Side Rd", "Hank Scorpio"),
                customer(3, "Initech", "3 Office Park", "Jane Doe"),
                customer(4, "Umbrella", "4 Hill Ave", "Albert Wesker"),
            ],
        )
        .sheet(
            "Заявки",
            vec![
                order_header(),
                order(1, 10, 1, 100, 5, (2024, 3, 10)),
                order(2, 20, 2, 101, 1, (2024, 3, 11)),
                order(3, 10, 2, 102, 7, (2024, 3, 12)),
                order(4, 10, 3, 103, 2, (2024, 4, 1)),
                order(5, 20, 2, 104, 3, (2024, 4, 2)),
                order(6, 20, 1, 105, 4, (2024, 4, 3)),
                order(7, 10, 1, 106, 6, (2024, 4, 4)),
                order(8, 10, 99, 107, 1, (2024, 5, 5)),
            ],
        )
        .write()
}
