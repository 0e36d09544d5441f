//! Row parsers for the three record sheets

use crate::config::SheetMarkers;
use crate::workbook::cells::{self, CellError};
use crate::workbook::{CellRef, SheetData, UsedRow};

use super::records::{Customer, Order, Product};
use super::{LoadError, Store};

/// Column positions (1-based, relative to the used range)
mod product_cols {
    pub const CODE: usize = 1;
    pub const NAME: usize = 2;
    pub const UNITS: usize = 3;
    pub const PRICE: usize = 4;
}

mod customer_cols {
    pub const CODE: usize = 1;
    pub const ORGANIZATION: usize = 2;
    pub const ADDRESS: usize = 3;
    pub const CONTACT_PERSON: usize = 4;
}

mod order_cols {
    pub const ORDER_CODE: usize = 1;
    pub const PRODUCT_CODE: usize = 2;
    pub const CUSTOMER_CODE: usize = 3;
    pub const ORDER_NUMBER: usize = 4;
    pub const QUANTITY: usize = 5;
    pub const ORDER_DATE: usize = 6;
}

/// Record kind a sheet holds, decided by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKind {
    Products,
    Customers,
    Orders,
}

impl SheetKind {
    pub const ALL: [SheetKind; 3] = [SheetKind::Products, SheetKind::Customers, SheetKind::Orders];

    /// Kind whose marker the sheet name contains. Products win over customers,
    /// customers over orders, when a name contains several markers.
    pub fn classify(sheet_name: &str, markers: &SheetMarkers) -> Option<SheetKind> {
        Self::ALL
            .into_iter()
            .find(|kind| sheet_name.contains(kind.marker(markers)))
    }

    pub fn marker(self, markers: &SheetMarkers) -> &str {
        match self {
            SheetKind::Products => &markers.products,
            SheetKind::Customers => &markers.customers,
            SheetKind::Orders => &markers.orders,
        }
    }
}

impl std::fmt::Display for SheetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetKind::Products => write!(f, "products"),
            SheetKind::Customers => write!(f, "customers"),
            SheetKind::Orders => write!(f, "orders"),
        }
    }
}

/// Parse every data row of a sheet into the store.
///
/// The first used row is the header. Store keys count data rows from 1 and
/// restart for every sheet. Returns the number of records read.
pub(super) fn load_sheet(sheet: &SheetData, kind: SheetKind, store: &mut Store) -> Result<usize, LoadError> {
    let first_col = sheet.origin().1;
    let mut key = 0;

    for used in sheet.used_rows().skip(1) {
        key += 1;
        let at_row = |source: CellError| LoadError::Parse {
            sheet: sheet.name.clone(),
            row: used.row + 1,
            source,
        };

        match kind {
            SheetKind::Products => {
                store.insert_product(key, parse_product(used).map_err(at_row)?);
            }
            SheetKind::Customers => {
                let origin = CellRef::new(
                    &sheet.name,
                    used.row,
                    first_col + (customer_cols::CONTACT_PERSON as u32 - 1),
                );
                store.insert_customer(key, parse_customer(used, origin).map_err(at_row)?);
            }
            SheetKind::Orders => {
                store.push_order(parse_order(used).map_err(at_row)?);
            }
        }
    }

    Ok(key)
}

fn parse_product(row: UsedRow<'_>) -> Result<Product, CellError> {
    Ok(Product {
        code: cells::integer(row.cells, product_cols::CODE)?,
        name: cells::string(row.cells, product_cols::NAME),
        units: cells::string(row.cells, product_cols::UNITS),
        price: cells::decimal(row.cells, product_cols::PRICE)?,
    })
}

fn parse_customer(row: UsedRow<'_>, origin: CellRef) -> Result<Customer, CellError> {
    Ok(Customer {
        code: cells::integer(row.cells, customer_cols::CODE)?,
        organization: cells::string(row.cells, customer_cols::ORGANIZATION),
        address: cells::string(row.cells, customer_cols::ADDRESS),
        contact_person: cells::string(row.cells, customer_cols::CONTACT_PERSON),
        origin,
    })
}

fn parse_order(row: UsedRow<'_>) -> Result<Order, CellError> {
    Ok(Order {
        order_code: cells::integer(row.cells, order_cols::ORDER_CODE)?,
        product_code: cells::integer(row.cells, order_cols::PRODUCT_CODE)?,
        customer_code: cells::integer(row.cells, order_cols::CUSTOMER_CODE)?,
        order_number: cells::integer(row.cells, order_cols::ORDER_NUMBER)?,
        quantity: cells::integer(row.cells, order_cols::QUANTITY)?,
        order_date: cells::date(row.cells, order_cols::ORDER_DATE)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::Data;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn used(cells: &[Data]) -> UsedRow<'_> {
        UsedRow { row: 4, cells }
    }

    #[test]
    fn test_classify_by_substring() {
        let markers = SheetMarkers::default();
        assert_eq!(SheetKind::classify("Товары", &markers), Some(SheetKind::Products));
        assert_eq!(SheetKind::classify("Клиенты 2024", &markers), Some(SheetKind::Customers));
        assert_eq!(SheetKind::classify("Все Заявки", &markers), Some(SheetKind::Orders));
        assert_eq!(SheetKind::classify("Справочник", &markers), None);
        assert_eq!(SheetKind::classify("товары", &markers), None);
    }

    #[test]
    fn test_classify_prefers_products() {
        let markers = SheetMarkers::default();
        assert_eq!(
            SheetKind::classify("Заявки на Товары", &markers),
            Some(SheetKind::Products)
        );
    }

    #[test]
    fn test_parse_product() {
        let cells = vec![
            Data::Float(1.0),
            Data::String("Widget".to_string()),
            Data::String("pcs".to_string()),
            Data::Float(9.99),
        ];
        let product = parse_product(used(&cells)).unwrap();
        assert_eq!(
            product,
            Product {
                code: 1,
                name: "Widget".to_string(),
                units: "pcs".to_string(),
                price: Decimal::new(999, 2),
            }
        );
    }

    #[test]
    fn test_parse_customer_keeps_origin() {
        let cells = vec![
            Data::Float(1.0),
            Data::String("Acme".to_string()),
            Data::String("1 Main St".to_string()),
            Data::String("Jane Doe".to_string()),
        ];
        let origin = CellRef::new("Клиенты", 4, 3);
        let customer = parse_customer(used(&cells), origin.clone()).unwrap();
        assert_eq!(customer.contact_person, "Jane Doe");
        assert_eq!(customer.origin, origin);
    }

    #[test]
    fn test_parse_order() {
        let cells = vec![
            Data::Float(1.0),
            Data::Float(10.0),
            Data::Float(2.0),
            Data::Float(100.0),
            Data::Float(5.0),
            Data::Float(45361.0),
        ];
        let order = parse_order(used(&cells)).unwrap();
        assert_eq!(order.product_code, 10);
        assert_eq!(order.customer_code, 2);
        assert_eq!(order.quantity, 5);
        assert_eq!(order.order_date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_parse_order_bad_quantity() {
        let cells = vec![
            Data::Float(1.0),
            Data::Float(10.0),
            Data::Float(2.0),
            Data::Float(100.0),
            Data::String("five".to_string()),
            Data::Float(45361.0),
        ];
        let err = parse_order(used(&cells)).unwrap_err();
        assert_eq!(err.column, order_cols::QUANTITY);
        assert_eq!(err.found, "five");
    }
}
