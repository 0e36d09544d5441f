//! Typed records loaded from the workbook

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::workbook::CellRef;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub code: i64,
    pub name: String,
    pub units: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub code: i64,
    pub organization: String,
    pub address: String,
    pub contact_person: String,
    /// Cell the contact person was read from
    pub origin: CellRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_code: i64,
    /// References [`Product::code`]
    pub product_code: i64,
    /// References [`Customer::code`]
    pub customer_code: i64,
    pub order_number: i64,
    pub quantity: i64,
    pub order_date: NaiveDate,
}
