//! Queries over a loaded [`Store`](crate::store::Store)
//!
//! Read queries borrow records from the store and never print. The contact
//! update goes to disk; the caller reloads the store afterwards.

mod contact;
mod golden;
mod products;

pub use contact::{ContactUpdate, update_contact_person};
pub use golden::{GoldenCustomer, golden_customer};
pub use products::{OrderLine, ProductOrders, customers_by_product};

use crate::workbook::CellRef;

/// Which list a store key was picked from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Product,
    Customer,
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::Product => write!(f, "product"),
            Selection::Customer => write!(f, "customer"),
        }
    }
}

#[derive(Debug)]
pub enum QueryError {
    /// Store key not present in the product or customer list
    InvalidSelection { kind: Selection, key: usize },
    /// New contact name is blank
    EmptyContactName,
    /// The workbook on disk no longer holds the value the store was loaded with
    StaleRecord {
        at: CellRef,
        expected: String,
        found: Option<String>,
    },
    /// Reading or writing the workbook failed
    Workbook(anyhow::Error),
}

impl QueryError {
    /// The store no longer matches the workbook and should be reloaded
    pub fn needs_reload(&self) -> bool {
        matches!(self, QueryError::StaleRecord { .. })
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidSelection { kind, key } => {
                write!(f, "Invalid {} selection: {}", kind, key)
            }
            QueryError::EmptyContactName => write!(f, "Contact name must not be empty"),
            QueryError::StaleRecord { at, expected, found } => match found {
                Some(found) => write!(
                    f,
                    "Workbook changed on disk: {} holds '{}', expected '{}'",
                    at, found, expected
                ),
                None => write!(
                    f,
                    "Workbook changed on disk: {} no longer exists",
                    at
                ),
            },
            QueryError::Workbook(err) => write!(f, "Workbook update failed: {:#}", err),
        }
    }
}

impl std::error::Error for QueryError {}
