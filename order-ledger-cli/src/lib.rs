//! Product, customer and order records kept in an Excel workbook
//!
//! [`store::Store`] loads the three record sheets into memory, [`query`] answers
//! questions about them and writes contact changes back, [`cli`] drives the
//! interactive session on top.

pub mod cli;
pub mod config;
pub mod query;
pub mod store;
pub mod workbook;

#[cfg(test)]
mod test_support;
