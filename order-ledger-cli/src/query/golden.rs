//! Golden customer: most orders within a calendar month

use chrono::Datelike;

use crate::store::{Customer, Store};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoldenCustomer<'a> {
    pub customer_code: i64,
    pub order_count: usize,
    /// `None` when no customer carries the winning code
    pub customer: Option<&'a Customer>,
}

/// Customer code with the most orders dated in `year`-`month`.
///
/// Ties go to the code whose first order in the period comes earliest in
/// load order. `None` when the period has no orders or `month` is not 1..=12.
pub fn golden_customer(store: &Store, year: i32, month: u32) -> Option<GoldenCustomer<'_>> {
    if !(1..=12).contains(&month) {
        return None;
    }

    // (customer code, order count) in order of first appearance
    let mut tally: Vec<(i64, usize)> = Vec::new();
    for order in store
        .orders()
        .iter()
        .filter(|o| o.order_date.year() == year && o.order_date.month() == month)
    {
        match tally.iter_mut().find(|(code, _)| *code == order.customer_code) {
            Some((_, count)) => *count += 1,
            None => tally.push((order.customer_code, 1)),
        }
    }

    let (customer_code, order_count) = tally
        .into_iter()
        .reduce(|best, next| if next.1 > best.1 { next } else { best })?;

    let customer = store
        .customers()
        .values()
        .find(|customer| customer.code == customer_code);

    Some(GoldenCustomer {
        customer_code,
        order_count,
        customer,
    })
}
