//! Terminal output for the interactive session

use colored::*;
use unicode_width::UnicodeWidthStr;

use crate::query::{ContactUpdate, GoldenCustomer, OrderLine, ProductOrders};
use crate::store::{LoadError, Store};

pub fn main_menu() {
    println!();
    println!("{}", "Choose an option:".bold());
    println!("  1. List customers who ordered a product");
    println!("  2. Change a customer's contact person");
    println!("  3. Show the \"golden\" customer for a year and month");
    println!("  4. Exit");
    println!();
}

pub fn invalid_choice(input: &str) {
    println!("{} '{}'", "Invalid choice:".red(), input.trim());
}

pub fn loaded(store: &Store) {
    println!(
        "{} {} ({} products, {} customers, {} orders)",
        "Loaded".green(),
        store.path().display().to_string().cyan(),
        store.products().len(),
        store.customers().len(),
        store.orders().len()
    );
}

/// Load failures with their full cause chain
pub fn load_failed(err: &LoadError) {
    match err {
        LoadError::FileNotFound { .. } => println!("{}", err.to_string().red()),
        _ => {
            println!("{}", "Failed to load the workbook:".red().bold());
            println!("  {}", err);
            let mut source = std::error::Error::source(err);
            while let Some(cause) = source {
                println!("  {} {}", "caused by:".dimmed(), cause);
                source = cause.source();
            }
        }
    }
}

pub fn error(err: &dyn std::fmt::Display) {
    println!("{}", err.to_string().red());
}

/// One selectable entry: store key, label, and a dimmed detail column
pub struct ListEntry<'a> {
    pub key: usize,
    pub label: &'a str,
    pub detail: String,
}

/// Numbered list keyed by store key, with the label column padded to its
/// display width so the detail column lines up for Cyrillic text too
pub fn selection_list(title: &str, entries: &[ListEntry<'_>]) {
    let key_width = entries
        .iter()
        .map(|e| e.key.to_string().len())
        .max()
        .unwrap_or(1);
    let label_width = entries.iter().map(|e| e.label.width()).max().unwrap_or(0);

    println!();
    println!("{}", title.bold());
    for entry in entries {
        let padding = " ".repeat(label_width - entry.label.width());
        println!(
            "  {:>kw$}. {}{}  {}",
            entry.key,
            entry.label,
            padding,
            entry.detail.dimmed(),
            kw = key_width
        );
    }
    println!();
    println!("  {:>kw$}. {}", 0, "Back to main menu".dimmed(), kw = key_width);
    println!();
}

pub fn product_orders(result: &ProductOrders<'_>, date_format: &str) {
    println!();
    if result.lines.is_empty() {
        println!("{} '{}'", "No orders for".yellow(), result.product.name);
        return;
    }

    println!("{} {}", "Customers who ordered".bold(), result.product.name.cyan().bold());
    for line in &result.lines {
        println!();
        for (label, value) in order_line_fields(line, result, date_format) {
            println!("  {} {}", pad_label(label), value);
        }
    }
}

/// Label/value pairs shown for one order line
pub fn order_line_fields(
    line: &OrderLine<'_>,
    result: &ProductOrders<'_>,
    date_format: &str,
) -> [(&'static str, String); 5] {
    [
        ("Organization:", line.customer.organization.clone()),
        ("Contact person:", line.customer.contact_person.clone()),
        ("Quantity:", line.order.quantity.to_string()),
        ("Price:", result.product.price.to_string()),
        ("Order date:", line.order.order_date.format(date_format).to_string()),
    ]
}

fn pad_label(label: &str) -> String {
    const LABEL_WIDTH: usize = 16;
    let padding = LABEL_WIDTH.saturating_sub(label.width());
    format!("{}{}", label.dimmed(), " ".repeat(padding))
}

pub fn golden_customer(golden: Option<&GoldenCustomer<'_>>, year: i32, month: u32) {
    println!();
    println!("{}", golden_customer_line(golden, year, month));
}

pub fn golden_customer_line(golden: Option<&GoldenCustomer<'_>>, year: i32, month: u32) -> String {
    match golden {
        None => format!("No golden customer for {}-{:02}", year, month),
        Some(golden) => {
            let name = match golden.customer {
                Some(customer) => customer.organization.clone(),
                None => format!("customer code {} (not in the customer list)", golden.customer_code),
            };
            let noun = if golden.order_count == 1 { "order" } else { "orders" };
            format!(
                "Golden customer for {}-{:02}: {} ({} {})",
                year, month, name, golden.order_count, noun
            )
        }
    }
}

pub fn contact_updated(update: &ContactUpdate) {
    println!();
    println!(
        "{} {}: {} -> {}",
        "Contact person updated for".green(),
        update.organization.bold(),
        update.previous.dimmed(),
        update.current.cyan()
    );
}
