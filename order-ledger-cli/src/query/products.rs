//! Customers who ordered a product

use crate::store::{Customer, Order, Product, Store};

use super::{QueryError, Selection};

/// One order of the product matched to one customer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderLine<'a> {
    pub customer: &'a Customer,
    pub order: &'a Order,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductOrders<'a> {
    pub product: &'a Product,
    /// Empty when nobody ordered the product
    pub lines: Vec<OrderLine<'a>>,
}

/// Customers who ordered the product at `product_key`.
///
/// Orders are visited in load order; each is matched against every customer
/// with its customer code, so an order whose customer is missing from the
/// customer list contributes no line.
pub fn customers_by_product(store: &Store, product_key: usize) -> Result<ProductOrders<'_>, QueryError> {
    let product = store
        .products()
        .get(&product_key)
        .ok_or(QueryError::InvalidSelection {
            kind: Selection::Product,
            key: product_key,
        })?;

    let lines = store
        .orders()
        .iter()
        .filter(|order| order.product_code == product.code)
        .flat_map(|order| {
            store
                .customers()
                .values()
                .filter(move |customer| customer.code == order.customer_code)
                .map(move |customer| OrderLine { customer, order })
        })
        .collect();

    Ok(ProductOrders { product, lines })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetMarkers;
    use crate::test_support::{example_workbook, ledger_workbook};

    #[test]
    fn test_example_scenario() {
        let fixture = example_workbook();
        let store = Store::load(fixture.path(), &SheetMarkers::default()).unwrap();

        let result = customers_by_product(&store, 1).unwrap();
        assert_eq!(result.product.name, "Widget");
        assert_eq!(result.lines.len(), 1);

        let line = result.lines[0];
        assert_eq!(line.customer.organization, "Acme");
        assert_eq!(line.customer.contact_person, "Jane Doe");
        assert_eq!(line.order.quantity, 5);
    }

    #[test]
    fn test_lines_match_product_code_in_load_order() {
        let fixture = ledger_workbook();
        let store = Store::load(fixture.path(), &SheetMarkers::default()).unwrap();

        // Store key 1 is the Widget, business code 10
        let result = customers_by_product(&store, 1).unwrap();
        assert_eq!(result.product.code, 10);

        let pairs: Vec<_> = result
            .lines
            .iter()
            .map(|line| (line.order.order_code, line.customer.organization.as_str()))
            .collect();
        // Order 8 references customer 99, which does not exist
        assert_eq!(
            pairs,
            vec![(1, "Acme"), (3, "Globex"), (4, "Initech"), (7, "Acme")]
        );
        assert!(result.lines.iter().all(|l| l.order.product_code == 10));
    }

    #[test]
    fn test_product_without_orders() {
        let fixture = ledger_workbook();
        let store = Store::load(fixture.path(), &SheetMarkers::default()).unwrap();

        let result = customers_by_product(&store, 3).unwrap();
        assert_eq!(result.product.name, "Sprocket");
        assert!(result.lines.is_empty());
    }

    #[test]
    fn test_invalid_product_key() {
        let fixture = ledger_workbook();
        let store = Store::load(fixture.path(), &SheetMarkers::default()).unwrap();

        for key in [0, 4, 10] {
            let err = customers_by_product(&store, key).unwrap_err();
            assert!(matches!(
                err,
                QueryError::InvalidSelection { kind: Selection::Product, key: k } if k == key
            ));
        }
    }
}
