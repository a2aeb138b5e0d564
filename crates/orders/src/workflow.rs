//! Order pricing: the pure half of the order-placement workflow.
//!
//! Given the requested lines and a snapshot of the products they reference,
//! [`price_order`] validates quantities and stock, snapshots unit prices,
//! and computes subtotals and the order total with decimal arithmetic.
//!
//! Nothing here touches storage. A backend is expected to:
//! 1. load (and lock) the referenced products,
//! 2. call [`price_order`],
//! 3. persist the order, its line items, and the stock decrements in one
//!    atomic unit — or nothing at all.
//!
//! Failing before step 3 therefore never leaves partial state behind.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tienda_catalog::Product;
use tienda_core::{Amount, DomainError, DomainResult, ProductId};

/// One requested order line: a product and how many units of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A priced line: price snapshot taken, subtotal computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Amount,
    pub subtotal: Amount,
}

/// Result of pricing an order request. Lines keep their input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub total: Amount,
}

/// Price an order request against a product snapshot.
///
/// Errors:
/// - [`DomainError::Validation`] for a non-positive quantity,
/// - [`DomainError::NotFound`] for an unknown product id,
/// - [`DomainError::Conflict`] when the requested quantity exceeds available
///   stock (counted cumulatively when the same product appears on several
///   lines).
///
/// Any error rejects the whole request; an empty request prices to an empty
/// order with total zero.
pub fn price_order(
    requested: &[RequestedLine],
    products: &HashMap<ProductId, Product>,
) -> DomainResult<PricedOrder> {
    let mut lines = Vec::with_capacity(requested.len());
    let mut total = Decimal::ZERO;
    let mut reserved: HashMap<ProductId, i64> = HashMap::new();

    for line in requested {
        if line.quantity <= 0 {
            return Err(DomainError::validation(
                "quantity must be a positive integer",
            ));
        }

        let product = products.get(&line.product_id).ok_or_else(|| {
            DomainError::not_found(format!("product {} not found", line.product_id))
        })?;

        let already_reserved = reserved.entry(line.product_id).or_insert(0);
        let cumulative = already_reserved
            .checked_add(line.quantity)
            .ok_or_else(|| DomainError::validation("requested quantity is too large"))?;
        if !product.has_stock_for(cumulative) {
            return Err(DomainError::conflict(format!(
                "insufficient stock for product {}",
                line.product_id
            )));
        }
        *already_reserved = cumulative;

        let subtotal = product.price * Decimal::from(line.quantity);
        total += subtotal;

        lines.push(PricedLine {
            product_id: line.product_id,
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price: product.price,
            subtotal,
        });
    }

    Ok(PricedOrder { lines, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn product(id: i64, price: &str, stock: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("producto {id}"),
            description: String::new(),
            category: "general".into(),
            price: amount(price),
            stock,
            condition: "nuevo".into(),
            image: None,
        }
    }

    fn snapshot(products: Vec<Product>) -> HashMap<ProductId, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    fn line(product_id: i64, quantity: i64) -> RequestedLine {
        RequestedLine {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }

    #[test]
    fn prices_single_line_order() {
        let products = snapshot(vec![product(1, "10.00", 5)]);
        let priced = price_order(&[line(1, 2)], &products).unwrap();

        assert_eq!(priced.total, amount("20.00"));
        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.lines[0].subtotal, amount("20.00"));
        assert_eq!(priced.lines[0].unit_price, amount("10.00"));
    }

    #[test]
    fn empty_request_prices_to_zero() {
        let priced = price_order(&[], &HashMap::new()).unwrap();
        assert!(priced.lines.is_empty());
        assert_eq!(priced.total, Decimal::ZERO);
    }

    #[test]
    fn unknown_product_rejects_whole_request() {
        let products = snapshot(vec![product(1, "10.00", 5)]);
        let err = price_order(&[line(1, 1), line(9999, 1)], &products).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn zero_quantity_is_invalid_input() {
        let products = snapshot(vec![product(1, "10.00", 5)]);
        let err = price_order(&[line(1, 0)], &products).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_quantity_is_invalid_input() {
        let products = snapshot(vec![product(1, "10.00", 5)]);
        assert!(price_order(&[line(1, -2)], &products).is_err());
    }

    #[test]
    fn requesting_more_than_stock_is_a_conflict() {
        let products = snapshot(vec![product(1, "10.00", 3)]);
        let err = price_order(&[line(1, 4)], &products).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn duplicate_lines_count_against_stock_cumulatively() {
        let products = snapshot(vec![product(1, "10.00", 3)]);
        // 2 + 2 exceeds the 3 in stock even though each line alone fits.
        let err = price_order(&[line(1, 2), line(1, 2)], &products).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // 2 + 1 exactly drains it.
        let priced = price_order(&[line(1, 2), line(1, 1)], &products).unwrap();
        assert_eq!(priced.total, amount("30.00"));
    }

    #[test]
    fn cumulative_quantity_overflow_is_invalid_input() {
        let products = snapshot(vec![product(1, "0.01", i64::MAX)]);
        // Two lines whose sum does not fit in i64 must fail cleanly, not wrap.
        let err = price_order(&[line(1, i64::MAX), line(1, i64::MAX)], &products).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn lines_keep_input_order() {
        let products = snapshot(vec![product(1, "1.00", 9), product(2, "2.00", 9)]);
        let priced = price_order(&[line(2, 1), line(1, 1)], &products).unwrap();
        assert_eq!(priced.lines[0].product_id, ProductId::new(2));
        assert_eq!(priced.lines[1].product_id, ProductId::new(1));
    }

    #[test]
    fn cent_prices_stay_exact() {
        // 0.10 * 3 must be exactly 0.30, not 0.30000000000000004.
        let products = snapshot(vec![product(1, "0.10", 10)]);
        let priced = price_order(&[line(1, 3)], &products).unwrap();
        assert_eq!(priced.total, amount("0.30"));
    }

    proptest! {
        /// For any valid cart, the total is the exact sum of subtotals and
        /// each subtotal is exactly quantity x unit price.
        #[test]
        fn total_is_exact_sum_of_subtotals(
            cart in proptest::collection::vec((1i64..=50, 1i64..=20, 0u32..=10_000), 0..8)
        ) {
            let mut products = HashMap::new();
            let mut requested = Vec::new();

            for (i, (id, qty, cents)) in cart.iter().enumerate() {
                // Distinct product per line keeps stock checks independent.
                let pid = id + (i as i64) * 100;
                let price = Decimal::new(i64::from(*cents), 2);
                let mut p = product(pid, "0", i64::MAX);
                p.price = price;
                products.insert(p.id, p);
                requested.push(line(pid, *qty));
            }

            let priced = price_order(&requested, &products).unwrap();

            let mut sum = Decimal::ZERO;
            for (priced_line, (_, qty, _)) in priced.lines.iter().zip(cart.iter()) {
                prop_assert_eq!(priced_line.quantity, *qty);
                prop_assert_eq!(
                    priced_line.subtotal,
                    priced_line.unit_price * Decimal::from(*qty)
                );
                sum += priced_line.subtotal;
            }
            prop_assert_eq!(priced.total, sum);
        }
    }
}
