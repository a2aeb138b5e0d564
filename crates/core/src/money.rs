//! Money values.
//!
//! All monetary amounts (unit prices, subtotals, order totals) are
//! fixed-point [`rust_decimal::Decimal`] values. Decimal arithmetic keeps the
//! core invariant `total == sum of subtotals` exact; there is no floating
//! rounding anywhere in the pricing path.

use rust_decimal::Decimal;

/// Monetary amount (fixed-point decimal).
pub type Amount = Decimal;

/// Render an amount with exactly two decimal places, e.g. `"20.00"`.
///
/// Wire responses expose prices and totals as strings in this form.
pub fn display_2dp(amount: Amount) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Parse an amount from its wire string form.
///
/// Accepts plain decimal notation (`"10"`, `"10.5"`, `"10.50"`).
pub fn parse_amount(raw: &str) -> Result<Amount, crate::DomainError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| crate::DomainError::validation(format!("invalid amount {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[test]
    fn displays_two_decimal_places() {
        assert_eq!(display_2dp(dec("20")), "20.00");
        assert_eq!(display_2dp(dec("19.5")), "19.50");
        assert_eq!(display_2dp(dec("0.005")), "0.00");
    }

    #[test]
    fn parses_plain_decimal_strings() {
        assert_eq!(parse_amount("10.50").unwrap(), dec("10.5"));
        assert_eq!(parse_amount(" 3 ").unwrap(), dec("3"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_amount("ten dollars").is_err());
    }
}
