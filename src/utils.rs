use crate::error::{CostHierarchyError, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

/// Normalises any date to the first day of its month.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Parses a billing month from `YYYY-MM` or `YYYY-MM-DD` and returns the first of that month.
pub fn parse_month(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(first_of_month(date));
    }

    NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
        .map_err(|e| CostHierarchyError::InvalidMonth(format!("'{}': {}", trimmed, e)))
}

/// Short month label such as `Jan-2024`.
pub fn month_label(month: NaiveDate) -> String {
    month.format("%b-%Y").to_string()
}

/// Fixed two-place rendering used for every money figure shown to a user.
pub fn format_money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Renders a completion fraction (0.4) as a percentage (`40.00%`).
pub fn format_percent(fraction: Decimal) -> String {
    format!("{}%", format_money(fraction * Decimal::ONE_HUNDRED))
}

/// Unit price basis: `scheduled_value / quantity`, zero when quantity is not positive.
pub fn unit_price(scheduled_value: Decimal, quantity: Decimal, scale: u32) -> Decimal {
    if quantity <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    match scheduled_value.checked_div(quantity) {
        Some(price) => price.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero),
        None => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_first_of_month() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            first_of_month(date),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_month_formats() {
        assert_eq!(
            parse_month("2024-03").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(
            parse_month(" 2024-03-31 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_month("March 2024").is_err());
    }

    #[test]
    fn test_month_label() {
        let month = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(month_label(month), "Jan-2024");
    }

    #[test]
    fn test_format_money_and_percent() {
        assert_eq!(format_money(dec!(1000)), "1000.00");
        assert_eq!(format_money(dec!(0.005)), "0.01");
        assert_eq!(format_percent(dec!(0.4)), "40.00%");
    }

    #[test]
    fn test_unit_price() {
        assert_eq!(unit_price(dec!(1000), dec!(3), 4), dec!(333.3333));
        assert_eq!(unit_price(dec!(1000), dec!(0), 4), Decimal::ZERO);
        assert_eq!(unit_price(dec!(1000), dec!(-2), 4), Decimal::ZERO);
        assert_eq!(unit_price(dec!(2), dec!(3), 4), dec!(0.6667));
    }
}
