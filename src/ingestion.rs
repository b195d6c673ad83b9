use crate::schema::{BidRow, FactOrigin, PayApplicationFact, RawBidRow, RawPayAppRow};
use crate::tree::CostTree;
use crate::utils::{month_label, parse_month};
use log::warn;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, Default)]
pub struct IngestionReport<T> {
    pub rows: Vec<T>,
    pub warnings: Vec<String>,
}

/// Parses a numeric cell as exported from a spreadsheet.
///
/// Blank cells are zero. Currency symbols, thousands separators, spaces and percent
/// signs are dropped. Spreadsheet error values (`#REF!`, `#N/A`, ...) are rejected.
pub fn clean_numeric(raw: &str) -> std::result::Result<Decimal, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }

    if trimmed.starts_with('#') {
        return Err(format!("spreadsheet error value '{}'", trimmed));
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '%'))
        .collect();

    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|e| format!("cannot parse '{}': {}", trimmed, e))
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn numeric_or_zero(raw: &str, field: &str, row_number: usize, warnings: &mut Vec<String>) -> Decimal {
    match clean_numeric(raw) {
        Ok(value) => value,
        Err(e) => {
            let message = format!("Row {}: invalid {} ({}); using 0", row_number, field, e);
            warn!("{}", message);
            warnings.push(message);
            Decimal::ZERO
        }
    }
}

/// Converts extracted bid rows into typed rows, recovering from bad numbers in place.
///
/// An unparsable budget is kept as `None` so the budget check can report it again;
/// an unparsable quantity or bid price becomes zero.
pub fn convert_bid_rows(rows: &[RawBidRow]) -> IngestionReport<BidRow> {
    let mut report = IngestionReport {
        rows: Vec::with_capacity(rows.len()),
        warnings: Vec::new(),
    };

    for (idx, raw) in rows.iter().enumerate() {
        let row_number = idx + 1;

        let budget = match clean_numeric(&raw.total_direct_cost) {
            Ok(value) => Some(value),
            // blank rows are skipped by the builder anyway
            Err(_) if raw.description.trim().is_empty() => None,
            Err(e) => {
                let message = format!("Row {}: invalid budget ({})", row_number, e);
                warn!("{}", message);
                report.warnings.push(message);
                None
            }
        };

        let quantity = numeric_or_zero(&raw.quantity, "quantity", row_number, &mut report.warnings);
        let scheduled_value = numeric_or_zero(
            &raw.total_bid_price,
            "total bid price",
            row_number,
            &mut report.warnings,
        );

        report.rows.push(BidRow {
            item_number: raw.item_number.trim().to_string(),
            job_cost_id: non_blank(&raw.job_cost_id),
            description: raw.description.trim().to_string(),
            quantity,
            unit: non_blank(&raw.unit),
            cost_method: raw.cost_method.trim().to_string(),
            scheduled_value,
            production_rate: raw.production_rate.trim().to_string(),
            budget,
        });
    }

    report
}

/// Resolves pay application rows against a built tree by item number.
///
/// Rows naming an unknown item, or carrying an unreadable month or quantity, are
/// skipped with a warning. An unreadable stored-materials figure becomes zero.
pub fn convert_pay_app_rows(
    rows: &[RawPayAppRow],
    tree: &CostTree,
) -> IngestionReport<PayApplicationFact> {
    let mut report = IngestionReport {
        rows: Vec::with_capacity(rows.len()),
        warnings: Vec::new(),
    };

    for (idx, raw) in rows.iter().enumerate() {
        let row_number = idx + 1;

        let Some(item) = tree.get_by_number(&raw.item_number) else {
            let message = format!(
                "Row {}: unknown item number '{}'",
                row_number,
                raw.item_number.trim()
            );
            warn!("{}", message);
            report.warnings.push(message);
            continue;
        };

        let month = match parse_month(&raw.month) {
            Ok(month) => month,
            Err(e) => {
                let message = format!("Row {}: {}", row_number, e);
                warn!("{}", message);
                report.warnings.push(message);
                continue;
            }
        };

        let quantity_this_month = match clean_numeric(&raw.quantity_this_month) {
            Ok(quantity) => quantity,
            Err(e) => {
                let message = format!(
                    "Row {}: invalid quantity for item {} month {} ({})",
                    row_number,
                    item.item_number,
                    month_label(month),
                    e
                );
                warn!("{}", message);
                report.warnings.push(message);
                continue;
            }
        };

        let stored_materials = numeric_or_zero(
            &raw.stored_materials,
            "stored materials",
            row_number,
            &mut report.warnings,
        );

        report.rows.push(PayApplicationFact {
            cost_item_id: item.id,
            month,
            quantity_this_month,
            stored_materials,
            origin: FactOrigin::Imported,
        });
    }

    report
}
