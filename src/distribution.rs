use crate::ledger::PayApplicationLedger;
use crate::schema::{FactOrigin, PayApplicationFact};
use crate::tree::CostTree;
use crate::utils::{first_of_month, format_percent, month_label};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionDetail {
    pub parent_id: Uuid,
    pub parent_item_number: String,
    pub month: NaiveDate,
    pub children_count: usize,
    /// Fraction in `[0, 1]` for normal progress (0.4 means 40%)
    pub percent_complete: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionResult {
    pub items_updated: usize,
    pub months_processed: Vec<NaiveDate>,
    pub details: Vec<DistributionDetail>,
}

impl DistributionResult {
    pub fn merge(&mut self, other: DistributionResult) {
        self.items_updated += other.items_updated;
        for month in other.months_processed {
            if !self.months_processed.contains(&month) {
                self.months_processed.push(month);
            }
        }
        self.details.extend(other.details);
    }
}

/// Fills in child quantities for a month from the parent's percent complete.
///
/// Fires only for parents that billed a non-zero quantity in the month while every
/// direct child billed nothing. Each child's cumulative quantity is set to
/// `child_total * parent_cumulative / parent_total`; the month quantity written is
/// the increase over the child's cumulative before the month, never below zero.
///
/// Parents are visited in sort order, so a child that is itself a parent is
/// distributed further down within the same run.
pub struct QuantityDistributor<'a> {
    tree: &'a CostTree,
}

impl<'a> QuantityDistributor<'a> {
    pub fn new(tree: &'a CostTree) -> Self {
        Self { tree }
    }

    pub fn distribute(&self, ledger: &mut PayApplicationLedger, month: NaiveDate) -> DistributionResult {
        let month = first_of_month(month);
        let mut result = DistributionResult {
            months_processed: vec![month],
            ..DistributionResult::default()
        };

        for parent in self.tree.parents() {
            let parent_quantity = ledger.quantity_for(parent.id, month);
            if ledger.get(parent.id, month).is_none() || parent_quantity.is_zero() {
                continue;
            }

            let children = self.tree.children(parent.id);
            if children.is_empty() {
                continue;
            }

            if children
                .iter()
                .any(|child| !ledger.quantity_for(child.id, month).is_zero())
            {
                debug!(
                    "Skipping {} for {}: children already billed",
                    parent.item_number,
                    month_label(month)
                );
                continue;
            }

            let parent_total = parent.quantity;
            if parent_total.is_zero() {
                continue;
            }
            let parent_cumulative = ledger.cumulative_through(parent.id, month);
            let Some(percent_complete) = parent_cumulative.checked_div(parent_total) else {
                continue;
            };

            let mut written = 0;
            for child in &children {
                let previous = ledger.cumulative_before(child.id, month);
                let Some(increase) = child
                    .quantity
                    .checked_mul(percent_complete)
                    .and_then(|cumulative| cumulative.checked_sub(previous))
                else {
                    warn!(
                        "Quantity overflow distributing {} to {} for {}, child left unbilled",
                        parent.item_number,
                        child.item_number,
                        month_label(month)
                    );
                    continue;
                };

                ledger.upsert(PayApplicationFact {
                    cost_item_id: child.id,
                    month,
                    quantity_this_month: increase.max(Decimal::ZERO),
                    stored_materials: Decimal::ZERO,
                    origin: FactOrigin::Distributed,
                });
                written += 1;
            }

            debug!(
                "Distributed {} of {} to {} children for {}",
                format_percent(percent_complete),
                parent.item_number,
                children.len(),
                month_label(month)
            );

            result.items_updated += written;
            result.details.push(DistributionDetail {
                parent_id: parent.id,
                parent_item_number: parent.item_number.clone(),
                month,
                children_count: children.len(),
                percent_complete,
            });
        }

        info!(
            "Distribution for {} updated {} item(s) under {} parent(s)",
            month_label(month),
            result.items_updated,
            result.details.len()
        );
        result
    }

    /// Distributes each month in ascending order and merges the results.
    pub fn distribute_months(
        &self,
        ledger: &mut PayApplicationLedger,
        months: &[NaiveDate],
    ) -> DistributionResult {
        let mut ordered: Vec<NaiveDate> = months.iter().map(|m| first_of_month(*m)).collect();
        ordered.sort();
        ordered.dedup();

        let mut combined = DistributionResult::default();
        for month in ordered {
            combined.merge(self.distribute(ledger, month));
        }
        combined
    }
}

pub fn distribute_parent_quantities(
    tree: &CostTree,
    ledger: &mut PayApplicationLedger,
    month: NaiveDate,
) -> DistributionResult {
    QuantityDistributor::new(tree).distribute(ledger, month)
}
