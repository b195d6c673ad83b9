use crate::config::EngineConfig;
use crate::ledger::PayApplicationLedger;
use crate::schema::CostItem;
use crate::tree::CostTree;
use crate::utils::{format_money, month_label};
use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MismatchKind {
    BudgetMismatch,
    MonthlyAmountMismatch,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetMismatch => write!(f, "BUDGET_MISMATCH"),
            Self::MonthlyAmountMismatch => write!(f, "MONTHLY_AMOUNT_MISMATCH"),
        }
    }
}

/// A parent whose direct children do not add up to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: MismatchKind,
    pub item_id: Uuid,
    pub item_number: String,
    /// Billing month; `None` for budget checks.
    pub month: Option<NaiveDate>,
    /// The parent's own figure
    pub expected: Decimal,
    /// Sum over the direct children
    pub actual: Decimal,
    pub difference: Decimal,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            None => write!(
                f,
                "{}: Item {} - expected budget {}, got {} (diff: {})",
                self.kind,
                self.item_number,
                format_money(self.expected),
                format_money(self.actual),
                format_money(self.difference)
            ),
            Some(month) => write!(
                f,
                "{}: Item {}, Month {} - expected {}, got {} (diff: {})",
                self.kind,
                self.item_number,
                month_label(month),
                format_money(self.expected),
                format_money(self.actual),
                format_money(self.difference)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    /// Records a mismatch when `|expected - actual|` exceeds `tolerance`.
    /// A difference exactly equal to the tolerance passes.
    fn check_sum(
        &mut self,
        kind: MismatchKind,
        parent: &CostItem,
        month: Option<NaiveDate>,
        expected: Decimal,
        actual: Decimal,
        tolerance: Decimal,
    ) {
        let difference = expected
            .checked_sub(actual)
            .map(|d| d.abs())
            .unwrap_or(Decimal::MAX);
        if difference <= tolerance {
            return;
        }

        let issue = ValidationIssue {
            kind,
            item_id: parent.id,
            item_number: parent.item_number.clone(),
            month,
            expected,
            actual,
            difference,
        };
        debug!("{}", issue);

        self.is_valid = false;
        self.errors.push(issue);
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        let status = if self.is_valid { "VALID" } else { "INVALID" };
        output.push_str(&format!("# Validation Result: {}\n\n", status));

        output.push_str(&format!("## Errors ({})\n\n", self.errors.len()));
        for error in &self.errors {
            output.push_str(&format!("- {}\n", error));
        }
        output.push('\n');

        output.push_str(&format!("## Warnings ({})\n\n", self.warnings.len()));
        for warning in &self.warnings {
            output.push_str(&format!("- {}\n", warning));
        }
        output.push('\n');

        output
    }
}

/// Checks that every parent's budget equals the sum of its direct children's budgets.
pub struct BudgetValidator<'a> {
    tree: &'a CostTree,
    tolerance: Decimal,
}

impl<'a> BudgetValidator<'a> {
    pub fn new(tree: &'a CostTree, config: &EngineConfig) -> Self {
        Self {
            tree,
            tolerance: config.tolerance,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        for parent in self.tree.parents() {
            let mut child_sum = Some(Decimal::ZERO);
            for child in self.tree.children(parent.id) {
                match child.budget {
                    Some(budget) => child_sum = child_sum.and_then(|sum| sum.checked_add(budget)),
                    None => result
                        .warnings
                        .push(format!("Invalid budget for item {}", child.item_number)),
                }
            }

            let Some(parent_budget) = parent.budget else {
                result
                    .warnings
                    .push(format!("Invalid budget for parent {}", parent.item_number));
                continue;
            };

            let Some(child_sum) = child_sum else {
                result.warnings.push(format!(
                    "Budget overflow summing children of item {}: not checked",
                    parent.item_number
                ));
                continue;
            };

            result.check_sum(
                MismatchKind::BudgetMismatch,
                parent,
                None,
                parent_budget,
                child_sum,
                self.tolerance,
            );
        }

        info!(
            "Budget validation finished: {} mismatch(es), {} warning(s)",
            result.errors.len(),
            result.warnings.len()
        );
        result
    }
}

/// Checks, per billing month, that a parent's billed amount equals its children's.
///
/// Billed amount is `quantity_this_month * unit_price`. Parents without a fact for a
/// month are not checked for that month; children without one count as zero.
pub struct MonthlyAmountValidator<'a> {
    tree: &'a CostTree,
    ledger: &'a PayApplicationLedger,
    tolerance: Decimal,
}

impl<'a> MonthlyAmountValidator<'a> {
    pub fn new(tree: &'a CostTree, ledger: &'a PayApplicationLedger, config: &EngineConfig) -> Self {
        Self {
            tree,
            ledger,
            tolerance: config.tolerance,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        for month in self.ledger.months() {
            for parent in self.tree.parents() {
                let Some(parent_fact) = self.ledger.get(parent.id, month) else {
                    continue;
                };

                let quantity = parent_fact.quantity_this_month;
                let Some(parent_amount) = self.billed_amount(parent, quantity, month, &mut result)
                else {
                    result.warnings.push(overflow_warning(parent, month));
                    continue;
                };

                let mut child_sum = Some(Decimal::ZERO);
                for child in self.tree.children(parent.id) {
                    let quantity = self.ledger.quantity_for(child.id, month);
                    if quantity.is_zero() {
                        continue;
                    }
                    child_sum = self
                        .billed_amount(child, quantity, month, &mut result)
                        .zip(child_sum)
                        .and_then(|(amount, sum)| sum.checked_add(amount));
                    if child_sum.is_none() {
                        break;
                    }
                }
                let Some(child_sum) = child_sum else {
                    result.warnings.push(overflow_warning(parent, month));
                    continue;
                };

                result.check_sum(
                    MismatchKind::MonthlyAmountMismatch,
                    parent,
                    Some(month),
                    parent_amount,
                    child_sum,
                    self.tolerance,
                );
            }
        }

        info!(
            "Monthly amount validation finished: {} mismatch(es), {} warning(s)",
            result.errors.len(),
            result.warnings.len()
        );
        result
    }

    /// `quantity * unit_price`, or `None` on overflow. An item whose unit price fell
    /// back to zero despite a non-zero scheduled value bills at zero and is noted.
    fn billed_amount(
        &self,
        item: &CostItem,
        quantity: Decimal,
        month: NaiveDate,
        result: &mut ValidationResult,
    ) -> Option<Decimal> {
        if item.unit_price.is_zero()
            && item.quantity <= Decimal::ZERO
            && !item.scheduled_value.is_zero()
        {
            result.warnings.push(format!(
                "Undeterminable unit price for item {} month {}: quantity basis is {}, billed at 0",
                item.item_number,
                month_label(month),
                item.quantity
            ));
        }
        quantity.checked_mul(item.unit_price)
    }
}

fn overflow_warning(parent: &CostItem, month: NaiveDate) -> String {
    format!(
        "Amount overflow for item {} month {}: not checked",
        parent.item_number,
        month_label(month)
    )
}

pub fn validate_budget_hierarchy(tree: &CostTree) -> ValidationResult {
    BudgetValidator::new(tree, &EngineConfig::default()).validate()
}

pub fn validate_monthly_amounts(tree: &CostTree, ledger: &PayApplicationLedger) -> ValidationResult {
    MonthlyAmountValidator::new(tree, ledger, &EngineConfig::default()).validate()
}

/// Runs the budget check followed by the monthly amount check and merges the findings.
pub fn validate_all_with(
    tree: &CostTree,
    ledger: &PayApplicationLedger,
    config: &EngineConfig,
) -> ValidationResult {
    let mut combined = BudgetValidator::new(tree, config).validate();
    combined.merge(MonthlyAmountValidator::new(tree, ledger, config).validate());
    combined
}

pub fn validate_all(tree: &CostTree, ledger: &PayApplicationLedger) -> ValidationResult {
    validate_all_with(tree, ledger, &EngineConfig::default())
}
