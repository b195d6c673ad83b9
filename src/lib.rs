//! # Cost Hierarchy Builder
//!
//! A library for rebuilding the cost structure of a construction bid from a flat
//! spreadsheet export and reconciling monthly pay applications against it.
//!
//! ## Core Concepts
//!
//! - **Bid rows**: an ordered, flattened list of pay items, details, crews and cost
//!   components. No row says how deep it sits.
//! - **Hierarchy reconstruction**: a single forward pass with a stack of open
//!   ancestors. A row belongs to the innermost ancestor whose budget is not yet
//!   accounted for by the children seen so far.
//! - **Validation**: children's budgets (and, per billing month, children's billed
//!   amounts) must add up to their parent within a one-cent tolerance.
//! - **Distribution**: when a parent was billed but its children were not, the
//!   parent's percent complete is pushed down to each child's own quantity.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cost_hierarchy_builder::*;
//! use rust_decimal_macros::dec;
//!
//! let rows = vec![
//!     BidRow::new("Storm Drain", dec!(1000)).with_item_number("10"),
//!     BidRow::new("Trench", dec!(600)).with_cost_method("Detail"),
//!     BidRow::new("Labor", dec!(300)).with_cost_method("Labor"),
//!     BidRow::new("Equipment", dec!(300)).with_cost_method("Equipment"),
//!     BidRow::new("Pipe", dec!(400)).with_cost_method("Material"),
//! ];
//!
//! let tree = build_cost_tree(&rows);
//! let result = validate_budget_hierarchy(&tree);
//! assert!(result.is_valid);
//! ```

pub mod classifier;
pub mod config;
pub mod distribution;
pub mod error;
pub mod hierarchy;
pub mod ingestion;
pub mod ledger;
pub mod report;
pub mod schema;
pub mod tree;
pub mod utils;
pub mod validation;

pub use classifier::{classify_row, Classification, RowClassifier};
pub use config::{EngineConfig, TOLERANCE};
pub use distribution::{
    distribute_parent_quantities, DistributionDetail, DistributionResult, QuantityDistributor,
};
pub use error::{CostHierarchyError, Result};
pub use hierarchy::{build_cost_tree, HierarchyBuilder};
pub use ingestion::{clean_numeric, convert_bid_rows, convert_pay_app_rows, IngestionReport};
pub use ledger::PayApplicationLedger;
pub use report::{CostTreeReport, ReportEntry};
pub use schema::*;
pub use tree::CostTree;
pub use validation::{
    validate_all, validate_budget_hierarchy, validate_monthly_amounts, BudgetValidator,
    MismatchKind, MonthlyAmountValidator, ValidationIssue, ValidationResult,
};

use chrono::NaiveDate;
use log::{debug, info};

/// Everything produced by importing one job: the tree, its billing facts and the
/// warnings raised while reading numbers.
#[derive(Debug, Clone)]
pub struct ImportedJob {
    pub tree: CostTree,
    pub ledger: PayApplicationLedger,
    pub warnings: Vec<String>,
}

pub struct ReconciliationEngine {
    config: EngineConfig,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }
}

impl ReconciliationEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn build(&self, rows: &[BidRow]) -> CostTree {
        HierarchyBuilder::new(&self.config).build(rows)
    }

    /// Converts an extracted batch into a tree plus ledger, recovering from bad
    /// numbers with warnings.
    pub fn import(&self, batch: &ImportBatch) -> ImportedJob {
        let bid = convert_bid_rows(&batch.bid_rows);
        let tree = self.build(&bid.rows);

        let pay_apps = convert_pay_app_rows(&batch.pay_app_rows, &tree);
        let ledger = PayApplicationLedger::from_facts(pay_apps.rows);

        let mut warnings = bid.warnings;
        warnings.extend(pay_apps.warnings);

        info!(
            "Imported {} cost items and {} pay application facts",
            tree.len(),
            ledger.len()
        );
        if !warnings.is_empty() {
            debug!("Import raised {} warning(s)", warnings.len());
        }

        ImportedJob {
            tree,
            ledger,
            warnings,
        }
    }

    /// Records a fact after checking that it refers to an item of `tree`.
    pub fn record_fact(
        &self,
        tree: &CostTree,
        ledger: &mut PayApplicationLedger,
        fact: PayApplicationFact,
    ) -> Result<()> {
        tree.require(fact.cost_item_id)?;
        ledger.upsert(fact);
        Ok(())
    }

    pub fn validate_budget(&self, tree: &CostTree) -> ValidationResult {
        BudgetValidator::new(tree, &self.config).validate()
    }

    pub fn validate_monthly_amounts(
        &self,
        tree: &CostTree,
        ledger: &PayApplicationLedger,
    ) -> ValidationResult {
        MonthlyAmountValidator::new(tree, ledger, &self.config).validate()
    }

    pub fn validate_all(&self, tree: &CostTree, ledger: &PayApplicationLedger) -> ValidationResult {
        validation::validate_all_with(tree, ledger, &self.config)
    }

    pub fn distribute(
        &self,
        tree: &CostTree,
        ledger: &mut PayApplicationLedger,
        month: NaiveDate,
    ) -> DistributionResult {
        QuantityDistributor::new(tree).distribute(ledger, month)
    }

    pub fn distribute_months(
        &self,
        tree: &CostTree,
        ledger: &mut PayApplicationLedger,
        months: &[NaiveDate],
    ) -> DistributionResult {
        QuantityDistributor::new(tree).distribute_months(ledger, months)
    }
}
