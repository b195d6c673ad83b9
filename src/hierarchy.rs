use crate::classifier::RowClassifier;
use crate::config::EngineConfig;
use crate::schema::{BidRow, CostItem};
use crate::tree::CostTree;
use crate::utils::unit_price;
use log::{debug, info};
use rust_decimal::Decimal;
use uuid::Uuid;

/// An ancestor still waiting for children to account for its budget.
#[derive(Debug, Clone)]
struct StackFrame {
    owner: usize,
    target: Decimal,
    running_sum: Decimal,
}

impl StackFrame {
    fn is_complete(&self, tolerance: Decimal) -> bool {
        self.running_sum >= self.target - tolerance
    }
}

/// Rebuilds the parent/child structure of a flat bid export in one forward pass.
///
/// No row declares its depth. A branch row (pay item, detail, crew) with a positive
/// budget opens a frame; each following row is attached to the innermost open frame
/// and adds its own budget to that frame's running sum. Before a row is attached,
/// every frame whose running sum has reached its budget (within tolerance) is closed.
///
/// Branch rows with a zero or negative budget are never opened, so rows that look
/// like their children attach to the next open ancestor instead.
pub struct HierarchyBuilder<'a> {
    config: &'a EngineConfig,
    classifier: RowClassifier<'a>,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            classifier: RowClassifier::new(&config.default_cost_method),
        }
    }

    pub fn build(&self, rows: &[BidRow]) -> CostTree {
        let tolerance = self.config.tolerance;
        let mut items: Vec<CostItem> = Vec::with_capacity(rows.len());
        let mut parents: Vec<Option<usize>> = Vec::with_capacity(rows.len());
        let mut stack: Vec<StackFrame> = Vec::new();

        for (row_idx, row) in rows.iter().enumerate() {
            let description = row.description.trim();
            if description.is_empty() {
                debug!("Skipping row {} with blank description", row_idx + 1);
                continue;
            }

            let classification = self.classifier.classify_row(row);
            let budget = row.budget_or_zero();

            while let Some(top) = stack.last() {
                if !top.is_complete(tolerance) {
                    break;
                }
                debug!(
                    "Closing '{}' at {} of {}",
                    items[top.owner].item_number, top.running_sum, top.target
                );
                stack.pop();
            }

            let parent = match stack.last_mut() {
                Some(frame) => {
                    frame.running_sum = frame.running_sum.saturating_add(budget);
                    Some(frame.owner)
                }
                None => None,
            };

            let position = items.len();
            let sort_order = position as u32 + 1;
            let item = CostItem {
                id: Uuid::new_v4(),
                item_number: self.item_number(row, sort_order),
                description: description.to_string(),
                job_cost_id: row.job_cost_id.clone(),
                unit: row.unit.clone(),
                budget: row.budget,
                scheduled_value: row.scheduled_value,
                quantity: row.quantity,
                unit_price: unit_price(
                    row.scheduled_value,
                    row.quantity,
                    self.config.unit_price_scale,
                ),
                cost_method: classification.cost_method,
                sort_order,
                parent_id: parent.map(|p| items[p].id),
            };

            items.push(item);
            parents.push(parent);

            if classification.can_have_children && budget > Decimal::ZERO {
                stack.push(StackFrame {
                    owner: position,
                    target: budget,
                    running_sum: Decimal::ZERO,
                });
            }
        }

        if !stack.is_empty() {
            debug!("{} frame(s) still open at end of input", stack.len());
        }

        let tree = CostTree::from_built(items, parents);
        info!(
            "Built cost hierarchy with {} items ({} roots)",
            tree.len(),
            tree.roots().count()
        );
        tree
    }

    fn item_number(&self, row: &BidRow, sort_order: u32) -> String {
        let explicit = row.item_number.trim();
        if explicit.is_empty() {
            format!("{}{}", self.config.auto_item_number_prefix, sort_order)
        } else {
            explicit.to_string()
        }
    }
}

pub fn build_cost_tree(rows: &[BidRow]) -> CostTree {
    let config = EngineConfig::default();
    HierarchyBuilder::new(&config).build(rows)
}
