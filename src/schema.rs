use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PAY_ITEM: &str = "Pay Item";
pub const DETAIL: &str = "Detail";
pub const SUBCONTRACTED: &str = "Subcontracted";
pub const CREW: &str = "Crew";

/// One bid-export row after numeric extraction, ready for classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BidRow {
    /// Explicit bid item number; blank for everything below a pay item.
    pub item_number: String,
    pub job_cost_id: Option<String>,
    pub description: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub cost_method: String,
    /// Total bid price for the line.
    pub scheduled_value: Decimal,
    pub production_rate: String,
    /// Total direct cost. `None` when the source figure could not be parsed.
    pub budget: Option<Decimal>,
}

impl BidRow {
    pub fn new(description: impl Into<String>, budget: Decimal) -> Self {
        Self {
            description: description.into(),
            budget: Some(budget),
            ..Self::default()
        }
    }

    pub fn with_item_number(mut self, item_number: impl Into<String>) -> Self {
        self.item_number = item_number.into();
        self
    }

    pub fn with_cost_method(mut self, cost_method: impl Into<String>) -> Self {
        self.cost_method = cost_method.into();
        self
    }

    pub fn with_production_rate(mut self, production_rate: impl Into<String>) -> Self {
        self.production_rate = production_rate.into();
        self
    }

    pub fn with_quantity(mut self, quantity: Decimal, scheduled_value: Decimal) -> Self {
        self.quantity = quantity;
        self.scheduled_value = scheduled_value;
        self
    }

    pub fn budget_or_zero(&self) -> Decimal {
        self.budget.unwrap_or(Decimal::ZERO)
    }
}

/// A node of the reconstructed cost hierarchy. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostItem {
    pub id: Uuid,
    pub item_number: String,
    pub description: String,
    pub job_cost_id: Option<String>,
    pub unit: Option<String>,
    pub budget: Option<Decimal>,
    pub scheduled_value: Decimal,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub cost_method: String,
    /// 1-based position among the rows that produced an item.
    pub sort_order: u32,
    pub parent_id: Option<Uuid>,
}

impl CostItem {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum FactOrigin {
    /// Read from the monthly pay application export
    Imported,
    /// Apportioned from a parent's percent complete
    Distributed,
}

impl Default for FactOrigin {
    fn default() -> Self {
        Self::Imported
    }
}

/// Billing progress for one cost item in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PayApplicationFact {
    pub cost_item_id: Uuid,
    /// Always the first day of the billing month.
    pub month: NaiveDate,
    pub quantity_this_month: Decimal,
    pub stored_materials: Decimal,
    #[serde(default)]
    pub origin: FactOrigin,
}

impl PayApplicationFact {
    pub fn new(cost_item_id: Uuid, month: NaiveDate, quantity_this_month: Decimal) -> Self {
        Self {
            cost_item_id,
            month: crate::utils::first_of_month(month),
            quantity_this_month,
            stored_materials: Decimal::ZERO,
            origin: FactOrigin::Imported,
        }
    }
}

/// Bid row as handed over by the spreadsheet extractor, every cell still text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RawBidRow {
    #[schemars(description = "Bid item number ('Item #'). Non-blank only on pay item rows.")]
    pub item_number: String,

    #[schemars(description = "Job cost id / phase code, if any.")]
    pub job_cost_id: String,

    #[schemars(description = "Line description. Rows with a blank description are ignored.")]
    pub description: String,

    #[schemars(description = "Quantity for the line, as displayed (may contain thousands separators).")]
    pub quantity: String,

    #[schemars(description = "Unit of measure (e.g. 'LF', 'CY', 'LS').")]
    pub unit: String,

    #[schemars(
        description = "Cost method column: 'Detail', 'Subcontracted', a cost component such as 'Labor', or blank."
    )]
    pub cost_method: String,

    #[schemars(description = "Total bid price for the line (scheduled value), e.g. '$12,500.00'.")]
    pub total_bid_price: String,

    #[schemars(description = "Production rate text. Its presence marks a crew row when cost method is blank.")]
    pub production_rate: String,

    #[schemars(description = "Total direct cost (budget) for the line, e.g. '$10,000.00'.")]
    pub total_direct_cost: String,
}

/// Pay application row as handed over by the spreadsheet extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RawPayAppRow {
    #[schemars(description = "Item number of the billed cost item, matching the bid import.")]
    pub item_number: String,

    #[schemars(description = "Billing month as YYYY-MM or any YYYY-MM-DD inside the month.")]
    pub month: String,

    #[schemars(description = "Quantity billed in this month (not cumulative).")]
    pub quantity_this_month: String,

    #[schemars(description = "Stored materials amount billed this month.")]
    pub stored_materials: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ImportBatch {
    #[schemars(description = "Bid export rows in their original order.")]
    pub bid_rows: Vec<RawBidRow>,

    #[serde(default)]
    #[schemars(description = "Pay application rows for any number of billing months.")]
    pub pay_app_rows: Vec<RawPayAppRow>,
}

impl ImportBatch {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ImportBatch)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
