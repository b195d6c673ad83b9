use crate::error::Result;
use crate::tree::CostTree;
use crate::utils::format_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: Uuid,
    pub depth: usize,
    pub sort_order: u32,
    pub item_number: String,
    pub description: String,
    pub cost_method: String,
    pub budget: Option<Decimal>,
    pub scheduled_value: Decimal,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub unit_price: Decimal,
    pub parent_item_number: Option<String>,
    pub children_count: usize,
}

/// Flattened, display-ready view of a cost tree in original row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostTreeReport {
    pub job_name: String,
    pub entries: Vec<ReportEntry>,
}

impl CostTreeReport {
    pub fn from_tree(job_name: impl Into<String>, tree: &CostTree) -> Self {
        let entries = tree
            .items()
            .iter()
            .map(|item| ReportEntry {
                id: item.id,
                depth: tree.depth(item.id),
                sort_order: item.sort_order,
                item_number: item.item_number.clone(),
                description: item.description.clone(),
                cost_method: item.cost_method.clone(),
                budget: item.budget,
                scheduled_value: item.scheduled_value,
                quantity: item.quantity,
                unit: item.unit.clone(),
                unit_price: item.unit_price,
                parent_item_number: tree.parent(item.id).map(|p| p.item_number.clone()),
                children_count: tree.children(item.id).len(),
            })
            .collect();

        Self {
            job_name: job_name.into(),
            entries,
        }
    }

    pub fn total_items(&self) -> usize {
        self.entries.len()
    }

    pub fn root_count(&self) -> usize {
        self.entries.iter().filter(|e| e.depth == 0).count()
    }

    /// Sum of root budgets; unparsed budgets count as zero.
    pub fn total_budget(&self) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.depth == 0)
            .map(|e| e.budget.unwrap_or(Decimal::ZERO))
            .sum()
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "Sort Order",
            "Item Number",
            "Parent Item Number",
            "Depth",
            "Cost Method",
            "Description",
            "Budget",
            "Scheduled Value",
            "Quantity",
            "Unit Price",
        ])?;

        for entry in &self.entries {
            csv_writer.write_record([
                entry.sort_order.to_string(),
                entry.item_number.clone(),
                entry.parent_item_number.clone().unwrap_or_default(),
                entry.depth.to_string(),
                entry.cost_method.clone(),
                entry.description.clone(),
                entry.budget.map(format_money).unwrap_or_default(),
                format_money(entry.scheduled_value),
                entry.quantity.to_string(),
                entry.unit_price.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Cost Hierarchy - {}\n\n", self.job_name));
        output.push_str(&format!(
            "**Items:** {} | **Pay Items:** {} | **Total Budget:** {}\n\n",
            self.total_items(),
            self.root_count(),
            format_money(self.total_budget())
        ));

        for entry in &self.entries {
            let indent = "  ".repeat(entry.depth);
            let budget = match entry.budget {
                Some(budget) => format_money(budget),
                None => "n/a".to_string(),
            };
            output.push_str(&format!(
                "{}- **{}** {} ({}) - {}\n",
                indent, entry.item_number, entry.description, entry.cost_method, budget
            ));
        }
        output.push('\n');

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::build_cost_tree;
    use crate::schema::BidRow;
    use rust_decimal_macros::dec;

    fn sample_tree() -> CostTree {
        build_cost_tree(&[
            BidRow::new("Storm Drain", dec!(1000)).with_item_number("10"),
            BidRow::new("Trench, 4ft", dec!(600)).with_cost_method("Detail"),
            BidRow::new("Labor", dec!(600)).with_cost_method("Labor"),
            BidRow::new("Pipe", dec!(400)).with_cost_method("Material"),
            BidRow::new("Mobilization", dec!(50)).with_item_number("20"),
        ])
    }

    #[test]
    fn test_report_creation() {
        let report = CostTreeReport::from_tree("Job 1042", &sample_tree());

        assert_eq!(report.total_items(), 5);
        assert_eq!(report.root_count(), 2);
        assert_eq!(report.total_budget(), dec!(1050));
        assert_eq!(report.entries[2].depth, 2);
        assert_eq!(report.entries[3].parent_item_number.as_deref(), Some("10"));
        assert_eq!(report.entries[0].children_count, 2);
    }

    #[test]
    fn test_report_to_markdown() {
        let report = CostTreeReport::from_tree("Job 1042", &sample_tree());
        let markdown = report.to_markdown();

        assert!(markdown.contains("# Cost Hierarchy - Job 1042"));
        assert!(markdown.contains("- **10** Storm Drain (Pay Item) - 1000.00"));
        assert!(markdown.contains("    - **AUTO-3** Labor (Labor) - 600.00"));
    }

    #[test]
    fn test_report_to_csv() {
        let report = CostTreeReport::from_tree("Job 1042", &sample_tree());
        let csv = report.to_csv().unwrap();

        assert!(csv.starts_with("Sort Order,Item Number"));
        assert!(csv.contains("2,AUTO-2,10,1,Detail,\"Trench, 4ft\",600.00"));

        let mut buffer = Vec::new();
        report.write_csv(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), csv);
    }

    #[test]
    fn test_report_csv_escapes_quotes_and_newlines() {
        let tree = build_cost_tree(&[
            BidRow::new("Pipe \"C900\" 8in", dec!(100)).with_item_number("30"),
            BidRow::new("Haul\nand place", dec!(100)).with_cost_method("Equipment"),
        ]);
        let output = CostTreeReport::from_tree("Job 7", &tree).to_csv().unwrap();

        assert!(output.contains("1,30,,0,Pay Item,\"Pipe \"\"C900\"\" 8in\",100.00"));
        assert!(output.contains("\"Haul\nand place\""));

        let mut reader = csv::Reader::from_reader(output.as_bytes());
        let descriptions: Vec<String> = reader
            .records()
            .map(|record| record.unwrap()[5].to_string())
            .collect();
        assert_eq!(descriptions, vec!["Pipe \"C900\" 8in", "Haul\nand place"]);
    }

    #[test]
    fn test_report_to_json() {
        let report = CostTreeReport::from_tree("Job 1042", &sample_tree());
        let json = report.to_json().unwrap();
        assert!(json.contains("\"job_name\": \"Job 1042\""));
    }
}
