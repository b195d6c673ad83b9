use chrono::NaiveDate;
use cost_hierarchy_builder::{
    CostTreeReport, ImportBatch, RawBidRow, RawPayAppRow, ReconciliationEngine,
};

fn bid_row(item: &str, description: &str, method: &str, rate: &str, qty: &str, price: &str, budget: &str) -> RawBidRow {
    RawBidRow {
        item_number: item.to_string(),
        description: description.to_string(),
        cost_method: method.to_string(),
        production_rate: rate.to_string(),
        quantity: qty.to_string(),
        total_bid_price: price.to_string(),
        total_direct_cost: budget.to_string(),
        ..RawBidRow::default()
    }
}

fn main() {
    let batch = ImportBatch {
        bid_rows: vec![
            bid_row("10", "Waterline 8in PVC", "", "", "1,200", "$96,000.00", "$80,000.00"),
            bid_row("", "Trench and Lay Pipe", "", "80 LF/HR", "1,200", "$48,000.00", "$40,000.00"),
            bid_row("", "Pipe Crew Labor", "Labor", "", "120", "$21,600.00", "$18,000.00"),
            bid_row("", "Excavator", "Equipment", "", "120", "$26,400.00", "$22,000.00"),
            bid_row("", "Pipe and Fittings", "Detail", "", "1,200", "$48,000.00", "$40,000.00"),
            bid_row("", "8in PVC C900", "Material", "", "1,200", "$48,000.00", "$40,000.00"),
            bid_row("20", "Testing", "", "", "1", "$3,000.00", "$2,500.00"),
            bid_row("", "Testing Sub", "Subcontracted", "", "1", "$3,000.00", "$2,500.00"),
        ],
        pay_app_rows: vec![
            RawPayAppRow {
                item_number: "10".to_string(),
                month: "2024-03".to_string(),
                quantity_this_month: "300".to_string(),
                stored_materials: "$4,000".to_string(),
            },
            RawPayAppRow {
                item_number: "10".to_string(),
                month: "2024-04".to_string(),
                quantity_this_month: "450".to_string(),
                stored_materials: String::new(),
            },
        ],
    };

    let engine = ReconciliationEngine::default();
    let mut job = engine.import(&batch);

    for warning in &job.warnings {
        println!("warning: {}", warning);
    }

    let report = CostTreeReport::from_tree("Waterline Job", &job.tree);
    println!("{}", report.to_markdown());

    let budget = engine.validate_budget(&job.tree);
    println!("{}", budget.to_markdown());

    let before = engine.validate_monthly_amounts(&job.tree, &job.ledger);
    println!("Monthly amounts before distribution:\n{}", before.to_markdown());

    let months = job.ledger.months();
    let distribution = engine.distribute_months(&job.tree, &mut job.ledger, &months);
    println!(
        "Distributed {} item-months across {} month(s)",
        distribution.items_updated,
        distribution.months_processed.len()
    );
    for detail in &distribution.details {
        println!(
            " - {} {}: {} children at {}",
            detail.parent_item_number,
            detail.month.format("%b-%Y"),
            detail.children_count,
            cost_hierarchy_builder::utils::format_percent(detail.percent_complete)
        );
    }

    let after = engine.validate_all(&job.tree, &job.ledger);
    println!("{}", after.to_markdown());

    let april = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    if let Some(labor) = job.tree.get_by_number("AUTO-3") {
        println!(
            "Labor hours billed in April: {}",
            job.ledger.quantity_for(labor.id, april)
        );
    }
}
