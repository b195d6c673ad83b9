use crate::config::DEFAULT_COST_METHOD;
use crate::schema::{BidRow, CREW, DETAIL, PAY_ITEM, SUBCONTRACTED};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub cost_method: String,
    pub can_have_children: bool,
}

impl Classification {
    fn branch(cost_method: &str) -> Self {
        Self {
            cost_method: cost_method.to_string(),
            can_have_children: true,
        }
    }

    fn leaf(cost_method: &str) -> Self {
        Self {
            cost_method: cost_method.to_string(),
            can_have_children: false,
        }
    }
}

/// Maps a row's item number, cost method and production rate to its item type.
///
/// First matching rule wins:
/// 1. an item number makes it a Pay Item
/// 2. cost method `Detail` (any case)
/// 3. cost method `Subcontracted` (any case), never a branch
/// 4. blank cost method with a production rate makes it a Crew
/// 5. anything else is a leaf cost component named after its cost method
pub struct RowClassifier<'a> {
    default_cost_method: &'a str,
}

impl Default for RowClassifier<'static> {
    fn default() -> Self {
        Self {
            default_cost_method: DEFAULT_COST_METHOD,
        }
    }
}

impl<'a> RowClassifier<'a> {
    pub fn new(default_cost_method: &'a str) -> Self {
        Self {
            default_cost_method,
        }
    }

    pub fn classify(
        &self,
        item_number_raw: &str,
        cost_method_raw: &str,
        production_rate_raw: &str,
    ) -> Classification {
        let item_number = item_number_raw.trim();
        let cost_method = cost_method_raw.trim();
        let production_rate = production_rate_raw.trim();

        if !item_number.is_empty() {
            return Classification::branch(PAY_ITEM);
        }

        if cost_method.eq_ignore_ascii_case(DETAIL) {
            return Classification::branch(DETAIL);
        }

        if cost_method.eq_ignore_ascii_case(SUBCONTRACTED) {
            return Classification::leaf(SUBCONTRACTED);
        }

        if cost_method.is_empty() && !production_rate.is_empty() {
            return Classification::branch(CREW);
        }

        if cost_method.is_empty() {
            Classification::leaf(self.default_cost_method)
        } else {
            Classification::leaf(cost_method)
        }
    }

    pub fn classify_row(&self, row: &BidRow) -> Classification {
        self.classify(&row.item_number, &row.cost_method, &row.production_rate)
    }
}

pub fn classify_row(row: &BidRow) -> Classification {
    RowClassifier::default().classify_row(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(item: &str, method: &str, rate: &str) -> (String, bool) {
        let c = RowClassifier::default().classify(item, method, rate);
        (c.cost_method, c.can_have_children)
    }

    #[test]
    fn test_item_number_wins_over_everything() {
        assert_eq!(classify("1.0", "Subcontracted", "12 LF/HR"), ("Pay Item".to_string(), true));
        assert_eq!(classify("200", "", ""), ("Pay Item".to_string(), true));
    }

    #[test]
    fn test_detail_is_case_insensitive() {
        assert_eq!(classify("", "detail", ""), ("Detail".to_string(), true));
        assert_eq!(classify("", "DETAIL", "5"), ("Detail".to_string(), true));
    }

    #[test]
    fn test_subcontracted_never_has_children() {
        assert_eq!(classify("", "SubContracted", "5"), ("Subcontracted".to_string(), false));
    }

    #[test]
    fn test_crew_requires_blank_method_and_rate() {
        assert_eq!(classify("", "", "40 CY/HR"), ("Crew".to_string(), true));
        assert_eq!(classify("", "Labor", "40 CY/HR"), ("Labor".to_string(), false));
    }

    #[test]
    fn test_cost_component_defaults() {
        assert_eq!(classify("", "Equipment", ""), ("Equipment".to_string(), false));
        assert_eq!(classify("", "", ""), ("Cost".to_string(), false));
        assert_eq!(classify("  ", "  ", "  "), ("Cost".to_string(), false));
    }

    #[test]
    fn test_custom_default_method() {
        let classifier = RowClassifier::new("Misc");
        let c = classifier.classify("", "", "");
        assert_eq!(c.cost_method, "Misc");
        assert!(!c.can_have_children);
    }
}
