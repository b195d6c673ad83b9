use crate::schema::PayApplicationFact;
use crate::utils::first_of_month;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Pay application facts keyed by (cost item, billing month); at most one fact per key.
#[derive(Debug, Clone, Default)]
pub struct PayApplicationLedger {
    facts: BTreeMap<(Uuid, NaiveDate), PayApplicationFact>,
}

impl PayApplicationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_facts(facts: impl IntoIterator<Item = PayApplicationFact>) -> Self {
        let mut ledger = Self::new();
        for fact in facts {
            ledger.upsert(fact);
        }
        ledger
    }

    /// Inserts or replaces the fact for its item and month. Returns the replaced fact.
    pub fn upsert(&mut self, mut fact: PayApplicationFact) -> Option<PayApplicationFact> {
        fact.month = first_of_month(fact.month);
        self.facts.insert((fact.cost_item_id, fact.month), fact)
    }

    pub fn get(&self, item_id: Uuid, month: NaiveDate) -> Option<&PayApplicationFact> {
        self.facts.get(&(item_id, first_of_month(month)))
    }

    /// Quantity billed in `month`; zero when no fact is recorded.
    pub fn quantity_for(&self, item_id: Uuid, month: NaiveDate) -> Decimal {
        self.get(item_id, month)
            .map(|fact| fact.quantity_this_month)
            .unwrap_or(Decimal::ZERO)
    }

    /// Distinct months with at least one recorded fact, ascending.
    pub fn months(&self) -> Vec<NaiveDate> {
        let months: BTreeSet<NaiveDate> = self.facts.keys().map(|(_, month)| *month).collect();
        months.into_iter().collect()
    }

    /// Sum of monthly quantities for months up to and including `month`.
    pub fn cumulative_through(&self, item_id: Uuid, month: NaiveDate) -> Decimal {
        let month = first_of_month(month);
        self.facts
            .range((item_id, NaiveDate::MIN)..=(item_id, month))
            .map(|(_, fact)| fact.quantity_this_month)
            .sum()
    }

    /// Sum of monthly quantities for months strictly before `month`.
    pub fn cumulative_before(&self, item_id: Uuid, month: NaiveDate) -> Decimal {
        let month = first_of_month(month);
        self.facts
            .range((item_id, NaiveDate::MIN)..(item_id, month))
            .map(|(_, fact)| fact.quantity_this_month)
            .sum()
    }

    pub fn facts(&self) -> impl Iterator<Item = &PayApplicationFact> + '_ {
        self.facts.values()
    }

    pub fn facts_for_item(&self, item_id: Uuid) -> impl Iterator<Item = &PayApplicationFact> + '_ {
        self.facts
            .range((item_id, NaiveDate::MIN)..=(item_id, NaiveDate::MAX))
            .map(|(_, fact)| fact)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn month(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
    }

    #[test]
    fn test_upsert_replaces_same_month() {
        let item = Uuid::new_v4();
        let mut ledger = PayApplicationLedger::new();

        assert!(ledger
            .upsert(PayApplicationFact::new(item, month(1), dec!(5)))
            .is_none());
        let replaced = ledger.upsert(PayApplicationFact::new(
            item,
            NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            dec!(7),
        ));

        assert_eq!(replaced.unwrap().quantity_this_month, dec!(5));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.quantity_for(item, month(1)), dec!(7));
    }

    #[test]
    fn test_cumulative_queries() {
        let item = Uuid::new_v4();
        let other = Uuid::new_v4();
        let ledger = PayApplicationLedger::from_facts(vec![
            PayApplicationFact::new(item, month(1), dec!(10)),
            PayApplicationFact::new(item, month(2), dec!(5)),
            PayApplicationFact::new(item, month(4), dec!(25)),
            PayApplicationFact::new(other, month(3), dec!(100)),
        ]);

        assert_eq!(ledger.cumulative_through(item, month(2)), dec!(15));
        assert_eq!(ledger.cumulative_through(item, month(3)), dec!(15));
        assert_eq!(ledger.cumulative_through(item, month(4)), dec!(40));
        assert_eq!(ledger.cumulative_before(item, month(4)), dec!(15));
        assert_eq!(ledger.cumulative_before(item, month(1)), Decimal::ZERO);
        assert_eq!(ledger.facts_for_item(item).count(), 3);
    }

    #[test]
    fn test_months_are_distinct_and_sorted() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let ledger = PayApplicationLedger::from_facts(vec![
            PayApplicationFact::new(a, month(3), dec!(1)),
            PayApplicationFact::new(b, month(1), dec!(1)),
            PayApplicationFact::new(a, month(1), dec!(1)),
        ]);

        assert_eq!(ledger.months(), vec![month(1), month(3)]);
    }

    #[test]
    fn test_missing_fact_is_zero_quantity() {
        let ledger = PayApplicationLedger::new();
        assert_eq!(ledger.quantity_for(Uuid::new_v4(), month(1)), Decimal::ZERO);
        assert!(ledger.is_empty());
    }
}
