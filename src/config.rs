use crate::error::{CostHierarchyError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Absolute slack applied to every sum-vs-target comparison (one cent).
pub const TOLERANCE: Decimal = dec!(0.01);

pub const DEFAULT_UNIT_PRICE_SCALE: u32 = 4;
pub const DEFAULT_COST_METHOD: &str = "Cost";
pub const DEFAULT_AUTO_ITEM_NUMBER_PREFIX: &str = "AUTO-";

const MAX_DECIMAL_SCALE: u32 = 28;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(
        description = "Absolute slack applied when comparing a running or child sum against its target. Defaults to 0.01 (one cent)."
    )]
    pub tolerance: Decimal,

    #[schemars(
        description = "Number of decimal places kept when deriving unit price from scheduled value / quantity. Defaults to 4."
    )]
    pub unit_price_scale: u32,

    #[schemars(
        description = "Prefix for generated item numbers on rows that carry none (e.g. 'AUTO-' gives 'AUTO-7' for the 7th row)."
    )]
    pub auto_item_number_prefix: String,

    #[schemars(description = "Cost method assigned to leaf rows with a blank cost method.")]
    pub default_cost_method: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: TOLERANCE,
            unit_price_scale: DEFAULT_UNIT_PRICE_SCALE,
            auto_item_number_prefix: DEFAULT_AUTO_ITEM_NUMBER_PREFIX.to_string(),
            default_cost_method: DEFAULT_COST_METHOD.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tolerance < Decimal::ZERO {
            return Err(CostHierarchyError::InvalidTolerance(self.tolerance));
        }

        if self.unit_price_scale > MAX_DECIMAL_SCALE {
            return Err(CostHierarchyError::InvalidUnitPriceScale(
                self.unit_price_scale,
            ));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(EngineConfig);
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_contract_values() {
        let config = EngineConfig::default();
        assert_eq!(config.tolerance, dec!(0.01));
        assert_eq!(config.unit_price_scale, 4);
        assert_eq!(config.default_cost_method, "Cost");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = EngineConfig::from_json(r#"{"unit_price_scale": 2}"#).unwrap();
        assert_eq!(config.unit_price_scale, 2);
        assert_eq!(config.tolerance, TOLERANCE);
        assert_eq!(config.auto_item_number_prefix, "AUTO-");
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let result = EngineConfig::from_json(r#"{"tolerance": "-0.5"}"#);
        assert!(matches!(
            result,
            Err(CostHierarchyError::InvalidTolerance(_))
        ));
    }

    #[test]
    fn test_scale_out_of_range_rejected() {
        let config = EngineConfig {
            unit_price_scale: 40,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CostHierarchyError::InvalidUnitPriceScale(40))
        ));
    }

    #[test]
    fn test_schema_generation() {
        let schema = EngineConfig::schema_as_json().unwrap();
        assert!(schema.contains("tolerance"));
        assert!(schema.contains("unit_price_scale"));
    }
}
