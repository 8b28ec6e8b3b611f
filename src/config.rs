use crate::error::{CashFlowError, Result};
use crate::schema::Horizon;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_AGGREGATE_CEILING: f64 = 1e9;
pub const DEFAULT_BALANCE_CEILING: f64 = 1e12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(
        description = "Largest believable income or expense total for one category in one month. Larger values are clamped."
    )]
    pub aggregate_ceiling: f64,

    #[schemars(
        description = "Largest believable running balance magnitude. A forecast balance past this is rebuilt from the last actual balance."
    )]
    pub balance_ceiling: f64,

    #[schemars(description = "Horizon used when the caller does not choose one")]
    pub default_horizon: Horizon,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            aggregate_ceiling: DEFAULT_AGGREGATE_CEILING,
            balance_ceiling: DEFAULT_BALANCE_CEILING,
            default_horizon: Horizon::SixMonths,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("aggregate_ceiling", self.aggregate_ceiling),
            ("balance_ceiling", self.balance_ceiling),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CashFlowError::InvalidConfig(format!(
                    "{} must be a positive finite number, got {}",
                    name, value
                )));
            }
        }

        if self.balance_ceiling < self.aggregate_ceiling {
            return Err(CashFlowError::InvalidConfig(format!(
                "balance_ceiling ({}) must not be smaller than aggregate_ceiling ({})",
                self.balance_ceiling, self.aggregate_ceiling
            )));
        }

        Ok(())
    }
}
