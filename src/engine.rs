use crate::budget::{self, GenerateOutcome, LoadOutcome};
use crate::config::EngineConfig;
use crate::edits::BudgetEdits;
use crate::error::Result;
use crate::rolling::{self, RollingForecast};
use crate::sanitize::Sanitizer;
use crate::schema::{BudgetDocument, Horizon, PlannedItem, StoredBudget, Transaction};
use crate::variance::{self, VarianceOutcome};
use chrono::NaiveDate;

/// The forecasting operations, bound to one validated configuration.
///
/// Every method is a pure function of its arguments: records are fetched and
/// persisted by the caller.
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    config: EngineConfig,
    sanitizer: Sanitizer,
}

impl ForecastEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let sanitizer = Sanitizer::new(&config);
        Ok(Self { config, sanitizer })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn default_horizon(&self) -> Horizon {
        self.config.default_horizon
    }

    pub fn generate_budget(
        &self,
        transactions: &[Transaction],
        planned_income: &[PlannedItem],
        planned_expenses: &[PlannedItem],
        horizon: Horizon,
        today: NaiveDate,
    ) -> Result<GenerateOutcome> {
        budget::generate_budget(
            transactions,
            planned_income,
            planned_expenses,
            horizon,
            today,
            &self.sanitizer,
        )
    }

    pub fn load_budget(
        &self,
        stored: Option<&StoredBudget>,
        planned_income: &[PlannedItem],
        planned_expenses: &[PlannedItem],
    ) -> LoadOutcome {
        budget::load_budget(stored, planned_income, planned_expenses, &self.sanitizer)
    }

    pub fn compute_rolling_forecast(
        &self,
        transactions: &[Transaction],
        stored: Option<&StoredBudget>,
        planned_income: &[PlannedItem],
        planned_expenses: &[PlannedItem],
        horizon: Horizon,
        today: NaiveDate,
    ) -> RollingForecast {
        rolling::compute_rolling_forecast(
            transactions,
            stored,
            planned_income,
            planned_expenses,
            horizon,
            today,
            &self.sanitizer,
        )
    }

    pub fn compute_variance(
        &self,
        stored: Option<&StoredBudget>,
        planned_income: &[PlannedItem],
        planned_expenses: &[PlannedItem],
        transactions: &[Transaction],
        today: NaiveDate,
    ) -> VarianceOutcome {
        variance::compute_variance(
            stored,
            planned_income,
            planned_expenses,
            transactions,
            today,
            &self.sanitizer,
        )
    }

    pub fn apply_edits(&self, document: &BudgetDocument, edits: &BudgetEdits) -> BudgetDocument {
        edits.apply(document, &self.sanitizer)
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        let sanitizer = Sanitizer::new(&config);
        Self { config, sanitizer }
    }
}
