use crate::budget::{GenerateOutcome, LoadOutcome};
use crate::edits::BudgetEdits;
use crate::engine::ForecastEngine;
use crate::error::Result;
use crate::rolling::RollingForecast;
use crate::schema::{Horizon, StoredBudget};
use crate::store::{AccountId, ForecastStore};
use crate::utils::local_today;
use crate::variance::VarianceOutcome;
use chrono::{NaiveDate, Utc};
use log::info;

/// Runs the engine against records fetched from a store for one account at a time.
pub struct ForecastService<S: ForecastStore> {
    store: S,
    engine: ForecastEngine,
}

impl<S: ForecastStore> ForecastService<S> {
    pub fn new(store: S, engine: ForecastEngine) -> Self {
        Self { store, engine }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    /// Generates and persists a budget. Nothing is written on insufficient history.
    pub fn generate_budget(
        &self,
        account: &AccountId,
        horizon: Horizon,
        today: NaiveDate,
    ) -> Result<GenerateOutcome> {
        let transactions = self.store.transactions(account)?;
        let planned_income = self.store.planned_income(account)?;
        let planned_expenses = self.store.planned_expenses(account)?;

        let outcome = self.engine.generate_budget(
            &transactions,
            &planned_income,
            &planned_expenses,
            horizon,
            today,
        )?;

        if let GenerateOutcome::Generated(document) = &outcome {
            let previous = self.store.budget(account)?;
            let record =
                StoredBudget::from_document(document.clone(), Utc::now(), previous.as_ref());
            self.store.save_budget(account, record)?;
            info!("Saved {} budget for account {}", horizon, account);
        }

        Ok(outcome)
    }

    pub fn load_budget(&self, account: &AccountId) -> Result<LoadOutcome> {
        let stored = self.store.budget(account)?;
        let planned_income = self.store.planned_income(account)?;
        let planned_expenses = self.store.planned_expenses(account)?;
        Ok(self
            .engine
            .load_budget(stored.as_ref(), &planned_income, &planned_expenses))
    }

    pub fn rolling_forecast(
        &self,
        account: &AccountId,
        horizon: Horizon,
        today: NaiveDate,
    ) -> Result<RollingForecast> {
        let transactions = self.store.transactions(account)?;
        let stored = self.store.budget(account)?;
        let planned_income = self.store.planned_income(account)?;
        let planned_expenses = self.store.planned_expenses(account)?;

        Ok(self.engine.compute_rolling_forecast(
            &transactions,
            stored.as_ref(),
            &planned_income,
            &planned_expenses,
            horizon,
            today,
        ))
    }

    pub fn variance(&self, account: &AccountId, today: NaiveDate) -> Result<VarianceOutcome> {
        let stored = self.store.budget(account)?;
        let planned_income = self.store.planned_income(account)?;
        let planned_expenses = self.store.planned_expenses(account)?;
        let transactions = self.store.transactions(account)?;

        Ok(self.engine.compute_variance(
            stored.as_ref(),
            &planned_income,
            &planned_expenses,
            &transactions,
            today,
        ))
    }

    /// Applies edits to the stored budget, persists it, and returns the reloaded budget.
    pub fn edit_budget(&self, account: &AccountId, edits: &BudgetEdits) -> Result<LoadOutcome> {
        let Some(previous) = self.store.budget(account)? else {
            return Ok(LoadOutcome::NotFound);
        };

        let edited = self.engine.apply_edits(&previous.to_document(), edits);
        let record = StoredBudget::from_document(edited, Utc::now(), Some(&previous));
        self.store.save_budget(account, record)?;
        info!(
            "Applied {} budget edits for account {}",
            edits.edits.len(),
            account
        );

        self.load_budget(account)
    }

    /// Generates with the configured default horizon as of the local date.
    pub fn generate_budget_now(&self, account: &AccountId) -> Result<GenerateOutcome> {
        self.generate_budget(account, self.engine.default_horizon(), local_today())
    }

    pub fn rolling_forecast_now(&self, account: &AccountId) -> Result<RollingForecast> {
        self.rolling_forecast(account, self.engine.default_horizon(), local_today())
    }

    pub fn variance_now(&self, account: &AccountId) -> Result<VarianceOutcome> {
        self.variance(account, local_today())
    }
}
