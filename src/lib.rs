//! # Cash-Flow Forecast
//!
//! A library for turning a ledger of dated transactions into monthly budgets,
//! rolling cash-flow forecasts and plan-versus-actual variance reports.
//!
//! ## Core Concepts
//!
//! - **Actuals**: Transactions aggregated into month -> category -> `{income, expenses}`
//! - **Growth Rates**: Average month-over-month change per category, derived from history
//! - **Budget**: Projected category figures for the forecast months of a horizon
//! - **Planned Items**: Known future one-off or monthly amounts, folded in under `"Planned Items"`
//! - **Rolling Forecast**: Actual months followed by forecast months with a continuous balance
//! - **Variance**: Actual minus plan per month and category, with percentages
//!
//! ## Example
//!
//! ```rust
//! use cashflow_forecast::*;
//! use chrono::NaiveDate;
//!
//! let transactions = vec![
//!     Transaction::new(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), 1000.0, Some("Salary")),
//!     Transaction::new(NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(), 1100.0, Some("Salary")),
//!     Transaction::new(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), -200.0, Some("Rent")),
//!     Transaction::new(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(), -200.0, Some("Rent")),
//! ];
//! let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//!
//! let outcome = generate_budget(&transactions, &[], &[], Horizon::SixMonths, today).unwrap();
//! let budget = outcome.into_document().unwrap();
//! assert_eq!(budget.forecast_months.len(), 6);
//!
//! let forecast =
//!     compute_rolling_forecast(&transactions, None, &[], &[], Horizon::SixMonths, today);
//! verify_rolling_forecast(&forecast, 0.01).unwrap();
//! ```

pub mod aggregator;
pub mod budget;
pub mod config;
pub mod edits;
pub mod engine;
pub mod error;
pub mod growth;
pub mod planned;
pub mod projector;
pub mod rolling;
pub mod sanitize;
pub mod schema;
pub mod service;
pub mod store;
pub mod utils;
pub mod variance;
pub mod verification;

pub use aggregator::{aggregate_transactions, RECORDED_PLANNED_ITEMS};
pub use budget::{GenerateOutcome, LoadOutcome};
pub use config::EngineConfig;
pub use edits::{BudgetEdit, BudgetEdits};
pub use engine::ForecastEngine;
pub use error::{CashFlowError, Result};
pub use growth::compute_growth_rates;
pub use projector::{project, ProjectionStart};
pub use rolling::{
    BudgetSource, RollingForecast, RollingForecastEntry, RollingForecastSummary, Totals,
};
pub use sanitize::Sanitizer;
pub use schema::*;
pub use service::ForecastService;
pub use store::{AccountData, AccountId, ForecastStore, MemoryStore};
pub use utils::*;
pub use variance::{Figures, MonthVariance, VarianceLine, VarianceOutcome, VarianceReport};
pub use verification::{verify_rolling_forecast, TimelineVerifier};

use chrono::NaiveDate;

/// Builds a fresh budget from history and planned items using the default configuration.
pub fn generate_budget(
    transactions: &[Transaction],
    planned_income: &[PlannedItem],
    planned_expenses: &[PlannedItem],
    horizon: Horizon,
    today: NaiveDate,
) -> Result<GenerateOutcome> {
    ForecastEngine::default().generate_budget(
        transactions,
        planned_income,
        planned_expenses,
        horizon,
        today,
    )
}

/// Returns the stored budget with its planned items rebuilt from the current lists.
pub fn load_budget(
    stored: Option<&StoredBudget>,
    planned_income: &[PlannedItem],
    planned_expenses: &[PlannedItem],
) -> LoadOutcome {
    ForecastEngine::default().load_budget(stored, planned_income, planned_expenses)
}

pub fn compute_rolling_forecast(
    transactions: &[Transaction],
    stored: Option<&StoredBudget>,
    planned_income: &[PlannedItem],
    planned_expenses: &[PlannedItem],
    horizon: Horizon,
    today: NaiveDate,
) -> RollingForecast {
    ForecastEngine::default().compute_rolling_forecast(
        transactions,
        stored,
        planned_income,
        planned_expenses,
        horizon,
        today,
    )
}

pub fn compute_variance(
    stored: Option<&StoredBudget>,
    planned_income: &[PlannedItem],
    planned_expenses: &[PlannedItem],
    transactions: &[Transaction],
    today: NaiveDate,
) -> VarianceOutcome {
    ForecastEngine::default().compute_variance(
        stored,
        planned_income,
        planned_expenses,
        transactions,
        today,
    )
}
