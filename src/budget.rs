use crate::aggregator::{aggregate_transactions, table_months};
use crate::error::{CashFlowError, Result};
use crate::growth::compute_growth_rates;
use crate::planned::PlannedItems;
use crate::projector::{project, ProjectionStart};
use crate::sanitize::Sanitizer;
use crate::schema::{
    BudgetDocument, Horizon, MonthlyCategoryTable, PlannedItem, StoredBudget, Transaction,
};
use crate::utils::forecast_months;
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerateOutcome {
    Generated(BudgetDocument),
    /// Fewer than two distinct months of transactions.
    InsufficientHistory { months_found: usize },
}

impl GenerateOutcome {
    pub fn document(&self) -> Option<&BudgetDocument> {
        match self {
            GenerateOutcome::Generated(document) => Some(document),
            GenerateOutcome::InsufficientHistory { .. } => None,
        }
    }

    pub fn into_document(self) -> Option<BudgetDocument> {
        match self {
            GenerateOutcome::Generated(document) => Some(document),
            GenerateOutcome::InsufficientHistory { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded(BudgetDocument),
    NotFound,
}

impl LoadOutcome {
    pub fn into_document(self) -> Option<BudgetDocument> {
        match self {
            LoadOutcome::Loaded(document) => Some(document),
            LoadOutcome::NotFound => None,
        }
    }
}

/// Builds a budget from already-aggregated history.
///
/// `start` decides whether the first forecast month compounds once
/// (`NextMonth`, used when generating a budget to keep) or not at all
/// (`CurrentMonth`, used for the transient budget behind a rolling forecast).
pub fn build_budget(
    history: &MonthlyCategoryTable,
    planned: &PlannedItems<'_>,
    horizon: Horizon,
    today: NaiveDate,
    start: ProjectionStart,
    sanitizer: &Sanitizer,
) -> Result<BudgetDocument> {
    let category_growth_rates = compute_growth_rates(history)?;
    let months = forecast_months(horizon, today);
    debug!(
        "Building {} budget over {} forecast months from {} categories",
        horizon,
        months.len(),
        category_growth_rates.len()
    );

    let mut budget = project(&category_growth_rates, &months, start);
    let clamped = sanitizer.table(&mut budget);
    if clamped > 0 {
        warn!("{} projected budget cells were clamped", clamped);
    }
    planned.refresh(&mut budget, &months);

    Ok(BudgetDocument {
        horizon,
        forecast_months: months,
        category_growth_rates,
        budget,
    })
}

pub fn generate_budget(
    transactions: &[Transaction],
    planned_income: &[PlannedItem],
    planned_expenses: &[PlannedItem],
    horizon: Horizon,
    today: NaiveDate,
    sanitizer: &Sanitizer,
) -> Result<GenerateOutcome> {
    info!(
        "Generating {} budget from {} transactions",
        horizon,
        transactions.len()
    );

    let history = aggregate_transactions(transactions);
    let months_found = table_months(&history).len();
    if months_found < 2 {
        info!(
            "Not enough history to generate a budget: {} month(s)",
            months_found
        );
        return Ok(GenerateOutcome::InsufficientHistory { months_found });
    }

    let planned = PlannedItems::new(planned_income, planned_expenses);
    match build_budget(
        &history,
        &planned,
        horizon,
        today,
        ProjectionStart::NextMonth,
        sanitizer,
    ) {
        Ok(document) => Ok(GenerateOutcome::Generated(document)),
        Err(CashFlowError::InsufficientHistory { months_found }) => {
            Ok(GenerateOutcome::InsufficientHistory { months_found })
        }
        Err(e) => Err(e),
    }
}

/// Opens a stored budget with sanitized cells and freshly computed planned items.
pub fn load_budget(
    stored: Option<&StoredBudget>,
    planned_income: &[PlannedItem],
    planned_expenses: &[PlannedItem],
    sanitizer: &Sanitizer,
) -> LoadOutcome {
    let Some(stored) = stored else {
        info!("No stored budget to load");
        return LoadOutcome::NotFound;
    };

    let mut document = stored.to_document();
    refresh_document(&mut document, planned_income, planned_expenses, sanitizer);
    info!(
        "Loaded {} budget covering {} forecast months",
        document.horizon,
        document.forecast_months.len()
    );
    LoadOutcome::Loaded(document)
}

pub(crate) fn refresh_document(
    document: &mut BudgetDocument,
    planned_income: &[PlannedItem],
    planned_expenses: &[PlannedItem],
    sanitizer: &Sanitizer,
) {
    let clamped = sanitizer.table(&mut document.budget);
    if clamped > 0 {
        warn!("{} stored budget cells were out of range and clamped", clamped);
    }
    PlannedItems::new(planned_income, planned_expenses)
        .refresh(&mut document.budget, &document.forecast_months);
}
