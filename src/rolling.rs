use crate::aggregator::{aggregate_transactions, cumulative_balance_through, table_months};
use crate::budget::build_budget;
use crate::planned::PlannedItems;
use crate::projector::ProjectionStart;
use crate::sanitize::Sanitizer;
use crate::schema::{
    breakdown_total, BudgetDocument, Category, CategoryAggregate, CategoryBreakdown, EntryKind,
    GrowthRates, Horizon, MonthKey, MonthlyCategoryTable, PlannedItem, StoredBudget, Transaction,
};
use crate::utils::{contiguous_months, current_month, forecast_months};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingForecastEntry {
    pub month: MonthKey,
    pub kind: EntryKind,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub balance: f64,
    pub categories: CategoryBreakdown,
    /// Set when an input for this month was out of range and had to be clamped or reset.
    pub sanitized: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

impl Totals {
    fn add_entry(&mut self, entry: &RollingForecastEntry) {
        self.income += entry.income;
        self.expenses += entry.expenses;
        self.net += entry.net;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RollingForecastSummary {
    pub actual: Totals,
    pub forecast: Totals,
    pub total: Totals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetSource {
    /// The stored budget matched the requested horizon and was reused.
    Stored,
    /// A budget was computed for this call only and not persisted.
    Transient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingForecast {
    pub horizon: Horizon,
    pub current_month: MonthKey,
    pub starting_balance: f64,
    pub budget_source: BudgetSource,
    pub entries: Vec<RollingForecastEntry>,
    pub summary: RollingForecastSummary,
}

impl RollingForecast {
    pub fn actual_entries(&self) -> impl Iterator<Item = &RollingForecastEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Actual)
    }

    pub fn forecast_entries(&self) -> impl Iterator<Item = &RollingForecastEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Forecast)
    }

    pub fn entry(&self, month: MonthKey) -> Option<&RollingForecastEntry> {
        self.entries.iter().find(|e| e.month == month)
    }
}

/// Stitches actual history and the forecast into one month-by-month timeline.
///
/// Never fails: when no usable budget is stored a transient one is built, and
/// without enough history to project, future months carry planned items only.
pub fn compute_rolling_forecast(
    transactions: &[Transaction],
    stored: Option<&StoredBudget>,
    planned_income: &[PlannedItem],
    planned_expenses: &[PlannedItem],
    horizon: Horizon,
    today: NaiveDate,
    sanitizer: &Sanitizer,
) -> RollingForecast {
    let current = current_month(today);
    info!(
        "Computing {} rolling forecast for {} from {} transactions",
        horizon,
        current,
        transactions.len()
    );

    let mut actuals = aggregate_transactions(transactions);
    let booked_ahead = actuals.split_off(&current.next());
    if !booked_ahead.is_empty() {
        debug!(
            "Ignoring {} future-dated months of transactions as actuals",
            booked_ahead.len()
        );
    }
    let planned = PlannedItems::new(planned_income, planned_expenses);
    let (document, budget_source) =
        select_budget(stored, &actuals, &planned, horizon, today, sanitizer);

    let months = contiguous_months(
        actuals
            .keys()
            .copied()
            .chain(document.forecast_months.iter().copied())
            .chain(std::iter::once(current)),
    );

    let last_actual_month = actuals.keys().next_back().copied();
    let starting_balance = last_actual_month
        .map(|month| cumulative_balance_through(transactions, month))
        .unwrap_or(0.0);
    debug!(
        "Timeline spans {} months; last actual month {:?}, starting balance {}",
        months.len(),
        last_actual_month.map(|m| m.to_string()),
        starting_balance
    );

    let mut running_balance = 0.0;
    let mut last_actual_balance = starting_balance;
    let mut forecast_started = false;
    let mut entries = Vec::with_capacity(months.len());

    for month in months {
        if month <= current {
            let entry = match actuals.get(&month) {
                Some(breakdown) => {
                    // Recomputed from the raw transactions rather than accumulated.
                    let balance = cumulative_balance_through(transactions, month);
                    build_entry(month, EntryKind::Actual, breakdown.clone(), balance, false)
                }
                None => build_entry(
                    month,
                    EntryKind::Actual,
                    CategoryBreakdown::new(),
                    running_balance,
                    false,
                ),
            };
            running_balance = entry.balance;
            last_actual_balance = entry.balance;
            entries.push(entry);
            continue;
        }

        if !forecast_started {
            running_balance = last_actual_balance;
            forecast_started = true;
        }

        let (categories, clamped) = match document.budget.get(&month) {
            Some(breakdown) => sanitizer.breakdown(month, breakdown),
            None => (planned_only_breakdown(&planned, month), false),
        };
        let net = breakdown_total(&categories).net();
        let (balance, reset) =
            sanitizer.balance(running_balance + net, last_actual_balance, net, month);
        running_balance = balance;

        entries.push(build_entry(
            month,
            EntryKind::Forecast,
            categories,
            balance,
            clamped || reset,
        ));
    }

    let summary = summarize(&entries);
    RollingForecast {
        horizon,
        current_month: current,
        starting_balance,
        budget_source,
        entries,
        summary,
    }
}

fn select_budget(
    stored: Option<&StoredBudget>,
    actuals: &MonthlyCategoryTable,
    planned: &PlannedItems<'_>,
    horizon: Horizon,
    today: NaiveDate,
    sanitizer: &Sanitizer,
) -> (BudgetDocument, BudgetSource) {
    let current = current_month(today);

    if let Some(stored) = stored {
        let reaches_future = stored.forecast_months.iter().any(|m| *m > current);
        if stored.horizon == horizon && reaches_future {
            // Cells are clamped later, month by month, so the entries get flagged.
            let mut document = stored.to_document();
            planned.refresh(&mut document.budget, &document.forecast_months);
            return (document, BudgetSource::Stored);
        }
        info!(
            "Stored {} budget is stale for a {} forecast in {}; computing a transient budget",
            stored.horizon, horizon, current
        );
    }

    if table_months(actuals).len() >= 2 {
        match build_budget(
            actuals,
            planned,
            horizon,
            today,
            ProjectionStart::CurrentMonth,
            sanitizer,
        ) {
            Ok(document) => return (document, BudgetSource::Transient),
            Err(e) => warn!("Transient budget could not be built: {}", e),
        }
    }

    debug!("Too little history to project; forecast months carry planned items only");
    let document = BudgetDocument {
        horizon,
        forecast_months: forecast_months(horizon, today),
        category_growth_rates: GrowthRates::new(),
        budget: MonthlyCategoryTable::new(),
    };
    (document, BudgetSource::Transient)
}

fn planned_only_breakdown(planned: &PlannedItems<'_>, month: MonthKey) -> CategoryBreakdown {
    let totals = planned.totals_for(month);
    let mut breakdown = CategoryBreakdown::new();
    if !totals.is_zero() {
        breakdown.insert(Category::planned_items(), totals);
    }
    breakdown
}

fn build_entry(
    month: MonthKey,
    kind: EntryKind,
    categories: CategoryBreakdown,
    balance: f64,
    sanitized: bool,
) -> RollingForecastEntry {
    let totals: CategoryAggregate = breakdown_total(&categories);
    RollingForecastEntry {
        month,
        kind,
        income: totals.income,
        expenses: totals.expenses,
        net: totals.net(),
        balance,
        categories,
        sanitized,
    }
}

fn summarize(entries: &[RollingForecastEntry]) -> RollingForecastSummary {
    let mut summary = RollingForecastSummary::default();
    for entry in entries {
        match entry.kind {
            EntryKind::Actual => summary.actual.add_entry(entry),
            EntryKind::Forecast => summary.forecast.add_entry(entry),
        }
        summary.total.add_entry(entry);
    }
    summary
}
