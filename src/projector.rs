use crate::schema::{CategoryAggregate, GrowthRates, MonthKey, MonthlyCategoryTable};
use log::debug;

/// How far ahead the first forecast month is from the compounding base.
///
/// Budget generation projects from next month (`NextMonth`, the first month
/// compounds once). The rolling forecast treats its first forecast month as
/// index 0 (`CurrentMonth`, the first month repeats the last value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionStart {
    NextMonth,
    CurrentMonth,
}

impl ProjectionStart {
    pub fn months_ahead(&self, index: usize) -> i32 {
        match self {
            ProjectionStart::NextMonth => index as i32 + 1,
            ProjectionStart::CurrentMonth => index as i32,
        }
    }
}

/// Compounds each category's last value forward over `forecast_months`.
///
/// Every forecast month gets an entry, even when there are no categories.
/// Projected magnitudes never go below zero.
pub fn project(
    rates: &GrowthRates,
    forecast_months: &[MonthKey],
    start: ProjectionStart,
) -> MonthlyCategoryTable {
    debug!(
        "Projecting {} categories over {} months ({:?})",
        rates.len(),
        forecast_months.len(),
        start
    );

    let mut table = MonthlyCategoryTable::new();
    for (index, month) in forecast_months.iter().enumerate() {
        let months_ahead = start.months_ahead(index);
        let breakdown = table.entry(*month).or_default();

        for (category, rate) in rates {
            let income = compound(
                rate.last_value.income,
                rate.income_rate_percent,
                months_ahead,
            );
            let expenses = compound(
                rate.last_value.expenses,
                rate.expense_rate_percent,
                months_ahead,
            );
            breakdown.insert(category.clone(), CategoryAggregate::new(income, expenses));
        }
    }

    table
}

/// Overflow saturates at `f64::MAX`; ceilings are the sanitizer's job.
fn compound(base: f64, rate_percent: f64, months_ahead: i32) -> f64 {
    let factor = 1.0 + rate_percent / 100.0;
    let value = base * factor.powi(months_ahead);
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, f64::MAX)
    }
}
