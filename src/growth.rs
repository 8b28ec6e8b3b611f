use crate::aggregator::{table_categories, table_months};
use crate::error::{CashFlowError, Result};
use crate::schema::{CategoryAggregate, GrowthRate, GrowthRates, MonthlyCategoryTable};
use log::debug;

/// Per-category average month-over-month growth over the months present in `table`.
///
/// Needs at least two months; callers should check first and report
/// insufficient history themselves, but a short table is rejected here too.
pub fn compute_growth_rates(table: &MonthlyCategoryTable) -> Result<GrowthRates> {
    let months = table_months(table);
    if months.len() < 2 {
        return Err(CashFlowError::InsufficientHistory {
            months_found: months.len(),
        });
    }

    let categories = table_categories(table);
    debug!(
        "Computing growth rates for {} categories over {} months ({} to {})",
        categories.len(),
        months.len(),
        months[0],
        months[months.len() - 1]
    );

    let mut rates = GrowthRates::new();
    for category in categories {
        let series: Vec<CategoryAggregate> = months
            .iter()
            .map(|month| {
                table
                    .get(month)
                    .and_then(|breakdown| breakdown.get(&category))
                    .copied()
                    .unwrap_or_default()
            })
            .collect();

        let mut income_samples = Vec::new();
        let mut expense_samples = Vec::new();
        for pair in series.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            if let Some(rate) = rate_sample(prev.income, curr.income) {
                income_samples.push(rate);
            }
            if let Some(rate) = rate_sample(prev.expenses, curr.expenses) {
                expense_samples.push(rate);
            }
        }

        let last_value = series.last().copied().unwrap_or_default();
        rates.insert(
            category,
            GrowthRate {
                income_rate_percent: mean(&income_samples),
                expense_rate_percent: mean(&expense_samples),
                last_value,
            },
        );
    }

    Ok(rates)
}

/// One month-over-month change in percent.
///
/// Growth from a zero base is recorded as 0% so that a new category projects
/// flat instead of exploding. Zero to zero records nothing.
fn rate_sample(prev: f64, curr: f64) -> Option<f64> {
    if prev > 0.0 && curr >= 0.0 {
        Some((curr - prev) / prev * 100.0)
    } else if prev == 0.0 && curr > 0.0 {
        Some(0.0)
    } else {
        None
    }
}

fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}
