//! Bounds checks applied wherever stored or historical figures enter the engine.
//!
//! Out-of-range values are never an error. They are clamped (or a balance is
//! rebuilt) and a warning is logged, so a forecast degrades instead of failing.

use crate::config::EngineConfig;
use crate::schema::{
    Category, CategoryAggregate, CategoryBreakdown, MonthKey, MonthlyCategoryTable,
};
use log::warn;

#[derive(Debug, Clone, Copy)]
pub struct Sanitizer {
    aggregate_ceiling: f64,
    balance_ceiling: f64,
}

impl Sanitizer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            aggregate_ceiling: config.aggregate_ceiling,
            balance_ceiling: config.balance_ceiling,
        }
    }

    /// A signed transaction amount. Non-finite amounts count as zero.
    pub fn amount(&self, amount: f64, month: MonthKey) -> f64 {
        if amount.is_finite() {
            amount
        } else {
            warn!(
                "Ignoring non-finite transaction amount {} booked in {}",
                amount, month
            );
            0.0
        }
    }

    /// Clamps both sides to `[0, aggregate_ceiling]`. The flag is set when anything changed.
    pub fn aggregate(
        &self,
        aggregate: CategoryAggregate,
        month: MonthKey,
        category: &Category,
    ) -> (CategoryAggregate, bool) {
        let (income, income_clamped) = clamp_magnitude(aggregate.income, self.aggregate_ceiling);
        let (expenses, expenses_clamped) =
            clamp_magnitude(aggregate.expenses, self.aggregate_ceiling);

        let clamped = income_clamped || expenses_clamped;
        if clamped {
            warn!(
                "Clamped out-of-range aggregate for {} / {}: income {} -> {}, expenses {} -> {}",
                month, category, aggregate.income, income, aggregate.expenses, expenses
            );
        }

        (CategoryAggregate::new(income, expenses), clamped)
    }

    pub fn breakdown(
        &self,
        month: MonthKey,
        breakdown: &CategoryBreakdown,
    ) -> (CategoryBreakdown, bool) {
        let mut any_clamped = false;
        let sanitized = breakdown
            .iter()
            .map(|(category, aggregate)| {
                let (value, clamped) = self.aggregate(*aggregate, month, category);
                any_clamped |= clamped;
                (category.clone(), value)
            })
            .collect();
        (sanitized, any_clamped)
    }

    /// Sanitizes a whole table in place, returning how many cells were clamped.
    pub fn table(&self, table: &mut MonthlyCategoryTable) -> usize {
        let mut clamped_cells = 0;
        for (month, breakdown) in table.iter_mut() {
            for (category, aggregate) in breakdown.iter_mut() {
                let (value, clamped) = self.aggregate(*aggregate, *month, category);
                if clamped {
                    *aggregate = value;
                    clamped_cells += 1;
                }
            }
        }
        clamped_cells
    }

    /// A forecast balance past the ceiling is rebuilt as `last_actual_balance + net`.
    pub fn balance(
        &self,
        balance: f64,
        last_actual_balance: f64,
        net: f64,
        month: MonthKey,
    ) -> (f64, bool) {
        if balance.is_finite() && balance.abs() <= self.balance_ceiling {
            return (balance, false);
        }

        let rebuilt = last_actual_balance + net;
        warn!(
            "Running balance {} for {} exceeds {}; rebuilding from last actual balance as {}",
            balance, month, self.balance_ceiling, rebuilt
        );
        (rebuilt, true)
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

fn clamp_magnitude(value: f64, ceiling: f64) -> (f64, bool) {
    let clamped = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, ceiling)
    };
    (clamped, clamped != value)
}
