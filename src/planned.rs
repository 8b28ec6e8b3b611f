use crate::schema::{
    Category, CategoryAggregate, MonthKey, MonthlyCategoryTable, PlannedItem,
};
use log::{debug, warn};

/// Planned income and expense lists, with malformed entries already dropped.
pub struct PlannedItems<'a> {
    income: Vec<&'a PlannedItem>,
    expenses: Vec<&'a PlannedItem>,
}

impl<'a> PlannedItems<'a> {
    pub fn new(income: &'a [PlannedItem], expenses: &'a [PlannedItem]) -> Self {
        Self {
            income: usable_items(income, "income"),
            expenses: usable_items(expenses, "expense"),
        }
    }

    /// Sum of the planned entries that apply to `month`.
    pub fn totals_for(&self, month: MonthKey) -> CategoryAggregate {
        CategoryAggregate::new(
            sum_applicable(&self.income, month),
            sum_applicable(&self.expenses, month),
        )
    }

    /// Rewrites the "Planned Items" cell of every forecast month.
    ///
    /// The old cell is always replaced. When nothing applies to a month the
    /// key is removed, so deleted planned items leave no residue.
    pub fn refresh(&self, budget: &mut MonthlyCategoryTable, forecast_months: &[MonthKey]) {
        let planned = Category::planned_items();
        let mut populated = 0;

        for month in forecast_months {
            let totals = self.totals_for(*month);
            if totals.is_zero() {
                if let Some(breakdown) = budget.get_mut(month) {
                    breakdown.remove(&planned);
                }
            } else {
                budget
                    .entry(*month)
                    .or_default()
                    .insert(planned.clone(), totals);
                populated += 1;
            }
        }

        debug!(
            "Refreshed planned items: {} of {} forecast months carry planned amounts",
            populated,
            forecast_months.len()
        );
    }
}

fn usable_items<'a>(items: &'a [PlannedItem], side: &str) -> Vec<&'a PlannedItem> {
    items
        .iter()
        .filter(|item| {
            if item.expected_month().is_none() {
                warn!(
                    "Planned {} '{}' has an unreadable date '{}'; it contributes nothing",
                    side, item.description, item.expected_date
                );
                return false;
            }
            if item.usable_amount().is_none() {
                warn!(
                    "Planned {} '{}' has an invalid amount {}; it contributes nothing",
                    side, item.description, item.amount
                );
                return false;
            }
            true
        })
        .collect()
}

fn sum_applicable(items: &[&PlannedItem], month: MonthKey) -> f64 {
    items
        .iter()
        .filter(|item| item.applies_to(month))
        .filter_map(|item| item.usable_amount())
        .fold(0.0, |total, amount| total + amount)
}
