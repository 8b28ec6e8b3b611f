use crate::sanitize::Sanitizer;
use crate::schema::{BudgetDocument, Category, CategoryAggregate, GrowthRate, MonthKey};
use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An ordered list of manual changes to a budget.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BudgetEdits {
    #[serde(default)]
    pub edits: Vec<BudgetEdit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BudgetEdit {
    /// Insert or replace one category cell.
    SetCategory {
        month: MonthKey,
        category: String,
        income: f64,
        expenses: f64,
    },

    /// Drop one category cell.
    RemoveCategory { month: MonthKey, category: String },

    /// Multiply a category in every forecast month (e.g. 1.1 for +10%).
    ScaleCategory { category: String, factor: f64 },

    /// Replace the growth rates recorded for a category. Cells are not re-projected.
    SetGrowthRate {
        category: String,
        income_rate_percent: f64,
        expense_rate_percent: f64,
    },

    /// Rename a category everywhere, summing into the target when it already exists.
    RenameCategory { from: String, to: String },
}

impl BudgetEdits {
    pub fn new(edits: Vec<BudgetEdit>) -> Self {
        Self { edits }
    }

    /// Applies the edits in order and returns the edited copy.
    pub fn apply(&self, document: &BudgetDocument, sanitizer: &Sanitizer) -> BudgetDocument {
        let mut edited = document.clone();
        for edit in &self.edits {
            apply_single_edit(&mut edited, edit);
        }
        sanitizer.table(&mut edited.budget);
        edited
    }
}

fn apply_single_edit(document: &mut BudgetDocument, edit: &BudgetEdit) {
    match edit {
        BudgetEdit::SetCategory {
            month,
            category,
            income,
            expenses,
        } => {
            let Some(category) = editable_category(category) else {
                return;
            };
            if !document.forecast_months.contains(month) {
                warn!("Ignoring edit for {}: not a forecast month", month);
                return;
            }
            document
                .budget
                .entry(*month)
                .or_default()
                .insert(category, CategoryAggregate::new(*income, *expenses));
        }

        BudgetEdit::RemoveCategory { month, category } => {
            let Some(category) = editable_category(category) else {
                return;
            };
            if let Some(breakdown) = document.budget.get_mut(month) {
                breakdown.remove(&category);
            }
        }

        BudgetEdit::ScaleCategory { category, factor } => {
            let Some(category) = editable_category(category) else {
                return;
            };
            for breakdown in document.budget.values_mut() {
                if let Some(cell) = breakdown.get_mut(&category) {
                    cell.income *= factor;
                    cell.expenses *= factor;
                }
            }
        }

        BudgetEdit::SetGrowthRate {
            category,
            income_rate_percent,
            expense_rate_percent,
        } => {
            let Some(category) = editable_category(category) else {
                return;
            };
            let rate = document
                .category_growth_rates
                .entry(category)
                .or_insert(GrowthRate {
                    income_rate_percent: 0.0,
                    expense_rate_percent: 0.0,
                    last_value: CategoryAggregate::default(),
                });
            rate.income_rate_percent = *income_rate_percent;
            rate.expense_rate_percent = *expense_rate_percent;
        }

        BudgetEdit::RenameCategory { from, to } => {
            let (Some(from), Some(to)) = (editable_category(from), editable_category(to)) else {
                return;
            };
            if from == to {
                return;
            }
            for breakdown in document.budget.values_mut() {
                if let Some(cell) = breakdown.remove(&from) {
                    *breakdown.entry(to.clone()).or_default() += cell;
                }
            }
            if let Some(rate) = document.category_growth_rates.remove(&from) {
                document.category_growth_rates.entry(to).or_insert(rate);
            }
        }
    }
}

/// The planned-items cell is rebuilt on every load, so edits to it would not stick.
fn editable_category(raw: &str) -> Option<Category> {
    let category = Category::named(raw);
    if category.is_planned_items() {
        warn!("Ignoring edit to the synthetic '{}' category", category);
        None
    } else {
        Some(category)
    }
}
