use crate::aggregator::aggregate_transactions;
use crate::budget::refresh_document;
use crate::sanitize::Sanitizer;
use crate::schema::{
    breakdown_total, Category, CategoryAggregate, CategoryBreakdown, EntryKind, MonthKey,
    PlannedItem, StoredBudget, Transaction,
};
use crate::utils::current_month;
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Figures {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

impl From<CategoryAggregate> for Figures {
    fn from(aggregate: CategoryAggregate) -> Self {
        Self {
            income: aggregate.income,
            expenses: aggregate.expenses,
            net: aggregate.net(),
        }
    }
}

/// Plan against actual for one month, one category, or a total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VarianceLine {
    pub plan: Figures,
    pub actual: Figures,
    /// `actual - plan` for each field.
    pub variance: Figures,
    /// `variance / plan * 100`, or 0 where the plan is 0.
    pub variance_percent: Figures,
}

impl VarianceLine {
    pub fn compare(plan: CategoryAggregate, actual: CategoryAggregate) -> Self {
        let plan = Figures::from(plan);
        let actual = Figures::from(actual);
        let variance = Figures {
            income: actual.income - plan.income,
            expenses: actual.expenses - plan.expenses,
            net: actual.net - plan.net,
        };
        let variance_percent = Figures {
            income: percent_of(variance.income, plan.income),
            expenses: percent_of(variance.expenses, plan.expenses),
            net: percent_of(variance.net, plan.net),
        };

        Self {
            plan,
            actual,
            variance,
            variance_percent,
        }
    }
}

// TODO: surface "undefined" instead of 0 once the budget views can render it.
fn percent_of(variance: f64, plan: f64) -> f64 {
    if plan == 0.0 {
        0.0
    } else {
        variance / plan * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthVariance {
    pub month: MonthKey,
    pub kind: EntryKind,
    #[serde(flatten)]
    pub line: VarianceLine,
    pub categories: BTreeMap<Category, VarianceLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceReport {
    pub months: Vec<MonthVariance>,
    /// Plan against actual summed over the months that have already happened.
    pub totals: VarianceLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VarianceOutcome {
    Computed(VarianceReport),
    NoBudget,
}

impl VarianceOutcome {
    pub fn into_report(self) -> Option<VarianceReport> {
        match self {
            VarianceOutcome::Computed(report) => Some(report),
            VarianceOutcome::NoBudget => None,
        }
    }
}

/// Compares a stored budget against what actually happened, month by month.
pub fn compute_variance(
    stored: Option<&StoredBudget>,
    planned_income: &[PlannedItem],
    planned_expenses: &[PlannedItem],
    transactions: &[Transaction],
    today: NaiveDate,
    sanitizer: &Sanitizer,
) -> VarianceOutcome {
    let Some(stored) = stored else {
        info!("No stored budget; variance not computed");
        return VarianceOutcome::NoBudget;
    };

    let mut document = stored.to_document();
    refresh_document(&mut document, planned_income, planned_expenses, sanitizer);

    let actuals = aggregate_transactions(transactions);
    let current = current_month(today);
    let empty = CategoryBreakdown::new();

    let mut months = Vec::with_capacity(document.forecast_months.len());
    let mut plan_to_date = CategoryAggregate::default();
    let mut actual_to_date = CategoryAggregate::default();

    for month in &document.forecast_months {
        let kind = if *month <= current {
            EntryKind::Actual
        } else {
            EntryKind::Forecast
        };
        let plan = document.budget.get(month).unwrap_or(&empty);
        let actual = actuals.get(month).unwrap_or(&empty);

        let plan_total = breakdown_total(plan);
        let actual_total = breakdown_total(actual);
        if kind == EntryKind::Actual {
            plan_to_date += plan_total;
            actual_to_date += actual_total;
        }

        let categories: BTreeSet<&Category> = plan.keys().chain(actual.keys()).collect();
        let categories = categories
            .into_iter()
            .map(|category| {
                let line = VarianceLine::compare(
                    plan.get(category).copied().unwrap_or_default(),
                    actual.get(category).copied().unwrap_or_default(),
                );
                (category.clone(), line)
            })
            .collect();

        months.push(MonthVariance {
            month: *month,
            kind,
            line: VarianceLine::compare(plan_total, actual_total),
            categories,
        });
    }

    debug!(
        "Variance computed for {} months, {} already elapsed",
        months.len(),
        months.iter().filter(|m| m.kind == EntryKind::Actual).count()
    );

    VarianceOutcome::Computed(VarianceReport {
        months,
        totals: VarianceLine::compare(plan_to_date, actual_to_date),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BudgetDocument, GrowthRates, Horizon, MonthlyCategoryTable};
    use chrono::Utc;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn stored_budget() -> StoredBudget {
        let april = MonthKey::new(2024, 4).unwrap();
        let may = MonthKey::new(2024, 5).unwrap();
        let mut budget = MonthlyCategoryTable::new();
        budget
            .entry(april)
            .or_default()
            .insert(Category::named("Sales"), CategoryAggregate::new(1000.0, 0.0));
        budget
            .entry(april)
            .or_default()
            .insert(Category::named("Rent"), CategoryAggregate::new(0.0, 400.0));
        budget
            .entry(may)
            .or_default()
            .insert(Category::named("Sales"), CategoryAggregate::new(1100.0, 0.0));

        StoredBudget::from_document(
            BudgetDocument {
                horizon: Horizon::SixMonths,
                forecast_months: vec![april, may],
                category_growth_rates: GrowthRates::new(),
                budget,
            },
            Utc::now(),
            None,
        )
    }

    fn actuals() -> Vec<Transaction> {
        vec![
            Transaction::new(date(2024, 4, 3), 1200.0, Some("Sales")),
            Transaction::new(date(2024, 4, 5), -400.0, Some("Rent")),
            Transaction::new(date(2024, 4, 9), -50.0, Some("Software")),
        ]
    }

    #[test]
    fn test_no_budget() {
        let today = date(2024, 4, 30);
        let outcome = compute_variance(None, &[], &[], &actuals(), today, &Sanitizer::default());
        assert_eq!(outcome, VarianceOutcome::NoBudget);
    }

    #[test]
    fn test_monthly_variance() {
        let stored = stored_budget();
        let report = compute_variance(
            Some(&stored),
            &[],
            &[],
            &actuals(),
            date(2024, 4, 30),
            &Sanitizer::default(),
        )
        .into_report()
        .unwrap();

        assert_eq!(report.months.len(), 2);
        let april = &report.months[0];
        assert_eq!(april.kind, EntryKind::Actual);
        assert_eq!(april.line.plan.net, 600.0);
        assert_eq!(april.line.actual.net, 750.0);
        assert_eq!(april.line.variance.income, 200.0);
        assert_eq!(april.line.variance.expenses, 50.0);
        assert_eq!(april.line.variance.net, 150.0);
        assert!((april.line.variance_percent.income - 20.0).abs() < 1e-9);
        assert!((april.line.variance_percent.net - 25.0).abs() < 1e-9);

        let may = &report.months[1];
        assert_eq!(may.kind, EntryKind::Forecast);
        assert_eq!(may.line.variance.income, -1100.0);
        assert_eq!(may.line.variance_percent.income, -100.0);
    }

    #[test]
    fn test_category_union() {
        let stored = stored_budget();
        let report = compute_variance(
            Some(&stored),
            &[],
            &[],
            &actuals(),
            date(2024, 4, 30),
            &Sanitizer::default(),
        )
        .into_report()
        .unwrap();

        let april = &report.months[0];
        let names: Vec<&str> = april.categories.keys().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["Rent", "Sales", "Software"]);

        // Unplanned spending has a zero plan, so its percentage is 0 by definition.
        let software = april.categories["Software"];
        assert_eq!(software.variance.expenses, 50.0);
        assert_eq!(software.variance_percent.expenses, 0.0);

        let rent = april.categories["Rent"];
        assert_eq!(rent.variance.expenses, 0.0);
    }

    #[test]
    fn test_sign_convention_holds_everywhere() {
        let stored = stored_budget();
        let report = compute_variance(
            Some(&stored),
            &[],
            &[],
            &actuals(),
            date(2024, 5, 31),
            &Sanitizer::default(),
        )
        .into_report()
        .unwrap();

        for month in &report.months {
            let lines = std::iter::once(&month.line).chain(month.categories.values());
            for line in lines {
                assert_eq!(line.variance.income, line.actual.income - line.plan.income);
                assert_eq!(line.variance.net, line.actual.net - line.plan.net);
            }
        }
    }

    #[test]
    fn test_totals_cover_elapsed_months_only() {
        let stored = stored_budget();
        let report = compute_variance(
            Some(&stored),
            &[],
            &[],
            &actuals(),
            date(2024, 4, 30),
            &Sanitizer::default(),
        )
        .into_report()
        .unwrap();
        assert_eq!(report.totals.plan.income, 1000.0);
        assert_eq!(report.totals.actual.income, 1200.0);
    }

    #[test]
    fn test_planned_items_refreshed_before_comparing() {
        let stored = stored_budget();
        let expenses = vec![crate::schema::PlannedItem::new(
            "Audit",
            300.0,
            date(2024, 4, 20),
            crate::schema::Recurrence::OneOff,
        )];
        let report = compute_variance(
            Some(&stored),
            &[],
            &expenses,
            &actuals(),
            date(2024, 4, 30),
            &Sanitizer::default(),
        )
        .into_report()
        .unwrap();

        let april = &report.months[0];
        assert_eq!(april.line.plan.expenses, 700.0);
        let planned = april.categories[crate::schema::PLANNED_ITEMS];
        assert_eq!(planned.variance.expenses, -300.0);
    }
}
