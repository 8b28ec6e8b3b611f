use crate::sanitize::Sanitizer;
use crate::schema::{Category, MonthKey, MonthlyCategoryTable, Transaction};
use log::warn;
use std::collections::BTreeSet;

/// Where recorded transactions land when their category collides with the
/// synthetic planned-items category.
pub const RECORDED_PLANNED_ITEMS: &str = "Planned Items (recorded)";

/// Groups transactions into month -> category -> {income, expenses}.
///
/// Input order does not matter. Cells are only created for (month, category)
/// pairs that actually occur. "Planned Items" is reserved for planned amounts,
/// so transactions recorded under it go to [`RECORDED_PLANNED_ITEMS`].
pub fn aggregate_transactions(transactions: &[Transaction]) -> MonthlyCategoryTable {
    let sanitizer = Sanitizer::default();
    let mut table = MonthlyCategoryTable::new();

    for transaction in transactions {
        let month = transaction.month();
        let category = recorded_category(transaction, month);
        let amount = sanitizer.amount(transaction.amount, month);

        table
            .entry(month)
            .or_default()
            .entry(category)
            .or_default()
            .add_amount(amount);
    }

    table
}

fn recorded_category(transaction: &Transaction, month: MonthKey) -> Category {
    let category = Category::new(transaction.category.as_deref());
    if category.is_planned_items() {
        warn!(
            "Transaction in {} uses the reserved category '{}'; recording it as '{}'",
            month, category, RECORDED_PLANNED_ITEMS
        );
        return Category::named(RECORDED_PLANNED_ITEMS);
    }
    category
}

/// Months present in the table, ascending.
pub fn table_months(table: &MonthlyCategoryTable) -> Vec<MonthKey> {
    table.keys().copied().collect()
}

/// Every category observed in any month.
pub fn table_categories(table: &MonthlyCategoryTable) -> BTreeSet<Category> {
    table
        .values()
        .flat_map(|breakdown| breakdown.keys().cloned())
        .collect()
}

/// Signed sum of every transaction booked in or before `month`.
pub fn cumulative_balance_through(transactions: &[Transaction], month: MonthKey) -> f64 {
    let sanitizer = Sanitizer::default();
    transactions
        .iter()
        .filter(|t| t.month() <= month)
        .map(|t| sanitizer.amount(t.amount, t.month()))
        .sum()
}
