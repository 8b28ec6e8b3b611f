use crate::schema::{Horizon, MonthKey};
use chrono::{Datelike, Local, NaiveDate};
use std::collections::BTreeSet;

pub const SIX_MONTH_HORIZON_LENGTH: i32 = 6;

pub fn current_month(today: NaiveDate) -> MonthKey {
    MonthKey::from_date(today)
}

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Forecast months for a horizon, always starting with the month after `today`.
///
/// - `SixMonths`: the next 6 calendar months.
/// - `YearEnd`: through December of the current year. In December that range
///   would be empty, so the whole of next year is used instead.
pub fn forecast_months(horizon: Horizon, today: NaiveDate) -> Vec<MonthKey> {
    let first = current_month(today).next();

    match horizon {
        Horizon::SixMonths => (0..SIX_MONTH_HORIZON_LENGTH)
            .map(|offset| first.add_months(offset))
            .collect(),
        Horizon::YearEnd => {
            let end = if today.month() == 12 {
                first.add_months(11)
            } else {
                first.add_months(12 - today.month() as i32 - 1)
            };
            MonthKey::range_inclusive(first, end)
        }
    }
}

/// Sorted, de-duplicated months, with every missing month between the first
/// and last filled in.
pub fn contiguous_months<I>(months: I) -> Vec<MonthKey>
where
    I: IntoIterator<Item = MonthKey>,
{
    let distinct: BTreeSet<MonthKey> = months.into_iter().collect();
    match (distinct.first(), distinct.last()) {
        (Some(&first), Some(&last)) => MonthKey::range_inclusive(first, last),
        _ => Vec::new(),
    }
}
