use crate::error::{CashFlowError, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject, StringValidation};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const PLANNED_ITEMS: &str = "Planned Items";

/// A calendar month. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
            return Err(CashFlowError::InvalidMonthKey(format!(
                "{:04}-{:02}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parses `YYYY-MM`, or the month prefix of `YYYY-MM-DD` / an RFC 3339 timestamp.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let invalid = || CashFlowError::InvalidMonthKey(raw.to_string());

        let bytes = raw.as_bytes();
        if bytes.len() < 7 || bytes[4] != b'-' || (bytes.len() > 7 && bytes[7] != b'-') {
            return Err(invalid());
        }

        let year_part = &raw[0..4];
        let month_part = &raw[5..7];
        if !year_part.chars().all(|c| c.is_ascii_digit())
            || !month_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year: i32 = year_part.parse().map_err(|_| invalid())?;
        let month: u32 = month_part.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn add_months(&self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn next(&self) -> Self {
        self.add_months(1)
    }

    pub fn prev(&self) -> Self {
        self.add_months(-1)
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(&self, other: MonthKey) -> i32 {
        (other.year - self.year) * 12 + (other.month as i32 - self.month as i32)
    }

    /// Every month from `start` to `end`, both included. Empty when `end < start`.
    pub fn range_inclusive(start: MonthKey, end: MonthKey) -> Vec<MonthKey> {
        let mut months = Vec::new();
        let mut current = start;
        while current <= end {
            months.push(current);
            current = current.next();
        }
        months
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = CashFlowError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MonthKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for MonthKey {
    fn schema_name() -> String {
        "MonthKey".to_string()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        let mut schema = SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            string: Some(Box::new(StringValidation {
                pattern: Some(r"^\d{4}-\d{2}$".to_string()),
                ..Default::default()
            })),
            ..Default::default()
        };
        schema.metadata().description =
            Some("Calendar month in zero-padded YYYY-MM form".to_string());
        schema.into()
    }
}

/// A transaction category: a trimmed, non-empty name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Blank or missing names collapse to [`UNCATEGORIZED`].
    pub fn new(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(name) if !name.is_empty() => Self(name.to_string()),
            _ => Self::uncategorized(),
        }
    }

    pub fn named(raw: &str) -> Self {
        Self::new(Some(raw))
    }

    pub fn uncategorized() -> Self {
        Self(UNCATEGORIZED.to_string())
    }

    pub fn planned_items() -> Self {
        Self(PLANNED_ITEMS.to_string())
    }

    pub fn is_planned_items(&self) -> bool {
        self.0 == PLANNED_ITEMS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(raw: &str) -> Self {
        Self::named(raw)
    }
}

impl Borrow<str> for Category {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Income and expense totals for one category in one month. Both sides are magnitudes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryAggregate {
    #[schemars(description = "Sum of non-negative transaction amounts")]
    pub income: f64,

    #[schemars(description = "Sum of the absolute values of negative transaction amounts")]
    pub expenses: f64,
}

impl CategoryAggregate {
    pub fn new(income: f64, expenses: f64) -> Self {
        Self { income, expenses }
    }

    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }

    pub fn is_zero(&self) -> bool {
        self.income == 0.0 && self.expenses == 0.0
    }

    /// Routes a signed amount: non-negative to income, negative to expenses.
    pub fn add_amount(&mut self, amount: f64) {
        if amount >= 0.0 {
            self.income += amount;
        } else {
            self.expenses += amount.abs();
        }
    }
}

impl AddAssign for CategoryAggregate {
    fn add_assign(&mut self, rhs: Self) {
        self.income += rhs.income;
        self.expenses += rhs.expenses;
    }
}

pub type CategoryBreakdown = BTreeMap<Category, CategoryAggregate>;

pub type MonthlyCategoryTable = BTreeMap<MonthKey, CategoryBreakdown>;

/// Sums every category cell of one month.
pub fn breakdown_total(breakdown: &CategoryBreakdown) -> CategoryAggregate {
    let mut total = CategoryAggregate::default();
    for aggregate in breakdown.values() {
        total += *aggregate;
    }
    total
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transaction {
    #[schemars(description = "Signed amount. Non-negative is income, negative is an expense.")]
    pub amount: f64,

    #[schemars(description = "Free-form category name; blank or missing means Uncategorized")]
    pub category: Option<String>,

    #[schemars(description = "Booking date in YYYY-MM-DD format")]
    pub booked_at: NaiveDate,
}

impl Transaction {
    pub fn new(booked_at: NaiveDate, amount: f64, category: Option<&str>) -> Self {
        Self {
            amount,
            category: category.map(str::to_string),
            booked_at,
        }
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.booked_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Recurrence {
    #[serde(rename = "one-off", alias = "once")]
    #[schemars(description = "Applies only in the month of the expected date")]
    OneOff,

    #[serde(rename = "monthly")]
    #[schemars(description = "Applies every month from the expected month onward")]
    Monthly,
}

/// A manually declared future income or expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlannedItem {
    pub description: String,

    #[schemars(
        description = "Non-negative magnitude; direction comes from the list the item belongs to"
    )]
    pub amount: f64,

    #[schemars(description = "Expected date, YYYY-MM-DD. Unparseable dates contribute nothing.")]
    pub expected_date: String,

    pub recurrence: Recurrence,
}

impl PlannedItem {
    pub fn new(
        description: &str,
        amount: f64,
        expected_date: NaiveDate,
        recurrence: Recurrence,
    ) -> Self {
        Self {
            description: description.to_string(),
            amount,
            expected_date: expected_date.format("%Y-%m-%d").to_string(),
            recurrence,
        }
    }

    /// Month of `expected_date`, read as `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub fn expected_month(&self) -> Option<MonthKey> {
        let raw = self.expected_date.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|timestamp| timestamp.date_naive())
            })
            .map(MonthKey::from_date)
    }

    /// The amount to contribute, or `None` when it is negative or not finite.
    pub fn usable_amount(&self) -> Option<f64> {
        if self.amount.is_finite() && self.amount >= 0.0 {
            Some(self.amount)
        } else {
            None
        }
    }

    pub fn applies_to(&self, month: MonthKey) -> bool {
        match (self.expected_month(), self.recurrence) {
            (Some(start), Recurrence::Monthly) => month >= start,
            (Some(expected), Recurrence::OneOff) => month == expected,
            (None, _) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Horizon {
    #[default]
    #[serde(rename = "6months")]
    #[schemars(description = "Six calendar months starting next month")]
    SixMonths,

    #[serde(rename = "yearend")]
    #[schemars(description = "From next month through December")]
    YearEnd,
}

impl Horizon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Horizon::SixMonths => "6months",
            Horizon::YearEnd => "yearend",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Horizon {
    type Err = CashFlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "6months" => Ok(Horizon::SixMonths),
            "yearend" => Ok(Horizon::YearEnd),
            other => Err(CashFlowError::InvalidHorizon(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GrowthRate {
    #[schemars(description = "Mean month-over-month income change in percent (12.5 means +12.5%)")]
    pub income_rate_percent: f64,

    #[schemars(description = "Mean month-over-month expense change in percent")]
    pub expense_rate_percent: f64,

    #[schemars(description = "Aggregate of the most recent historical month, the compounding base")]
    pub last_value: CategoryAggregate,
}

pub type GrowthRates = BTreeMap<Category, GrowthRate>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Actual,
    Forecast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BudgetDocument {
    pub horizon: Horizon,
    pub forecast_months: Vec<MonthKey>,
    pub category_growth_rates: GrowthRates,
    pub budget: MonthlyCategoryTable,
}

/// The persisted form of a [`BudgetDocument`], one per account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoredBudget {
    #[schemars(description = "Forecast length selector: '6months' or 'yearend'")]
    pub horizon: Horizon,

    #[schemars(description = "Ordered forecast months, YYYY-MM")]
    pub forecast_months: Vec<MonthKey>,

    #[schemars(description = "Per-category growth rates used to build the budget")]
    pub category_growth_rates: GrowthRates,

    #[schemars(
        description = "Month -> category -> {income, expenses}, restricted to forecast_months"
    )]
    pub budget_data: MonthlyCategoryTable,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredBudget {
    /// Wraps a document for persistence. A previous record keeps its `created_at`.
    pub fn from_document(
        document: BudgetDocument,
        now: DateTime<Utc>,
        previous: Option<&StoredBudget>,
    ) -> Self {
        Self {
            horizon: document.horizon,
            forecast_months: document.forecast_months,
            category_growth_rates: document.category_growth_rates,
            budget_data: document.budget,
            created_at: previous.map(|p| p.created_at).unwrap_or(now),
            updated_at: now,
        }
    }

    pub fn into_document(self) -> BudgetDocument {
        BudgetDocument {
            horizon: self.horizon,
            forecast_months: self.forecast_months,
            category_growth_rates: self.category_growth_rates,
            budget: self.budget_data,
        }
    }

    pub fn to_document(&self) -> BudgetDocument {
        self.clone().into_document()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(StoredBudget)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
