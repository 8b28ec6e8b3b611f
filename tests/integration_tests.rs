use cashflow_forecast::*;
use chrono::{NaiveDate, Utc};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn month(year: i32, m: u32) -> MonthKey {
    MonthKey::new(year, m).unwrap()
}

fn salary_and_rent() -> Vec<Transaction> {
    vec![
        Transaction::new(date(2024, 1, 5), 1000.0, Some("Salary")),
        Transaction::new(date(2024, 1, 10), -200.0, Some("Rent")),
        Transaction::new(date(2024, 2, 5), 1100.0, Some("Salary")),
        Transaction::new(date(2024, 2, 10), -200.0, Some("Rent")),
    ]
}

/// Twelve months of a small retail shop with a few uncategorised entries.
fn retail_year() -> Vec<Transaction> {
    let mut transactions = Vec::new();
    for m in 1..=12 {
        let sales = 10_000.0 + 250.0 * m as f64;
        transactions.push(Transaction::new(date(2023, m, 3), sales, Some("Sales")));
        transactions.push(Transaction::new(date(2023, m, 1), -3_000.0, Some("Rent")));
        transactions.push(Transaction::new(
            date(2023, m, 15),
            -(4_000.0 + 50.0 * m as f64),
            Some("Payroll"),
        ));
        if m % 3 == 0 {
            transactions.push(Transaction::new(date(2023, m, 20), -125.0, None));
        }
    }
    transactions
}

#[test]
fn test_salary_and_rent_budget() {
    let outcome = generate_budget(
        &salary_and_rent(),
        &[],
        &[],
        Horizon::SixMonths,
        date(2024, 3, 1),
    )
    .unwrap();
    let document = outcome.into_document().unwrap();

    let salary = &document.category_growth_rates["Salary"];
    assert!((salary.income_rate_percent - 10.0).abs() < 1e-9);
    let rent = &document.category_growth_rates["Rent"];
    assert!(rent.expense_rate_percent.abs() < 1e-9);

    let april = &document.budget[&month(2024, 4)];
    assert!((april["Salary"].income - 1210.0).abs() < 0.01);
    assert!((april["Rent"].expenses - 200.0).abs() < 0.01);

    let may = &document.budget[&month(2024, 5)];
    assert!((may["Salary"].income - 1331.0).abs() < 0.01);
}

#[test]
fn test_no_history_is_insufficient() {
    let outcome =
        generate_budget(&[], &[], &[], Horizon::SixMonths, date(2024, 3, 1)).unwrap();
    assert_eq!(outcome, GenerateOutcome::InsufficientHistory { months_found: 0 });

    let one_month = vec![Transaction::new(date(2024, 2, 1), 50.0, Some("Sales"))];
    let outcome =
        generate_budget(&one_month, &[], &[], Horizon::SixMonths, date(2024, 3, 1)).unwrap();
    assert_eq!(outcome, GenerateOutcome::InsufficientHistory { months_found: 1 });
}

#[test]
fn test_one_off_planned_expense_lands_in_one_month() {
    let insurance = PlannedItem::new("Insurance", 500.0, date(2024, 5, 15), Recurrence::OneOff);
    let document = generate_budget(
        &salary_and_rent(),
        &[],
        &[insurance],
        Horizon::SixMonths,
        date(2024, 3, 1),
    )
    .unwrap()
    .into_document()
    .unwrap();

    for forecast_month in &document.forecast_months {
        let planned = document.budget[forecast_month].get(PLANNED_ITEMS);
        if *forecast_month == month(2024, 5) {
            let planned = planned.unwrap();
            assert_eq!(planned.expenses, 500.0);
            assert_eq!(planned.income, 0.0);
        } else {
            assert!(planned.is_none());
        }
    }
}

#[test]
fn test_recorded_planned_items_category_kept_apart_from_planned_amounts() {
    let mut transactions = salary_and_rent();
    transactions.push(Transaction::new(date(2024, 1, 20), -100.0, Some("Planned Items")));
    transactions.push(Transaction::new(date(2024, 2, 20), -100.0, Some("Planned Items")));
    let insurance = PlannedItem::new("Insurance", 500.0, date(2024, 5, 15), Recurrence::OneOff);

    let document = generate_budget(
        &transactions,
        &[],
        &[insurance],
        Horizon::SixMonths,
        date(2024, 3, 1),
    )
    .unwrap()
    .into_document()
    .unwrap();

    let may = &document.budget[&month(2024, 5)];
    assert_eq!(may[PLANNED_ITEMS].expenses, 500.0);
    assert!((may[RECORDED_PLANNED_ITEMS].expenses - 100.0).abs() < 1e-9);
    assert!(document.budget[&month(2024, 4)].get(PLANNED_ITEMS).is_none());
}

#[test]
fn test_monthly_planned_income_starts_at_expected_month() {
    let retainer = PlannedItem::new("Retainer", 750.0, date(2024, 6, 1), Recurrence::Monthly);
    let document = generate_budget(
        &salary_and_rent(),
        &[retainer],
        &[],
        Horizon::SixMonths,
        date(2024, 3, 1),
    )
    .unwrap()
    .into_document()
    .unwrap();

    assert!(!document.budget[&month(2024, 5)].contains_key(PLANNED_ITEMS));
    for m in 6..=9 {
        assert_eq!(document.budget[&month(2024, m)][PLANNED_ITEMS].income, 750.0);
    }
}

#[test]
fn test_year_end_horizon() {
    let document = generate_budget(
        &salary_and_rent(),
        &[],
        &[],
        Horizon::YearEnd,
        date(2024, 9, 14),
    )
    .unwrap()
    .into_document()
    .unwrap();
    assert_eq!(
        document.forecast_months,
        vec![month(2024, 10), month(2024, 11), month(2024, 12)]
    );
}

#[test]
fn test_rolling_forecast_is_contiguous_and_continuous() {
    let today = date(2024, 1, 10);
    let forecast = compute_rolling_forecast(
        &retail_year(),
        None,
        &[],
        &[],
        Horizon::SixMonths,
        today,
    );

    assert_eq!(forecast.budget_source, BudgetSource::Transient);
    assert_eq!(forecast.entries.first().unwrap().month, month(2023, 1));
    assert_eq!(forecast.entries.last().unwrap().month, month(2024, 7));
    for pair in forecast.entries.windows(2) {
        assert_eq!(pair[0].month.next(), pair[1].month);
    }
    assert!(verify_rolling_forecast(&forecast, 0.01).is_ok());

    // January 2024 has no transactions yet; it is an actual month carrying the December balance.
    let january = forecast.entry(month(2024, 1)).unwrap();
    let december = forecast.entry(month(2023, 12)).unwrap();
    assert_eq!(january.kind, EntryKind::Actual);
    assert_eq!(january.net, 0.0);
    assert!((january.balance - december.balance).abs() < 1e-6);

    let first_forecast = forecast.forecast_entries().next().unwrap();
    assert_eq!(first_forecast.month, month(2024, 2));
    assert!((first_forecast.balance - (january.balance + first_forecast.net)).abs() < 0.01);
}

#[test]
fn test_rolling_forecast_actual_balances_match_ledger() {
    let transactions = retail_year();
    let forecast = compute_rolling_forecast(
        &transactions,
        None,
        &[],
        &[],
        Horizon::SixMonths,
        date(2024, 1, 10),
    );

    let ledger_total: f64 = transactions.iter().map(|t| t.amount).sum();
    let december = forecast.entry(month(2023, 12)).unwrap();
    assert!((december.balance - ledger_total).abs() < 0.01);
    assert!((forecast.starting_balance - ledger_total).abs() < 0.01);

    let actual_net: f64 = forecast.actual_entries().map(|e| e.net).sum();
    assert!((forecast.summary.actual.net - actual_net).abs() < 0.01);
    assert!(
        (forecast.summary.total.net - (forecast.summary.actual.net + forecast.summary.forecast.net))
            .abs()
            < 0.01
    );
}

#[test]
fn test_rolling_forecast_with_stored_budget() {
    let today = date(2024, 3, 1);
    let document = generate_budget(&salary_and_rent(), &[], &[], Horizon::SixMonths, today)
        .unwrap()
        .into_document()
        .unwrap();
    let stored = StoredBudget::from_document(document, Utc::now(), None);

    let forecast = compute_rolling_forecast(
        &salary_and_rent(),
        Some(&stored),
        &[],
        &[],
        Horizon::SixMonths,
        today,
    );
    assert_eq!(forecast.budget_source, BudgetSource::Stored);
    assert!(verify_rolling_forecast(&forecast, 0.01).is_ok());

    let april = forecast.entry(month(2024, 4)).unwrap();
    assert_eq!(april.kind, EntryKind::Forecast);
    assert!((april.net - 1010.0).abs() < 0.01);
    // 1700 through February, nothing in March, then April's projected net.
    assert!((april.balance - 2710.0).abs() < 0.01);

    let other_horizon = compute_rolling_forecast(
        &salary_and_rent(),
        Some(&stored),
        &[],
        &[],
        Horizon::YearEnd,
        today,
    );
    assert_eq!(other_horizon.budget_source, BudgetSource::Transient);
}

#[test]
fn test_rolling_forecast_without_history_uses_planned_items() {
    let bonus = PlannedItem::new("Grant", 2_000.0, date(2024, 4, 1), Recurrence::OneOff);
    let forecast = compute_rolling_forecast(
        &[],
        None,
        &[bonus],
        &[],
        Horizon::SixMonths,
        date(2024, 3, 1),
    );

    assert_eq!(forecast.actual_entries().count(), 1);
    assert_eq!(forecast.forecast_entries().count(), 6);
    let april = forecast.entry(month(2024, 4)).unwrap();
    assert_eq!(april.income, 2_000.0);
    assert_eq!(forecast.entry(month(2024, 9)).unwrap().balance, 2_000.0);
}

#[test]
fn test_variance_sign_convention() {
    let today = date(2024, 3, 1);
    let document = generate_budget(&salary_and_rent(), &[], &[], Horizon::SixMonths, today)
        .unwrap()
        .into_document()
        .unwrap();
    let stored = StoredBudget::from_document(document, Utc::now(), None);

    let mut transactions = salary_and_rent();
    transactions.push(Transaction::new(date(2024, 4, 5), 1300.0, Some("Salary")));
    transactions.push(Transaction::new(date(2024, 4, 9), -150.0, Some("Rent")));

    let report = compute_variance(Some(&stored), &[], &[], &transactions, date(2024, 4, 30))
        .into_report()
        .unwrap();

    let april = report
        .months
        .iter()
        .find(|m| m.month == month(2024, 4))
        .unwrap();
    assert_eq!(april.kind, EntryKind::Actual);

    // Earned more than planned: positive income variance.
    let salary = &april.categories["Salary"];
    assert!((salary.variance.income - 90.0).abs() < 0.01);
    assert!((salary.variance_percent.income - 90.0 / 1210.0 * 100.0).abs() < 0.01);

    // Spent less than planned: negative expense variance.
    let rent = &april.categories["Rent"];
    assert!((rent.variance.expenses - (-50.0)).abs() < 0.01);

    let may = report
        .months
        .iter()
        .find(|m| m.month == month(2024, 5))
        .unwrap();
    assert_eq!(may.kind, EntryKind::Forecast);
    assert!((may.line.variance.net + may.line.plan.net).abs() < 0.01);

    // Totals only cover April, the single elapsed month.
    assert!((report.totals.plan.net - 1010.0).abs() < 0.01);
    assert!((report.totals.actual.net - 1150.0).abs() < 0.01);
}

#[test]
fn test_variance_without_budget() {
    assert_eq!(
        compute_variance(None, &[], &[], &salary_and_rent(), date(2024, 3, 1)),
        VarianceOutcome::NoBudget
    );
}

#[test]
fn test_reload_is_idempotent_and_leaves_no_residue() {
    let today = date(2024, 3, 1);
    let insurance = PlannedItem::new("Insurance", 500.0, date(2024, 5, 15), Recurrence::OneOff);
    let planned_expenses = vec![insurance];
    let document = generate_budget(
        &salary_and_rent(),
        &[],
        &planned_expenses,
        Horizon::SixMonths,
        today,
    )
    .unwrap()
    .into_document()
    .unwrap();
    let stored = StoredBudget::from_document(document, Utc::now(), None);

    let first = load_budget(Some(&stored), &[], &planned_expenses)
        .into_document()
        .unwrap();
    let reloaded = StoredBudget::from_document(first.clone(), Utc::now(), Some(&stored));
    let second = load_budget(Some(&reloaded), &[], &planned_expenses)
        .into_document()
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.budget[&month(2024, 5)][PLANNED_ITEMS].expenses, 500.0);

    let without_items = load_budget(Some(&stored), &[], &[]).into_document().unwrap();
    assert!(without_items
        .budget
        .values()
        .all(|breakdown| !breakdown.contains_key(PLANNED_ITEMS)));
    assert!(without_items.budget[&month(2024, 5)].contains_key("Salary"));
}

#[test]
fn test_load_without_budget() {
    assert_eq!(load_budget(None, &[], &[]), LoadOutcome::NotFound);
}

#[test]
fn test_service_flow() {
    let account = AccountId::from("retail-haven");
    let store = MemoryStore::new();
    store.add_transactions(&account, retail_year()).unwrap();
    let service = ForecastService::new(store, ForecastEngine::default());

    let today = date(2024, 1, 10);
    let generated = service
        .generate_budget(&account, Horizon::SixMonths, today)
        .unwrap();
    assert!(generated.document().is_some());

    let forecast = service
        .rolling_forecast(&account, Horizon::SixMonths, today)
        .unwrap();
    assert_eq!(forecast.budget_source, BudgetSource::Stored);
    assert!(verify_rolling_forecast(&forecast, 0.01).is_ok());

    let edits = BudgetEdits::new(vec![BudgetEdit::ScaleCategory {
        category: "Sales".to_string(),
        factor: 0.5,
    }]);
    let before = service.load_budget(&account).unwrap().into_document().unwrap();
    let after = service
        .edit_budget(&account, &edits)
        .unwrap()
        .into_document()
        .unwrap();
    let february = month(2024, 2);
    assert!(
        (after.budget[&february]["Sales"].income - before.budget[&february]["Sales"].income * 0.5)
            .abs()
            < 0.01
    );

    let other = AccountId::from("someone-else");
    assert_eq!(service.load_budget(&other).unwrap(), LoadOutcome::NotFound);
}

#[test]
fn test_stored_budget_json_and_schema() {
    let document = generate_budget(
        &salary_and_rent(),
        &[],
        &[],
        Horizon::SixMonths,
        date(2024, 3, 1),
    )
    .unwrap()
    .into_document()
    .unwrap();
    let stored = StoredBudget::from_document(document, Utc::now(), None);

    let json = stored.to_json().unwrap();
    assert!(json.contains("\"2024-04\""));
    assert!(json.contains("\"6months\""));
    let parsed = StoredBudget::from_json(&json).unwrap();
    assert_eq!(parsed.horizon, stored.horizon);
    assert_eq!(parsed.forecast_months, stored.forecast_months);
    assert_eq!(parsed.created_at, stored.created_at);
    let april = month(2024, 4);
    assert!(
        (parsed.budget_data[&april]["Salary"].income - stored.budget_data[&april]["Salary"].income)
            .abs()
            < 1e-6
    );

    let schema = StoredBudget::schema_as_json().unwrap();
    assert!(schema.contains("budget_data"));
    assert!(schema.contains("forecast_months"));
}

#[test]
fn test_corrupted_stored_values_are_clamped() {
    let today = date(2024, 3, 1);
    let mut document = generate_budget(&salary_and_rent(), &[], &[], Horizon::SixMonths, today)
        .unwrap()
        .into_document()
        .unwrap();
    document
        .budget
        .get_mut(&month(2024, 4))
        .unwrap()
        .insert(Category::named("Glitch"), CategoryAggregate::new(1e15, 0.0));
    let stored = StoredBudget::from_document(document, Utc::now(), None);

    let loaded = load_budget(Some(&stored), &[], &[]).into_document().unwrap();
    assert_eq!(loaded.budget[&month(2024, 4)]["Glitch"].income, 1e9);

    let forecast = compute_rolling_forecast(
        &salary_and_rent(),
        Some(&stored),
        &[],
        &[],
        Horizon::SixMonths,
        today,
    );
    let april = forecast.entry(month(2024, 4)).unwrap();
    assert!(april.sanitized);
    assert!(april.income <= 1e9 + 2_000.0);
}
