// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pursebook::models::{AccountId, AccountKind, Category, NewTransaction, TransactionKind};
use pursebook::{Finance, FinanceError, MemoryTelemetry, Session, SqliteStore};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn setup() -> (SqliteStore, MemoryTelemetry, Session) {
    (
        SqliteStore::open_in_memory().unwrap(),
        MemoryTelemetry::new(),
        Session::new(),
    )
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn post(
    finance: &Finance<'_>,
    account_id: AccountId,
    amount: Decimal,
    category: Category,
    occurred_at: DateTime<Utc>,
) {
    let kind = if amount.is_sign_negative() {
        TransactionKind::Expense
    } else {
        TransactionKind::Income
    };
    finance
        .journal()
        .record(NewTransaction {
            account_id: Some(account_id),
            amount,
            description: format!("{} {}", category, amount),
            occurred_at,
            category,
            kind,
        })
        .unwrap();
}

#[test]
fn expenses_by_category_sums_absolute_amounts() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.users().register("ana@example.com", "Ana", None).unwrap();
    let acct = finance
        .ledger()
        .open_account(user.id, "Main", AccountKind::Checking, dec!(0))
        .unwrap()
        .id;

    post(&finance, acct, dec!(-12.50), Category::Food, at(2026, 3, 1));
    post(&finance, acct, dec!(-7.50), Category::Food, at(2026, 3, 20));
    post(&finance, acct, dec!(-40), Category::Transport, at(2026, 3, 2));
    post(&finance, acct, dec!(3000), Category::Salary, at(2026, 3, 5));
    post(&finance, acct, dec!(-99), Category::Food, at(2026, 4, 1));
    post(
        &finance,
        acct,
        dec!(-1),
        Category::Bills,
        Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap(),
    );

    let report = finance.reports().expenses_by_category(user.id, 3, 2026).unwrap();
    assert_eq!(report.len(), 3);
    assert_eq!(report[&Category::Food], dec!(20.00));
    assert_eq!(report[&Category::Transport], dec!(40));
    assert_eq!(report[&Category::Bills], dec!(1));
    assert!(!report.contains_key(&Category::Salary));
    assert!(report.values().all(|v| *v > Decimal::ZERO));

    // pure function of stored transactions
    assert_eq!(
        finance.reports().expenses_by_category(user.id, 3, 2026).unwrap(),
        report
    );

    assert!(
        finance
            .reports()
            .expenses_by_category(user.id, 2, 2026)
            .unwrap()
            .is_empty()
    );
    assert!(matches!(
        finance.reports().expenses_by_category(user.id, 0, 2026),
        Err(FinanceError::InvalidPeriod(_))
    ));
}

#[test]
fn reports_ignore_budget_spent() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.users().register("bo@example.com", "Bo", None).unwrap();
    let budgets = finance.budgets();
    budgets
        .create_budget(user.id, Category::Food, dec!(100), 3, 2026)
        .unwrap();
    budgets
        .record_expense(user.id, Category::Food, dec!(-60), 3, 2026)
        .unwrap();

    assert!(
        finance
            .reports()
            .expenses_by_category(user.id, 3, 2026)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn income_vs_expenses_runs_oldest_to_newest() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.users().register("cy@example.com", "Cy", None).unwrap();
    let acct = finance
        .ledger()
        .open_account(user.id, "Main", AccountKind::Checking, dec!(0))
        .unwrap()
        .id;

    post(&finance, acct, dec!(2000), Category::Salary, at(2025, 12, 5));
    post(&finance, acct, dec!(-150.25), Category::Bills, at(2025, 12, 10));
    post(&finance, acct, dec!(2100), Category::Salary, at(2026, 2, 5));
    post(&finance, acct, dec!(-80), Category::Food, at(2026, 2, 6));
    post(&finance, acct, dec!(-20), Category::Food, at(2026, 2, 28));
    post(&finance, acct, dec!(-5), Category::Other, at(2026, 3, 1));

    let today = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
    let series = finance
        .reports()
        .income_vs_expenses_from(user.id, 3, today)
        .unwrap();

    let labels: Vec<&str> = series.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(labels, vec!["Dec 2025", "Jan 2026", "Feb 2026"]);
    assert_eq!(series[0].income, dec!(2000));
    assert_eq!(series[0].expenses, dec!(150.25));
    assert_eq!(series[1].income, dec!(0));
    assert_eq!(series[1].expenses, dec!(0));
    assert_eq!((series[2].month, series[2].year), (2, 2026));
    assert_eq!(series[2].income, dec!(2100));
    assert_eq!(series[2].expenses, dec!(100));

    let again = finance
        .reports()
        .income_vs_expenses_from(user.id, 3, today)
        .unwrap();
    assert_eq!(again, series);
}

#[test]
fn non_positive_month_counts_yield_nothing() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.users().register("di@example.com", "Di", None).unwrap();
    let reports = finance.reports();

    assert!(reports.income_vs_expenses(user.id, 0).unwrap().is_empty());
    assert!(reports.income_vs_expenses(user.id, -3).unwrap().is_empty());
    assert_eq!(reports.income_vs_expenses(user.id, 1).unwrap().len(), 1);
}

#[test]
fn reports_are_scoped_to_the_user() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let ana = finance.users().register("ana@example.com", "Ana", None).unwrap();
    let bo = finance.users().register("bo@example.com", "Bo", None).unwrap();
    let ana_acct = finance
        .ledger()
        .open_account(ana.id, "A", AccountKind::Checking, dec!(0))
        .unwrap()
        .id;
    let bo_acct = finance
        .ledger()
        .open_account(bo.id, "B", AccountKind::Checking, dec!(0))
        .unwrap()
        .id;
    post(&finance, ana_acct, dec!(-10), Category::Food, at(2026, 3, 3));
    post(&finance, bo_acct, dec!(-99), Category::Food, at(2026, 3, 3));

    let (income, expenses) = finance.reports().month_totals(ana.id, 3, 2026).unwrap();
    assert_eq!(income, dec!(0));
    assert_eq!(expenses, dec!(10));
}

#[test]
fn dashboard_requires_a_signed_in_user() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    assert!(matches!(
        finance.reports().dashboard(&session),
        Err(FinanceError::Unauthenticated)
    ));
    assert!(matches!(
        finance.current_user(),
        Err(FinanceError::Unauthenticated)
    ));
}

#[test]
fn dashboard_snapshot() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.users().register("ed@example.com", "Ed", None).unwrap();
    let ledger = finance.ledger();
    let main = ledger
        .open_account(user.id, "Main", AccountKind::Checking, dec!(500))
        .unwrap()
        .id;
    let old = ledger
        .open_account(user.id, "Old", AccountKind::Savings, dec!(70))
        .unwrap()
        .id;

    post(&finance, main, dec!(1000), Category::Salary, at(2026, 5, 1));
    for day in 2..=8 {
        post(&finance, main, dec!(-10), Category::Food, at(2026, 5, day));
    }
    post(&finance, old, dec!(-30), Category::Other, at(2026, 5, 9));
    post(&finance, main, dec!(-1), Category::Food, at(2026, 4, 30));
    ledger.deactivate_account(old).unwrap();

    session.sign_in(user.id);
    let today = NaiveDate::from_ymd_opt(2026, 5, 20).unwrap();
    let dashboard = finance.reports().dashboard_at(&session, today).unwrap();

    assert_eq!(dashboard.accounts.len(), 1);
    assert_eq!(dashboard.total_balance, dec!(1429));
    assert_eq!(dashboard.recent_transactions.len(), 5);
    assert_eq!(dashboard.recent_transactions[0].amount, dec!(-30));
    assert_eq!(dashboard.cashflow.len(), 6);
    assert_eq!(dashboard.cashflow[5].label, "May 2026");
    assert_eq!(dashboard.cashflow[4].expenses, dec!(1));
    // inactive accounts still count toward history
    assert_eq!(dashboard.monthly_income, dec!(1000));
    assert_eq!(dashboard.monthly_expenses, dec!(100));
    assert_eq!(dashboard.monthly_savings, dec!(900));
    assert!(telemetry.event_names().contains(&"dashboard_viewed".to_string()));
}
