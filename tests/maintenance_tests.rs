// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, TimeZone, Utc};
use pursebook::config;
use pursebook::models::{AccountKind, Category};
use pursebook::store::RecordStore;
use pursebook::{Finance, MemoryTelemetry, Session, SqliteStore};
use rust_decimal_macros::dec;

fn setup() -> (SqliteStore, MemoryTelemetry, Session) {
    (
        SqliteStore::open_in_memory().unwrap(),
        MemoryTelemetry::new(),
        Session::new(),
    )
}

fn march(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
}

#[test]
fn seeds_a_consistent_demo_user() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.seed_sample_data_at(march(20)).unwrap().unwrap();
    assert_eq!(user.email, "demo@example.com");
    assert_eq!(user.preferred_currency, "BRL");

    let balances: Vec<_> = finance
        .ledger()
        .accounts_for(user.id)
        .unwrap()
        .into_iter()
        .map(|a| (a.kind, a.balance))
        .collect();
    assert_eq!(balances.len(), 4);
    assert!(balances.contains(&(AccountKind::Checking, dec!(7379.50))));
    assert!(balances.contains(&(AccountKind::Savings, dec!(15000.00))));
    assert!(balances.contains(&(AccountKind::Credit, dec!(-925.00))));
    assert!(balances.contains(&(AccountKind::Investment, dec!(25000.00))));
    assert_eq!(finance.ledger().total_balance(user.id).unwrap(), dec!(46454.50));

    let budgets = finance.budgets();
    let spent = |category| {
        budgets
            .find_budget(user.id, category, 3, 2026)
            .unwrap()
            .unwrap()
            .spent
    };
    assert_eq!(spent(Category::Food), dec!(120.50));
    assert_eq!(spent(Category::Transport), dec!(45));
    assert_eq!(spent(Category::Entertainment), dec!(80));
    assert_eq!(spent(Category::Shopping), dec!(0));

    let txs = finance.journal().transactions_for(user.id, None, None).unwrap();
    assert_eq!(txs.len(), 4);
    assert_eq!(txs[0].description, "Cinema");
    assert!(telemetry.event_names().contains(&"sample_data_seeded".to_string()));
    assert!(telemetry.errors().is_empty());
}

#[test]
fn seeding_early_in_the_month_stays_in_the_month() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.seed_sample_data_at(march(2)).unwrap().unwrap();

    let txs = finance.journal().transactions_for(user.id, None, None).unwrap();
    let month_start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    assert_eq!(txs.len(), 4);
    assert!(txs.iter().all(|t| t.occurred_at >= month_start));
    let food = finance
        .budgets()
        .find_budget(user.id, Category::Food, 3, 2026)
        .unwrap()
        .unwrap();
    assert_eq!(food.spent, dec!(120.50));
}

#[test]
fn seeding_skips_a_store_with_users() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    finance.users().register("ana@example.com", "Ana", None).unwrap();

    assert!(finance.seed_sample_data().unwrap().is_none());
    assert_eq!(store.fetch_users().unwrap().len(), 1);

    let (other, telemetry, session) = setup();
    let finance = Finance::new(&other, &telemetry, &session).unwrap();
    assert!(finance.seed_sample_data().unwrap().is_some());
    assert!(finance.seed_sample_data().unwrap().is_none());
    assert_eq!(other.fetch_users().unwrap().len(), 1);
}

#[test]
fn clear_all_empties_the_store_but_keeps_settings() {
    let (store, telemetry, session) = setup();
    let mut finance = Finance::new(&store, &telemetry, &session).unwrap();
    finance.update_setting(config::DASHBOARD_MONTHS, "3").unwrap();
    let demo = finance.seed_sample_data_at(march(20)).unwrap().unwrap();
    let extra = finance.users().register("bo@example.com", "Bo", None).unwrap();
    finance
        .budgets()
        .create_budget(extra.id, Category::Bills, dec!(90), 3, 2026)
        .unwrap();

    finance.clear_all().unwrap();

    assert!(store.fetch_users().unwrap().is_empty());
    assert!(finance.ledger().accounts_for(demo.id).unwrap().is_empty());
    assert!(finance.budgets().budgets_for(demo.id).unwrap().is_empty());
    assert!(finance.budgets().budgets_for(extra.id).unwrap().is_empty());
    assert!(
        finance
            .journal()
            .transactions_for(demo.id, None, None)
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        Finance::new(&store, &telemetry, &session)
            .unwrap()
            .settings()
            .dashboard_months,
        3
    );
    assert!(telemetry.event_names().contains(&"data_cleared".to_string()));

    // a cleared store can be seeded again
    assert!(finance.seed_sample_data_at(march(20)).unwrap().is_some());
}

#[test]
fn failed_clear_leaves_everything_in_place() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let demo = finance.seed_sample_data_at(march(20)).unwrap().unwrap();
    store
        .connection()
        .execute_batch(
            "CREATE TRIGGER users_locked BEFORE DELETE ON users
             BEGIN SELECT RAISE(ABORT, 'users are read-only'); END;",
        )
        .unwrap();

    assert!(finance.clear_all().unwrap_err().is_storage());
    assert_eq!(store.fetch_users().unwrap().len(), 1);
    assert_eq!(finance.ledger().accounts_for(demo.id).unwrap().len(), 4);
    assert_eq!(
        finance
            .journal()
            .transactions_for(demo.id, None, None)
            .unwrap()
            .len(),
        4
    );
    assert_eq!(telemetry.errors()[0].0, "Finance::clear_all");
}
