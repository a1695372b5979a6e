// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{TimeZone, Utc};
use pursebook::models::{AccountKind, AccountState, Category, NewTransaction, TransactionKind};
use pursebook::{Finance, FinanceError, MemoryTelemetry, Session, SqliteStore};
use rust_decimal_macros::dec;

fn setup() -> (SqliteStore, MemoryTelemetry, Session) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    (
        SqliteStore::open_in_memory().unwrap(),
        MemoryTelemetry::new(),
        Session::new(),
    )
}

#[test]
fn open_account_validates_input() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.users().register("ana@example.com", "Ana", None).unwrap();
    let ledger = finance.ledger();

    assert!(matches!(
        ledger.open_account(user.id, "   ", AccountKind::Checking, dec!(0)),
        Err(FinanceError::InvalidInput(_))
    ));
    assert!(matches!(
        ledger.open_account(user.id, "Big", AccountKind::Savings, dec!(1000000.00)),
        Err(FinanceError::InvalidAmount(_))
    ));
    assert!(matches!(
        ledger.open_account(uuid::Uuid::new_v4(), "Ghost", AccountKind::Checking, dec!(0)),
        Err(FinanceError::NotFound(_))
    ));

    let acct = ledger
        .open_account(user.id, " Wallet ", AccountKind::Checking, dec!(10.50))
        .unwrap();
    assert_eq!(acct.name, "Wallet");
    assert_eq!(acct.state, AccountState::Active);
    assert_eq!(ledger.account(acct.id).unwrap(), acct);
    assert!(telemetry.event_names().contains(&"account_created".to_string()));
}

#[test]
fn total_balance_skips_inactive_accounts() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.users().register("bo@example.com", "Bo", None).unwrap();
    let ledger = finance.ledger();

    let checking = ledger
        .open_account(user.id, "Checking", AccountKind::Checking, dec!(1000.00))
        .unwrap();
    let savings = ledger
        .open_account(user.id, "Savings", AccountKind::Savings, dec!(250.25))
        .unwrap();
    let card = ledger
        .open_account(user.id, "Card", AccountKind::Credit, dec!(-120.10))
        .unwrap();
    assert_eq!(ledger.total_balance(user.id).unwrap(), dec!(1130.15));

    ledger.deactivate_account(savings.id).unwrap();
    assert_eq!(ledger.total_balance(user.id).unwrap(), dec!(879.90));

    let listed: Vec<_> = ledger
        .accounts_for(user.id)
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(listed, vec![card.id, checking.id]);

    // deactivated accounts keep their history and can still be read by id
    let closed = ledger.account(savings.id).unwrap();
    assert_eq!(closed.state, AccountState::Inactive);
    assert_eq!(closed.balance, dec!(250.25));
    assert!(matches!(
        ledger.active_account(savings.id),
        Err(FinanceError::NotFound(_))
    ));

    // idempotent
    ledger.deactivate_account(savings.id).unwrap();

    let credit = ledger.accounts_by_kind(user.id, AccountKind::Credit).unwrap();
    assert_eq!(credit.len(), 1);
    assert_eq!(credit[0].id, card.id);
}

#[test]
fn total_balance_of_user_without_accounts_is_zero() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.users().register("cy@example.com", "Cy", None).unwrap();
    assert_eq!(finance.ledger().total_balance(user.id).unwrap(), dec!(0));
}

#[test]
fn account_with_transactions_cannot_be_deleted() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.users().register("di@example.com", "Di", None).unwrap();
    let ledger = finance.ledger();
    let journal = finance.journal();

    let acct = ledger
        .open_account(user.id, "Main", AccountKind::Checking, dec!(100))
        .unwrap();
    let tx = journal
        .record(NewTransaction {
            account_id: Some(acct.id),
            amount: dec!(-20.00),
            description: "Lunch".into(),
            occurred_at: Utc.with_ymd_and_hms(2026, 5, 3, 12, 0, 0).unwrap(),
            category: Category::Food,
            kind: TransactionKind::Expense,
        })
        .unwrap();

    assert!(matches!(
        ledger.delete_account(acct.id),
        Err(FinanceError::DependentRecordsExist(_))
    ));
    // soft delete does not lift the restriction
    ledger.deactivate_account(acct.id).unwrap();
    assert!(matches!(
        ledger.delete_account(acct.id),
        Err(FinanceError::DependentRecordsExist(_))
    ));
    assert!(ledger.account(acct.id).is_ok());

    journal.remove(tx.id).unwrap();
    ledger.delete_account(acct.id).unwrap();
    assert!(matches!(
        ledger.account(acct.id),
        Err(FinanceError::NotFound(_))
    ));
    assert!(telemetry.event_names().contains(&"account_deleted".to_string()));
}

#[test]
fn rename_rejects_blank_names() {
    let (store, telemetry, session) = setup();
    let finance = Finance::new(&store, &telemetry, &session).unwrap();
    let user = finance.users().register("ed@example.com", "Ed", None).unwrap();
    let ledger = finance.ledger();
    let acct = ledger
        .open_account(user.id, "Old", AccountKind::Investment, dec!(0))
        .unwrap();

    assert!(ledger.rename_account(acct.id, "").is_err());
    let renamed = ledger.rename_account(acct.id, "Brokerage").unwrap();
    assert_eq!(renamed.name, "Brokerage");
    assert_eq!(ledger.account(acct.id).unwrap().name, "Brokerage");
}
