// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Whole-store chores: demo data for a fresh install and a full wipe.

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use super::Finance;
use crate::error::{FinanceError, FinanceResult};
use crate::models::{AccountKind, Category, NewTransaction, TransactionKind, User};
use crate::store::{AccountQuery, BudgetQuery, TransactionQuery, atomically};
use crate::telemetry::Reported;
use crate::utils::{month_bounds, now};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_NAME: &str = "Demo User";

// (name, kind, opening balance in cents)
const DEMO_ACCOUNTS: [(&str, AccountKind, i64); 4] = [
    ("Main Checking", AccountKind::Checking, 250_000),
    ("Savings", AccountKind::Savings, 1_500_000),
    ("Credit Card", AccountKind::Credit, -80_000),
    ("Investments", AccountKind::Investment, 2_500_000),
];

// (account index, amount in cents, description, category, days ago)
const DEMO_TRANSACTIONS: [(usize, i64, &str, Category, i64); 4] = [
    (0, 500_000, "Salary", Category::Salary, 5),
    (0, -12_050, "Groceries", Category::Food, 3),
    (2, -4_500, "Ride", Category::Transport, 2),
    (2, -8_000, "Cinema", Category::Entertainment, 1),
];

// (category, limit in cents)
const DEMO_BUDGETS: [(Category, i64); 4] = [
    (Category::Food, 80_000),
    (Category::Transport, 30_000),
    (Category::Entertainment, 20_000),
    (Category::Shopping, 40_000),
];

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

impl Finance<'_> {
    /// Fills an empty store with a demo user, their accounts, this month's
    /// budgets and a few recent transactions. Does nothing and returns `None`
    /// when any user already exists.
    pub fn seed_sample_data(&self) -> FinanceResult<Option<User>> {
        self.seed_sample_data_at(now())
    }

    /// Seeds relative to `at`: budgets cover `at`'s month and transaction
    /// dates never fall before its first day.
    ///
    /// Everything lands in one unit of work. The per-record events of the
    /// nested writes are emitted as each write lands.
    pub fn seed_sample_data_at(&self, at: DateTime<Utc>) -> FinanceResult<Option<User>> {
        let existing = self
            .store
            .fetch_users()
            .reported(self.telemetry, "Finance::seed_sample_data")?;
        if !existing.is_empty() {
            tracing::info!(users = existing.len(), "store already holds data; not seeding");
            return Ok(None);
        }

        let (month, year) = (at.month(), at.year());
        let (month_start, _) = month_bounds(month, year)?;

        let user = atomically(self.store, self.telemetry, || {
            let user = self.users().register(DEMO_EMAIL, DEMO_NAME, None)?;

            let ledger = self.ledger();
            let mut account_ids = Vec::with_capacity(DEMO_ACCOUNTS.len());
            for (name, kind, balance) in DEMO_ACCOUNTS {
                account_ids.push(ledger.open_account(user.id, name, kind, cents(balance))?.id);
            }

            let budgets = self.budgets();
            for (category, limit) in DEMO_BUDGETS {
                budgets.create_budget(user.id, category, cents(limit), month, year)?;
            }

            let journal = self.journal();
            for (account, amount, description, category, days_ago) in DEMO_TRANSACTIONS {
                let kind = if amount < 0 {
                    TransactionKind::Expense
                } else {
                    TransactionKind::Income
                };
                journal.record(NewTransaction {
                    account_id: Some(account_ids[account]),
                    amount: cents(amount),
                    description: description.to_string(),
                    occurred_at: (at - Duration::days(days_ago)).max(month_start),
                    category,
                    kind,
                })?;
            }
            Ok::<_, FinanceError>(user)
        })?;

        self.telemetry.record_event(
            "sample_data_seeded",
            json!({
                "accounts": DEMO_ACCOUNTS.len(),
                "transactions": DEMO_TRANSACTIONS.len(),
                "budgets": DEMO_BUDGETS.len(),
            }),
        );
        tracing::info!(user_id = %user.id, month, year, "sample data seeded");
        Ok(Some(user))
    }

    /// Deletes every transaction, budget, account and user, in that order,
    /// as one unit of work. Settings are kept.
    pub fn clear_all(&self) -> FinanceResult<()> {
        const CONTEXT: &str = "Finance::clear_all";
        let (transactions, budgets, accounts, users) =
            atomically(self.store, self.telemetry, || {
                let transactions = self
                    .store
                    .fetch_transactions(&TransactionQuery::default())
                    .reported(self.telemetry, CONTEXT)?;
                for tx in &transactions {
                    self.store
                        .delete_transaction(tx.id)
                        .reported(self.telemetry, CONTEXT)?;
                }
                let budgets = self
                    .store
                    .fetch_budgets(&BudgetQuery::default())
                    .reported(self.telemetry, CONTEXT)?;
                for budget in &budgets {
                    self.store
                        .delete_budget(budget.id)
                        .reported(self.telemetry, CONTEXT)?;
                }
                let accounts = self
                    .store
                    .fetch_accounts(&AccountQuery::default())
                    .reported(self.telemetry, CONTEXT)?;
                for account in &accounts {
                    self.store
                        .delete_account(account.id)
                        .reported(self.telemetry, CONTEXT)?;
                }
                let users = self.store.fetch_users().reported(self.telemetry, CONTEXT)?;
                for user in &users {
                    self.store
                        .delete_user(user.id)
                        .reported(self.telemetry, CONTEXT)?;
                }
                Ok::<_, FinanceError>((
                    transactions.len(),
                    budgets.len(),
                    accounts.len(),
                    users.len(),
                ))
            })?;

        self.telemetry.record_event(
            "data_cleared",
            json!({
                "transactions": transactions,
                "budgets": budgets,
                "accounts": accounts,
                "users": users,
            }),
        );
        tracing::info!(transactions, budgets, accounts, users, "all data cleared");
        Ok(())
    }
}
