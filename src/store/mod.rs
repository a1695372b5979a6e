// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Record store boundary.
//!
//! The services only talk to [`RecordStore`]; [`SqliteStore`] is the
//! reference backend. Mutations that must land together run inside
//! [`atomically`], which maps to a nestable unit of work in the backend.

pub mod sqlite;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    Account, AccountId, AccountKind, AccountState, Budget, BudgetId, Category, Transaction,
    TransactionId, TransactionKind, User, UserId,
};
use crate::telemetry::TelemetrySink;

pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Default)]
pub struct AccountQuery {
    pub user_id: Option<UserId>,
    pub state: Option<AccountState>,
    pub kind: Option<AccountKind>,
}

impl AccountQuery {
    /// Active accounts of one user.
    pub fn active_for(user_id: UserId) -> Self {
        AccountQuery {
            user_id: Some(user_id),
            state: Some(AccountState::Active),
            kind: None,
        }
    }

    pub fn kind(mut self, kind: AccountKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Transaction predicate. `user_id` matches through the owning account, so
/// transactions without an account never match a user filter.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub user_id: Option<UserId>,
    pub account_id: Option<AccountId>,
    pub category: Option<Category>,
    pub kind: Option<TransactionKind>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>, // exclusive
    pub order: SortOrder,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl TransactionQuery {
    pub fn for_user(user_id: UserId) -> Self {
        TransactionQuery {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn for_account(account_id: AccountId) -> Self {
        TransactionQuery {
            account_id: Some(account_id),
            ..Default::default()
        }
    }

    pub fn between(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.until = Some(until);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, limit: Option<usize>, offset: Option<usize>) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct BudgetQuery {
    pub user_id: Option<UserId>,
    pub category: Option<Category>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl BudgetQuery {
    pub fn for_user(user_id: UserId) -> Self {
        BudgetQuery {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn period(mut self, month: u32, year: i32) -> Self {
        self.month = Some(month);
        self.year = Some(year);
        self
    }

    pub fn key(user_id: UserId, category: Category, month: u32, year: i32) -> Self {
        BudgetQuery {
            user_id: Some(user_id),
            category: Some(category),
            month: Some(month),
            year: Some(year),
        }
    }
}

pub trait RecordStore {
    fn begin_unit(&self) -> StoreResult<()>;
    fn commit_unit(&self) -> StoreResult<()>;
    fn rollback_unit(&self) -> StoreResult<()>;

    fn setting(&self, key: &str) -> StoreResult<Option<String>>;
    fn put_setting(&self, key: &str, value: &str) -> StoreResult<()>;

    fn insert_user(&self, user: &User) -> StoreResult<()>;
    fn update_user(&self, user: &User) -> StoreResult<()>;
    fn delete_user(&self, id: UserId) -> StoreResult<()>;
    fn fetch_user(&self, id: UserId) -> StoreResult<Option<User>>;
    fn fetch_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Every user, oldest first.
    fn fetch_users(&self) -> StoreResult<Vec<User>>;

    fn insert_account(&self, account: &Account) -> StoreResult<()>;
    fn update_account(&self, account: &Account) -> StoreResult<()>;
    fn delete_account(&self, id: AccountId) -> StoreResult<()>;
    fn fetch_account(&self, id: AccountId) -> StoreResult<Option<Account>>;
    fn fetch_accounts(&self, query: &AccountQuery) -> StoreResult<Vec<Account>>;

    fn insert_transaction(&self, tx: &Transaction) -> StoreResult<()>;
    fn update_transaction(&self, tx: &Transaction) -> StoreResult<()>;
    fn delete_transaction(&self, id: TransactionId) -> StoreResult<()>;
    fn fetch_transaction(&self, id: TransactionId) -> StoreResult<Option<Transaction>>;
    fn fetch_transactions(&self, query: &TransactionQuery) -> StoreResult<Vec<Transaction>>;
    fn count_transactions(&self, account_id: AccountId) -> StoreResult<usize>;

    fn insert_budget(&self, budget: &Budget) -> StoreResult<()>;
    fn update_budget(&self, budget: &Budget) -> StoreResult<()>;
    fn delete_budget(&self, id: BudgetId) -> StoreResult<()>;
    fn fetch_budget(&self, id: BudgetId) -> StoreResult<Option<Budget>>;
    fn fetch_budgets(&self, query: &BudgetQuery) -> StoreResult<Vec<Budget>>;
}

/// Runs `f` as one unit of work: committed when it returns `Ok`, rolled back
/// otherwise. Units nest. Begin and commit failures are reported to
/// `telemetry`; errors returned by `f` are left to `f` to report.
pub fn atomically<T, E>(
    store: &dyn RecordStore,
    telemetry: &dyn TelemetrySink,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E>
where
    E: From<StoreError>,
{
    if let Err(err) = store.begin_unit() {
        telemetry.record_error(&err, "atomically::begin");
        return Err(err.into());
    }
    match f() {
        Ok(value) => match store.commit_unit() {
            Ok(()) => Ok(value),
            Err(commit_err) => {
                telemetry.record_error(&commit_err, "atomically::commit");
                rollback_quietly(store);
                Err(commit_err.into())
            }
        },
        Err(err) => {
            rollback_quietly(store);
            Err(err)
        }
    }
}

fn rollback_quietly(store: &dyn RecordStore) {
    if let Err(err) = store.rollback_unit() {
        tracing::error!(error = %err, "rollback of unit of work failed");
    }
}
