// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, ffi, params, params_from_iter};
use uuid::Uuid;

use super::{
    AccountQuery, BudgetQuery, RecordStore, SortOrder, StoreError, StoreResult, TransactionQuery,
};
use crate::db;
use crate::models::{
    Account, AccountId, AccountState, Budget, BudgetId, Transaction, TransactionId, User, UserId,
};
use crate::utils::{fmt_timestamp, parse_decimal, parse_timestamp};

const UNIT: &str = "pursebook_unit";

const USER_COLS: &str = "id, email, name, avatar, created_at, preferred_currency";
const ACCOUNT_COLS: &str = "id, user_id, name, balance, kind, is_active, created_at";
const TX_COLS: &str =
    "t.id, t.account_id, t.amount, t.description, t.occurred_at, t.category, t.kind";
const BUDGET_COLS: &str = "id, user_id, category, limit_amount, spent, month, year";

/// [`RecordStore`] over a single SQLite connection.
///
/// Amounts are stored as decimal text and timestamps as fixed-width RFC 3339
/// text, so range predicates compare correctly as strings.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Wraps an already-initialised connection (see [`db::open_at`]).
    pub fn new(conn: Connection) -> Self {
        SqliteStore { conn }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(SqliteStore::new(db::open_at(path)?))
    }

    pub fn open_default() -> Result<Self> {
        Ok(SqliteStore::new(db::open_or_init()?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(SqliteStore::new(db::open_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_all<T>(
        &self,
        sql: &str,
        args: &[Value],
        read: impl Fn(&Row<'_>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            out.push(read(r)?);
        }
        Ok(out)
    }

    fn query_one<T>(
        &self,
        sql: &str,
        id: &str,
        read: impl Fn(&Row<'_>) -> Result<T>,
    ) -> Result<Option<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(r) => Ok(Some(read(r)?)),
            None => Ok(None),
        }
    }

    fn write(&self, what: &str, sql: &str, args: &[Value]) -> StoreResult<usize> {
        self.conn
            .execute(sql, params_from_iter(args.iter()))
            .map_err(|e| classify(e, what))
    }

    fn write_one(&self, what: &str, sql: &str, args: &[Value]) -> StoreResult<()> {
        match self.write(what, sql, args)? {
            0 => Err(StoreError::Backend(anyhow!("{} does not exist", what))),
            _ => Ok(()),
        }
    }
}

fn classify(err: rusqlite::Error, what: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
            || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        {
            return StoreError::Conflict(what.to_string());
        }
    }
    StoreError::Backend(anyhow::Error::new(err).context(format!("Write {}", what)))
}

fn text(s: impl Into<String>) -> Value {
    Value::Text(s.into())
}

fn opt_text(s: Option<String>) -> Value {
    s.map(Value::Text).unwrap_or(Value::Null)
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).with_context(|| format!("Invalid id '{}'", s))
}

fn read_user(r: &Row<'_>) -> Result<User> {
    let id: String = r.get(0)?;
    let created: String = r.get(4)?;
    Ok(User {
        id: parse_uuid(&id)?,
        email: r.get(1)?,
        name: r.get(2)?,
        avatar: r.get(3)?,
        created_at: parse_timestamp(&created)?,
        preferred_currency: r.get(5)?,
    })
}

fn read_account(r: &Row<'_>) -> Result<Account> {
    let id: String = r.get(0)?;
    let user_id: String = r.get(1)?;
    let balance: String = r.get(3)?;
    let kind: String = r.get(4)?;
    let active: bool = r.get(5)?;
    let created: String = r.get(6)?;
    Ok(Account {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        name: r.get(2)?,
        balance: parse_decimal(&balance)
            .with_context(|| format!("Invalid balance for account {}", id))?,
        kind: kind.parse().map_err(anyhow::Error::msg)?,
        state: if active {
            AccountState::Active
        } else {
            AccountState::Inactive
        },
        created_at: parse_timestamp(&created)?,
    })
}

fn read_transaction(r: &Row<'_>) -> Result<Transaction> {
    let id: String = r.get(0)?;
    let account_id: Option<String> = r.get(1)?;
    let amount: String = r.get(2)?;
    let occurred: String = r.get(4)?;
    let category: String = r.get(5)?;
    let kind: String = r.get(6)?;
    Ok(Transaction {
        id: parse_uuid(&id)?,
        account_id: account_id.as_deref().map(parse_uuid).transpose()?,
        amount: parse_decimal(&amount)
            .with_context(|| format!("Invalid amount for transaction {}", id))?,
        description: r.get(3)?,
        occurred_at: parse_timestamp(&occurred)?,
        category: category.parse().map_err(anyhow::Error::msg)?,
        kind: kind.parse().map_err(anyhow::Error::msg)?,
    })
}

fn read_budget(r: &Row<'_>) -> Result<Budget> {
    let id: String = r.get(0)?;
    let user_id: String = r.get(1)?;
    let category: String = r.get(2)?;
    let limit: String = r.get(3)?;
    let spent: String = r.get(4)?;
    Ok(Budget {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        category: category.parse().map_err(anyhow::Error::msg)?,
        limit: parse_decimal(&limit).with_context(|| format!("Invalid limit for budget {}", id))?,
        spent: parse_decimal(&spent).with_context(|| format!("Invalid spent for budget {}", id))?,
        month: r.get(5)?,
        year: r.get(6)?,
    })
}

fn account_values(a: &Account) -> Vec<Value> {
    vec![
        text(a.id.to_string()),
        text(a.user_id.to_string()),
        text(a.name.clone()),
        text(a.balance.to_string()),
        text(a.kind.as_str()),
        Value::Integer(a.state.is_active() as i64),
        text(fmt_timestamp(&a.created_at)),
    ]
}

fn transaction_values(t: &Transaction) -> Vec<Value> {
    vec![
        text(t.id.to_string()),
        opt_text(t.account_id.map(|id| id.to_string())),
        text(t.amount.to_string()),
        text(t.description.clone()),
        text(fmt_timestamp(&t.occurred_at)),
        text(t.category.as_str()),
        text(t.kind.as_str()),
    ]
}

fn budget_values(b: &Budget) -> Vec<Value> {
    vec![
        text(b.id.to_string()),
        text(b.user_id.to_string()),
        text(b.category.as_str()),
        text(b.limit.to_string()),
        text(b.spent.to_string()),
        Value::Integer(b.month as i64),
        Value::Integer(b.year as i64),
    ]
}

fn user_values(u: &User) -> Vec<Value> {
    vec![
        text(u.id.to_string()),
        text(u.email.clone()),
        text(u.name.clone()),
        u.avatar.clone().map(Value::Blob).unwrap_or(Value::Null),
        text(fmt_timestamp(&u.created_at)),
        text(u.preferred_currency.clone()),
    ]
}

impl RecordStore for SqliteStore {
    fn begin_unit(&self) -> StoreResult<()> {
        self.conn
            .execute_batch(&format!("SAVEPOINT {}", UNIT))
            .context("Begin unit of work")?;
        Ok(())
    }

    fn commit_unit(&self) -> StoreResult<()> {
        self.conn
            .execute_batch(&format!("RELEASE {}", UNIT))
            .context("Commit unit of work")?;
        Ok(())
    }

    fn rollback_unit(&self) -> StoreResult<()> {
        self.conn
            .execute_batch(&format!("ROLLBACK TO {0}; RELEASE {0}", UNIT))
            .context("Roll back unit of work")?;
        Ok(())
    }

    fn setting(&self, key: &str) -> StoreResult<Option<String>> {
        let v: Option<String> = self
            .conn
            .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
                r.get(0)
            })
            .optional()
            .with_context(|| format!("Read setting '{}'", key))?;
        Ok(v)
    }

    fn put_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        self.write(
            "setting",
            "INSERT INTO settings(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            &[text(key), text(value)],
        )?;
        Ok(())
    }

    fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.write(
            "user",
            "INSERT INTO users(id, email, name, avatar, created_at, preferred_currency)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            &user_values(user),
        )?;
        Ok(())
    }

    fn update_user(&self, user: &User) -> StoreResult<()> {
        self.write_one(
            "user",
            "UPDATE users SET email=?2, name=?3, avatar=?4, created_at=?5, preferred_currency=?6
             WHERE id=?1",
            &user_values(user),
        )
    }

    fn delete_user(&self, id: UserId) -> StoreResult<()> {
        self.write_one("user", "DELETE FROM users WHERE id=?1", &[text(id.to_string())])
    }

    fn fetch_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id=?1", USER_COLS);
        Ok(self
            .query_one(&sql, &id.to_string(), read_user)
            .with_context(|| format!("Fetch user {}", id))?)
    }

    fn fetch_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email=?1", USER_COLS);
        Ok(self
            .query_one(&sql, email, read_user)
            .with_context(|| format!("Fetch user by email '{}'", email))?)
    }

    fn fetch_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at, id", USER_COLS);
        Ok(self.query_all(&sql, &[], read_user).context("Fetch users")?)
    }

    fn insert_account(&self, account: &Account) -> StoreResult<()> {
        self.write(
            "account",
            "INSERT INTO accounts(id, user_id, name, balance, kind, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            &account_values(account),
        )?;
        Ok(())
    }

    fn update_account(&self, account: &Account) -> StoreResult<()> {
        self.write_one(
            "account",
            "UPDATE accounts SET user_id=?2, name=?3, balance=?4, kind=?5, is_active=?6, created_at=?7
             WHERE id=?1",
            &account_values(account),
        )
    }

    fn delete_account(&self, id: AccountId) -> StoreResult<()> {
        self.write_one(
            "account",
            "DELETE FROM accounts WHERE id=?1",
            &[text(id.to_string())],
        )
    }

    fn fetch_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {} FROM accounts WHERE id=?1", ACCOUNT_COLS);
        Ok(self
            .query_one(&sql, &id.to_string(), read_account)
            .with_context(|| format!("Fetch account {}", id))?)
    }

    fn fetch_accounts(&self, query: &AccountQuery) -> StoreResult<Vec<Account>> {
        let mut sql = format!("SELECT {} FROM accounts WHERE 1=1", ACCOUNT_COLS);
        let mut args = Vec::new();
        if let Some(user_id) = query.user_id {
            sql.push_str(" AND user_id=?");
            args.push(text(user_id.to_string()));
        }
        if let Some(state) = query.state {
            sql.push_str(" AND is_active=?");
            args.push(Value::Integer(state.is_active() as i64));
        }
        if let Some(kind) = query.kind {
            sql.push_str(" AND kind=?");
            args.push(text(kind.as_str()));
        }
        sql.push_str(" ORDER BY name, id");
        Ok(self
            .query_all(&sql, &args, read_account)
            .context("Fetch accounts")?)
    }

    fn insert_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        self.write(
            "transaction",
            "INSERT INTO transactions(id, account_id, amount, description, occurred_at, category, kind)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            &transaction_values(tx),
        )?;
        Ok(())
    }

    fn update_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        self.write_one(
            "transaction",
            "UPDATE transactions SET account_id=?2, amount=?3, description=?4, occurred_at=?5,
             category=?6, kind=?7 WHERE id=?1",
            &transaction_values(tx),
        )
    }

    fn delete_transaction(&self, id: TransactionId) -> StoreResult<()> {
        self.write_one(
            "transaction",
            "DELETE FROM transactions WHERE id=?1",
            &[text(id.to_string())],
        )
    }

    fn fetch_transaction(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        let sql = format!("SELECT {} FROM transactions t WHERE t.id=?1", TX_COLS);
        Ok(self
            .query_one(&sql, &id.to_string(), read_transaction)
            .with_context(|| format!("Fetch transaction {}", id))?)
    }

    fn fetch_transactions(&self, query: &TransactionQuery) -> StoreResult<Vec<Transaction>> {
        let mut sql = format!(
            "SELECT {} FROM transactions t LEFT JOIN accounts a ON t.account_id=a.id WHERE 1=1",
            TX_COLS
        );
        let mut args = Vec::new();

        if let Some(user_id) = query.user_id {
            sql.push_str(" AND a.user_id=?");
            args.push(text(user_id.to_string()));
        }
        if let Some(account_id) = query.account_id {
            sql.push_str(" AND t.account_id=?");
            args.push(text(account_id.to_string()));
        }
        if let Some(category) = query.category {
            sql.push_str(" AND t.category=?");
            args.push(text(category.as_str()));
        }
        if let Some(kind) = query.kind {
            sql.push_str(" AND t.kind=?");
            args.push(text(kind.as_str()));
        }
        if let Some(from) = query.from {
            sql.push_str(" AND t.occurred_at>=?");
            args.push(text(fmt_timestamp(&from)));
        }
        if let Some(until) = query.until {
            sql.push_str(" AND t.occurred_at<?");
            args.push(text(fmt_timestamp(&until)));
        }
        match query.order {
            SortOrder::NewestFirst => sql.push_str(" ORDER BY t.occurred_at DESC, t.id DESC"),
            SortOrder::OldestFirst => sql.push_str(" ORDER BY t.occurred_at ASC, t.id ASC"),
        }
        match (query.limit, query.offset) {
            (Some(limit), offset) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                args.push(Value::Integer(limit as i64));
                args.push(Value::Integer(offset.unwrap_or(0) as i64));
            }
            (None, Some(offset)) => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                args.push(Value::Integer(offset as i64));
            }
            (None, None) => {}
        }

        Ok(self
            .query_all(&sql, &args, read_transaction)
            .context("Fetch transactions")?)
    }

    fn count_transactions(&self, account_id: AccountId) -> StoreResult<usize> {
        let n: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM transactions WHERE account_id=?1",
                params![account_id.to_string()],
                |r| r.get(0),
            )
            .with_context(|| format!("Count transactions of account {}", account_id))?;
        Ok(n as usize)
    }

    fn insert_budget(&self, budget: &Budget) -> StoreResult<()> {
        self.write(
            "budget",
            "INSERT INTO budgets(id, user_id, category, limit_amount, spent, month, year)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            &budget_values(budget),
        )?;
        Ok(())
    }

    fn update_budget(&self, budget: &Budget) -> StoreResult<()> {
        self.write_one(
            "budget",
            "UPDATE budgets SET user_id=?2, category=?3, limit_amount=?4, spent=?5, month=?6, year=?7
             WHERE id=?1",
            &budget_values(budget),
        )
    }

    fn delete_budget(&self, id: BudgetId) -> StoreResult<()> {
        self.write_one(
            "budget",
            "DELETE FROM budgets WHERE id=?1",
            &[text(id.to_string())],
        )
    }

    fn fetch_budget(&self, id: BudgetId) -> StoreResult<Option<Budget>> {
        let sql = format!("SELECT {} FROM budgets WHERE id=?1", BUDGET_COLS);
        Ok(self
            .query_one(&sql, &id.to_string(), read_budget)
            .with_context(|| format!("Fetch budget {}", id))?)
    }

    fn fetch_budgets(&self, query: &BudgetQuery) -> StoreResult<Vec<Budget>> {
        let mut sql = format!("SELECT {} FROM budgets WHERE 1=1", BUDGET_COLS);
        let mut args = Vec::new();
        if let Some(user_id) = query.user_id {
            sql.push_str(" AND user_id=?");
            args.push(text(user_id.to_string()));
        }
        if let Some(category) = query.category {
            sql.push_str(" AND category=?");
            args.push(text(category.as_str()));
        }
        if let Some(month) = query.month {
            sql.push_str(" AND month=?");
            args.push(Value::Integer(month as i64));
        }
        if let Some(year) = query.year {
            sql.push_str(" AND year=?");
            args.push(Value::Integer(year as i64));
        }
        sql.push_str(" ORDER BY year DESC, month DESC, category");
        Ok(self
            .query_all(&sql, &args, read_budget)
            .context("Fetch budgets")?)
    }
}
