// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Account lifecycle and balances.
//!
//! `Account::balance` is only ever written here: once at creation and then by
//! [`Ledger::apply_transaction`] / [`Ledger::reverse_transaction`].

use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{FinanceError, FinanceResult};
use crate::models::{Account, AccountId, AccountKind, AccountState, Transaction, UserId};
use crate::store::{AccountQuery, RecordStore};
use crate::telemetry::{Reported, TelemetrySink};
use crate::utils::now;

pub struct Ledger<'a> {
    store: &'a dyn RecordStore,
    telemetry: &'a dyn TelemetrySink,
    settings: &'a Settings,
}

impl<'a> Ledger<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        telemetry: &'a dyn TelemetrySink,
        settings: &'a Settings,
    ) -> Self {
        Ledger {
            store,
            telemetry,
            settings,
        }
    }

    pub fn open_account(
        &self,
        user_id: UserId,
        name: &str,
        kind: AccountKind,
        initial_balance: Decimal,
    ) -> FinanceResult<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FinanceError::InvalidInput(
                "account name must not be empty".into(),
            ));
        }
        if initial_balance.abs() > self.settings.max_amount {
            return Err(FinanceError::InvalidAmount(format!(
                "initial balance {} exceeds {}",
                initial_balance, self.settings.max_amount
            )));
        }
        self.store
            .fetch_user(user_id)
            .reported(self.telemetry, "Ledger::open_account")?
            .ok_or_else(|| FinanceError::not_found("User", user_id))?;

        let account = Account {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            balance: initial_balance,
            kind,
            state: AccountState::Active,
            created_at: now(),
        };
        self.store
            .insert_account(&account)
            .reported(self.telemetry, "Ledger::open_account")?;

        self.telemetry.record_event(
            "account_created",
            json!({
                "account_type": kind.as_str(),
                "initial_balance": initial_balance.to_string(),
            }),
        );
        tracing::info!(account_id = %account.id, %user_id, name, "account opened");
        Ok(account)
    }

    /// Any account, active or not.
    pub fn account(&self, id: AccountId) -> FinanceResult<Account> {
        self.store
            .fetch_account(id)
            .reported(self.telemetry, "Ledger::account")?
            .ok_or_else(|| FinanceError::not_found("Account", id))
    }

    /// An account that still accepts transactions; inactive ones read as missing.
    pub fn active_account(&self, id: AccountId) -> FinanceResult<Account> {
        let account = self.account(id)?;
        if !account.state.is_active() {
            return Err(FinanceError::not_found("Active account", id));
        }
        Ok(account)
    }

    pub fn accounts_for(&self, user_id: UserId) -> FinanceResult<Vec<Account>> {
        let accounts = self
            .store
            .fetch_accounts(&AccountQuery::active_for(user_id))
            .reported(self.telemetry, "Ledger::accounts_for")?;
        tracing::debug!(%user_id, count = accounts.len(), "accounts loaded");
        Ok(accounts)
    }

    pub fn accounts_by_kind(
        &self,
        user_id: UserId,
        kind: AccountKind,
    ) -> FinanceResult<Vec<Account>> {
        self.store
            .fetch_accounts(&AccountQuery::active_for(user_id).kind(kind))
            .reported(self.telemetry, "Ledger::accounts_by_kind")
    }

    pub fn rename_account(&self, id: AccountId, name: &str) -> FinanceResult<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FinanceError::InvalidInput(
                "account name must not be empty".into(),
            ));
        }
        let mut account = self.account(id)?;
        account.name = name.to_string();
        self.store
            .update_account(&account)
            .reported(self.telemetry, "Ledger::rename_account")?;
        self.telemetry.record_event(
            "account_updated",
            json!({ "account_type": account.kind.as_str(), "account_id": id.to_string() }),
        );
        Ok(account)
    }

    /// Soft delete: the account keeps its balance and history but drops out
    /// of listings and totals.
    pub fn deactivate_account(&self, id: AccountId) -> FinanceResult<Account> {
        let mut account = self.account(id)?;
        if account.state == AccountState::Inactive {
            return Ok(account);
        }
        account.state = AccountState::Inactive;
        self.store
            .update_account(&account)
            .reported(self.telemetry, "Ledger::deactivate_account")?;
        tracing::info!(account_id = %id, balance = %account.balance, "account deactivated");
        Ok(account)
    }

    /// Physical delete, refused while any transaction still references the account.
    pub fn delete_account(&self, id: AccountId) -> FinanceResult<()> {
        let account = self.account(id)?;
        let owned = self
            .store
            .count_transactions(id)
            .reported(self.telemetry, "Ledger::delete_account")?;
        if owned > 0 {
            return Err(FinanceError::DependentRecordsExist(format!(
                "account '{}' ({} transactions)",
                account.name, owned
            )));
        }
        self.store
            .delete_account(id)
            .reported(self.telemetry, "Ledger::delete_account")?;
        self.telemetry.record_event(
            "account_deleted",
            json!({ "account_type": account.kind.as_str(), "account_id": id.to_string() }),
        );
        tracing::info!(account_id = %id, "account deleted");
        Ok(())
    }

    /// Adds the signed amount to the owning account. Returns the updated
    /// account, or `None` when the transaction has no account.
    pub fn apply_transaction(&self, tx: &Transaction) -> FinanceResult<Option<Account>> {
        self.shift_balance(tx, tx.amount, "Ledger::apply_transaction")
    }

    /// Exact inverse of [`Ledger::apply_transaction`].
    pub fn reverse_transaction(&self, tx: &Transaction) -> FinanceResult<Option<Account>> {
        self.shift_balance(tx, -tx.amount, "Ledger::reverse_transaction")
    }

    fn shift_balance(
        &self,
        tx: &Transaction,
        delta: Decimal,
        context: &str,
    ) -> FinanceResult<Option<Account>> {
        let Some(account_id) = tx.account_id else {
            return Ok(None);
        };
        let mut account = self.account(account_id)?;
        account.balance = account.balance.checked_add(delta).ok_or_else(|| {
            FinanceError::InvalidAmount(format!(
                "balance of account {} cannot absorb {}",
                account_id, delta
            ))
        })?;
        self.store
            .update_account(&account)
            .reported(self.telemetry, context)?;
        tracing::debug!(
            %account_id,
            transaction_id = %tx.id,
            %delta,
            balance = %account.balance,
            "balance updated"
        );
        Ok(Some(account))
    }

    /// Sum of the balances of the user's active accounts.
    pub fn total_balance(&self, user_id: UserId) -> FinanceResult<Decimal> {
        let total = self
            .accounts_for(user_id)?
            .iter()
            .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a.balance))
            .ok_or_else(|| {
                FinanceError::InvalidAmount(format!(
                    "total balance of user {} is not representable",
                    user_id
                ))
            })?;
        tracing::debug!(%user_id, %total, "total balance computed");
        Ok(total)
    }
}
