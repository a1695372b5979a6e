// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Datelike, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use super::budgets::{BudgetTracker, SpentChange};
use super::ledger::Ledger;
use crate::config::Settings;
use crate::error::{FinanceError, FinanceResult};
use crate::models::{
    AccountId, Category, NewTransaction, Transaction, TransactionId, TransactionKind, UserId,
};
use crate::store::{RecordStore, TransactionQuery, atomically};
use crate::telemetry::{Reported, TelemetrySink};

/// Writes transactions together with their balance and budget effects.
///
/// Every mutation runs as one unit of work: the record write, the owning
/// account's balance change, then the matching budget's spent change. If any
/// step fails, none of them stick, and no budget event is emitted.
pub struct Journal<'a> {
    store: &'a dyn RecordStore,
    telemetry: &'a dyn TelemetrySink,
    settings: &'a Settings,
}

impl<'a> Journal<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        telemetry: &'a dyn TelemetrySink,
        settings: &'a Settings,
    ) -> Self {
        Journal {
            store,
            telemetry,
            settings,
        }
    }

    fn ledger(&self) -> Ledger<'a> {
        Ledger::new(self.store, self.telemetry, self.settings)
    }

    fn budgets(&self) -> BudgetTracker<'a> {
        BudgetTracker::new(self.store, self.telemetry, self.settings)
    }

    fn validate_amount(&self, amount: Decimal, kind: TransactionKind) -> FinanceResult<()> {
        if amount.is_zero() {
            return Err(FinanceError::InvalidAmount(
                "transaction amount must not be zero".into(),
            ));
        }
        if !kind.accepts(amount) {
            return Err(FinanceError::InvalidAmount(format!(
                "{} must be {} for {}",
                amount,
                match kind {
                    TransactionKind::Income => "positive",
                    TransactionKind::Expense => "negative",
                },
                kind.as_str()
            )));
        }
        if amount.abs() > self.settings.max_amount {
            return Err(FinanceError::InvalidAmount(format!(
                "{} exceeds {}",
                amount.abs(),
                self.settings.max_amount
            )));
        }
        Ok(())
    }

    /// User owning the transaction's account, if it has one.
    fn owner_of(&self, account_id: Option<AccountId>) -> FinanceResult<Option<UserId>> {
        match account_id {
            Some(id) => Ok(Some(self.ledger().account(id)?.user_id)),
            None => Ok(None),
        }
    }

    fn apply_effects(
        &self,
        tx: &Transaction,
        owner: Option<UserId>,
        changes: &mut Vec<SpentChange>,
    ) -> FinanceResult<()> {
        self.ledger().apply_transaction(tx)?;
        if let (Some(user_id), TransactionKind::Expense) = (owner, tx.kind) {
            changes.extend(self.budgets().add_spent(
                user_id,
                tx.category,
                tx.amount,
                tx.occurred_at.month(),
                tx.occurred_at.year(),
            )?);
        }
        Ok(())
    }

    fn reverse_effects(
        &self,
        tx: &Transaction,
        owner: Option<UserId>,
        changes: &mut Vec<SpentChange>,
    ) -> FinanceResult<()> {
        self.ledger().reverse_transaction(tx)?;
        if let (Some(user_id), TransactionKind::Expense) = (owner, tx.kind) {
            changes.extend(self.budgets().subtract_spent(
                user_id,
                tx.category,
                tx.amount,
                tx.occurred_at.month(),
                tx.occurred_at.year(),
            )?);
        }
        Ok(())
    }

    /// Budget events are only emitted once the unit that wrote them commits.
    fn announce(&self, changes: &[SpentChange]) {
        let budgets = self.budgets();
        for change in changes {
            budgets.announce(change);
        }
    }

    pub fn record(&self, new: NewTransaction) -> FinanceResult<Transaction> {
        self.validate_amount(new.amount, new.kind)?;
        let owner = match new.account_id {
            Some(id) => Some(self.ledger().active_account(id)?.user_id),
            None => None,
        };

        let tx = Transaction {
            id: Uuid::new_v4(),
            account_id: new.account_id,
            amount: new.amount,
            description: new.description.trim().to_string(),
            occurred_at: new.occurred_at.trunc_subsecs(6),
            category: new.category,
            kind: new.kind,
        };

        let changes = atomically(self.store, self.telemetry, || {
            let mut changes = Vec::new();
            self.store
                .insert_transaction(&tx)
                .reported(self.telemetry, "Journal::record")?;
            self.apply_effects(&tx, owner, &mut changes)?;
            Ok::<_, FinanceError>(changes)
        })?;
        self.announce(&changes);

        self.telemetry.record_event(
            "transaction_created",
            json!({
                "transaction_type": tx.kind.as_str(),
                "category": tx.category.as_str(),
                "amount": tx.amount.abs().to_string(),
            }),
        );
        tracing::info!(
            transaction_id = %tx.id,
            amount = %tx.amount,
            category = %tx.category,
            "transaction recorded"
        );
        Ok(tx)
    }

    /// Deletes a transaction after undoing its balance and budget effects.
    pub fn remove(&self, id: TransactionId) -> FinanceResult<Transaction> {
        let tx = self.transaction(id)?;
        let owner = self.owner_of(tx.account_id)?;

        let changes = atomically(self.store, self.telemetry, || {
            let mut changes = Vec::new();
            self.reverse_effects(&tx, owner, &mut changes)?;
            self.store
                .delete_transaction(id)
                .reported(self.telemetry, "Journal::remove")?;
            Ok::<_, FinanceError>(changes)
        })?;
        self.announce(&changes);

        self.telemetry.record_event(
            "transaction_deleted",
            json!({
                "transaction_type": tx.kind.as_str(),
                "category": tx.category.as_str(),
            }),
        );
        tracing::info!(transaction_id = %id, "transaction removed");
        Ok(tx)
    }

    /// Replaces a stored transaction, moving its effects from the old values
    /// to the new ones.
    pub fn revise(&self, updated: Transaction) -> FinanceResult<Transaction> {
        self.validate_amount(updated.amount, updated.kind)?;
        let previous = self.transaction(updated.id)?;
        let old_owner = self.owner_of(previous.account_id)?;
        let new_owner = if updated.account_id == previous.account_id {
            old_owner
        } else {
            match updated.account_id {
                Some(id) => Some(self.ledger().active_account(id)?.user_id),
                None => None,
            }
        };
        let mut updated = updated;
        updated.description = updated.description.trim().to_string();
        updated.occurred_at = updated.occurred_at.trunc_subsecs(6);

        let changes = atomically(self.store, self.telemetry, || {
            let mut changes = Vec::new();
            self.reverse_effects(&previous, old_owner, &mut changes)?;
            self.store
                .update_transaction(&updated)
                .reported(self.telemetry, "Journal::revise")?;
            self.apply_effects(&updated, new_owner, &mut changes)?;
            Ok::<_, FinanceError>(changes)
        })?;
        self.announce(&changes);

        self.telemetry.record_event(
            "transaction_updated",
            json!({ "transaction_id": updated.id.to_string() }),
        );
        tracing::info!(transaction_id = %updated.id, "transaction revised");
        Ok(updated)
    }

    pub fn transaction(&self, id: TransactionId) -> FinanceResult<Transaction> {
        self.store
            .fetch_transaction(id)
            .reported(self.telemetry, "Journal::transaction")?
            .ok_or_else(|| FinanceError::not_found("Transaction", id))
    }

    /// Newest first.
    pub fn transactions_for(
        &self,
        user_id: UserId,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> FinanceResult<Vec<Transaction>> {
        self.store
            .fetch_transactions(&TransactionQuery::for_user(user_id).page(limit, offset))
            .reported(self.telemetry, "Journal::transactions_for")
    }

    pub fn transactions_for_account(
        &self,
        account_id: AccountId,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> FinanceResult<Vec<Transaction>> {
        self.store
            .fetch_transactions(&TransactionQuery::for_account(account_id).page(limit, offset))
            .reported(self.telemetry, "Journal::transactions_for_account")
    }

    pub fn transactions_by_category(
        &self,
        user_id: UserId,
        category: Category,
    ) -> FinanceResult<Vec<Transaction>> {
        self.store
            .fetch_transactions(&TransactionQuery::for_user(user_id).category(category))
            .reported(self.telemetry, "Journal::transactions_by_category")
    }

    /// Transactions in `[from, until)`.
    pub fn transactions_between(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> FinanceResult<Vec<Transaction>> {
        self.store
            .fetch_transactions(&TransactionQuery::for_user(user_id).between(from, until))
            .reported(self.telemetry, "Journal::transactions_between")
    }
}
