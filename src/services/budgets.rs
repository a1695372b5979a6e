// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-category monthly budgets.
//!
//! `spent` is maintained incrementally by [`BudgetTracker::record_expense`] and
//! [`BudgetTracker::reverse_expense`]. [`BudgetTracker::reconcile_spent`] is the
//! only place that recomputes it from transactions, and it is never called on
//! the transaction write path.

use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{FinanceError, FinanceResult};
use crate::models::{
    AlertKind, Budget, BudgetAlert, BudgetId, BudgetSummary, Category, TransactionKind, UserId,
};
use crate::store::{BudgetQuery, RecordStore, StoreError, TransactionQuery};
use crate::telemetry::{Reported, TelemetrySink};
use crate::utils::{current_period, month_bounds, validate_period};

/// A spent total already written to the store but not yet announced.
pub(crate) struct SpentChange {
    budget: Budget,
    crossed_limit: bool,
}

pub struct BudgetTracker<'a> {
    store: &'a dyn RecordStore,
    telemetry: &'a dyn TelemetrySink,
    settings: &'a Settings,
}

impl<'a> BudgetTracker<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        telemetry: &'a dyn TelemetrySink,
        settings: &'a Settings,
    ) -> Self {
        BudgetTracker {
            store,
            telemetry,
            settings,
        }
    }

    fn validate_limit(&self, limit: Decimal) -> FinanceResult<()> {
        if limit <= Decimal::ZERO {
            return Err(FinanceError::InvalidAmount(format!(
                "budget limit {} must be greater than zero",
                limit
            )));
        }
        if limit > self.settings.max_amount {
            return Err(FinanceError::InvalidAmount(format!(
                "budget limit {} exceeds {}",
                limit, self.settings.max_amount
            )));
        }
        Ok(())
    }

    pub fn create_budget(
        &self,
        user_id: UserId,
        category: Category,
        limit: Decimal,
        month: u32,
        year: i32,
    ) -> FinanceResult<Budget> {
        self.validate_limit(limit)?;
        validate_period(month, year)?;
        self.store
            .fetch_user(user_id)
            .reported(self.telemetry, "BudgetTracker::create_budget")?
            .ok_or_else(|| FinanceError::not_found("User", user_id))?;

        if self.find_budget(user_id, category, month, year)?.is_some() {
            return Err(FinanceError::AlreadyExists(category));
        }

        let budget = Budget {
            id: Uuid::new_v4(),
            user_id,
            category,
            limit,
            spent: Decimal::ZERO,
            month,
            year,
        };
        // The read above can race another writer; the unique key settles it.
        match self.store.insert_budget(&budget) {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(FinanceError::AlreadyExists(category)),
            Err(err) => {
                self.telemetry
                    .record_error(&err, "BudgetTracker::create_budget");
                return Err(err.into());
            }
        }

        self.telemetry.record_event(
            "budget_created",
            json!({
                "category": category.as_str(),
                "limit": limit.to_string(),
                "month": month,
                "year": year,
            }),
        );
        tracing::info!(budget_id = %budget.id, %user_id, %category, %limit, month, year, "budget created");
        Ok(budget)
    }

    pub fn create_budget_for_current_month(
        &self,
        user_id: UserId,
        category: Category,
        limit: Decimal,
    ) -> FinanceResult<Budget> {
        let (month, year) = current_period();
        self.create_budget(user_id, category, limit, month, year)
    }

    pub fn budget(&self, id: BudgetId) -> FinanceResult<Budget> {
        self.store
            .fetch_budget(id)
            .reported(self.telemetry, "BudgetTracker::budget")?
            .ok_or_else(|| FinanceError::not_found("Budget", id))
    }

    pub fn find_budget(
        &self,
        user_id: UserId,
        category: Category,
        month: u32,
        year: i32,
    ) -> FinanceResult<Option<Budget>> {
        let budgets = self
            .store
            .fetch_budgets(&BudgetQuery::key(user_id, category, month, year))
            .reported(self.telemetry, "BudgetTracker::find_budget")?;
        Ok(budgets.into_iter().next())
    }

    /// Newest period first, then by category.
    pub fn budgets_for(&self, user_id: UserId) -> FinanceResult<Vec<Budget>> {
        let budgets = self
            .store
            .fetch_budgets(&BudgetQuery::for_user(user_id))
            .reported(self.telemetry, "BudgetTracker::budgets_for")?;
        tracing::debug!(%user_id, count = budgets.len(), "budgets loaded");
        Ok(budgets)
    }

    pub fn budgets_for_month(
        &self,
        user_id: UserId,
        month: u32,
        year: i32,
    ) -> FinanceResult<Vec<Budget>> {
        validate_period(month, year)?;
        self.store
            .fetch_budgets(&BudgetQuery::for_user(user_id).period(month, year))
            .reported(self.telemetry, "BudgetTracker::budgets_for_month")
    }

    pub fn update_limit(&self, id: BudgetId, limit: Decimal) -> FinanceResult<Budget> {
        self.validate_limit(limit)?;
        let mut budget = self.budget(id)?;
        budget.limit = limit;
        self.save(&budget, "BudgetTracker::update_limit")?;
        Ok(budget)
    }

    pub fn delete_budget(&self, id: BudgetId) -> FinanceResult<()> {
        let budget = self.budget(id)?;
        self.store
            .delete_budget(id)
            .reported(self.telemetry, "BudgetTracker::delete_budget")?;
        self.telemetry.record_event(
            "budget_deleted",
            json!({ "category": budget.category.as_str(), "budget_id": id.to_string() }),
        );
        tracing::info!(budget_id = %id, "budget deleted");
        Ok(())
    }

    /// Adds `|amount|` to the matching budget's spent total. Expenses in a
    /// category without a budget are not tracked.
    pub fn record_expense(
        &self,
        user_id: UserId,
        category: Category,
        amount: Decimal,
        month: u32,
        year: i32,
    ) -> FinanceResult<Option<Budget>> {
        let change = self.add_spent(user_id, category, amount, month, year)?;
        Ok(change.map(|change| {
            self.announce(&change);
            change.budget
        }))
    }

    /// Subtracts `|amount|` from the matching budget; spent never goes below zero.
    pub fn reverse_expense(
        &self,
        user_id: UserId,
        category: Category,
        amount: Decimal,
        month: u32,
        year: i32,
    ) -> FinanceResult<Option<Budget>> {
        let change = self.subtract_spent(user_id, category, amount, month, year)?;
        Ok(change.map(|change| {
            self.announce(&change);
            change.budget
        }))
    }

    /// Writes the new spent total without emitting anything. Callers inside a
    /// unit of work hand the change to [`BudgetTracker::announce`] once the
    /// unit has committed.
    pub(crate) fn add_spent(
        &self,
        user_id: UserId,
        category: Category,
        amount: Decimal,
        month: u32,
        year: i32,
    ) -> FinanceResult<Option<SpentChange>> {
        let Some(mut budget) = self.find_budget(user_id, category, month, year)? else {
            return Ok(None);
        };
        let was_over = budget.is_over();
        budget.spent = budget.spent.checked_add(amount.abs()).ok_or_else(|| {
            FinanceError::InvalidAmount(format!(
                "spent total of the {} budget cannot absorb {}",
                category,
                amount.abs()
            ))
        })?;
        self.write(&budget, "BudgetTracker::record_expense")?;
        let crossed_limit = !was_over && budget.is_over();
        Ok(Some(SpentChange {
            budget,
            crossed_limit,
        }))
    }

    pub(crate) fn subtract_spent(
        &self,
        user_id: UserId,
        category: Category,
        amount: Decimal,
        month: u32,
        year: i32,
    ) -> FinanceResult<Option<SpentChange>> {
        let Some(mut budget) = self.find_budget(user_id, category, month, year)? else {
            return Ok(None);
        };
        budget.spent = (budget.spent - amount.abs()).max(Decimal::ZERO);
        self.write(&budget, "BudgetTracker::reverse_expense")?;
        Ok(Some(SpentChange {
            budget,
            crossed_limit: false,
        }))
    }

    /// Emits `budget_updated`, plus `budget_exceeded` when the change pushed
    /// spending over the limit.
    pub(crate) fn announce(&self, change: &SpentChange) {
        let budget = &change.budget;
        self.announce_update(budget);
        if change.crossed_limit {
            self.telemetry.record_event(
                "budget_exceeded",
                json!({
                    "category": budget.category.as_str(),
                    "limit": budget.limit.to_string(),
                    "spent": budget.spent.to_string(),
                    "excess": (budget.spent - budget.limit).to_string(),
                }),
            );
            tracing::warn!(budget_id = %budget.id, category = %budget.category, spent = %budget.spent, limit = %budget.limit, "budget exceeded");
        }
    }

    /// Alert for a prospective expense against the current month's budget.
    pub fn check_threshold(
        &self,
        user_id: UserId,
        category: Category,
        incoming: Decimal,
    ) -> FinanceResult<Option<BudgetAlert>> {
        let (month, year) = current_period();
        self.check_threshold_for(user_id, category, incoming, month, year)
    }

    pub fn check_threshold_for(
        &self,
        user_id: UserId,
        category: Category,
        incoming: Decimal,
        month: u32,
        year: i32,
    ) -> FinanceResult<Option<BudgetAlert>> {
        let Some(budget) = self.find_budget(user_id, category, month, year)? else {
            return Ok(None);
        };
        let Some(kind) = budget.projected_alert(incoming, self.settings.warning_ratio) else {
            return Ok(None);
        };
        let name = category.display_name();
        let message = match kind {
            AlertKind::Exceeded => format!("{} budget exceeded!", name),
            AlertKind::Danger => format!("{} budget exhausted!", name),
            AlertKind::Warning => {
                let remaining = budget.limit - (budget.spent + incoming.abs());
                format!(
                    "Heads up: only {:.2} left in the {} budget",
                    remaining.round_dp(2),
                    name
                )
            }
        };
        Ok(Some(BudgetAlert {
            budget,
            kind,
            message,
        }))
    }

    pub fn summary(&self, user_id: UserId, month: u32, year: i32) -> FinanceResult<BudgetSummary> {
        let budgets = self.budgets_for_month(user_id, month, year)?;
        let total_budgeted = budgets.iter().fold(Decimal::ZERO, |acc, b| acc + b.limit);
        let total_spent = budgets.iter().fold(Decimal::ZERO, |acc, b| acc + b.spent);
        let over_budget_count = budgets.iter().filter(|b| b.is_over()).count();
        let utilization_percentage = if total_budgeted > Decimal::ZERO {
            total_spent / total_budgeted * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        Ok(BudgetSummary {
            total_budgeted,
            total_spent,
            total_remaining: total_budgeted - total_spent,
            budget_count: budgets.len(),
            over_budget_count,
            utilization_percentage,
        })
    }

    /// Recomputes `spent` from the user's expense transactions in the budget's
    /// category and month, overwriting the tracked total.
    pub fn reconcile_spent(
        &self,
        user_id: UserId,
        category: Category,
        month: u32,
        year: i32,
    ) -> FinanceResult<Budget> {
        let mut budget = self
            .find_budget(user_id, category, month, year)?
            .ok_or_else(|| {
                FinanceError::NotFound(format!(
                    "Budget for {} in {}-{:02}",
                    category, year, month
                ))
            })?;
        let (start, end) = month_bounds(month, year)?;
        let expenses = self
            .store
            .fetch_transactions(
                &TransactionQuery::for_user(user_id)
                    .between(start, end)
                    .category(category)
                    .kind(TransactionKind::Expense),
            )
            .reported(self.telemetry, "BudgetTracker::reconcile_spent")?;
        let actual = expenses
            .iter()
            .fold(Decimal::ZERO, |acc, t| acc + t.amount.abs());
        if actual != budget.spent {
            tracing::warn!(
                budget_id = %budget.id,
                tracked = %budget.spent,
                %actual,
                "spent total drifted; overwriting"
            );
            budget.spent = actual;
            self.save(&budget, "BudgetTracker::reconcile_spent")?;
        }
        Ok(budget)
    }

    fn save(&self, budget: &Budget, context: &str) -> FinanceResult<()> {
        self.write(budget, context)?;
        self.announce_update(budget);
        Ok(())
    }

    fn write(&self, budget: &Budget, context: &str) -> FinanceResult<()> {
        self.store
            .update_budget(budget)
            .reported(self.telemetry, context)
    }

    fn announce_update(&self, budget: &Budget) {
        self.telemetry.record_event(
            "budget_updated",
            json!({
                "category": budget.category.as_str(),
                "limit": budget.limit.to_string(),
                "spent": budget.spent.to_string(),
                "budget_id": budget.id.to_string(),
            }),
        );
    }
}
