// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only summaries, always derived from stored transactions.
//!
//! Nothing here reads `Budget::spent` or writes to the store.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::ledger::Ledger;
use crate::config::Settings;
use crate::error::FinanceResult;
use crate::identity::{IdentityGateway, require_user};
use crate::models::{Category, Dashboard, MonthlyCashflow, Transaction, TransactionKind, UserId};
use crate::store::{RecordStore, TransactionQuery};
use crate::telemetry::{Reported, TelemetrySink};
use crate::utils::{month_bounds, month_label, months_before, today};

pub struct ReportEngine<'a> {
    store: &'a dyn RecordStore,
    telemetry: &'a dyn TelemetrySink,
    settings: &'a Settings,
}

impl<'a> ReportEngine<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        telemetry: &'a dyn TelemetrySink,
        settings: &'a Settings,
    ) -> Self {
        ReportEngine {
            store,
            telemetry,
            settings,
        }
    }

    fn month_transactions(
        &self,
        user_id: UserId,
        month: u32,
        year: i32,
        context: &str,
    ) -> FinanceResult<Vec<Transaction>> {
        let (start, end) = month_bounds(month, year)?;
        self.store
            .fetch_transactions(&TransactionQuery::for_user(user_id).between(start, end))
            .reported(self.telemetry, context)
    }

    /// Absolute expense totals per category for one month. Categories without
    /// expenses are absent.
    pub fn expenses_by_category(
        &self,
        user_id: UserId,
        month: u32,
        year: i32,
    ) -> FinanceResult<BTreeMap<Category, Decimal>> {
        let txs = self.month_transactions(
            user_id,
            month,
            year,
            "ReportEngine::expenses_by_category",
        )?;
        let mut by_category: BTreeMap<Category, Decimal> = BTreeMap::new();
        for tx in txs.iter().filter(|t| t.kind == TransactionKind::Expense) {
            *by_category.entry(tx.category).or_insert(Decimal::ZERO) += tx.amount.abs();
        }
        Ok(by_category)
    }

    /// `(income, expenses)` for one month, both as positive totals.
    pub fn month_totals(
        &self,
        user_id: UserId,
        month: u32,
        year: i32,
    ) -> FinanceResult<(Decimal, Decimal)> {
        let txs = self.month_transactions(user_id, month, year, "ReportEngine::month_totals")?;
        Ok(split_totals(&txs))
    }

    pub fn income_vs_expenses(
        &self,
        user_id: UserId,
        months_back: i32,
    ) -> FinanceResult<Vec<MonthlyCashflow>> {
        self.income_vs_expenses_from(user_id, months_back, today())
    }

    /// One entry per calendar month for the `months_back` months ending with
    /// the month of `today`, oldest first. Zero or negative yields nothing.
    pub fn income_vs_expenses_from(
        &self,
        user_id: UserId,
        months_back: i32,
        today: NaiveDate,
    ) -> FinanceResult<Vec<MonthlyCashflow>> {
        if months_back <= 0 {
            return Ok(Vec::new());
        }
        let mut series = Vec::with_capacity(months_back as usize);
        for back in 0..months_back as u32 {
            let (month, year) = months_before(today, back);
            let txs = self.month_transactions(
                user_id,
                month,
                year,
                "ReportEngine::income_vs_expenses",
            )?;
            let (income, expenses) = split_totals(&txs);
            series.push(MonthlyCashflow {
                label: month_label(month, year),
                month,
                year,
                income,
                expenses,
            });
        }
        series.reverse();
        Ok(series)
    }

    pub fn recent_transactions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> FinanceResult<Vec<Transaction>> {
        self.store
            .fetch_transactions(&TransactionQuery::for_user(user_id).page(Some(limit), None))
            .reported(self.telemetry, "ReportEngine::recent_transactions")
    }

    pub fn dashboard(&self, identity: &dyn IdentityGateway) -> FinanceResult<Dashboard> {
        self.dashboard_at(identity, today())
    }

    /// Snapshot for the signed-in user as of `today`.
    pub fn dashboard_at(
        &self,
        identity: &dyn IdentityGateway,
        today: NaiveDate,
    ) -> FinanceResult<Dashboard> {
        let user_id = require_user(identity)?;
        let ledger = Ledger::new(self.store, self.telemetry, self.settings);

        let accounts = ledger.accounts_for(user_id)?;
        let total_balance = accounts
            .iter()
            .fold(Decimal::ZERO, |acc, a| acc + a.balance);
        let recent_transactions =
            self.recent_transactions(user_id, self.settings.recent_transactions)?;
        let cashflow = self.income_vs_expenses_from(
            user_id,
            self.settings.dashboard_months as i32,
            today,
        )?;
        let (monthly_income, monthly_expenses) =
            self.month_totals(user_id, today.month(), today.year())?;

        self.telemetry
            .record_event("dashboard_viewed", serde_json::Value::Null);
        Ok(Dashboard {
            total_balance,
            accounts,
            recent_transactions,
            cashflow,
            monthly_income,
            monthly_expenses,
            monthly_savings: monthly_income - monthly_expenses,
        })
    }
}

fn split_totals(txs: &[Transaction]) -> (Decimal, Decimal) {
    txs.iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(inc, exp), t| match t.kind {
            TransactionKind::Income => (inc + t.amount, exp),
            TransactionKind::Expense => (inc, exp + t.amount.abs()),
        })
}
