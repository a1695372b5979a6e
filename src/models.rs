// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type AccountId = Uuid;
pub type TransactionId = Uuid;
pub type BudgetId = Uuid;

/// Spending/earning category shared by transactions and budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Healthcare,
    Shopping,
    Bills,
    Salary,
    Investment,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Healthcare,
        Category::Shopping,
        Category::Bills,
        Category::Salary,
        Category::Investment,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Entertainment => "entertainment",
            Category::Healthcare => "healthcare",
            Category::Shopping => "shopping",
            Category::Bills => "bills",
            Category::Salary => "salary",
            Category::Investment => "investment",
            Category::Other => "other",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Healthcare => "Healthcare",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Salary => "Salary",
            Category::Investment => "Investment",
            Category::Other => "Other",
        }
    }

    /// Symbol name used by front-ends to pick an icon.
    pub fn icon_name(self) -> &'static str {
        match self {
            Category::Food => "fork.knife",
            Category::Transport => "car",
            Category::Entertainment => "gamecontroller",
            Category::Healthcare => "cross",
            Category::Shopping => "bag",
            Category::Bills => "doc.text",
            Category::Salary => "dollarsign.circle",
            Category::Investment => "chart.line.uptrend.xyaxis",
            Category::Other => "questionmark.circle",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    /// Whether `amount` carries the sign this kind requires (never zero).
    pub fn accepts(self, amount: Decimal) -> bool {
        match self {
            TransactionKind::Income => amount.is_sign_positive() && !amount.is_zero(),
            TransactionKind::Expense => amount.is_sign_negative() && !amount.is_zero(),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("Unknown transaction kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Checking,
    Savings,
    Credit,
    Investment,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
            AccountKind::Credit => "credit",
            AccountKind::Investment => "investment",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AccountKind::Checking => "Checking Account",
            AccountKind::Savings => "Savings",
            AccountKind::Credit => "Credit Card",
            AccountKind::Investment => "Investment",
        }
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "checking" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            "credit" => Ok(AccountKind::Credit),
            "investment" => Ok(AccountKind::Investment),
            other => Err(format!("Unknown account kind '{}'", other)),
        }
    }
}

/// Accounts are never physically removed while they own transactions;
/// closing one flips it to `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountState {
    Active,
    Inactive,
}

impl AccountState {
    pub fn is_active(self) -> bool {
        matches!(self, AccountState::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub avatar: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub preferred_currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub name: String,
    pub balance: Decimal,
    pub kind: AccountKind,
    pub state: AccountState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: Option<AccountId>,
    pub amount: Decimal, // negative for expenses
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub category: Category,
    pub kind: TransactionKind,
}

/// Input for [`crate::services::transactions::Journal::record`].
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: Option<AccountId>,
    pub amount: Decimal,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub category: Category,
    pub kind: TransactionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserId,
    pub category: Category,
    pub limit: Decimal,
    pub spent: Decimal,
    pub month: u32,
    pub year: i32,
}

/// Where a budget sits relative to its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetStage {
    Created,
    Accumulating,
    AtLimit,
    OverLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    /// Projected spend reached the warning ratio of the limit.
    Warning,
    /// Projected spend equals the limit exactly.
    Danger,
    /// Projected spend is above the limit.
    Exceeded,
}

impl Budget {
    pub fn remaining(&self) -> Decimal {
        self.limit - self.spent
    }

    pub fn is_over(&self) -> bool {
        self.spent > self.limit
    }

    /// Spent as a fraction of the limit; zero for a zero limit.
    pub fn utilization(&self) -> Decimal {
        if self.limit.is_zero() {
            return Decimal::ZERO;
        }
        self.spent / self.limit
    }

    pub fn stage(&self) -> BudgetStage {
        if self.spent > self.limit {
            BudgetStage::OverLimit
        } else if self.spent == self.limit {
            BudgetStage::AtLimit
        } else if self.spent.is_zero() {
            BudgetStage::Created
        } else {
            BudgetStage::Accumulating
        }
    }

    /// Classifies `spent + |incoming|` against the limit. First match wins:
    /// above the limit, exactly at it, at or past `warning_ratio`. A sum too
    /// large to represent is above any limit.
    pub fn projected_alert(&self, incoming: Decimal, warning_ratio: Decimal) -> Option<AlertKind> {
        if self.limit <= Decimal::ZERO {
            return None;
        }
        let Some(projected) = self.spent.checked_add(incoming.abs()) else {
            return Some(AlertKind::Exceeded);
        };
        if projected > self.limit {
            Some(AlertKind::Exceeded)
        } else if projected == self.limit {
            Some(AlertKind::Danger)
        } else if projected / self.limit >= warning_ratio {
            Some(AlertKind::Warning)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetAlert {
    pub budget: Budget,
    pub kind: AlertKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub total_budgeted: Decimal,
    pub total_spent: Decimal,
    pub total_remaining: Decimal,
    pub budget_count: usize,
    pub over_budget_count: usize,
    pub utilization_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCashflow {
    pub label: String, // e.g. "Oct 2026"
    pub month: u32,
    pub year: i32,
    pub income: Decimal,
    pub expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_balance: Decimal,
    pub accounts: Vec<Account>,
    pub recent_transactions: Vec<Transaction>,
    pub cashflow: Vec<MonthlyCashflow>,
    pub monthly_income: Decimal,
    pub monthly_expenses: Decimal,
    pub monthly_savings: Decimal,
}
