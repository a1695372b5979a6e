// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Errors surfaced by the finance services.
//!
//! Business-rule failures ([`FinanceError::AlreadyExists`],
//! [`FinanceError::InvalidAmount`], [`FinanceError::DependentRecordsExist`], ...)
//! are returned as-is. [`FinanceError::Storage`] always carries the store's
//! original cause and is reported to the telemetry sink before it is returned.

use thiserror::Error;

use crate::models::Category;
use crate::store::StoreError;

pub type FinanceResult<T> = Result<T, FinanceError>;

#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("A budget for {} already exists in this period", .0.display_name())]
    AlreadyExists(Category),
    #[error("Email '{0}' is already registered")]
    EmailAlreadyExists(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Cannot delete {0} while it still owns records")]
    DependentRecordsExist(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
    #[error("No user is signed in")]
    Unauthenticated,
}

impl FinanceError {
    pub(crate) fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        FinanceError::NotFound(format!("{} '{}'", what, id))
    }

    /// `true` for failures coming from the record store rather than a business rule.
    pub fn is_storage(&self) -> bool {
        matches!(self, FinanceError::Storage(_))
    }
}
