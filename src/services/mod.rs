// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budgets;
pub mod ledger;
mod maintenance;
pub mod reports;
pub mod transactions;
pub mod users;

use crate::config::Settings;
use crate::error::FinanceResult;
use crate::identity::{IdentityGateway, require_user};
use crate::models::UserId;
use crate::store::RecordStore;
use crate::telemetry::TelemetrySink;

use budgets::BudgetTracker;
use ledger::Ledger;
use reports::ReportEngine;
use transactions::Journal;
use users::UserDirectory;

/// One store, one telemetry sink and one identity gateway shared by every
/// service, plus the settings loaded from the store at construction.
pub struct Finance<'a> {
    store: &'a dyn RecordStore,
    telemetry: &'a dyn TelemetrySink,
    identity: &'a dyn IdentityGateway,
    settings: Settings,
}

impl<'a> Finance<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        telemetry: &'a dyn TelemetrySink,
        identity: &'a dyn IdentityGateway,
    ) -> FinanceResult<Self> {
        let settings = Settings::load(store, telemetry)?;
        Ok(Self::with_settings(store, telemetry, identity, settings))
    }

    pub fn with_settings(
        store: &'a dyn RecordStore,
        telemetry: &'a dyn TelemetrySink,
        identity: &'a dyn IdentityGateway,
        settings: Settings,
    ) -> Self {
        Finance {
            store,
            telemetry,
            identity,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Persists one setting and makes it effective for later calls.
    pub fn update_setting(&mut self, key: &str, value: &str) -> FinanceResult<&Settings> {
        self.settings = Settings::set(self.store, self.telemetry, key, value)?;
        Ok(&self.settings)
    }

    pub fn identity(&self) -> &'a dyn IdentityGateway {
        self.identity
    }

    /// The signed-in user, or [`crate::FinanceError::Unauthenticated`].
    pub fn current_user(&self) -> FinanceResult<UserId> {
        require_user(self.identity)
    }

    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(self.store, self.telemetry, &self.settings)
    }

    pub fn budgets(&self) -> BudgetTracker<'_> {
        BudgetTracker::new(self.store, self.telemetry, &self.settings)
    }

    pub fn journal(&self) -> Journal<'_> {
        Journal::new(self.store, self.telemetry, &self.settings)
    }

    pub fn reports(&self) -> ReportEngine<'_> {
        ReportEngine::new(self.store, self.telemetry, &self.settings)
    }

    pub fn users(&self) -> UserDirectory<'_> {
        UserDirectory::new(self.store, self.telemetry, &self.settings)
    }
}
