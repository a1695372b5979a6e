// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use serde_json::json;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{FinanceError, FinanceResult};
use crate::models::{User, UserId};
use crate::store::{AccountQuery, BudgetQuery, RecordStore, StoreError, atomically};
use crate::telemetry::{Reported, TelemetrySink};
use crate::utils::now;

pub struct UserDirectory<'a> {
    store: &'a dyn RecordStore,
    telemetry: &'a dyn TelemetrySink,
    settings: &'a Settings,
}

fn normalize_email(email: &str) -> FinanceResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(FinanceError::InvalidInput(format!(
            "'{}' is not an email address",
            email
        )));
    }
    Ok(email)
}

fn normalize_currency(code: &str) -> FinanceResult<String> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(FinanceError::InvalidInput(format!(
            "'{}' is not a 3-letter currency code",
            code
        )));
    }
    Ok(code.to_uppercase())
}

impl<'a> UserDirectory<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        telemetry: &'a dyn TelemetrySink,
        settings: &'a Settings,
    ) -> Self {
        UserDirectory {
            store,
            telemetry,
            settings,
        }
    }

    pub fn register(
        &self,
        email: &str,
        name: &str,
        preferred_currency: Option<&str>,
    ) -> FinanceResult<User> {
        let email = normalize_email(email)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(FinanceError::InvalidInput("name must not be empty".into()));
        }
        let preferred_currency = match preferred_currency {
            Some(code) => normalize_currency(code)?,
            None => self.settings.default_currency.clone(),
        };

        let user = User {
            id: Uuid::new_v4(),
            email,
            name: name.to_string(),
            avatar: None,
            created_at: now(),
            preferred_currency,
        };
        match self.store.insert_user(&user) {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                return Err(FinanceError::EmailAlreadyExists(user.email));
            }
            Err(err) => {
                self.telemetry.record_error(&err, "UserDirectory::register");
                return Err(err.into());
            }
        }

        self.telemetry.record_event(
            "user_registered",
            json!({ "preferred_currency": user.preferred_currency }),
        );
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub fn user(&self, id: UserId) -> FinanceResult<User> {
        self.store
            .fetch_user(id)
            .reported(self.telemetry, "UserDirectory::user")?
            .ok_or_else(|| FinanceError::not_found("User", id))
    }

    pub fn user_by_email(&self, email: &str) -> FinanceResult<Option<User>> {
        let email = normalize_email(email)?;
        self.store
            .fetch_user_by_email(&email)
            .reported(self.telemetry, "UserDirectory::user_by_email")
    }

    /// `None` leaves a field unchanged. An empty avatar clears it.
    pub fn update_profile(
        &self,
        id: UserId,
        name: Option<&str>,
        avatar: Option<Vec<u8>>,
        preferred_currency: Option<&str>,
    ) -> FinanceResult<User> {
        let mut user = self.user(id)?;
        if let Some(name) = name {
            let name = name.trim();
            if name.is_empty() {
                return Err(FinanceError::InvalidInput("name must not be empty".into()));
            }
            user.name = name.to_string();
        }
        if let Some(avatar) = avatar {
            user.avatar = if avatar.is_empty() { None } else { Some(avatar) };
        }
        if let Some(code) = preferred_currency {
            user.preferred_currency = normalize_currency(code)?;
        }
        self.store
            .update_user(&user)
            .reported(self.telemetry, "UserDirectory::update_profile")?;
        self.telemetry.record_event(
            "profile_updated",
            json!({ "preferred_currency": user.preferred_currency }),
        );
        Ok(user)
    }

    /// Removes a user and their budgets. Refused while any account, active or
    /// not, still belongs to them.
    pub fn delete_user(&self, id: UserId) -> FinanceResult<()> {
        let user = self.user(id)?;
        let accounts = self
            .store
            .fetch_accounts(&AccountQuery {
                user_id: Some(id),
                ..Default::default()
            })
            .reported(self.telemetry, "UserDirectory::delete_user")?;
        if !accounts.is_empty() {
            return Err(FinanceError::DependentRecordsExist(format!(
                "user '{}' ({} accounts)",
                user.email,
                accounts.len()
            )));
        }

        atomically(self.store, self.telemetry, || {
            let budgets = self
                .store
                .fetch_budgets(&BudgetQuery::for_user(id))
                .reported(self.telemetry, "UserDirectory::delete_user")?;
            for budget in &budgets {
                self.store
                    .delete_budget(budget.id)
                    .reported(self.telemetry, "UserDirectory::delete_user")?;
            }
            self.store
                .delete_user(id)
                .reported(self.telemetry, "UserDirectory::delete_user")
        })?;

        self.telemetry
            .record_event("user_deleted", serde_json::Value::Null);
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}
