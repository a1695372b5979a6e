// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Tunables persisted in the store's `settings` table.
//!
//! Missing keys fall back to the defaults below, so a fresh database works
//! without any configuration step.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FinanceError, FinanceResult};
use crate::store::{RecordStore, StoreError};
use crate::telemetry::{Reported, TelemetrySink};
use crate::utils::parse_decimal;

pub const WARNING_RATIO: &str = "warning_ratio";
pub const DASHBOARD_MONTHS: &str = "dashboard_months";
pub const RECENT_TRANSACTIONS: &str = "recent_transactions";
pub const MAX_AMOUNT: &str = "max_amount";
pub const DEFAULT_CURRENCY: &str = "default_currency";

/// Largest accepted `max_amount`: 1,000,000,000,000.00.
pub const AMOUNT_CEILING: Decimal = Decimal::from_parts(276_447_232, 23_283, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Fraction of a budget's limit at which a warning is raised.
    pub warning_ratio: Decimal,
    pub dashboard_months: u32,
    pub recent_transactions: usize,
    /// Largest absolute amount accepted for a transaction or budget limit.
    pub max_amount: Decimal,
    pub default_currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            warning_ratio: Decimal::new(8, 1),
            dashboard_months: 6,
            recent_transactions: 5,
            max_amount: Decimal::new(99_999_999, 2),
            default_currency: "BRL".to_string(),
        }
    }
}

impl Settings {
    pub fn load(
        store: &dyn RecordStore,
        telemetry: &dyn TelemetrySink,
    ) -> FinanceResult<Settings> {
        let mut settings = Settings::default();
        for key in [
            WARNING_RATIO,
            DASHBOARD_MONTHS,
            RECENT_TRANSACTIONS,
            MAX_AMOUNT,
            DEFAULT_CURRENCY,
        ] {
            let stored = store.setting(key).reported(telemetry, "Settings::load")?;
            if let Some(value) = stored {
                settings
                    .apply(key, &value)
                    .map_err(|e| {
                        StoreError::Backend(anyhow::anyhow!(
                            "stored setting '{}' is invalid: {}",
                            key,
                            e
                        ))
                    })
                    .reported(telemetry, "Settings::load")?;
            }
        }
        Ok(settings)
    }

    pub fn save(
        &self,
        store: &dyn RecordStore,
        telemetry: &dyn TelemetrySink,
    ) -> FinanceResult<()> {
        for (key, value) in [
            (WARNING_RATIO, self.warning_ratio.to_string()),
            (DASHBOARD_MONTHS, self.dashboard_months.to_string()),
            (RECENT_TRANSACTIONS, self.recent_transactions.to_string()),
            (MAX_AMOUNT, self.max_amount.to_string()),
            (DEFAULT_CURRENCY, self.default_currency.clone()),
        ] {
            store
                .put_setting(key, &value)
                .reported(telemetry, "Settings::save")?;
        }
        Ok(())
    }

    /// Validates and persists one setting.
    pub fn set(
        store: &dyn RecordStore,
        telemetry: &dyn TelemetrySink,
        key: &str,
        value: &str,
    ) -> FinanceResult<Settings> {
        let mut settings = Settings::load(store, telemetry)?;
        settings.apply(key, value)?;
        store
            .put_setting(key, value.trim())
            .reported(telemetry, "Settings::set")?;
        tracing::info!(key, value = value.trim(), "setting updated");
        Ok(settings)
    }

    fn apply(&mut self, key: &str, value: &str) -> FinanceResult<()> {
        let value = value.trim();
        match key {
            WARNING_RATIO => {
                let ratio = parse_decimal(value)
                    .map_err(|e| FinanceError::InvalidAmount(e.to_string()))?;
                if ratio <= Decimal::ZERO || ratio >= Decimal::ONE {
                    return Err(FinanceError::InvalidAmount(format!(
                        "warning ratio {} must be between 0 and 1",
                        ratio
                    )));
                }
                self.warning_ratio = ratio;
            }
            DASHBOARD_MONTHS => {
                self.dashboard_months = value.parse().map_err(|_| {
                    FinanceError::InvalidPeriod(format!("invalid month count '{}'", value))
                })?;
            }
            RECENT_TRANSACTIONS => {
                self.recent_transactions = value.parse().map_err(|_| {
                    FinanceError::InvalidInput(format!("invalid transaction count '{}'", value))
                })?;
            }
            MAX_AMOUNT => {
                let max = parse_decimal(value)
                    .map_err(|e| FinanceError::InvalidAmount(e.to_string()))?;
                if max <= Decimal::ZERO || max > AMOUNT_CEILING {
                    return Err(FinanceError::InvalidAmount(format!(
                        "maximum amount {} must be positive and at most {}",
                        max, AMOUNT_CEILING
                    )));
                }
                self.max_amount = max;
            }
            DEFAULT_CURRENCY => {
                if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(FinanceError::InvalidInput(format!(
                        "'{}' is not a 3-letter currency code",
                        value
                    )));
                }
                self.default_currency = value.to_uppercase();
            }
            other => {
                return Err(FinanceError::InvalidInput(format!(
                    "unknown setting '{}'",
                    other
                )));
            }
        }
        Ok(())
    }
}
