// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Fire-and-forget analytics and error reporting.
//!
//! Sinks never fail the calling operation: both methods return `()`.

use std::cell::RefCell;
use std::error::Error;

use serde_json::Value;

use crate::error::{FinanceError, FinanceResult};
use crate::store::StoreResult;

pub trait TelemetrySink {
    fn record_event(&self, name: &str, parameters: Value);
    fn record_error(&self, error: &dyn Error, context: &str);
}

/// Forwards events and errors to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn record_event(&self, name: &str, parameters: Value) {
        tracing::info!(target: "pursebook::analytics", event = name, %parameters);
    }

    fn record_error(&self, error: &dyn Error, context: &str) {
        tracing::error!(target: "pursebook::analytics", context, error = %error);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record_event(&self, _name: &str, _parameters: Value) {}
    fn record_error(&self, _error: &dyn Error, _context: &str) {}
}

/// Keeps everything it receives; handy as a test double.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    events: RefCell<Vec<(String, Value)>>,
    errors: RefCell<Vec<(String, String)>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.borrow().clone()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.events.borrow().iter().map(|(n, _)| n.clone()).collect()
    }

    /// `(context, message)` pairs.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.errors.borrow().clone()
    }
}

impl TelemetrySink for MemoryTelemetry {
    fn record_event(&self, name: &str, parameters: Value) {
        self.events.borrow_mut().push((name.to_string(), parameters));
    }

    fn record_error(&self, error: &dyn Error, context: &str) {
        self.errors
            .borrow_mut()
            .push((context.to_string(), error.to_string()));
    }
}

/// Converts a store result, reporting storage failures to the sink first.
pub(crate) trait Reported<T> {
    fn reported(self, sink: &dyn TelemetrySink, context: &str) -> FinanceResult<T>;
}

impl<T> Reported<T> for StoreResult<T> {
    fn reported(self, sink: &dyn TelemetrySink, context: &str) -> FinanceResult<T> {
        self.map_err(|err| {
            sink.record_error(&err, context);
            FinanceError::Storage(err)
        })
    }
}

impl<T> Reported<T> for FinanceResult<T> {
    fn reported(self, sink: &dyn TelemetrySink, context: &str) -> FinanceResult<T> {
        if let Err(err) = &self {
            if err.is_storage() {
                sink.record_error(err, context);
            }
        }
        self
    }
}
