// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod services;
pub mod store;
pub mod telemetry;
pub mod utils;

pub use config::Settings;
pub use error::{FinanceError, FinanceResult};
pub use identity::{IdentityGateway, Session};
pub use services::Finance;
pub use store::{RecordStore, SqliteStore, StoreError};
pub use telemetry::{MemoryTelemetry, NoopTelemetry, TelemetrySink, TracingTelemetry};
