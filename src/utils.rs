// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, SubsecRound, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::error::{FinanceError, FinanceResult};

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Fixed-width RFC 3339 (microseconds, `Z`), so stored timestamps sort as text.
pub fn fmt_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp '{}'", s))
}

pub fn validate_period(month: u32, year: i32) -> FinanceResult<()> {
    if !(1..=12).contains(&month) {
        return Err(FinanceError::InvalidPeriod(format!(
            "month {} is outside 1-12",
            month
        )));
    }
    if !(1000..=9999).contains(&year) {
        return Err(FinanceError::InvalidPeriod(format!(
            "year {} is not a 4-digit year",
            year
        )));
    }
    Ok(())
}

/// Half-open `[start, end)` bounds of a calendar month in UTC.
pub fn month_bounds(month: u32, year: i32) -> FinanceResult<(DateTime<Utc>, DateTime<Utc>)> {
    validate_period(month, year)?;
    let (next_m, next_y) = if month == 12 {
        (1, year + 1)
    } else {
        (month + 1, year)
    };
    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| FinanceError::InvalidPeriod(format!("{}-{:02}", year, month)))?;
    let end = Utc
        .with_ymd_and_hms(next_y, next_m, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| FinanceError::InvalidPeriod(format!("{}-{:02}", next_y, next_m)))?;
    Ok((start, end))
}

/// The calendar month `back` months before the month containing `day`.
pub fn months_before(day: NaiveDate, back: u32) -> (u32, i32) {
    let index = day.year() * 12 + day.month0() as i32 - back as i32;
    ((index.rem_euclid(12) + 1) as u32, index.div_euclid(12))
}

pub fn month_label(month: u32, year: i32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(d) => d.format("%b %Y").to_string(),
        None => format!("{}-{:02}", year, month),
    }
}

/// Current time at the precision timestamps are stored with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn current_period() -> (u32, i32) {
    let today = Utc::now().date_naive();
    (today.month(), today.year())
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
