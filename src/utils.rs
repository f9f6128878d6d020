// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::sync::Once;

use crate::errors::{LedgerError, LedgerResult};

/// Owner used when no `--user` flag is given and no `default_owner`
/// setting exists. Single-user installs never need to think about
/// identity; see DESIGN.md for the policy discussion.
pub const DEFAULT_OWNER: i64 = 1;

static TRACING_INIT: Once = Once::new();

pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::from_default_env().add_directive("billfold=info".parse().unwrap());

        fmt().with_env_filter(filter).init();
    });
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Parses an amount that must be strictly positive. Field-level message so
/// the caller can surface it as-is.
pub fn parse_positive_amount(s: &str) -> LedgerResult<Decimal> {
    let d = s
        .parse::<Decimal>()
        .map_err(|_| LedgerError::validation("amount", format!("'{}' is not a number", s)))?;
    if d <= Decimal::ZERO {
        return Err(LedgerError::validation("amount", "must be positive"));
    }
    Ok(d)
}

/// Re-parses an amount read back from storage, where it was written by us
/// and must be a valid decimal.
pub fn stored_amount(s: &str) -> LedgerResult<Decimal> {
    s.parse::<Decimal>()
        .map_err(|_| LedgerError::Corrupt(format!("invalid stored amount '{}'", s)))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
    }
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> LedgerResult<(NaiveDate, NaiveDate)> {
    if !(1..=12).contains(&month) {
        return Err(LedgerError::validation(
            "month",
            format!("expected 1-12, got {}", month),
        ));
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| LedgerError::validation("month", format!("invalid {}-{}", year, month)))?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
        .ok_or_else(|| LedgerError::validation("month", format!("invalid {}-{}", year, month)))?;
    Ok((first, last))
}

/// Shifts a date forward by `months` calendar months, clamping the day to
/// the target month's last valid day (Jan 31 + 1 month is Feb 28/29, never
/// Mar 3). Month index wraps 0-based so year boundaries fall out of
/// floor-division.
pub fn add_months(date: NaiveDate, months: u32) -> LedgerResult<NaiveDate> {
    let months0 = date.year() as i64 * 12 + date.month0() as i64 + months as i64;
    let year = months0.div_euclid(12) as i32;
    let month = months0.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        LedgerError::validation("date", format!("cannot add {} months to {}", months, date))
    })
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

// Owner identity settings
pub fn get_default_owner(conn: &Connection) -> Result<i64> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='default_owner'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    match v {
        Some(s) => s
            .parse::<i64>()
            .with_context(|| format!("Invalid default_owner '{}' in settings", s)),
        None => Ok(DEFAULT_OWNER),
    }
}

pub fn set_default_owner(conn: &Connection, owner: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('default_owner', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![owner.to_string()],
    )?;
    Ok(())
}

/// Resolves the owner every command operates on: explicit `--user` flag
/// first, then the `default_owner` setting, then `DEFAULT_OWNER`.
pub fn resolve_owner(conn: &Connection, m: &clap::ArgMatches) -> Result<i64> {
    if let Some(u) = m.get_one::<String>("user") {
        return u
            .parse::<i64>()
            .with_context(|| format!("Invalid user id '{}'", u));
    }
    get_default_owner(conn)
}
