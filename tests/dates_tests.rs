// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::utils::{add_months, days_in_month, month_bounds};
use chrono::NaiveDate;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn month_bounds_regular_months() {
    let (first, last) = month_bounds(2025, 9).unwrap();
    assert_eq!(first, d(2025, 9, 1));
    assert_eq!(last, d(2025, 9, 30));

    let (first, last) = month_bounds(2025, 12).unwrap();
    assert_eq!(first, d(2025, 12, 1));
    assert_eq!(last, d(2025, 12, 31));
}

#[test]
fn month_bounds_february_leap_aware() {
    let (_, last) = month_bounds(2025, 2).unwrap();
    assert_eq!(last, d(2025, 2, 28));
    let (_, last) = month_bounds(2024, 2).unwrap();
    assert_eq!(last, d(2024, 2, 29));
}

#[test]
fn month_bounds_rejects_bad_month() {
    assert!(month_bounds(2025, 0).is_err());
    assert!(month_bounds(2025, 13).is_err());
}

#[test]
fn add_months_clamps_to_shorter_month() {
    assert_eq!(add_months(d(2025, 1, 31), 1).unwrap(), d(2025, 2, 28));
    assert_eq!(add_months(d(2024, 1, 31), 1).unwrap(), d(2024, 2, 29));
    assert_eq!(add_months(d(2025, 10, 31), 1).unwrap(), d(2025, 11, 30));
    // no clamp when the day fits
    assert_eq!(add_months(d(2025, 1, 28), 1).unwrap(), d(2025, 2, 28));
}

#[test]
fn add_months_wraps_year_boundaries() {
    assert_eq!(add_months(d(2025, 11, 15), 3).unwrap(), d(2026, 2, 15));
    assert_eq!(add_months(d(2025, 12, 31), 2).unwrap(), d(2026, 2, 28));
    assert_eq!(add_months(d(2025, 6, 10), 25).unwrap(), d(2027, 7, 10));
}

#[test]
fn add_months_zero_is_identity() {
    assert_eq!(add_months(d(2025, 8, 7), 0).unwrap(), d(2025, 8, 7));
}

#[test]
fn days_in_month_table() {
    assert_eq!(days_in_month(2025, 1), 31);
    assert_eq!(days_in_month(2025, 4), 30);
    assert_eq!(days_in_month(2025, 2), 28);
    assert_eq!(days_in_month(2028, 2), 29);
}
