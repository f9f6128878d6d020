// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::commands::installments::{
    future_installments, plan_total, schedule_charges, split_total,
};
use billfold::commands::transactions::{create_transaction, InstallmentRequest, NewTransaction};
use billfold::models::{InstallmentMode, PaymentMethod, TxKind};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    billfold::db::init_schema(&mut conn).unwrap();
    conn
}

fn credit_purchase(amount: &str, date: NaiveDate, inst: Option<InstallmentRequest>) -> NewTransaction {
    NewTransaction {
        kind: TxKind::Expense,
        amount: dec(amount),
        category: "Shopping".into(),
        description: Some("New phone".into()),
        date,
        payment_method: Some(PaymentMethod::Credit),
        recurring: false,
        tag: None,
        installments: inst,
    }
}

#[test]
fn split_puts_rounding_residue_on_last_charge() {
    assert_eq!(
        split_total(dec("100.00"), 3),
        vec![dec("33.33"), dec("33.33"), dec("33.34")]
    );
}

#[test]
fn split_sums_exactly_to_total() {
    for (total, count) in [
        ("100.00", 3u32),
        ("10.00", 3),
        ("0.10", 3),
        ("999.99", 7),
        ("1234.56", 12),
        ("50.00", 2),
    ] {
        let parts = split_total(dec(total), count);
        assert_eq!(parts.len(), count as usize);
        let sum: Decimal = parts.iter().sum();
        assert_eq!(sum, dec(total), "total={} count={}", total, count);
    }
}

#[test]
fn split_even_totals_have_no_residue() {
    assert_eq!(split_total(dec("90.00"), 3), vec![dec("30.00"); 3]);
}

#[test]
fn schedule_total_mode_monthly_due_dates() {
    let charges =
        schedule_charges(dec("100.00"), 3, InstallmentMode::Total, d(2025, 1, 31)).unwrap();
    assert_eq!(charges.len(), 3);
    assert_eq!(
        charges.iter().map(|c| c.seq).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(charges[0].due_date, d(2025, 1, 31));
    assert_eq!(charges[1].due_date, d(2025, 2, 28));
    assert_eq!(charges[2].due_date, d(2025, 3, 31));
    assert_eq!(charges[2].amount, dec("33.34"));
}

#[test]
fn schedule_per_installment_mode_repeats_amount() {
    let charges = schedule_charges(
        dec("45.90"),
        3,
        InstallmentMode::PerInstallment,
        d(2025, 6, 10),
    )
    .unwrap();
    assert!(charges.iter().all(|c| c.amount == dec("45.90")));
    assert_eq!(
        plan_total(dec("45.90"), 3, InstallmentMode::PerInstallment),
        dec("137.70")
    );
}

#[test]
fn schedule_rejects_single_installment() {
    let err = schedule_charges(dec("100.00"), 1, InstallmentMode::Total, d(2025, 1, 1));
    assert!(err.is_err());
}

#[test]
fn installment_purchase_persists_plan_and_charges() {
    let mut conn = setup();
    let id = create_transaction(
        &mut conn,
        1,
        &credit_purchase(
            "100.00",
            d(2025, 8, 15),
            Some(InstallmentRequest {
                count: 3,
                mode: InstallmentMode::Total,
                first_due: Some(d(2025, 9, 1)),
                interest_per_month: Some(dec("1.5")),
            }),
        ),
    )
    .unwrap();

    let is_installment: bool = conn
        .query_row(
            "SELECT is_installment FROM transactions WHERE id=?1",
            [id],
            |r| r.get(0),
        )
        .unwrap();
    assert!(is_installment);

    let (plan_id, total, count, mode): (i64, String, u32, String) = conn
        .query_row(
            "SELECT id, total_amount, installment_count, mode FROM installment_plans WHERE transaction_id=?1",
            [id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!(total, "100.00");
    assert_eq!(count, 3);
    assert_eq!(mode, "total");

    let mut stmt = conn
        .prepare("SELECT seq, amount, due_date FROM installment_charges WHERE plan_id=?1 ORDER BY seq")
        .unwrap();
    let charges: Vec<(u32, String, String)> = stmt
        .query_map([plan_id], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(
        charges,
        vec![
            (1, "33.33".into(), "2025-09-01".into()),
            (2, "33.33".into(), "2025-10-01".into()),
            (3, "33.34".into(), "2025-11-01".into()),
        ]
    );
}

#[test]
fn first_due_defaults_to_purchase_date() {
    let mut conn = setup();
    create_transaction(
        &mut conn,
        1,
        &credit_purchase(
            "60.00",
            d(2025, 3, 31),
            Some(InstallmentRequest {
                count: 2,
                mode: InstallmentMode::Total,
                first_due: None,
                interest_per_month: None,
            }),
        ),
    )
    .unwrap();
    let first_due: String = conn
        .query_row(
            "SELECT due_date FROM installment_charges WHERE seq=1",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(first_due, "2025-03-31");
}

#[test]
fn installment_requires_credit_expense() {
    let mut conn = setup();
    let mut new = credit_purchase(
        "100.00",
        d(2025, 8, 15),
        Some(InstallmentRequest {
            count: 3,
            mode: InstallmentMode::Total,
            first_due: None,
            interest_per_month: None,
        }),
    );
    new.payment_method = Some(PaymentMethod::Debit);
    assert!(create_transaction(&mut conn, 1, &new).is_err());

    // nothing half-written
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn future_installments_group_by_month_ascending() {
    let mut conn = setup();
    // 300 over 3 months starting Sep 2025
    create_transaction(
        &mut conn,
        1,
        &credit_purchase(
            "300.00",
            d(2025, 8, 20),
            Some(InstallmentRequest {
                count: 3,
                mode: InstallmentMode::Total,
                first_due: Some(d(2025, 9, 10)),
                interest_per_month: None,
            }),
        ),
    )
    .unwrap();
    // second purchase with a charge in Sep as well
    create_transaction(
        &mut conn,
        1,
        &credit_purchase(
            "40.00",
            d(2025, 8, 25),
            Some(InstallmentRequest {
                count: 2,
                mode: InstallmentMode::PerInstallment,
                first_due: Some(d(2025, 9, 25)),
                interest_per_month: None,
            }),
        ),
    )
    .unwrap();

    let groups = future_installments(&conn, 1, d(2025, 8, 31)).unwrap();
    assert_eq!(groups.len(), 3);
    assert_eq!((groups[0].year, groups[0].month), (2025, 9));
    assert_eq!(groups[0].items.len(), 2);
    assert_eq!(groups[0].total, dec("140.00"));
    assert_eq!((groups[1].year, groups[1].month), (2025, 10));
    assert_eq!(groups[1].total, dec("140.00"));
    assert_eq!((groups[2].year, groups[2].month), (2025, 11));
    assert_eq!(groups[2].total, dec("100.00"));
}

#[test]
fn future_installments_skip_paid_and_past() {
    let mut conn = setup();
    create_transaction(
        &mut conn,
        1,
        &credit_purchase(
            "100.00",
            d(2025, 5, 1),
            Some(InstallmentRequest {
                count: 2,
                mode: InstallmentMode::Total,
                first_due: Some(d(2025, 5, 1)),
                interest_per_month: None,
            }),
        ),
    )
    .unwrap();
    conn.execute("UPDATE installment_charges SET paid=1 WHERE seq=2", [])
        .unwrap();

    // seq 1 is in the past, seq 2 is paid
    let groups = future_installments(&conn, 1, d(2025, 5, 15)).unwrap();
    assert!(groups.is_empty());
}
