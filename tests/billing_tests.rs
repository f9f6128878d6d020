// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::commands::billing::{compute_bill, settle_bill};
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

fn entry(kind: TxKind, amount: &str, date: NaiveDate, method: Option<PaymentMethod>) -> NewTransaction {
    NewTransaction {
        kind,
        amount: dec(amount),
        category: "General".into(),
        description: None,
        date,
        payment_method: method,
        recurring: false,
        tag: None,
        installments: None,
    }
}

/// August 2025 fixture: one 50.00 credit purchase and the first 100.00
/// charge of a 300.00 x3 plan land in the bill; debit, income, settled,
/// and foreign-owner rows must not.
fn seed_august(conn: &mut Connection) {
    create_transaction(
        conn,
        1,
        &entry(TxKind::Expense, "50.00", d(2025, 8, 10), Some(PaymentMethod::Credit)),
    )
    .unwrap();
    create_transaction(
        conn,
        1,
        &entry(TxKind::Expense, "30.00", d(2025, 8, 11), Some(PaymentMethod::Debit)),
    )
    .unwrap();
    create_transaction(conn, 1, &entry(TxKind::Income, "2000.00", d(2025, 8, 1), None)).unwrap();
    // settled credit purchase stays out of the bill
    let settled_id = create_transaction(
        conn,
        1,
        &entry(TxKind::Expense, "75.00", d(2025, 8, 12), Some(PaymentMethod::Credit)),
    )
    .unwrap();
    conn.execute("UPDATE transactions SET settled=1 WHERE id=?1", [settled_id])
        .unwrap();
    // someone else's ledger
    create_transaction(
        conn,
        2,
        &entry(TxKind::Expense, "500.00", d(2025, 8, 13), Some(PaymentMethod::Credit)),
    )
    .unwrap();

    let mut plan = entry(TxKind::Expense, "300.00", d(2025, 8, 5), Some(PaymentMethod::Credit));
    plan.installments = Some(InstallmentRequest {
        count: 3,
        mode: InstallmentMode::Total,
        first_due: Some(d(2025, 8, 5)),
        interest_per_month: None,
    });
    create_transaction(conn, 1, &plan).unwrap();
}

#[test]
fn bill_selects_one_shot_and_due_charges() {
    let mut conn = setup();
    seed_august(&mut conn);

    let bill = compute_bill(&conn, 1, 2025, 8).unwrap();
    assert_eq!(bill.one_shot_total, dec("50.00"));
    assert_eq!(bill.installments_total, dec("100.00"));
    assert_eq!(bill.total, dec("150.00"));
    assert_eq!(bill.transaction_ids.len(), 1);
    assert_eq!(bill.charge_ids.len(), 1);
}

#[test]
fn bill_is_idempotent() {
    let mut conn = setup();
    seed_august(&mut conn);

    let a = compute_bill(&conn, 1, 2025, 8).unwrap();
    let b = compute_bill(&conn, 1, 2025, 8).unwrap();
    assert_eq!(a.total, b.total);
    assert_eq!(a.transaction_ids, b.transaction_ids);
    assert_eq!(a.charge_ids, b.charge_ids);
}

#[test]
fn empty_month_bill_is_zero() {
    let conn = setup();
    let bill = compute_bill(&conn, 1, 2025, 1).unwrap();
    assert_eq!(bill.total, Decimal::ZERO);
    assert!(bill.transaction_ids.is_empty());
    assert!(bill.charge_ids.is_empty());
}

#[test]
fn settle_marks_everything_and_appends_payment() {
    let mut conn = setup();
    seed_august(&mut conn);

    let before = compute_bill(&conn, 1, 2025, 8).unwrap();
    let settlement = settle_bill(&mut conn, 1, 2025, 8, d(2025, 9, 1)).unwrap();
    assert_eq!(settlement.bill.total, before.total);

    for id in &before.transaction_ids {
        let settled: bool = conn
            .query_row("SELECT settled FROM transactions WHERE id=?1", [id], |r| {
                r.get(0)
            })
            .unwrap();
        assert!(settled);
    }
    for id in &before.charge_ids {
        let paid: bool = conn
            .query_row(
                "SELECT paid FROM installment_charges WHERE id=?1",
                [id],
                |r| r.get(0),
            )
            .unwrap();
        assert!(paid);
    }

    let (amount, method, settled, date): (String, String, bool, String) = conn
        .query_row(
            "SELECT amount, payment_method, settled, date FROM transactions
             WHERE id=?1 AND category='Bill Payment'",
            [settlement.payment_transaction_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!(amount, "150.00");
    assert_eq!(method, "debit");
    assert!(settled);
    assert_eq!(date, "2025-09-01");

    let payments: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM transactions WHERE category='Bill Payment'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(payments, 1);

    // the month is clean afterwards
    let after = compute_bill(&conn, 1, 2025, 8).unwrap();
    assert_eq!(after.total, Decimal::ZERO);
}

#[test]
fn settle_rejects_month_with_nothing_pending() {
    let mut conn = setup();
    seed_august(&mut conn);

    let before: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    let err = settle_bill(&mut conn, 1, 2025, 1, d(2025, 1, 31));
    assert!(err.is_err());
    let after: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn later_charges_bill_in_their_own_months() {
    let mut conn = setup();
    seed_august(&mut conn);
    settle_bill(&mut conn, 1, 2025, 8, d(2025, 9, 1)).unwrap();

    let sep = compute_bill(&conn, 1, 2025, 9).unwrap();
    assert_eq!(sep.one_shot_total, Decimal::ZERO);
    assert_eq!(sep.installments_total, dec("100.00"));

    let oct = compute_bill(&conn, 1, 2025, 10).unwrap();
    assert_eq!(oct.installments_total, dec("100.00"));
}

#[test]
fn bill_payment_rows_never_rebill() {
    let mut conn = setup();
    seed_august(&mut conn);
    // pay inside the billed month: the payment row must not re-enter it
    settle_bill(&mut conn, 1, 2025, 8, d(2025, 8, 31)).unwrap();
    let again = compute_bill(&conn, 1, 2025, 8).unwrap();
    assert_eq!(again.total, Decimal::ZERO);
}
