// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{LedgerError, LedgerResult};
use crate::models::BILL_PAYMENT_CATEGORY;
use crate::utils::{
    fmt_money, maybe_print_json, month_bounds, parse_date, pretty_table, resolve_owner,
    stored_amount,
};

/// What a month's bill is made of. Totals plus the ids of every
/// contributing record, so settlement touches exactly what was previewed.
#[derive(Debug, Clone, Serialize)]
pub struct BillSnapshot {
    pub year: i32,
    pub month: u32,
    pub one_shot_total: Decimal,
    pub installments_total: Decimal,
    pub total: Decimal,
    pub transaction_ids: Vec<i64>,
    pub charge_ids: Vec<i64>,
}

/// Aggregates the owner's outstanding credit charges for a month. Pure
/// read: safe to call repeatedly for preview before paying.
///
/// One-shot contributions are unsettled credit expenses dated inside the
/// month, excluding installment parents and prior bill payments.
/// Installment contributions are unpaid charges due inside the month.
pub fn compute_bill(
    conn: &Connection,
    owner: i64,
    year: i32,
    month: u32,
) -> LedgerResult<BillSnapshot> {
    let (first, last) = month_bounds(year, month)?;

    let mut one_shot_total = Decimal::ZERO;
    let mut transaction_ids = Vec::new();
    let mut stmt = conn.prepare(
        "SELECT id, amount FROM transactions
         WHERE owner = ?1 AND kind = 'expense' AND payment_method = 'credit'
           AND is_installment = 0 AND settled = 0 AND category <> ?2
           AND date >= ?3 AND date <= ?4
         ORDER BY date, id",
    )?;
    let mut rows = stmt.query(params![
        owner,
        BILL_PAYMENT_CATEGORY,
        first.to_string(),
        last.to_string()
    ])?;
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let amount_s: String = r.get(1)?;
        one_shot_total += stored_amount(&amount_s)?;
        transaction_ids.push(id);
    }

    let mut installments_total = Decimal::ZERO;
    let mut charge_ids = Vec::new();
    let mut stmt = conn.prepare(
        "SELECT c.id, c.amount FROM installment_charges c
         JOIN installment_plans p ON c.plan_id = p.id
         JOIN transactions t ON p.transaction_id = t.id
         WHERE t.owner = ?1 AND c.paid = 0 AND c.due_date >= ?2 AND c.due_date <= ?3
         ORDER BY c.due_date, c.id",
    )?;
    let mut rows = stmt.query(params![owner, first.to_string(), last.to_string()])?;
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let amount_s: String = r.get(1)?;
        installments_total += stored_amount(&amount_s)?;
        charge_ids.push(id);
    }

    let total = one_shot_total + installments_total;
    Ok(BillSnapshot {
        year,
        month,
        one_shot_total,
        installments_total,
        total,
        transaction_ids,
        charge_ids,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub bill: BillSnapshot,
    pub payment_transaction_id: i64,
}

/// Pays a month's bill: marks every contributing transaction settled and
/// every contributing charge paid, and appends one "Bill Payment" debit
/// expense for the grand total. All three effects commit together or not
/// at all; the constituent records stay in the ledger as history.
pub fn settle_bill(
    conn: &mut Connection,
    owner: i64,
    year: i32,
    month: u32,
    pay_date: NaiveDate,
) -> LedgerResult<Settlement> {
    let bill = compute_bill(conn, owner, year, month)?;
    if bill.total <= Decimal::ZERO {
        return Err(LedgerError::validation(
            "bill",
            format!("nothing pending for {:04}-{:02}", year, month),
        ));
    }

    let tx = conn.transaction()?;
    for id in &bill.transaction_ids {
        tx.execute("UPDATE transactions SET settled = 1 WHERE id = ?1", params![id])?;
    }
    for id in &bill.charge_ids {
        tx.execute(
            "UPDATE installment_charges SET paid = 1 WHERE id = ?1",
            params![id],
        )?;
    }
    tx.execute(
        "INSERT INTO transactions(owner, kind, amount, category, description, date, payment_method, settled)
         VALUES (?1, 'expense', ?2, ?3, ?4, ?5, 'debit', 1)",
        params![
            owner,
            bill.total.round_dp(2).to_string(),
            BILL_PAYMENT_CATEGORY,
            format!("Credit card bill {:04}-{:02}", year, month),
            pay_date.to_string()
        ],
    )?;
    let payment_transaction_id = tx.last_insert_rowid();
    tx.commit()?;

    tracing::info!(
        owner,
        year,
        month,
        total = %bill.total,
        payment_transaction_id,
        "bill settled"
    );
    Ok(Settlement {
        bill,
        payment_transaction_id,
    })
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => show(conn, sub)?,
        Some(("pay", sub)) => pay(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let owner = resolve_owner(conn, sub)?;
    let year = *sub.get_one::<i32>("year").unwrap();
    let month = *sub.get_one::<u32>("month").unwrap();
    let bill = compute_bill(conn, owner, year, month)?;
    if !maybe_print_json(json_flag, jsonl_flag, &bill)? {
        let rows = vec![
            vec![
                "One-shot credit".into(),
                bill.transaction_ids.len().to_string(),
                fmt_money(&bill.one_shot_total),
            ],
            vec![
                "Installments".into(),
                bill.charge_ids.len().to_string(),
                fmt_money(&bill.installments_total),
            ],
            vec!["Total".into(), String::new(), fmt_money(&bill.total)],
        ];
        let header = format!("Bill {:04}-{:02}", year, month);
        println!(
            "{}",
            pretty_table(&[header.as_str(), "Items", "Amount"], rows)
        );
    }
    Ok(())
}

fn pay(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner = resolve_owner(conn, sub)?;
    let year = *sub.get_one::<i32>("year").unwrap();
    let month = *sub.get_one::<u32>("month").unwrap();
    let pay_date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => chrono::Utc::now().date_naive(),
    };
    let settlement = settle_bill(conn, owner, year, month, pay_date)?;
    println!(
        "Paid bill {:04}-{:02}: {} ({} one-shot, {} installments; payment tx #{})",
        year,
        month,
        fmt_money(&settlement.bill.total),
        settlement.bill.transaction_ids.len(),
        settlement.bill.charge_ids.len(),
        settlement.payment_transaction_id
    );
    Ok(())
}
