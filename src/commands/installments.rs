// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::{LedgerError, LedgerResult};
use crate::models::{InstallmentCharge, InstallmentMode};
use crate::utils::{
    add_months, fmt_money, maybe_print_json, pretty_table, resolve_owner, stored_amount,
};

/// Splits `total` into `count` two-decimal amounts. Every slot gets
/// `round(total / count, 2)`; the last slot also absorbs the rounding
/// residue so the sum equals `total` to the cent. This is the single
/// place the remainder policy lives.
pub fn split_total(total: Decimal, count: u32) -> Vec<Decimal> {
    if count == 0 {
        return Vec::new();
    }
    let n = Decimal::from(count);
    let base = (total / n).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let mut amounts = vec![base; count as usize];
    if let Some(last) = amounts.last_mut() {
        *last = base + (total - base * n);
    }
    amounts
}

/// Total a plan commits to, given how the user expressed the amount.
pub fn plan_total(amount: Decimal, count: u32, mode: InstallmentMode) -> Decimal {
    match mode {
        InstallmentMode::Total => amount,
        InstallmentMode::PerInstallment => amount * Decimal::from(count),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledCharge {
    pub seq: u32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

/// Produces the per-period charges of a parceled purchase: `count` charges,
/// one calendar month apart starting at `first_due`.
pub fn schedule_charges(
    amount: Decimal,
    count: u32,
    mode: InstallmentMode,
    first_due: NaiveDate,
) -> LedgerResult<Vec<ScheduledCharge>> {
    if count < 2 {
        return Err(LedgerError::validation(
            "installments",
            format!("count must be at least 2, got {}", count),
        ));
    }
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount", "must be positive"));
    }
    let amounts = match mode {
        InstallmentMode::PerInstallment => vec![amount; count as usize],
        InstallmentMode::Total => split_total(amount, count),
    };
    let mut charges = Vec::with_capacity(count as usize);
    for (i, amt) in amounts.into_iter().enumerate() {
        charges.push(ScheduledCharge {
            seq: i as u32 + 1,
            amount: amt,
            due_date: add_months(first_due, i as u32)?,
        });
    }
    Ok(charges)
}

/// A plan's charges in sequence order.
pub fn plan_charges(conn: &Connection, plan_id: i64) -> LedgerResult<Vec<InstallmentCharge>> {
    let mut stmt = conn.prepare(
        "SELECT id, plan_id, seq, amount, due_date, paid
         FROM installment_charges WHERE plan_id = ?1 ORDER BY seq",
    )?;
    let mut rows = stmt.query(params![plan_id])?;
    let mut charges = Vec::new();
    while let Some(r) = rows.next()? {
        let amount_s: String = r.get(3)?;
        let due_s: String = r.get(4)?;
        charges.push(InstallmentCharge {
            id: r.get(0)?,
            plan_id: r.get(1)?,
            seq: r.get(2)?,
            amount: stored_amount(&amount_s)?,
            due_date: NaiveDate::parse_from_str(&due_s, "%Y-%m-%d")
                .map_err(|_| LedgerError::Corrupt(format!("invalid stored due date '{}'", due_s)))?,
            paid: r.get(5)?,
        });
    }
    Ok(charges)
}

#[derive(Debug, Clone, Serialize)]
pub struct FutureInstallment {
    pub description: String,
    pub seq: u32,
    pub count: u32,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthGroup {
    pub year: i32,
    pub month: u32,
    pub total: Decimal,
    pub items: Vec<FutureInstallment>,
}

/// Unpaid charges due after `today`, grouped by year-month ascending.
pub fn future_installments(
    conn: &Connection,
    owner: i64,
    today: NaiveDate,
) -> LedgerResult<Vec<MonthGroup>> {
    let mut stmt = conn.prepare(
        "SELECT c.seq, c.amount, c.due_date, p.installment_count,
                COALESCE(p.description, t.description, t.category)
         FROM installment_charges c
         JOIN installment_plans p ON c.plan_id = p.id
         JOIN transactions t ON p.transaction_id = t.id
         WHERE t.owner = ?1 AND c.paid = 0 AND c.due_date > ?2
         ORDER BY c.due_date, c.id",
    )?;
    let mut rows = stmt.query(params![owner, today.to_string()])?;

    let mut groups: BTreeMap<(i32, u32), MonthGroup> = BTreeMap::new();
    while let Some(r) = rows.next()? {
        let seq: u32 = r.get(0)?;
        let amount_s: String = r.get(1)?;
        let due_s: String = r.get(2)?;
        let count: u32 = r.get(3)?;
        let description: String = r.get(4)?;
        let due_date = NaiveDate::parse_from_str(&due_s, "%Y-%m-%d")
            .map_err(|_| LedgerError::Corrupt(format!("invalid stored due date '{}'", due_s)))?;
        let amount = stored_amount(&amount_s)?;
        let entry = groups
            .entry((due_date.year(), due_date.month()))
            .or_insert_with(|| MonthGroup {
                year: due_date.year(),
                month: due_date.month(),
                total: Decimal::ZERO,
                items: Vec::new(),
            });
        entry.total += amount;
        entry.items.push(FutureInstallment {
            description,
            seq,
            count,
            due_date,
            amount,
        });
    }
    Ok(groups.into_values().collect())
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("future", sub)) => future(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn future(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let owner = resolve_owner(conn, sub)?;
    let today = chrono::Utc::now().date_naive();
    let groups = future_installments(conn, owner, today)?;
    if !maybe_print_json(json_flag, jsonl_flag, &groups)? {
        let mut rows = Vec::new();
        for g in &groups {
            for item in &g.items {
                rows.push(vec![
                    format!("{:04}-{:02}", g.year, g.month),
                    item.description.clone(),
                    format!("{}/{}", item.seq, item.count),
                    item.due_date.to_string(),
                    fmt_money(&item.amount),
                ]);
            }
            rows.push(vec![
                format!("{:04}-{:02}", g.year, g.month),
                "(month total)".into(),
                String::new(),
                String::new(),
                fmt_money(&g.total),
            ]);
        }
        println!(
            "{}",
            pretty_table(&["Month", "Description", "Installment", "Due", "Amount"], rows)
        );
    }
    Ok(())
}
