// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::commands::billing::compute_bill;
use crate::errors::LedgerResult;
use crate::models::BILL_PAYMENT_CATEGORY;
use crate::utils::{
    fmt_money, maybe_print_json, month_bounds, pretty_table, resolve_owner, stored_amount,
};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, sub)?,
        Some(("cashflow", sub)) => cashflow(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub bill_total: Decimal,
    pub balance: Decimal,
}

/// The dashboard numbers for one month: income, expenses that actually
/// left the balance (debit and bill payments; pending credit purchases
/// count only once settled through a bill), the open bill, and the net.
pub fn month_summary(
    conn: &Connection,
    owner: i64,
    year: i32,
    month: u32,
) -> LedgerResult<MonthSummary> {
    let (first, last) = month_bounds(year, month)?;

    let mut income_total = Decimal::ZERO;
    let mut expense_total = Decimal::ZERO;
    let mut stmt = conn.prepare(
        "SELECT kind, amount, payment_method, category FROM transactions
         WHERE owner = ?1 AND date >= ?2 AND date <= ?3",
    )?;
    let mut rows = stmt.query(params![owner, first.to_string(), last.to_string()])?;
    while let Some(r) = rows.next()? {
        let kind: String = r.get(0)?;
        let amount_s: String = r.get(1)?;
        let method: Option<String> = r.get(2)?;
        let category: String = r.get(3)?;
        let amount = stored_amount(&amount_s)?;
        match kind.as_str() {
            "income" => income_total += amount,
            _ => {
                let on_credit = method.as_deref() == Some("credit");
                if !on_credit || category == BILL_PAYMENT_CATEGORY {
                    expense_total += amount;
                }
            }
        }
    }

    let bill_total = compute_bill(conn, owner, year, month)?.total;
    Ok(MonthSummary {
        year,
        month,
        income_total,
        expense_total,
        bill_total,
        balance: income_total - expense_total,
    })
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let owner = resolve_owner(conn, sub)?;
    let year = *sub.get_one::<i32>("year").unwrap();
    let month = *sub.get_one::<u32>("month").unwrap();
    let s = month_summary(conn, owner, year, month)?;
    if !maybe_print_json(json_flag, jsonl_flag, &s)? {
        let rows = vec![
            vec!["Income".to_string(), fmt_money(&s.income_total)],
            vec!["Expenses".to_string(), fmt_money(&s.expense_total)],
            vec!["Open bill".to_string(), fmt_money(&s.bill_total)],
            vec!["Balance".to_string(), fmt_money(&s.balance)],
        ];
        let header = format!("Summary {:04}-{:02}", year, month);
        println!("{}", pretty_table(&[header.as_str(), "Amount"], rows));
    }
    Ok(())
}

fn cashflow(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let owner = resolve_owner(conn, sub)?;
    let months: usize = *sub.get_one::<usize>("months").unwrap_or(&12);

    let mut stmt = conn.prepare(
        "SELECT substr(date,1,7) AS month, kind, amount FROM transactions
         WHERE owner = ?1 ORDER BY date DESC",
    )?;
    let mut rows = stmt.query(params![owner])?;

    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    while let Some(r) = rows.next()? {
        let m: String = r.get(0)?;
        let kind: String = r.get(1)?;
        let amount_s: String = r.get(2)?;
        let amount = stored_amount(&amount_s)?;
        let entry = map.entry(m).or_insert((Decimal::ZERO, Decimal::ZERO));
        if kind == "income" {
            entry.0 += amount;
        } else {
            entry.1 += amount;
        }
    }
    let mut data = Vec::new();
    for (m, (inc, exp)) in map.iter().rev().take(months) {
        data.push(vec![m.clone(), fmt_money(inc), fmt_money(exp)]);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", pretty_table(&["Month", "Income", "Expense"], data));
    }
    Ok(())
}
