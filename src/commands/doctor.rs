// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::commands::boxes::box_balance;
use crate::commands::installments::plan_charges;
use crate::utils::{pretty_table, stored_amount};

/// Scans for stored rows that violate the ledger's invariants. Everything
/// reported here points at a write path bug or hand-edited data.
pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Plans whose charges don't add up, or with the wrong charge count
    let mut stmt = conn.prepare(
        "SELECT p.id, p.total_amount, p.installment_count FROM installment_plans p",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let plan_id: i64 = r.get(0)?;
        let total_s: String = r.get(1)?;
        let count: u32 = r.get(2)?;
        let total = stored_amount(&total_s)?;

        let charges = plan_charges(conn, plan_id)?;
        if charges.len() != count as usize {
            rows.push(vec![
                "plan_charge_count".into(),
                format!(
                    "plan #{}: {} charges, expected {}",
                    plan_id,
                    charges.len(),
                    count
                ),
            ]);
        }
        let sum: Decimal = charges.iter().map(|c| c.amount).sum();
        if sum != total {
            rows.push(vec![
                "plan_total_mismatch".into(),
                format!("plan #{}: charges sum {} != total {}", plan_id, sum, total),
            ]);
        }
    }

    // 2) Installment transactions without a plan
    let mut stmt2 = conn.prepare(
        "SELECT t.id FROM transactions t
         WHERE t.is_installment=1
           AND NOT EXISTS (SELECT 1 FROM installment_plans p WHERE p.transaction_id=t.id)",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec!["installment_without_plan".into(), format!("tx #{}", id)]);
    }

    // 3) Boxes overdrawn despite the withdraw guard
    let mut stmt3 = conn.prepare("SELECT id, name FROM saving_boxes")?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let balance = box_balance(conn, id)?;
        if balance < Decimal::ZERO {
            rows.push(vec![
                "negative_box_balance".into(),
                format!("box #{} '{}': {}", id, name, balance),
            ]);
        }
    }

    // 4) Movement back-references pointing at deleted transactions
    let mut stmt4 = conn.prepare(
        "SELECT m.id FROM saving_movements m
         WHERE m.transaction_id IS NOT NULL
           AND NOT EXISTS (SELECT 1 FROM transactions t WHERE t.id=m.transaction_id)",
    )?;
    let mut cur4 = stmt4.query([])?;
    while let Some(r) = cur4.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec!["dangling_movement_ref".into(), format!("movement #{}", id)]);
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
