// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{LedgerError, LedgerResult};
use crate::models::{
    MovementKind, SavingBox, SavingMovement, BOX_DEPOSIT_CATEGORY, BOX_WITHDRAWAL_CATEGORY,
};
use crate::utils::{
    fmt_money, maybe_print_json, parse_date, parse_decimal, parse_positive_amount, pretty_table,
    resolve_owner, stored_amount,
};

// Tolerance when comparing a withdrawal against the derived balance, so
// sub-cent residue in stored amounts never blocks an exact drain.
fn balance_epsilon() -> Decimal {
    Decimal::new(1, 9)
}

/// A box's movement history, newest first.
pub fn box_movements(conn: &Connection, box_id: i64) -> LedgerResult<Vec<SavingMovement>> {
    let mut stmt = conn.prepare(
        "SELECT id, box_id, kind, amount, date, description, transaction_id
         FROM saving_movements WHERE box_id = ?1 ORDER BY date DESC, id DESC",
    )?;
    let mut rows = stmt.query(params![box_id])?;
    let mut movements = Vec::new();
    while let Some(r) = rows.next()? {
        let kind_s: String = r.get(2)?;
        let amount_s: String = r.get(3)?;
        let date_s: String = r.get(4)?;
        movements.push(SavingMovement {
            id: r.get(0)?,
            box_id: r.get(1)?,
            kind: MovementKind::parse(&kind_s)
                .map_err(|_| LedgerError::Corrupt(format!("invalid movement kind '{}'", kind_s)))?,
            amount: stored_amount(&amount_s)?,
            date: NaiveDate::parse_from_str(&date_s, "%Y-%m-%d")
                .map_err(|_| LedgerError::Corrupt(format!("invalid stored date '{}'", date_s)))?,
            description: r.get(5)?,
            transaction_id: r.get(6)?,
        });
    }
    Ok(movements)
}

/// A box's balance is never stored; it is the sum of its movements,
/// deposits positive, withdrawals negative.
pub fn box_balance(conn: &Connection, box_id: i64) -> LedgerResult<Decimal> {
    let mut balance = Decimal::ZERO;
    for m in box_movements(conn, box_id)? {
        match m.kind {
            MovementKind::Deposit => balance += m.amount,
            MovementKind::Withdraw => balance -= m.amount,
        }
    }
    Ok(balance)
}

pub fn get_box(conn: &Connection, owner: i64, id: i64) -> LedgerResult<SavingBox> {
    let row = conn
        .query_row(
            "SELECT id, owner, name, description, target_amount, archived
             FROM saving_boxes WHERE id = ?1 AND owner = ?2",
            params![id, owner],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, Option<String>>(3)?,
                    r.get::<_, Option<String>>(4)?,
                    r.get::<_, bool>(5)?,
                ))
            },
        )
        .optional()?;
    let (id, owner, name, description, target_s, archived) =
        row.ok_or_else(|| LedgerError::not_found("saving box", id))?;
    let target_amount = target_s.as_deref().map(stored_amount).transpose()?;
    Ok(SavingBox {
        id,
        owner,
        name,
        description,
        target_amount,
        archived,
    })
}

pub fn create_box(
    conn: &Connection,
    owner: i64,
    name: &str,
    description: Option<&str>,
    target_amount: Option<Decimal>,
) -> LedgerResult<i64> {
    if name.trim().is_empty() {
        return Err(LedgerError::validation("name", "is required"));
    }
    if let Some(t) = target_amount {
        if t <= Decimal::ZERO {
            return Err(LedgerError::validation("target", "must be positive"));
        }
    }
    conn.execute(
        "INSERT INTO saving_boxes(owner, name, description, target_amount)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            owner,
            name.trim(),
            description,
            target_amount.map(|t| t.round_dp(2).to_string())
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn archive_box(conn: &Connection, owner: i64, id: i64) -> LedgerResult<()> {
    let bx = get_box(conn, owner, id)?;
    conn.execute(
        "UPDATE saving_boxes SET archived = 1 WHERE id = ?1",
        params![bx.id],
    )?;
    Ok(())
}

/// Hard delete: movements first, then the box, atomically. Normal flows
/// archive instead.
pub fn delete_box(conn: &mut Connection, owner: i64, id: i64) -> LedgerResult<()> {
    let bx = get_box(conn, owner, id)?;
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM saving_movements WHERE box_id = ?1",
        params![bx.id],
    )?;
    tx.execute("DELETE FROM saving_boxes WHERE id = ?1", params![bx.id])?;
    tx.commit()?;
    tracing::debug!(owner, box_id = id, "saving box deleted");
    Ok(())
}

/// Moves money into a box: one expense transaction in the main ledger and
/// one deposit movement referencing it, committed together.
pub fn deposit(
    conn: &mut Connection,
    owner: i64,
    box_id: i64,
    amount: Decimal,
    date: NaiveDate,
    description: Option<&str>,
) -> LedgerResult<i64> {
    let bx = movement_target(conn, owner, box_id, amount)?;
    let tx = conn.transaction()?;
    let desc = description
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Deposit to '{}'", bx.name));
    tx.execute(
        "INSERT INTO transactions(owner, kind, amount, category, description, date)
         VALUES (?1, 'expense', ?2, ?3, ?4, ?5)",
        params![
            owner,
            amount.round_dp(2).to_string(),
            BOX_DEPOSIT_CATEGORY,
            desc,
            date.to_string()
        ],
    )?;
    let transaction_id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO saving_movements(box_id, kind, amount, date, description, transaction_id)
         VALUES (?1, 'deposit', ?2, ?3, ?4, ?5)",
        params![
            bx.id,
            amount.round_dp(2).to_string(),
            date.to_string(),
            description,
            transaction_id
        ],
    )?;
    tx.commit()?;
    tracing::debug!(owner, box_id, amount = %amount, "deposit recorded");
    Ok(transaction_id)
}

/// Moves money out of a box. Rejected when the amount exceeds the derived
/// balance (plus epsilon); a box can be drained to exactly zero.
pub fn withdraw(
    conn: &mut Connection,
    owner: i64,
    box_id: i64,
    amount: Decimal,
    date: NaiveDate,
    description: Option<&str>,
) -> LedgerResult<i64> {
    let bx = movement_target(conn, owner, box_id, amount)?;
    let balance = box_balance(conn, bx.id)?;
    if amount > balance + balance_epsilon() {
        return Err(LedgerError::validation(
            "amount",
            format!("exceeds box balance ({})", fmt_money(&balance)),
        ));
    }
    let tx = conn.transaction()?;
    let desc = description
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Withdrawal from '{}'", bx.name));
    tx.execute(
        "INSERT INTO transactions(owner, kind, amount, category, description, date)
         VALUES (?1, 'income', ?2, ?3, ?4, ?5)",
        params![
            owner,
            amount.round_dp(2).to_string(),
            BOX_WITHDRAWAL_CATEGORY,
            desc,
            date.to_string()
        ],
    )?;
    let transaction_id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO saving_movements(box_id, kind, amount, date, description, transaction_id)
         VALUES (?1, 'withdraw', ?2, ?3, ?4, ?5)",
        params![
            bx.id,
            amount.round_dp(2).to_string(),
            date.to_string(),
            description,
            transaction_id
        ],
    )?;
    tx.commit()?;
    tracing::debug!(owner, box_id, amount = %amount, "withdrawal recorded");
    Ok(transaction_id)
}

fn movement_target(
    conn: &Connection,
    owner: i64,
    box_id: i64,
    amount: Decimal,
) -> LedgerResult<SavingBox> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount", "must be positive"));
    }
    let bx = get_box(conn, owner, box_id)?;
    if bx.archived {
        return Err(LedgerError::validation("box", "is archived"));
    }
    Ok(bx)
}

#[derive(Serialize)]
pub struct BoxRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub target: String,
    pub balance: String,
    pub archived: bool,
}

pub fn list_boxes(
    conn: &Connection,
    owner: i64,
    include_archived: bool,
) -> LedgerResult<Vec<BoxRow>> {
    let mut sql = String::from(
        "SELECT id, name, description, target_amount, archived
         FROM saving_boxes WHERE owner = ?1",
    );
    if !include_archived {
        sql.push_str(" AND archived = 0");
    }
    sql.push_str(" ORDER BY name");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![owner])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let description: Option<String> = r.get(2)?;
        let target: Option<String> = r.get(3)?;
        let archived: bool = r.get(4)?;
        let balance = box_balance(conn, id)?;
        data.push(BoxRow {
            id,
            name,
            description: description.unwrap_or_default(),
            target: target.unwrap_or_default(),
            balance: fmt_money(&balance),
            archived,
        });
    }
    Ok(data)
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let owner = resolve_owner(conn, sub)?;
            let name = sub.get_one::<String>("name").unwrap();
            let description = sub.get_one::<String>("description").map(|s| s.as_str());
            let target = sub
                .get_one::<String>("target")
                .map(|s| parse_decimal(s))
                .transpose()?;
            let id = create_box(conn, owner, name, description, target)?;
            println!("Created box '{}' (#{})", name.trim(), id);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let owner = resolve_owner(conn, sub)?;
            let data = list_boxes(conn, owner, sub.get_flag("all"))?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows: Vec<Vec<String>> = data
                    .iter()
                    .map(|b| {
                        vec![
                            b.id.to_string(),
                            b.name.clone(),
                            b.description.clone(),
                            b.target.clone(),
                            b.balance.clone(),
                            if b.archived { "yes".into() } else { String::new() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Id", "Name", "Description", "Target", "Balance", "Archived"],
                        rows
                    )
                );
            }
        }
        Some(("show", sub)) => {
            let owner = resolve_owner(conn, sub)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            let bx = get_box(conn, owner, id)?;
            let balance = box_balance(conn, bx.id)?;
            show_box(conn, &bx, balance, sub.get_flag("json"))?;
        }
        Some(("archive", sub)) => {
            let owner = resolve_owner(conn, sub)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            archive_box(conn, owner, id)?;
            println!("Archived box #{}", id);
        }
        Some(("rm", sub)) => {
            let owner = resolve_owner(conn, sub)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_box(conn, owner, id)?;
            println!("Deleted box #{}", id);
        }
        Some(("deposit", sub)) => {
            movement(conn, sub, MovementKind::Deposit)?;
        }
        Some(("withdraw", sub)) => {
            movement(conn, sub, MovementKind::Withdraw)?;
        }
        _ => {}
    }
    Ok(())
}

fn movement(conn: &mut Connection, sub: &clap::ArgMatches, kind: MovementKind) -> Result<()> {
    let owner = resolve_owner(conn, sub)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let amount = parse_positive_amount(sub.get_one::<String>("amount").unwrap())?;
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => chrono::Utc::now().date_naive(),
    };
    let description = sub.get_one::<String>("description").map(|s| s.as_str());
    match kind {
        MovementKind::Deposit => deposit(conn, owner, id, amount, date, description)?,
        MovementKind::Withdraw => withdraw(conn, owner, id, amount, date, description)?,
    };
    let balance = box_balance(conn, id)?;
    println!(
        "{} {} box #{}; balance is now {}",
        match kind {
            MovementKind::Deposit => "Deposited",
            MovementKind::Withdraw => "Withdrew",
        },
        fmt_money(&amount),
        id,
        fmt_money(&balance)
    );
    Ok(())
}

fn show_box(conn: &Connection, bx: &SavingBox, balance: Decimal, json_flag: bool) -> Result<()> {
    if json_flag {
        let row = BoxRow {
            id: bx.id,
            name: bx.name.clone(),
            description: bx.description.clone().unwrap_or_default(),
            target: bx
                .target_amount
                .map(|t| fmt_money(&t))
                .unwrap_or_default(),
            balance: fmt_money(&balance),
            archived: bx.archived,
        };
        println!("{}", serde_json::to_string_pretty(&row)?);
        return Ok(());
    }
    let mut rows = vec![vec!["Balance".to_string(), fmt_money(&balance)]];
    if let Some(t) = bx.target_amount {
        rows.push(vec!["Target".into(), fmt_money(&t)]);
    }
    let movements: Vec<Vec<String>> = box_movements(conn, bx.id)?
        .iter()
        .map(|m| {
            vec![
                m.date.to_string(),
                m.kind.as_str().to_string(),
                fmt_money(&m.amount),
                m.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    let header = format!("Box '{}' (#{})", bx.name, bx.id);
    println!("{}", pretty_table(&[header.as_str(), ""], rows));
    println!(
        "{}",
        pretty_table(&["Date", "Kind", "Amount", "Description"], movements)
    );
    Ok(())
}
