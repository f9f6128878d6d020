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

use crate::commands::installments::{plan_charges, plan_total, schedule_charges};
use crate::errors::{LedgerError, LedgerResult};
use crate::models::{
    InstallmentMode, InstallmentPlan, InstallmentSummary, PaymentMethod, Transaction, TxKind,
};
use crate::utils::{
    maybe_print_json, parse_date, parse_decimal, parse_positive_amount, pretty_table,
    resolve_owner,
};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Installment fields of a new purchase, as entered by the user.
#[derive(Debug, Clone)]
pub struct InstallmentRequest {
    pub count: u32,
    pub mode: InstallmentMode,
    pub first_due: Option<NaiveDate>,
    pub interest_per_month: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TxKind,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub payment_method: Option<PaymentMethod>,
    pub recurring: bool,
    pub tag: Option<String>,
    pub installments: Option<InstallmentRequest>,
}

/// Records a transaction. An installment purchase additionally creates its
/// plan and all scheduled charges in the same DB transaction, so a failed
/// schedule leaves no half-created purchase behind.
pub fn create_transaction(
    conn: &mut Connection,
    owner: i64,
    new: &NewTransaction,
) -> LedgerResult<i64> {
    if new.amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount", "must be positive"));
    }
    if new.category.trim().is_empty() {
        return Err(LedgerError::validation("category", "is required"));
    }
    if let Some(inst) = &new.installments {
        if new.kind != TxKind::Expense || new.payment_method != Some(PaymentMethod::Credit) {
            return Err(LedgerError::validation(
                "installments",
                "installment purchases must be credit expenses",
            ));
        }
        if inst.count < 2 {
            return Err(LedgerError::validation(
                "installments",
                format!("count must be at least 2, got {}", inst.count),
            ));
        }
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO transactions(owner, kind, amount, category, description, date,
                                  payment_method, recurring, tag, is_installment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            owner,
            new.kind.as_str(),
            new.amount.round_dp(2).to_string(),
            new.category,
            new.description,
            new.date.to_string(),
            new.payment_method.map(|p| p.as_str()),
            new.recurring as i64,
            new.tag,
            new.installments.is_some() as i64,
        ],
    )?;
    let transaction_id = tx.last_insert_rowid();

    if let Some(inst) = &new.installments {
        let first_due = inst.first_due.unwrap_or(new.date);
        let total = plan_total(new.amount, inst.count, inst.mode);
        tx.execute(
            "INSERT INTO installment_plans(transaction_id, description, total_amount,
                                           installment_count, mode, interest_per_month)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                transaction_id,
                new.description,
                total.round_dp(2).to_string(),
                inst.count,
                inst.mode.as_str(),
                inst.interest_per_month.map(|i| i.to_string()),
            ],
        )?;
        let plan_id = tx.last_insert_rowid();
        let charges = schedule_charges(new.amount, inst.count, inst.mode, first_due)?;
        for c in &charges {
            tx.execute(
                "INSERT INTO installment_charges(plan_id, seq, amount, due_date)
                 VALUES (?1, ?2, ?3, ?4)",
                params![plan_id, c.seq, c.amount.to_string(), c.due_date.to_string()],
            )?;
        }
    }
    tx.commit()?;

    tracing::debug!(
        owner,
        transaction_id,
        kind = new.kind.as_str(),
        amount = %new.amount,
        installment = new.installments.is_some(),
        "transaction recorded"
    );
    Ok(transaction_id)
}

fn plan_for_transaction(
    conn: &Connection,
    transaction_id: i64,
) -> LedgerResult<Option<InstallmentPlan>> {
    let row = conn
        .query_row(
            "SELECT id, transaction_id, description, total_amount, installment_count, mode,
                    interest_per_month
             FROM installment_plans WHERE transaction_id = ?1",
            params![transaction_id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, Option<String>>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, u32>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, Option<String>>(6)?,
                ))
            },
        )
        .optional()?;
    let Some((id, transaction_id, description, total_s, count, mode_s, interest_s)) = row else {
        return Ok(None);
    };
    Ok(Some(InstallmentPlan {
        id,
        transaction_id,
        description,
        total_amount: crate::utils::stored_amount(&total_s)?,
        installment_count: count,
        mode: InstallmentMode::parse(&mode_s)
            .map_err(|_| LedgerError::Corrupt(format!("invalid stored mode '{}'", mode_s)))?,
        interest_per_month: interest_s
            .as_deref()
            .map(crate::utils::stored_amount)
            .transpose()?,
    }))
}

/// Loads one transaction, with its parceling summary when it has one.
pub fn get_transaction(conn: &Connection, owner: i64, id: i64) -> LedgerResult<Transaction> {
    let row = conn
        .query_row(
            "SELECT id, owner, kind, amount, category, description, date, payment_method,
                    recurring, tag, settled
             FROM transactions WHERE id = ?1 AND owner = ?2",
            params![id, owner],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, Option<String>>(5)?,
                    r.get::<_, String>(6)?,
                    r.get::<_, Option<String>>(7)?,
                    r.get::<_, bool>(8)?,
                    r.get::<_, Option<String>>(9)?,
                    r.get::<_, bool>(10)?,
                ))
            },
        )
        .optional()?;
    let Some((id, owner, kind_s, amount_s, category, description, date_s, method_s, recurring, tag, settled)) =
        row
    else {
        return Err(LedgerError::not_found("transaction", id));
    };

    let installment = match plan_for_transaction(conn, id)? {
        Some(plan) => {
            let first_due_date = plan_charges(conn, plan.id)?
                .first()
                .map(|c| c.due_date)
                .ok_or_else(|| {
                    LedgerError::Corrupt(format!("plan #{} has no charges", plan.id))
                })?;
            Some(InstallmentSummary {
                mode: plan.mode,
                count: plan.installment_count,
                total_amount: plan.total_amount,
                interest_per_month: plan.interest_per_month,
                first_due_date,
            })
        }
        None => None,
    };

    Ok(Transaction {
        id,
        owner,
        kind: TxKind::parse(&kind_s)
            .map_err(|_| LedgerError::Corrupt(format!("invalid stored kind '{}'", kind_s)))?,
        amount: crate::utils::stored_amount(&amount_s)?,
        category,
        description,
        date: NaiveDate::parse_from_str(&date_s, "%Y-%m-%d")
            .map_err(|_| LedgerError::Corrupt(format!("invalid stored date '{}'", date_s)))?,
        payment_method: method_s
            .as_deref()
            .map(|s| {
                PaymentMethod::parse(s).map_err(|_| {
                    LedgerError::Corrupt(format!("invalid stored payment method '{}'", s))
                })
            })
            .transpose()?,
        recurring,
        tag,
        settled,
        installment,
    })
}

/// Deletes an owner's transaction with explicit child-first cascade:
/// charges, plan, movement back-references, then the row itself, in one
/// atomic unit.
pub fn delete_transaction(conn: &mut Connection, owner: i64, id: i64) -> LedgerResult<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT id FROM transactions WHERE id = ?1 AND owner = ?2",
            params![id, owner],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(LedgerError::not_found("transaction", id));
    }

    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM installment_charges WHERE plan_id IN
             (SELECT id FROM installment_plans WHERE transaction_id = ?1)",
        params![id],
    )?;
    tx.execute(
        "DELETE FROM installment_plans WHERE transaction_id = ?1",
        params![id],
    )?;
    tx.execute(
        "UPDATE saving_movements SET transaction_id = NULL WHERE transaction_id = ?1",
        params![id],
    )?;
    tx.execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
    tx.commit()?;

    tracing::debug!(owner, transaction_id = id, "transaction deleted");
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner = resolve_owner(conn, sub)?;
    let kind = TxKind::parse(sub.get_one::<String>("kind").unwrap())?;
    let amount = parse_positive_amount(sub.get_one::<String>("amount").unwrap())?;
    let category = sub.get_one::<String>("category").unwrap().trim().to_string();
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let description = sub.get_one::<String>("description").map(|s| s.to_string());
    let payment_method = sub
        .get_one::<String>("method")
        .map(|s| PaymentMethod::parse(s))
        .transpose()?;
    let recurring = sub.get_flag("recurring");
    let tag = sub.get_one::<String>("tag").map(|s| s.to_string());

    let installments = match sub.get_one::<u32>("installments") {
        Some(&count) => {
            let mode = match sub.get_one::<String>("installment-mode") {
                Some(s) => InstallmentMode::parse(s)?,
                None => InstallmentMode::Total,
            };
            let first_due = sub
                .get_one::<String>("first-due")
                .map(|s| parse_date(s))
                .transpose()?;
            let interest_per_month = sub
                .get_one::<String>("interest")
                .map(|s| parse_decimal(s))
                .transpose()?
                .filter(|i| *i > Decimal::ZERO);
            Some(InstallmentRequest {
                count,
                mode,
                first_due,
                interest_per_month,
            })
        }
        None => None,
    };

    let new = NewTransaction {
        kind,
        amount,
        category,
        description,
        date,
        payment_method,
        recurring,
        tag,
        installments,
    };
    let id = create_transaction(conn, owner, &new)?;
    match &new.installments {
        Some(inst) => println!(
            "Recorded {} on {} in '{}' as {}x (tx #{})",
            new.amount, new.date, new.category, inst.count, id
        ),
        None => println!(
            "Recorded {} {} on {} in '{}' (tx #{})",
            new.kind.as_str(),
            new.amount,
            new.date,
            new.category,
            id
        ),
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner = resolve_owner(conn, sub)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let t = get_transaction(conn, owner, id)?;
    if sub.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&t)?);
        return Ok(());
    }
    let mut rows = vec![
        vec!["Kind".to_string(), t.kind.as_str().to_string()],
        vec!["Amount".into(), t.amount.to_string()],
        vec!["Category".into(), t.category.clone()],
        vec!["Date".into(), t.date.to_string()],
    ];
    if let Some(desc) = &t.description {
        rows.push(vec!["Description".into(), desc.clone()]);
    }
    if let Some(method) = t.payment_method {
        rows.push(vec!["Method".into(), method.as_str().to_string()]);
    }
    if t.settled {
        rows.push(vec!["Settled".into(), "yes".into()]);
    }
    if let Some(inst) = &t.installment {
        rows.push(vec![
            "Installments".into(),
            format!(
                "{}x of {} starting {}",
                inst.count,
                inst.total_amount,
                inst.first_due_date
            ),
        ]);
    }
    let header = format!("Transaction #{}", t.id);
    println!("{}", pretty_table(&[header.as_str(), ""], rows));
    Ok(())
}

fn rm(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner = resolve_owner(conn, sub)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    delete_transaction(conn, owner, id)?;
    println!("Deleted transaction #{}", id);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.kind.clone(),
                    r.category.clone(),
                    r.description.clone(),
                    r.amount.clone(),
                    r.method.clone(),
                    r.installments.clone(),
                    if r.settled { "yes".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Kind", "Category", "Description", "Amount", "Method", "Parcels", "Settled"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub kind: String,
    pub category: String,
    pub description: String,
    pub amount: String,
    pub method: String,
    pub installments: String,
    pub settled: bool,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let owner = resolve_owner(conn, sub)?;
    let mut sql = String::from(
        "SELECT t.id, t.date, t.kind, t.category, t.description, t.amount, t.payment_method,
                t.settled, p.installment_count
         FROM transactions t
         LEFT JOIN installment_plans p ON p.transaction_id = t.id
         WHERE t.owner = ?",
    );
    let mut params_vec: Vec<String> = vec![owner.to_string()];

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month.into());
    }
    if let Some(kind) = sub.get_one::<String>("kind") {
        sql.push_str(" AND t.kind=?");
        params_vec.push(kind.into());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND t.category=?");
        params_vec.push(cat.into());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let date: String = r.get(1)?;
        let kind: String = r.get(2)?;
        let category: String = r.get(3)?;
        let description: Option<String> = r.get(4)?;
        let amount: String = r.get(5)?;
        let method: Option<String> = r.get(6)?;
        let settled: bool = r.get(7)?;
        let installment_count: Option<u32> = r.get(8)?;
        data.push(TransactionRow {
            id,
            date,
            kind,
            category,
            description: description.unwrap_or_default(),
            amount,
            method: method.unwrap_or_default(),
            installments: installment_count
                .map(|c| format!("{}x", c))
                .unwrap_or_default(),
            settled,
        });
    }
    Ok(data)
}
