// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::commands::transactions::{create_transaction, NewTransaction};
use billfold::models::{PaymentMethod, TxKind};
use billfold::{cli, commands::exporter};
use chrono::NaiveDate;
use rusqlite::Connection;
use tempfile::tempdir;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    billfold::db::init_schema(&mut conn).unwrap();
    create_transaction(
        &mut conn,
        1,
        &NewTransaction {
            kind: TxKind::Expense,
            amount: "12.34".parse().unwrap(),
            category: "Groceries".into(),
            description: Some("Weekly run".into()),
            date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            payment_method: Some(PaymentMethod::Debit),
            recurring: false,
            tag: None,
            installments: None,
        },
    )
    .unwrap();
    conn
}

fn run_export(conn: &Connection, format: &str, out: &str) {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "billfold",
        "export",
        "transactions",
        "--format",
        format,
        "--out",
        out,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(conn, export_m).unwrap();
    } else {
        panic!("export command not parsed");
    }
}

#[test]
fn export_transactions_csv() {
    let conn = setup();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    run_export(&conn, "csv", &out_path.to_string_lossy());

    let body = std::fs::read_to_string(&out_path).unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "date,kind,category,description,amount,method,recurring,settled"
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("2025-01-02,expense,Groceries,Weekly run,12.34,debit"));
    assert_eq!(lines.next(), None);
}

#[test]
fn export_transactions_json() {
    let conn = setup();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    run_export(&conn, "json", &out_path.to_string_lossy());

    let body = std::fs::read_to_string(&out_path).unwrap();
    let items: serde_json::Value = serde_json::from_str(&body).unwrap();
    let arr = items.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["kind"], "expense");
    assert_eq!(arr[0]["amount"], "12.34");
    assert_eq!(arr[0]["settled"], false);
}
