// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use billfold::{cli, commands, db, utils};

fn main() -> Result<()> {
    utils::init_tracing();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    let result = run(&mut conn, &matches);
    if let Err(ref e) = result {
        tracing::error!(error = %e, "command failed");
    }
    result
}

fn run(conn: &mut Connection, matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("tx", sub)) => commands::transactions::handle(conn, sub)?,
        Some(("bill", sub)) => commands::billing::handle(conn, sub)?,
        Some(("installments", sub)) => commands::installments::handle(conn, sub)?,
        Some(("box", sub)) => commands::boxes::handle(conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(conn)?,
        Some(("config", sub)) => commands::config::handle(conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
