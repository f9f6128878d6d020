// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::utils::{get_default_owner, pretty_table, set_default_owner};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let owner = get_default_owner(conn)?;
            println!(
                "{}",
                pretty_table(
                    &["Setting", "Value"],
                    vec![vec!["default_owner".into(), owner.to_string()]],
                )
            );
        }
        Some(("set-default-owner", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            set_default_owner(conn, id)?;
            println!("Default owner set to {}", id);
        }
        _ => {}
    }
    Ok(())
}
