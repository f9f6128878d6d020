// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, value_parser, Arg, ArgAction, Command};

fn with_json(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print one JSON object per line"),
    )
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record, list, and delete ledger transactions")
        .subcommand(
            Command::new("add")
                .about("Record a transaction; credit expenses can be parceled")
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .required(true)
                        .help("income or expense"),
                )
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("category").long("category").required(true))
                .arg(
                    Arg::new("date")
                        .long("date")
                        .required(true)
                        .help("YYYY-MM-DD"),
                )
                .arg(Arg::new("description").long("description"))
                .arg(
                    Arg::new("method")
                        .long("method")
                        .help("credit or debit"),
                )
                .arg(
                    Arg::new("recurring")
                        .long("recurring")
                        .action(ArgAction::SetTrue),
                )
                .arg(Arg::new("tag").long("tag").help("Visual tag or logo name"))
                .arg(
                    Arg::new("installments")
                        .long("installments")
                        .value_parser(value_parser!(u32))
                        .help("Parcel a credit purchase into N monthly charges"),
                )
                .arg(
                    Arg::new("installment-mode")
                        .long("installment-mode")
                        .help("'total' (amount is the whole price) or 'per_installment'"),
                )
                .arg(
                    Arg::new("first-due")
                        .long("first-due")
                        .help("First charge due date; defaults to the purchase date"),
                )
                .arg(
                    Arg::new("interest")
                        .long("interest")
                        .help("Informational monthly interest percentage"),
                ),
        )
        .subcommand(with_json(
            Command::new("list")
                .about("List transactions, newest first")
                .arg(Arg::new("month").long("month").help("YYYY-MM"))
                .arg(Arg::new("kind").long("kind"))
                .arg(Arg::new("category").long("category"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                ),
        ))
        .subcommand(
            Command::new("show")
                .about("One transaction with its parceling summary")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print pretty JSON"),
                ),
        )
        .subcommand(
            Command::new("rm").about("Delete a transaction and its plan").arg(
                Arg::new("id")
                    .long("id")
                    .required(true)
                    .value_parser(value_parser!(i64)),
            ),
        )
}

fn bill_cmd() -> Command {
    let year = Arg::new("year")
        .long("year")
        .required(true)
        .value_parser(value_parser!(i32));
    let month = Arg::new("month")
        .long("month")
        .required(true)
        .value_parser(value_parser!(u32));
    Command::new("bill")
        .about("Credit-card bill: preview and settle a month")
        .subcommand(with_json(
            Command::new("show")
                .about("Compute a month's outstanding bill")
                .arg(year.clone())
                .arg(month.clone()),
        ))
        .subcommand(
            Command::new("pay")
                .about("Settle a month's bill")
                .arg(year)
                .arg(month)
                .arg(
                    Arg::new("date")
                        .long("date")
                        .help("Payment date; defaults to today"),
                ),
        )
}

fn installments_cmd() -> Command {
    Command::new("installments")
        .about("Scheduled installment charges")
        .subcommand(with_json(
            Command::new("future").about("Unpaid charges due after today, by month"),
        ))
}

fn box_cmd() -> Command {
    let id = Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64));
    Command::new("box")
        .about("Saving boxes: named sub-accounts with their own balance")
        .subcommand(
            Command::new("add")
                .about("Create a saving box")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("description").long("description"))
                .arg(Arg::new("target").long("target").help("Target amount")),
        )
        .subcommand(with_json(
            Command::new("list")
                .about("List boxes with derived balances")
                .arg(Arg::new("all").long("all").action(ArgAction::SetTrue).help(
                    "Include archived boxes",
                )),
        ))
        .subcommand(
            Command::new("show")
                .about("Box details and movement history")
                .arg(id.clone())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print pretty JSON"),
                ),
        )
        .subcommand(Command::new("archive").about("Archive a box").arg(id.clone()))
        .subcommand(
            Command::new("rm")
                .about("Delete a box and its movements")
                .arg(id.clone()),
        )
        .subcommand(
            Command::new("deposit")
                .about("Move money into a box")
                .arg(id.clone())
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("date").long("date").help("Defaults to today"))
                .arg(Arg::new("description").long("description")),
        )
        .subcommand(
            Command::new("withdraw")
                .about("Move money out of a box")
                .arg(id)
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("date").long("date").help("Defaults to today"))
                .arg(Arg::new("description").long("description")),
        )
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Month summary and cashflow")
        .subcommand(with_json(
            Command::new("summary")
                .about("Income, expenses, open bill, and balance for a month")
                .arg(
                    Arg::new("year")
                        .long("year")
                        .required(true)
                        .value_parser(value_parser!(i32)),
                )
                .arg(
                    Arg::new("month")
                        .long("month")
                        .required(true)
                        .value_parser(value_parser!(u32)),
                ),
        ))
        .subcommand(with_json(
            Command::new("cashflow")
                .about("Income/expense per month, most recent first")
                .arg(
                    Arg::new("months")
                        .long("months")
                        .value_parser(value_parser!(usize)),
                ),
        ))
}

fn export_cmd() -> Command {
    Command::new("export").about("Export the ledger").subcommand(
        Command::new("transactions")
            .about("Export transactions to CSV or JSON")
            .arg(
                Arg::new("format")
                    .long("format")
                    .default_value("csv")
                    .help("csv or json"),
            )
            .arg(Arg::new("out").long("out").required(true))
            .arg(Arg::new("month").long("month").help("YYYY-MM")),
    )
}

fn config_cmd() -> Command {
    Command::new("config")
        .about("Settings stored in the database")
        .subcommand(Command::new("show").about("Print current settings"))
        .subcommand(
            Command::new("set-default-owner")
                .about("Owner used when --user is not given")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                ),
        )
}

pub fn build_cli() -> Command {
    Command::new("billfold")
        .version(crate_version!())
        .about("Personal finance ledger: installment purchases, credit-card billing, saving boxes")
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .help("Owner id; defaults to the default_owner setting"),
        )
        .subcommand(Command::new("init").about("Create the database and print its path"))
        .subcommand(tx_cmd())
        .subcommand(bill_cmd())
        .subcommand(installments_cmd())
        .subcommand(box_cmd())
        .subcommand(report_cmd())
        .subcommand(export_cmd())
        .subcommand(Command::new("doctor").about("Check stored ledger invariants"))
        .subcommand(config_cmd())
}
