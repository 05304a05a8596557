// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn month_arg(required: bool) -> Arg {
    Arg::new("month")
        .long("month")
        .required(required)
        .help("Month as YYYY-MM")
}

fn direction_arg() -> Arg {
    Arg::new("type")
        .long("type")
        .required(true)
        .value_parser(["income", "expense"])
        .help("income or expense")
}

pub fn build_cli() -> Command {
    Command::new("moneyflow")
        .version(crate_version!())
        .about("Personal finance tracker with monthly balance carry-forward")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("balance")
                                .long("balance")
                                .allow_hyphen_values(true)
                                .default_value("0")
                                .help("Current balance"),
                        )
                        .arg(
                            Arg::new("position")
                                .long("position")
                                .value_parser(value_parser!(i64))
                                .help("Sort position (defaults to last)"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("set-balance")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("balance")
                                .long("balance")
                                .required(true)
                                .allow_hyphen_values(true),
                        ),
                )
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true))),
        )
        .subcommand(
            Command::new("tx")
                .about("One-time transactions and transfers")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("account").long("account").required(true))
                        .arg(Arg::new("date").long("date").required(true).help("YYYY-MM-DD"))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(direction_arg())
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(month_arg(false))
                        .arg(Arg::new("account").long("account"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["income", "expense"]),
                        )
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(
                    Command::new("transfer")
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true))
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("note").long("note")),
                ),
        )
        .subcommand(
            Command::new("recurring")
                .about("Monthly recurring transactions")
                .subcommand(
                    Command::new("add")
                        .arg(
                            Arg::new("account")
                                .long("account")
                                .help("Owning account; omit for obligations without one"),
                        )
                        .arg(
                            Arg::new("day")
                                .long("day")
                                .required(true)
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(direction_arg())
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(
                    Command::new("override")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(month_arg(true))
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(
                    Command::new("clear-override")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(month_arg(true)),
                ),
        )
        .subcommand(json_flags(
            Command::new("summary")
                .about("Monthly income, expense and projected balances")
                .arg(month_arg(true))
                .arg(
                    Arg::new("detail")
                        .long("detail")
                        .action(ArgAction::SetTrue)
                        .help("Show each account's running balance"),
                ),
        ))
        .subcommand(
            Command::new("balances")
                .about("Monthly opening-balance snapshots")
                .subcommand(json_flags(Command::new("record").arg(month_arg(true))))
                .subcommand(Command::new("invalidate").arg(month_arg(true)))
                .subcommand(json_flags(
                    Command::new("list").arg(Arg::new("account").long("account")),
                ))
                .subcommand(json_flags(
                    Command::new("opening")
                        .arg(Arg::new("account").long("account").required(true))
                        .arg(month_arg(true)),
                )),
        )
        .subcommand(
            Command::new("tax")
                .about("Resident tax installments")
                .subcommand(
                    Command::new("add")
                        .arg(
                            Arg::new("year")
                                .long("year")
                                .required(true)
                                .value_parser(value_parser!(i32)),
                        )
                        .arg(Arg::new("annual").long("annual").required(true))
                        .arg(Arg::new("account").long("account")),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("summary")
                        .arg(month_arg(true))
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check snapshot and transfer consistency"))
        .subcommand(
            Command::new("config")
                .about("Engine settings")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
}
