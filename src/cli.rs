// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

fn json_args(cmd: Command) -> Command {
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

fn kind_arg() -> Arg {
    Arg::new("kind")
        .long("kind")
        .value_parser(["income", "expense"])
        .help("income or expense")
}

fn id_arg() -> Arg {
    Arg::new("id").long("id").required(true)
}

fn entry_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("title").long("title").required(true))
        .arg(Arg::new("amount").long("amount").required(true).allow_hyphen_values(true))
        .arg(
            Arg::new("category")
                .long("category")
                .required(true)
                .help("Category name or id"),
        )
        .arg(kind_arg().default_value("expense"))
        .arg(Arg::new("notes").long("notes"))
}

pub fn build_cli() -> Command {
    Command::new("billclip")
        .about("Personal income/expense ledger with recurring subscriptions")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("BILLCLIP_DB")
                .help("Path to the SQLite database (defaults to the platform data dir)"),
        )
        .arg(
            Arg::new("no_sync")
                .long("no-sync")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Do not process due subscriptions before running the command"),
        )
        .subcommand(Command::new("init").about("Create the database and default categories"))
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(kind_arg().required(true))
                        .arg(Arg::new("icon").long("icon").default_value("")),
                )
                .subcommand(json_args(Command::new("list").arg(kind_arg())))
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(kind_arg()),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and browse transactions")
                .subcommand(entry_args(
                    Command::new("add").arg(Arg::new("date").long("date").help("YYYY-MM-DD, defaults to today")),
                ))
                .subcommand(json_args(
                    Command::new("list")
                        .arg(Arg::new("month").long("month").help("YYYY-MM"))
                        .arg(kind_arg())
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(Arg::new("title").long("title"))
                        .arg(Arg::new("amount").long("amount").allow_hyphen_values(true))
                        .arg(Arg::new("category").long("category"))
                        .arg(kind_arg())
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("notes").long("notes")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("template")
                .about("Saved transaction presets")
                .subcommand(entry_args(Command::new("add")))
                .subcommand(json_args(Command::new("list")))
                .subcommand(
                    Command::new("use")
                        .arg(id_arg())
                        .arg(Arg::new("date").long("date")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("sub")
                .about("Recurring subscriptions")
                .subcommand(entry_args(
                    Command::new("add")
                        .arg(
                            Arg::new("interval")
                                .long("interval")
                                .required(true)
                                .value_parser(["daily", "weekly", "monthly", "yearly"]),
                        )
                        .arg(
                            Arg::new("weekday")
                                .long("weekday")
                                .help("Weekly: first weekday (mon..sun)"),
                        )
                        .arg(
                            Arg::new("day")
                                .long("day")
                                .allow_hyphen_values(true)
                                .help("Monthly: day of month (1-31)"),
                        )
                        .arg(
                            Arg::new("month")
                                .long("month")
                                .help("Yearly: month (1-12 or jan..dec)"),
                        ),
                ))
                .subcommand(json_args(Command::new("list")))
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(
                    Command::new("sync")
                        .about("Materialize every due occurrence now")
                        .arg(
                            Arg::new("now")
                                .long("now")
                                .help("Process as of YYYY-MM-DD[THH:MM[:SS]] instead of the clock"),
                        ),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Totals and breakdowns")
                .subcommand(json_args(
                    Command::new("summary").arg(Arg::new("month").long("month")),
                ))
                .subcommand(json_args(
                    Command::new("by-category")
                        .arg(Arg::new("month").long("month"))
                        .arg(kind_arg().default_value("expense")),
                )),
        )
        .subcommand(
            Command::new("settings")
                .about("Show or change settings")
                .subcommand(json_args(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").long("key").required(true))
                        .arg(Arg::new("value").long("value").required(true)),
                ),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("transactions")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv or json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(
            Command::new("import").subcommand(
                Command::new("legacy")
                    .about("Migrate a JSON snapshot of the old key/value storage")
                    .arg(Arg::new("path").long("path").required(true)),
            ),
        )
        .subcommand(Command::new("doctor").about("Check subscriptions and references"))
}

/// Whether due subscriptions should be processed before dispatching.
/// `init` and `import` run on a fresh ledger, and `sub sync` does its own
/// pass, possibly at an explicit `--now`.
pub fn wants_startup_sync(matches: &ArgMatches) -> bool {
    if matches.get_flag("no_sync") {
        return false;
    }
    match matches.subcommand() {
        Some(("init", _)) | Some(("import", _)) => false,
        Some(("sub", sub)) => !matches!(sub.subcommand_name(), Some("sync")),
        _ => true,
    }
}
