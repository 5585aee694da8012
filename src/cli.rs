// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Pretty JSON output"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("One JSON object per line"),
    )
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).required(true).help(help)
}

pub fn build_cli() -> Command {
    Command::new("studiobooks")
        .about("Projects, clients, income, expenses and payments for a photo/video studio")
        .version(clap::crate_version!())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Log more (-v info, -vv debug)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("client")
                .about("Manage clients")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Client name"))
                        .arg(opt("phone", "Phone number"))
                        .arg(opt("email", "Email address")),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(Command::new("rm").arg(req("name", "Client name"))),
        )
        .subcommand(
            Command::new("project")
                .about("Manage projects")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Project name"))
                        .arg(req("amount", "Quoted contract value"))
                        .arg(opt("outsourcing", "Cost paid to subcontractors (default 0)"))
                        .arg(opt("client", "Client name"))
                        .arg(opt("shoot-date", "Shoot date YYYY-MM-DD")),
                )
                .subcommand(json_args(
                    Command::new("list").arg(opt("status", "active|completed|cancelled")),
                ))
                .subcommand(json_args(
                    Command::new("show").arg(req("project", "Project id or code")),
                ))
                .subcommand(
                    Command::new("update")
                        .arg(req("project", "Project id or code"))
                        .arg(opt("name", "New name"))
                        .arg(opt("amount", "New contract value"))
                        .arg(opt("outsourcing", "New outsourcing cost"))
                        .arg(opt("client", "Client name, or 'none' to clear"))
                        .arg(opt("shoot-date", "Shoot date YYYY-MM-DD"))
                        .arg(opt("status", "active|completed|cancelled")),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(req("project", "Project id or code"))
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .action(ArgAction::SetTrue)
                                .help("Also delete incomes, expenses and payments"),
                        ),
                ),
        )
        .subcommand(
            Command::new("income")
                .about("Money received")
                .subcommand(
                    Command::new("add")
                        .arg(req("amount", "Amount received"))
                        .arg(req("date", "Date YYYY-MM-DD"))
                        .arg(opt("project", "Project id or code"))
                        .arg(opt("description", "What the money is for"))
                        .arg(opt("note", "Free-form note"))
                        .arg(opt("payment-type", "advance|partial|final (default partial)")),
                )
                .subcommand(json_args(
                    Command::new("list")
                        .arg(opt("project", "Project id or code"))
                        .arg(opt("month", "YYYY-MM")),
                ))
                .subcommand(
                    Command::new("update")
                        .arg(req("id", "Income id"))
                        .arg(opt("amount", "New amount"))
                        .arg(opt("date", "New date YYYY-MM-DD"))
                        .arg(opt("project", "Project id or code, or 'none'"))
                        .arg(opt("description", "New description"))
                        .arg(opt("note", "New note, or 'none' to clear")),
                )
                .subcommand(Command::new("rm").arg(req("id", "Income id"))),
        )
        .subcommand(
            Command::new("expense")
                .about("Money spent")
                .subcommand(
                    Command::new("add")
                        .arg(req("amount", "Amount spent"))
                        .arg(req("category", "Expense category"))
                        .arg(req("date", "Date YYYY-MM-DD"))
                        .arg(opt("project", "Project id or code"))
                        .arg(opt("description", "What was bought"))
                        .arg(opt("note", "Free-form note")),
                )
                .subcommand(json_args(
                    Command::new("list")
                        .arg(opt("project", "Project id or code"))
                        .arg(opt("month", "YYYY-MM"))
                        .arg(opt("category", "Expense category")),
                ))
                .subcommand(
                    Command::new("update")
                        .arg(req("id", "Expense id"))
                        .arg(opt("amount", "New amount"))
                        .arg(opt("category", "New category"))
                        .arg(opt("date", "New date YYYY-MM-DD"))
                        .arg(opt("project", "Project id or code, or 'none'"))
                        .arg(opt("description", "New description"))
                        .arg(opt("note", "New note, or 'none' to clear")),
                )
                .subcommand(Command::new("rm").arg(req("id", "Expense id"))),
        )
        .subcommand(
            Command::new("payment")
                .about("Project payment history")
                .subcommand(
                    Command::new("add")
                        .arg(req("project", "Project id or code"))
                        .arg(req("amount", "Amount paid"))
                        .arg(req("date", "Payment date YYYY-MM-DD"))
                        .arg(opt("type", "advance|partial|final (default partial)"))
                        .arg(opt(
                            "income",
                            "Link an existing income of this project (amount must match) instead of recording a new one",
                        ))
                        .arg(opt("note", "Free-form note")),
                )
                .subcommand(json_args(
                    Command::new("list").arg(opt("project", "Project id or code")),
                ))
                .subcommand(
                    Command::new("rm").arg(req("id", "Payment id")).arg(
                        Arg::new("with-income")
                            .long("with-income")
                            .action(ArgAction::SetTrue)
                            .help("Delete the linked income too (required for linked payments)"),
                    ),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly budgets per expense category")
                .subcommand(
                    Command::new("set")
                        .arg(req("month", "YYYY-MM"))
                        .arg(req("category", "Expense category"))
                        .arg(req("amount", "Planned spend")),
                )
                .subcommand(Command::new("list").arg(opt("month", "YYYY-MM")))
                .subcommand(json_args(
                    Command::new("report").arg(req("month", "YYYY-MM")),
                )),
        )
        .subcommand(
            Command::new("report")
                .about("Read-only summaries")
                .subcommand(json_args(Command::new("dashboard")))
                .subcommand(json_args(
                    Command::new("by-category").arg(opt("month", "YYYY-MM")),
                ))
                .subcommand(json_args(
                    Command::new("by-month").arg(
                        Arg::new("months")
                            .long("months")
                            .value_parser(value_parser!(usize))
                            .help("How many recent months (default 12)"),
                    ),
                ))
                .subcommand(json_args(Command::new("by-project"))),
        )
        .subcommand(
            Command::new("reconcile")
                .about("Check and repair derived project financials")
                .subcommand(json_args(
                    Command::new("run").about("Recompute every project and fix drift"),
                ))
                .subcommand(json_args(
                    Command::new("validate").about("Report problems without changing anything"),
                ))
                .subcommand(json_args(
                    Command::new("fix").about("Apply safe automatic corrections"),
                )),
        )
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand(Command::new("get").arg(req("key", "Setting name")))
                .subcommand(
                    Command::new("set")
                        .arg(req("key", "Setting name"))
                        .arg(req("value", "New value")),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("projects")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(req("out", "Output file")),
                ),
        )
}
