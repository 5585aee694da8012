// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config;
use crate::error::StudioError;
use crate::finance::{self, ProjectLedger};
use crate::models::{Project, PROJECT_STATUSES};
use crate::utils::{
    clearable, fmt_money, id_for_client, id_for_project, maybe_print_json, parse_amount, parse_date,
    pretty_table,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("update", sub)) => update_cmd(conn, sub)?,
        Some(("rm", sub)) => {
            let id = id_for_project(conn, sub.get_one::<String>("project").unwrap())?;
            let out = delete(conn, id, sub.get_flag("force"))?;
            println!(
                "Removed project {} ({} income, {} expense, {} payment record(s))",
                out.code, out.incomes, out.expenses, out.payments
            );
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub amount: Decimal,
    pub outsourcing_amt: Decimal,
    pub client_id: Option<i64>,
    pub shoot_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub outsourcing_amt: Option<Decimal>,
    /// `Some(None)` unlinks the client.
    pub client_id: Option<Option<i64>>,
    pub shoot_date: Option<NaiveDate>,
    pub status: Option<String>,
}

/// Insert a project, derive its code from the new id and seed its financials.
pub fn create(conn: &Connection, p: &NewProject) -> Result<Project> {
    let name = p.name.trim();
    if name.is_empty() {
        return Err(StudioError::Validation("project name is empty".into()).into());
    }
    let prefix = config::code_prefix(conn)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO projects(name, client_id, shoot_date, amount, outsourcing_amt)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            name,
            p.client_id,
            p.shoot_date.map(|d| d.to_string()),
            p.amount.to_string(),
            p.outsourcing_amt.to_string()
        ],
    )?;
    let id = tx.last_insert_rowid();
    let code = format!("{}-{:04}", prefix, id);
    tx.execute(
        "UPDATE projects SET code=?1 WHERE id=?2",
        params![code, id],
    )?;
    finance::recompute(&tx, id)?;
    tx.commit()?;
    tracing::info!(project = %code, amount = %p.amount, "project created");
    finance::load_project(conn, id)
}

pub fn update(conn: &Connection, project_id: i64, c: &ProjectChanges) -> Result<Project> {
    finance::load_project(conn, project_id)?;
    if let Some(ref s) = c.status {
        if !PROJECT_STATUSES.contains(&s.as_str()) {
            return Err(StudioError::Validation(format!(
                "Invalid status '{}', expected one of {}",
                s,
                PROJECT_STATUSES.join("|")
            ))
            .into());
        }
    }
    let tx = conn.unchecked_transaction()?;
    if let Some(ref name) = c.name {
        tx.execute(
            "UPDATE projects SET name=?1 WHERE id=?2",
            params![name.trim(), project_id],
        )?;
    }
    if let Some(amount) = c.amount {
        tx.execute(
            "UPDATE projects SET amount=?1 WHERE id=?2",
            params![amount.to_string(), project_id],
        )?;
    }
    if let Some(outs) = c.outsourcing_amt {
        tx.execute(
            "UPDATE projects SET outsourcing_amt=?1 WHERE id=?2",
            params![outs.to_string(), project_id],
        )?;
    }
    if let Some(client_id) = c.client_id {
        tx.execute(
            "UPDATE projects SET client_id=?1 WHERE id=?2",
            params![client_id, project_id],
        )?;
    }
    if let Some(d) = c.shoot_date {
        tx.execute(
            "UPDATE projects SET shoot_date=?1 WHERE id=?2",
            params![d.to_string(), project_id],
        )?;
    }
    if let Some(ref s) = c.status {
        tx.execute(
            "UPDATE projects SET status=?1 WHERE id=?2",
            params![s, project_id],
        )?;
    }
    finance::recompute(&tx, project_id)?;
    tx.commit()?;
    finance::load_project(conn, project_id)
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub code: String,
    pub incomes: i64,
    pub expenses: i64,
    pub payments: i64,
}

/// Delete a project. With financial history present this needs `force` and
/// the `allow_force_delete` setting, and then cascades to the history.
pub fn delete(conn: &Connection, project_id: i64, force: bool) -> Result<DeleteOutcome> {
    let project = finance::load_project(conn, project_id)?;
    let count = |table: &str| -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE project_id=?1", table);
        Ok(conn.query_row(&sql, params![project_id], |r| r.get(0))?)
    };
    let incomes = count("incomes")?;
    let expenses = count("expenses")?;
    let payments = count("project_payments")?;

    if incomes > 0 || expenses > 0 {
        if !force {
            return Err(StudioError::DeleteBlocked {
                code: project.code,
                incomes,
                expenses,
            }
            .into());
        }
        if !config::allow_force_delete(conn)? {
            return Err(StudioError::ForceDeleteDisabled.into());
        }
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM project_payments WHERE project_id=?1",
        params![project_id],
    )?;
    tx.execute("DELETE FROM incomes WHERE project_id=?1", params![project_id])?;
    tx.execute("DELETE FROM expenses WHERE project_id=?1", params![project_id])?;
    tx.execute("DELETE FROM projects WHERE id=?1", params![project_id])?;
    tx.commit()?;
    tracing::warn!(project = %project.code, incomes, expenses, payments, force, "project deleted");
    Ok(DeleteOutcome {
        code: project.code,
        incomes,
        expenses,
        payments,
    })
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().to_string();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let outsourcing_amt = match sub.get_one::<String>("outsourcing") {
        Some(raw) => parse_amount(raw)?,
        None => Decimal::ZERO,
    };
    let client_id = match sub.get_one::<String>("client") {
        Some(c) => Some(id_for_client(conn, c)?),
        None => None,
    };
    let shoot_date = sub
        .get_one::<String>("shoot-date")
        .map(|s| parse_date(s))
        .transpose()?;
    let p = create(
        conn,
        &NewProject {
            name,
            amount,
            outsourcing_amt,
            client_id,
            shoot_date,
        },
    )?;
    println!(
        "Created project {} '{}' for {}",
        p.code,
        p.name,
        fmt_money(&p.amount, &config::currency(conn)?)
    );
    Ok(())
}

fn update_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_for_project(conn, sub.get_one::<String>("project").unwrap())?;
    let changes = ProjectChanges {
        name: sub.get_one::<String>("name").map(|s| s.to_string()),
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_amount(s))
            .transpose()?,
        outsourcing_amt: sub
            .get_one::<String>("outsourcing")
            .map(|s| parse_amount(s))
            .transpose()?,
        client_id: match clearable(sub.get_one::<String>("client")) {
            Some(Some(name)) => Some(Some(id_for_client(conn, &name)?)),
            Some(None) => Some(None),
            None => None,
        },
        shoot_date: sub
            .get_one::<String>("shoot-date")
            .map(|s| parse_date(s))
            .transpose()?,
        status: sub
            .get_one::<String>("status")
            .map(|s| s.trim().to_lowercase()),
    };
    let p = update(conn, id, &changes)?;
    println!(
        "Updated {}: received {}, pending {}, profit {}",
        p.code, p.received_amt, p.pending_amt, p.profit
    );
    Ok(())
}

#[derive(Serialize)]
pub struct ProjectRow {
    pub code: String,
    pub name: String,
    pub client: String,
    pub status: String,
    pub amount: Decimal,
    pub outsourcing_amt: Decimal,
    pub received_amt: Decimal,
    pub pending_amt: Decimal,
    pub profit: Decimal,
}

pub fn query_rows(conn: &Connection, status: Option<&str>) -> Result<Vec<ProjectRow>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, c.name FROM projects p LEFT JOIN clients c ON p.client_id=c.id
         WHERE (?1 IS NULL OR p.status=?1) ORDER BY p.id",
    )?;
    let rows = stmt.query_map(params![status], |r| {
        Ok((r.get::<_, i64>(0)?, r.get::<_, Option<String>>(1)?))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (id, client) = row?;
        let p = finance::load_project(conn, id)?;
        data.push(ProjectRow {
            code: p.code,
            name: p.name,
            client: client.unwrap_or_default(),
            status: p.status,
            amount: p.amount,
            outsourcing_amt: p.outsourcing_amt,
            received_amt: p.received_amt,
            pending_amt: p.pending_amt,
            profit: p.profit,
        });
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let status = sub.get_one::<String>("status").map(|s| s.trim().to_lowercase());
    let data = query_rows(conn, status.as_deref())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.code.clone(),
                    r.name.clone(),
                    r.client.clone(),
                    r.status.clone(),
                    format!("{:.2}", r.amount),
                    format!("{:.2}", r.received_amt),
                    format!("{:.2}", r.pending_amt),
                    format!("{:.2}", r.profit),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Code", "Name", "Client", "Status", "Amount", "Received", "Pending", "Profit"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct ProjectDetail<'a> {
    project: &'a Project,
    incomes: &'a [crate::models::Income],
    expenses: &'a [crate::models::Expense],
    payments: &'a [crate::models::ProjectPayment],
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_for_project(conn, sub.get_one::<String>("project").unwrap())?;
    let l = ProjectLedger::load(conn, id)?;
    let detail = ProjectDetail {
        project: &l.project,
        incomes: &l.incomes,
        expenses: &l.expenses,
        payments: &l.payments,
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &detail)? {
        return Ok(());
    }
    let ccy = config::currency(conn)?;
    let p = &l.project;
    println!(
        "{}",
        pretty_table(
            &["Field", "Value"],
            vec![
                vec!["Code".into(), p.code.clone()],
                vec!["Name".into(), p.name.clone()],
                vec!["Status".into(), p.status.clone()],
                vec![
                    "Shoot date".into(),
                    p.shoot_date.map(|d| d.to_string()).unwrap_or_default()
                ],
                vec!["Amount".into(), fmt_money(&p.amount, &ccy)],
                vec!["Outsourcing".into(), fmt_money(&p.outsourcing_amt, &ccy)],
                vec!["Received".into(), fmt_money(&p.received_amt, &ccy)],
                vec!["Pending".into(), fmt_money(&p.pending_amt, &ccy)],
                vec!["Profit".into(), fmt_money(&p.profit, &ccy)],
            ],
        )
    );
    let incomes = l
        .incomes
        .iter()
        .map(|i| {
            vec![
                i.id.to_string(),
                i.date.to_string(),
                format!("{:.2}", i.amount),
                i.description.clone(),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Income", "Date", "Amount", "Description"], incomes));
    let expenses = l
        .expenses
        .iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.date.to_string(),
                format!("{:.2}", e.amount),
                e.category.clone(),
                e.description.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Expense", "Date", "Amount", "Category", "Description"], expenses)
    );
    let payments = l
        .payments
        .iter()
        .map(|pm| {
            vec![
                pm.id.to_string(),
                pm.payment_date.to_string(),
                format!("{:.2}", pm.amount),
                pm.payment_type.clone(),
                pm.income_id.map(|i| i.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Payment", "Date", "Amount", "Type", "Income"], payments)
    );
    Ok(())
}
