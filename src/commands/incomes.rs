// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::StudioError;
use crate::finance;
use crate::models::Income;
use crate::utils::{
    clearable, id_for_project, maybe_print_json, parse_amount, parse_date, parse_id, parse_month,
    parse_payment_type, pretty_table,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("update", sub)) => update_cmd(conn, sub)?,
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            delete(conn, id)?;
            println!("Removed income {}", id);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewIncome {
    pub project_id: Option<i64>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    pub note: Option<String>,
    pub payment_type: String,
}

/// Changes to an income. `project_id: Some(None)` detaches it from its project.
#[derive(Debug, Clone, Default)]
pub struct IncomeChanges {
    pub project_id: Option<Option<i64>>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub note: Option<Option<String>>,
}

/// Record money received. An income tied to a project also gets a linked
/// payment record, and the project's financials are recomputed.
pub fn record(conn: &Connection, n: &NewIncome) -> Result<i64> {
    if let Some(pid) = n.project_id {
        finance::load_project(conn, pid)?;
    }
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO incomes(project_id, amount, date, description, note) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            n.project_id,
            n.amount.to_string(),
            n.date.to_string(),
            n.description,
            n.note
        ],
    )?;
    let id = tx.last_insert_rowid();
    if let Some(pid) = n.project_id {
        tx.execute(
            "INSERT INTO project_payments(project_id, income_id, amount, payment_date, payment_type, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                pid,
                id,
                n.amount.to_string(),
                n.date.to_string(),
                n.payment_type,
                n.note
            ],
        )?;
    }
    finance::recompute_owner(&tx, n.project_id)?;
    tx.commit()?;
    tracing::info!(income = id, project = ?n.project_id, amount = %n.amount, "income recorded");
    Ok(id)
}

pub fn get(conn: &Connection, id: i64) -> Result<Income> {
    let row = conn
        .query_row(
            "SELECT project_id, amount, date, description, note FROM incomes WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, Option<i64>>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, Option<String>>(4)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| StudioError::not_found("Income", id))?;
    let (project_id, amount, date, description, note) = row;
    let what = format!("income {}", id);
    Ok(Income {
        id,
        project_id,
        amount: crate::utils::stored_decimal(&amount, &what)?,
        date: crate::utils::stored_date(&date, &what)?,
        description,
        note,
    })
}

/// Apply changes, keep the linked payment in step, and recompute both the
/// previous and the new owning project.
pub fn update(conn: &Connection, id: i64, c: &IncomeChanges) -> Result<Income> {
    let old = get(conn, id)?;
    let project_id = c.project_id.unwrap_or(old.project_id);
    if let Some(pid) = project_id {
        finance::load_project(conn, pid)?;
    }
    let amount = c.amount.unwrap_or(old.amount);
    let date = c.date.unwrap_or(old.date);
    let description = c.description.clone().unwrap_or_else(|| old.description.clone());
    let note = c.note.clone().unwrap_or_else(|| old.note.clone());

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE incomes SET project_id=?1, amount=?2, date=?3, description=?4, note=?5 WHERE id=?6",
        params![
            project_id,
            amount.to_string(),
            date.to_string(),
            description,
            note,
            id
        ],
    )?;
    match project_id {
        Some(pid) => {
            // Only the first linked payment follows the income; duplicates stay
            // as they are for the consistency audit to report.
            let linked = tx.execute(
                "UPDATE project_payments SET project_id=?1, amount=?2, payment_date=?3
                 WHERE id=(SELECT MIN(id) FROM project_payments WHERE income_id=?4)",
                params![pid, amount.to_string(), date.to_string(), id],
            )?;
            if linked == 0 {
                tx.execute(
                    "INSERT INTO project_payments(project_id, income_id, amount, payment_date, payment_type)
                     VALUES (?1, ?2, ?3, ?4, 'partial')",
                    params![pid, id, amount.to_string(), date.to_string()],
                )?;
            }
        }
        None => {
            tx.execute(
                "DELETE FROM project_payments WHERE income_id=?1",
                params![id],
            )?;
        }
    }
    finance::recompute_owner(&tx, old.project_id)?;
    if project_id != old.project_id {
        finance::recompute_owner(&tx, project_id)?;
    }
    tx.commit()?;
    tracing::info!(income = id, project = ?project_id, amount = %amount, "income updated");
    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let old = get(conn, id)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM project_payments WHERE income_id=?1",
        params![id],
    )?;
    tx.execute("DELETE FROM incomes WHERE id=?1", params![id])?;
    finance::recompute_owner(&tx, old.project_id)?;
    tx.commit()?;
    tracing::info!(income = id, project = ?old.project_id, "income deleted");
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let project_id = sub
        .get_one::<String>("project")
        .map(|p| id_for_project(conn, p))
        .transpose()?;
    let payment_type = match sub.get_one::<String>("payment-type") {
        Some(t) => parse_payment_type(t)?,
        None => "partial".to_string(),
    };
    let id = record(
        conn,
        &NewIncome {
            project_id,
            amount,
            date,
            description: sub
                .get_one::<String>("description")
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            note: sub.get_one::<String>("note").map(|s| s.trim().to_string()),
            payment_type,
        },
    )?;
    println!("Recorded income {} of {} on {}", id, amount, date);
    Ok(())
}

/// `--project none` detaches; anything else is resolved as a project.
pub fn project_change(conn: &Connection, raw: Option<&String>) -> Result<Option<Option<i64>>> {
    match raw.map(|s| s.trim()) {
        None => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("none") => Ok(Some(None)),
        Some(s) => Ok(Some(Some(id_for_project(conn, s)?))),
    }
}

fn update_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(sub.get_one::<String>("id").unwrap())?;
    let changes = IncomeChanges {
        project_id: project_change(conn, sub.get_one::<String>("project"))?,
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_amount(s))
            .transpose()?,
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
        description: sub.get_one::<String>("description").map(|s| s.trim().to_string()),
        note: clearable(sub.get_one::<String>("note")),
    };
    let i = update(conn, id, &changes)?;
    println!("Updated income {}: {} on {}", i.id, i.amount, i.date);
    Ok(())
}

#[derive(Serialize)]
pub struct IncomeRow {
    pub id: i64,
    pub date: String,
    pub project: String,
    pub amount: String,
    pub description: String,
}

pub fn query_rows(
    conn: &Connection,
    project_id: Option<i64>,
    month: Option<&str>,
) -> Result<Vec<IncomeRow>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.date, p.code, i.amount, i.description
         FROM incomes i LEFT JOIN projects p ON i.project_id=p.id
         WHERE (?1 IS NULL OR i.project_id=?1)
           AND (?2 IS NULL OR substr(i.date,1,7)=?2)
         ORDER BY i.date DESC, i.id DESC",
    )?;
    let rows = stmt.query_map(params![project_id, month], |r| {
        Ok(IncomeRow {
            id: r.get(0)?,
            date: r.get(1)?,
            project: r.get::<_, Option<String>>(2)?.unwrap_or_default(),
            amount: r.get(3)?,
            description: r.get(4)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let project_id = sub
        .get_one::<String>("project")
        .map(|p| id_for_project(conn, p))
        .transpose()?;
    let month = sub
        .get_one::<String>("month")
        .map(|m| parse_month(m))
        .transpose()?;
    let data = query_rows(conn, project_id, month.as_deref())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.project.clone(),
                    r.amount.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", "Project", "Amount", "Description"], rows)
        );
    }
    Ok(())
}
