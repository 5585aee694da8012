// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::incomes::project_change;
use crate::error::StudioError;
use crate::finance;
use crate::models::Expense;
use crate::utils::{
    clearable, id_for_project, maybe_print_json, parse_amount, parse_date, parse_id, parse_month,
    pretty_table, stored_date, stored_decimal,
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
            println!("Removed expense {}", id);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub project_id: Option<i64>,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    pub description: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseChanges {
    pub project_id: Option<Option<i64>>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub note: Option<Option<String>>,
}

fn clean_category(raw: &str) -> Result<String> {
    let c = raw.trim();
    if c.is_empty() {
        return Err(StudioError::Validation("expense category is empty".into()).into());
    }
    Ok(c.to_string())
}

pub fn record(conn: &Connection, n: &NewExpense) -> Result<i64> {
    if let Some(pid) = n.project_id {
        finance::load_project(conn, pid)?;
    }
    let category = clean_category(&n.category)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO expenses(project_id, amount, category, date, description, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            n.project_id,
            n.amount.to_string(),
            category,
            n.date.to_string(),
            n.description,
            n.note
        ],
    )?;
    let id = tx.last_insert_rowid();
    finance::recompute_owner(&tx, n.project_id)?;
    tx.commit()?;
    tracing::info!(expense = id, project = ?n.project_id, amount = %n.amount, "expense recorded");
    Ok(id)
}

pub fn get(conn: &Connection, id: i64) -> Result<Expense> {
    let (project_id, amount, category, date, description, note) = conn
        .query_row(
            "SELECT project_id, amount, category, date, description, note FROM expenses WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, Option<i64>>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, Option<String>>(5)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| StudioError::not_found("Expense", id))?;
    let what = format!("expense {}", id);
    Ok(Expense {
        id,
        project_id,
        amount: stored_decimal(&amount, &what)?,
        category,
        date: stored_date(&date, &what)?,
        description,
        note,
    })
}

pub fn update(conn: &Connection, id: i64, c: &ExpenseChanges) -> Result<Expense> {
    let old = get(conn, id)?;
    let project_id = c.project_id.unwrap_or(old.project_id);
    if let Some(pid) = project_id {
        finance::load_project(conn, pid)?;
    }
    let category = match c.category {
        Some(ref raw) => clean_category(raw)?,
        None => old.category.clone(),
    };
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE expenses SET project_id=?1, amount=?2, category=?3, date=?4, description=?5, note=?6
         WHERE id=?7",
        params![
            project_id,
            c.amount.unwrap_or(old.amount).to_string(),
            category,
            c.date.unwrap_or(old.date).to_string(),
            c.description.clone().unwrap_or_else(|| old.description.clone()),
            c.note.clone().unwrap_or_else(|| old.note.clone()),
            id
        ],
    )?;
    finance::recompute_owner(&tx, old.project_id)?;
    if project_id != old.project_id {
        finance::recompute_owner(&tx, project_id)?;
    }
    tx.commit()?;
    tracing::info!(expense = id, project = ?project_id, "expense updated");
    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let old = get(conn, id)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM expenses WHERE id=?1", params![id])?;
    finance::recompute_owner(&tx, old.project_id)?;
    tx.commit()?;
    tracing::info!(expense = id, project = ?old.project_id, "expense deleted");
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let category = sub.get_one::<String>("category").unwrap().to_string();
    let project_id = sub
        .get_one::<String>("project")
        .map(|p| id_for_project(conn, p))
        .transpose()?;
    let id = record(
        conn,
        &NewExpense {
            project_id,
            amount,
            category: category.clone(),
            date,
            description: sub
                .get_one::<String>("description")
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            note: sub.get_one::<String>("note").map(|s| s.trim().to_string()),
        },
    )?;
    println!(
        "Recorded expense {} of {} on {} ({})",
        id,
        amount,
        date,
        category.trim()
    );
    Ok(())
}

fn update_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(sub.get_one::<String>("id").unwrap())?;
    let changes = ExpenseChanges {
        project_id: project_change(conn, sub.get_one::<String>("project"))?,
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_amount(s))
            .transpose()?,
        category: sub.get_one::<String>("category").cloned(),
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
        description: sub.get_one::<String>("description").map(|s| s.trim().to_string()),
        note: clearable(sub.get_one::<String>("note")),
    };
    let e = update(conn, id, &changes)?;
    println!("Updated expense {}: {} on {} ({})", e.id, e.amount, e.date, e.category);
    Ok(())
}

#[derive(Serialize)]
pub struct ExpenseRow {
    pub id: i64,
    pub date: String,
    pub project: String,
    pub category: String,
    pub amount: String,
    pub description: String,
}

pub fn query_rows(
    conn: &Connection,
    project_id: Option<i64>,
    month: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<ExpenseRow>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.date, p.code, e.category, e.amount, e.description
         FROM expenses e LEFT JOIN projects p ON e.project_id=p.id
         WHERE (?1 IS NULL OR e.project_id=?1)
           AND (?2 IS NULL OR substr(e.date,1,7)=?2)
           AND (?3 IS NULL OR e.category=?3)
         ORDER BY e.date DESC, e.id DESC",
    )?;
    let rows = stmt.query_map(params![project_id, month, category], |r| {
        Ok(ExpenseRow {
            id: r.get(0)?,
            date: r.get(1)?,
            project: r.get::<_, Option<String>>(2)?.unwrap_or_default(),
            category: r.get(3)?,
            amount: r.get(4)?,
            description: r.get(5)?,
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
    let category = sub.get_one::<String>("category").map(|s| s.trim().to_string());
    let data = query_rows(conn, project_id, month.as_deref(), category.as_deref())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.project.clone(),
                    r.category.clone(),
                    r.amount.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Project", "Category", "Amount", "Description"],
                rows
            )
        );
    }
    Ok(())
}
