// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::incomes::{self, NewIncome};
use crate::error::StudioError;
use crate::finance;
use crate::utils::{
    id_for_project, maybe_print_json, parse_amount, parse_date, parse_id, parse_payment_type,
    pretty_table,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            delete(conn, id, sub.get_flag("with-income"))?;
            println!("Removed payment {}", id);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub project_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub payment_type: String,
    pub income_id: Option<i64>,
    pub note: Option<String>,
}

/// Record a payment. Without `income_id` the matching income is recorded
/// too, so payment history and income never diverge.
pub fn record(conn: &Connection, n: &NewPayment) -> Result<i64> {
    let project = finance::load_project(conn, n.project_id)?;
    let Some(income_id) = n.income_id else {
        let income = incomes::record(
            conn,
            &NewIncome {
                project_id: Some(n.project_id),
                amount: n.amount,
                date: n.date,
                description: format!("{} payment for {}", n.payment_type, project.code),
                note: n.note.clone(),
                payment_type: n.payment_type.clone(),
            },
        )?;
        let id: i64 = conn.query_row(
            "SELECT id FROM project_payments WHERE income_id=?1",
            params![income],
            |r| r.get(0),
        )?;
        return Ok(id);
    };

    let income = incomes::get(conn, income_id)?;
    if income.project_id != Some(n.project_id) {
        return Err(StudioError::Validation(format!(
            "income {} does not belong to project {}",
            income_id, project.code
        ))
        .into());
    }
    if n.amount != income.amount {
        return Err(StudioError::Validation(format!(
            "payment amount {} does not match income {} amount {}",
            n.amount, income_id, income.amount
        ))
        .into());
    }
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM project_payments WHERE income_id=?1 LIMIT 1",
            params![income_id],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(pid) = existing {
        return Err(StudioError::Validation(format!(
            "income {} already has payment {}",
            income_id, pid
        ))
        .into());
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO project_payments(project_id, income_id, amount, payment_date, payment_type, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            n.project_id,
            income_id,
            n.amount.to_string(),
            n.date.to_string(),
            n.payment_type,
            n.note
        ],
    )?;
    let id = tx.last_insert_rowid();
    finance::recompute(&tx, n.project_id)?;
    tx.commit()?;
    tracing::info!(payment = id, project = %project.code, income = income_id, "payment linked");
    Ok(id)
}

/// Delete a payment. A payment linked to an income only goes together with
/// that income, so `with_income` is required for it.
pub fn delete(conn: &Connection, id: i64, with_income: bool) -> Result<()> {
    let (project_id, income_id): (i64, Option<i64>) = conn
        .query_row(
            "SELECT project_id, income_id FROM project_payments WHERE id=?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| StudioError::not_found("Payment", id))?;

    if let Some(income_id) = income_id {
        if !with_income {
            return Err(StudioError::Validation(format!(
                "payment {} is linked to income {}; remove it with --with-income",
                id, income_id
            ))
            .into());
        }
        // Removing the income also removes its payments and recomputes.
        return incomes::delete(conn, income_id);
    }
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM project_payments WHERE id=?1", params![id])?;
    finance::recompute(&tx, project_id)?;
    tx.commit()?;
    tracing::info!(payment = id, project_id, "payment deleted");
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let project_id = id_for_project(conn, sub.get_one::<String>("project").unwrap())?;
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let payment_type = match sub.get_one::<String>("type") {
        Some(t) => parse_payment_type(t)?,
        None => "partial".to_string(),
    };
    let income_id = sub
        .get_one::<String>("income")
        .map(|s| parse_id(s))
        .transpose()?;
    let id = record(
        conn,
        &NewPayment {
            project_id,
            amount,
            date,
            payment_type: payment_type.clone(),
            income_id,
            note: sub.get_one::<String>("note").map(|s| s.trim().to_string()),
        },
    )?;
    println!("Recorded {} payment {} of {} on {}", payment_type, id, amount, date);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let project_id = sub
        .get_one::<String>("project")
        .map(|p| id_for_project(conn, p))
        .transpose()?;
    let data = finance::payments_for(conn, project_id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.project_id.to_string(),
                    p.payment_date.to_string(),
                    format!("{:.2}", p.amount),
                    p.payment_type.clone(),
                    p.income_id.map(|i| i.to_string()).unwrap_or_default(),
                    p.note.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Project", "Date", "Amount", "Type", "Income", "Note"],
                rows
            )
        );
    }
    Ok(())
}
