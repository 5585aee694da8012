// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::StudioError;
use crate::utils::{maybe_print_json, parse_amount, parse_month, pretty_table, stored_decimal};
use anyhow::Result;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("report", sub)) => report(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let cat = sub.get_one::<String>("category").unwrap().trim().to_string();
    if cat.is_empty() {
        return Err(StudioError::Validation("budget category is empty".into()).into());
    }
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    conn.execute(
        "INSERT INTO budgets(month, category, amount) VALUES (?1,?2,?3)
         ON CONFLICT(month, category) DO UPDATE SET amount=excluded.amount",
        params![month, cat, amount.to_string()],
    )?;
    println!("Budget set for {} / {} = {}", month, cat, amount);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub
        .get_one::<String>("month")
        .map(|m| parse_month(m))
        .transpose()?;
    let mut stmt = conn.prepare(
        "SELECT month, category, amount FROM budgets
         WHERE (?1 IS NULL OR month=?1) ORDER BY month DESC, category",
    )?;
    let rows = stmt.query_map(params![month], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (m, c, a) = row?;
        data.push(vec![m, c, a]);
    }
    println!("{}", pretty_table(&["Month", "Category", "Budget"], data));
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetLine {
    pub category: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
}

/// Planned vs actual spend per expense category for one month. Categories
/// with either a budget or spending show up; no rows gives an empty report.
pub fn budget_vs_actual(conn: &Connection, month: &str) -> Result<Vec<BudgetLine>> {
    let mut lines: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();

    let mut bstmt = conn.prepare("SELECT category, amount FROM budgets WHERE month=?1")?;
    let mut cur = bstmt.query(params![month])?;
    while let Some(r) = cur.next()? {
        let cat: String = r.get(0)?;
        let amt: String = r.get(1)?;
        let amt = stored_decimal(&amt, &format!("budget {} / {}", month, cat))?;
        lines.entry(cat).or_insert((Decimal::ZERO, Decimal::ZERO)).0 += amt;
    }

    let mut estmt =
        conn.prepare("SELECT id, category, amount FROM expenses WHERE substr(date,1,7)=?1")?;
    let mut cur = estmt.query(params![month])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let cat: String = r.get(1)?;
        let amt: String = r.get(2)?;
        let amt = stored_decimal(&amt, &format!("expense {}", id))?;
        lines.entry(cat).or_insert((Decimal::ZERO, Decimal::ZERO)).1 += amt;
    }

    Ok(lines
        .into_iter()
        .map(|(category, (budget, spent))| BudgetLine {
            category,
            budget,
            spent,
            remaining: budget - spent,
        })
        .collect())
}

fn report(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let data = budget_vs_actual(conn, &month)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|l| {
                vec![
                    l.category.clone(),
                    format!("{:.2}", l.budget),
                    format!("{:.2}", l.spent),
                    format!("{:.2}", l.remaining),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Budget", "Spent", "Remaining"], rows)
        );
    }
    Ok(())
}
