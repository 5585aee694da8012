// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::finance;
use crate::utils::{maybe_print_json, parse_month, pretty_table, stored_decimal};
use anyhow::Result;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("dashboard", sub)) => {
            let d = dashboard(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &d)? {
                let rows = vec![
                    vec!["Projects".into(), d.projects.to_string()],
                    vec!["Active projects".into(), d.active_projects.to_string()],
                    vec!["Contract value".into(), format!("{:.2}", d.contract_value)],
                    vec!["Received".into(), format!("{:.2}", d.received)],
                    vec!["Pending".into(), format!("{:.2}", d.pending)],
                    vec!["Outsourcing".into(), format!("{:.2}", d.outsourcing)],
                    vec!["Expenses".into(), format!("{:.2}", d.expenses)],
                    vec!["Project profit".into(), format!("{:.2}", d.profit)],
                    vec!["Unassigned income".into(), format!("{:.2}", d.unassigned_income)],
                    vec![
                        "Unassigned expenses".into(),
                        format!("{:.2}", d.unassigned_expenses),
                    ],
                ];
                println!("{}", pretty_table(&["Metric", "Value"], rows));
            }
        }
        Some(("by-category", sub)) => {
            let month = sub
                .get_one::<String>("month")
                .map(|m| parse_month(m))
                .transpose()?;
            let data = by_category(conn, month.as_deref())?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|c| vec![c.category.clone(), c.count.to_string(), format!("{:.2}", c.total)])
                    .collect();
                println!("{}", pretty_table(&["Category", "Entries", "Spent"], rows));
            }
        }
        Some(("by-month", sub)) => {
            let months: usize = *sub.get_one::<usize>("months").unwrap_or(&12);
            let data = by_month(conn, months)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|m| {
                        vec![
                            m.month.clone(),
                            format!("{:.2}", m.income),
                            format!("{:.2}", m.expense),
                            format!("{:.2}", m.net),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Month", "Income", "Expense", "Net"], rows));
            }
        }
        Some(("by-project", sub)) => {
            let data = by_project(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|p| {
                        vec![
                            p.code.clone(),
                            p.name.clone(),
                            format!("{:.2}", p.amount),
                            format!("{:.2}", p.received),
                            format!("{:.2}", p.pending),
                            format!("{:.2}", p.expenses),
                            format!("{:.2}", p.profit),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Code", "Name", "Amount", "Received", "Pending", "Expenses", "Profit"],
                        rows
                    )
                );
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Dashboard {
    pub projects: usize,
    pub active_projects: usize,
    pub contract_value: Decimal,
    pub received: Decimal,
    pub pending: Decimal,
    pub outsourcing: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    pub unassigned_income: Decimal,
    pub unassigned_expenses: Decimal,
}

pub fn dashboard(conn: &Connection) -> Result<Dashboard> {
    let mut d = Dashboard::default();
    for p in finance::all_projects(conn)? {
        d.projects += 1;
        if p.status == "active" {
            d.active_projects += 1;
        }
        d.contract_value += p.amount;
        d.received += p.received_amt;
        d.pending += p.pending_amt;
        d.outsourcing += p.outsourcing_amt;
        d.profit += p.profit;
    }
    for e in finance::expenses_for(conn, None)? {
        d.expenses += e.amount;
        if e.project_id.is_none() {
            d.unassigned_expenses += e.amount;
        }
    }
    for i in finance::incomes_for(conn, None)? {
        if i.project_id.is_none() {
            d.unassigned_income += i.amount;
        }
    }
    Ok(d)
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub count: usize,
    pub total: Decimal,
}

/// Expense totals per category, largest first.
pub fn by_category(conn: &Connection, month: Option<&str>) -> Result<Vec<CategoryTotal>> {
    let mut stmt = conn.prepare(
        "SELECT id, category, amount FROM expenses WHERE (?1 IS NULL OR substr(date,1,7)=?1)",
    )?;
    let mut cur = stmt.query(params![month])?;
    let mut agg: BTreeMap<String, (usize, Decimal)> = BTreeMap::new();
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let cat: String = r.get(1)?;
        let amt: String = r.get(2)?;
        let amt = stored_decimal(&amt, &format!("expense {}", id))?;
        let e = agg.entry(cat).or_insert((0, Decimal::ZERO));
        e.0 += 1;
        e.1 += amt;
    }
    let mut items: Vec<CategoryTotal> = agg
        .into_iter()
        .map(|(category, (count, total))| CategoryTotal {
            category,
            count,
            total,
        })
        .collect();
    items.sort_by(|a, b| b.total.cmp(&a.total));
    Ok(items)
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthTotal {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Income vs expense for the most recent `months` months with activity,
/// newest first.
pub fn by_month(conn: &Connection, months: usize) -> Result<Vec<MonthTotal>> {
    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for i in finance::incomes_for(conn, None)? {
        let m = i.date.format("%Y-%m").to_string();
        map.entry(m).or_insert((Decimal::ZERO, Decimal::ZERO)).0 += i.amount;
    }
    for e in finance::expenses_for(conn, None)? {
        let m = e.date.format("%Y-%m").to_string();
        map.entry(m).or_insert((Decimal::ZERO, Decimal::ZERO)).1 += e.amount;
    }
    Ok(map
        .into_iter()
        .rev()
        .take(months)
        .map(|(month, (income, expense))| MonthTotal {
            month,
            income,
            expense,
            net: income - expense,
        })
        .collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectTotal {
    pub code: String,
    pub name: String,
    pub amount: Decimal,
    pub received: Decimal,
    pub pending: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
}

/// Stored figures per project plus the expense total behind its profit.
pub fn by_project(conn: &Connection) -> Result<Vec<ProjectTotal>> {
    let mut spent: BTreeMap<i64, Decimal> = BTreeMap::new();
    for e in finance::expenses_for(conn, None)? {
        if let Some(pid) = e.project_id {
            *spent.entry(pid).or_insert(Decimal::ZERO) += e.amount;
        }
    }
    Ok(finance::all_projects(conn)?
        .into_iter()
        .map(|p| ProjectTotal {
            expenses: spent.get(&p.id).copied().unwrap_or(Decimal::ZERO),
            code: p.code,
            name: p.name,
            amount: p.amount,
            received: p.received_amt,
            pending: p.pending_amt,
            profit: p.profit,
        })
        .collect())
}
