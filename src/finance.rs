// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived project financials.
//!
//! `received_amt`, `pending_amt` and `profit` are stored on the project row
//! for cheap reads but are fully determined by the project's incomes and
//! expenses. [`derive_financials`] is the only place the formulas live; both
//! the per-mutation [`recompute`] and the reconciliation sweep call it.

use crate::error::StudioError;
use crate::models::{Expense, Income, Project, ProjectPayment};
use crate::utils::{stored_date, stored_decimal};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Financials {
    pub received_amt: Decimal,
    pub pending_amt: Decimal,
    pub profit: Decimal,
}

/// received = Σ incomes; pending = amount − received;
/// profit = received − (outsourcing + Σ expenses).
pub fn derive_financials(
    amount: Decimal,
    outsourcing_amt: Decimal,
    incomes: &[Income],
    expenses: &[Expense],
) -> Financials {
    let received_amt: Decimal = incomes.iter().map(|i| i.amount).sum();
    let spent: Decimal = expenses.iter().map(|e| e.amount).sum();
    Financials {
        received_amt,
        pending_amt: amount - received_amt,
        profit: received_amt - (outsourcing_amt + spent),
    }
}

/// A project together with every child row that feeds its derived fields.
#[derive(Debug, Clone)]
pub struct ProjectLedger {
    pub project: Project,
    pub incomes: Vec<Income>,
    pub expenses: Vec<Expense>,
    pub payments: Vec<ProjectPayment>,
}

impl ProjectLedger {
    pub fn load(conn: &Connection, project_id: i64) -> Result<Self> {
        let project = load_project(conn, project_id)?;
        Ok(Self {
            incomes: incomes_for(conn, Some(project_id))?,
            expenses: expenses_for(conn, Some(project_id))?,
            payments: payments_for(conn, Some(project_id))?,
            project,
        })
    }

    pub fn stored(&self) -> Financials {
        Financials {
            received_amt: self.project.received_amt,
            pending_amt: self.project.pending_amt,
            profit: self.project.profit,
        }
    }

    pub fn expected(&self) -> Financials {
        derive_financials(
            self.project.amount,
            self.project.outsourcing_amt,
            &self.incomes,
            &self.expenses,
        )
    }

    pub fn payments_total(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Most recently dated income; ties go to the later row.
    pub fn latest_income(&self) -> Option<&Income> {
        self.incomes.iter().max_by_key(|i| (i.date, i.id))
    }
}

/// Recompute and persist a project's derived fields from its child rows.
pub fn recompute(conn: &Connection, project_id: i64) -> Result<Financials> {
    let ledger = ProjectLedger::load(conn, project_id)?;
    let f = ledger.expected();
    write_financials(conn, project_id, &f)?;
    tracing::debug!(
        project = %ledger.project.code,
        received = %f.received_amt,
        pending = %f.pending_amt,
        profit = %f.profit,
        "recomputed project financials"
    );
    Ok(f)
}

/// Recompute an optional owner; child rows without a project are a no-op.
pub fn recompute_owner(conn: &Connection, project_id: Option<i64>) -> Result<()> {
    if let Some(pid) = project_id {
        recompute(conn, pid)?;
    }
    Ok(())
}

pub fn write_financials(conn: &Connection, project_id: i64, f: &Financials) -> Result<()> {
    let n = conn.execute(
        "UPDATE projects SET received_amt=?1, pending_amt=?2, profit=?3 WHERE id=?4",
        params![
            f.received_amt.to_string(),
            f.pending_amt.to_string(),
            f.profit.to_string(),
            project_id
        ],
    )?;
    if n == 0 {
        return Err(StudioError::not_found("Project", project_id).into());
    }
    Ok(())
}

const PROJECT_COLUMNS: &str = "id, code, name, client_id, shoot_date, status, amount, outsourcing_amt, received_amt, pending_amt, profit";

type RawProject = (
    i64,
    Option<String>,
    String,
    Option<i64>,
    Option<String>,
    String,
    String,
    String,
    String,
    String,
    String,
);

fn raw_project(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawProject> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
        r.get(8)?,
        r.get(9)?,
        r.get(10)?,
    ))
}

fn project_from_raw(raw: RawProject) -> Result<Project> {
    let (id, code, name, client_id, shoot, status, amount, outs, recv, pend, profit) = raw;
    let what = format!("project {}", id);
    Ok(Project {
        id,
        code: code.unwrap_or_default(),
        name,
        client_id,
        shoot_date: shoot.map(|s| stored_date(&s, &what)).transpose()?,
        status,
        amount: stored_decimal(&amount, &what)?,
        outsourcing_amt: stored_decimal(&outs, &what)?,
        received_amt: stored_decimal(&recv, &what)?,
        pending_amt: stored_decimal(&pend, &what)?,
        profit: stored_decimal(&profit, &what)?,
    })
}

pub fn load_project(conn: &Connection, project_id: i64) -> Result<Project> {
    let sql = format!("SELECT {} FROM projects WHERE id=?1", PROJECT_COLUMNS);
    let raw = conn
        .query_row(&sql, params![project_id], raw_project)
        .optional()?
        .ok_or_else(|| StudioError::not_found("Project", project_id))?;
    project_from_raw(raw)
}

pub fn all_projects(conn: &Connection) -> Result<Vec<Project>> {
    let sql = format!("SELECT {} FROM projects ORDER BY id", PROJECT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], raw_project)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(project_from_raw(row?)?);
    }
    Ok(out)
}

pub fn project_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM projects ORDER BY id")?;
    let rows = stmt.query_map([], |r| r.get::<_, i64>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Incomes of one project, or every income when `project_id` is `None`.
pub fn incomes_for(conn: &Connection, project_id: Option<i64>) -> Result<Vec<Income>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, amount, date, description, note FROM incomes
         WHERE (?1 IS NULL OR project_id=?1) ORDER BY date, id",
    )?;
    let rows = stmt.query_map(params![project_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, Option<i64>>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, Option<String>>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, pid, amount, date, description, note) = row?;
        let what = format!("income {}", id);
        out.push(Income {
            id,
            project_id: pid,
            amount: stored_decimal(&amount, &what)?,
            date: stored_date(&date, &what)?,
            description,
            note,
        });
    }
    Ok(out)
}

pub fn expenses_for(conn: &Connection, project_id: Option<i64>) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, amount, category, date, description, note FROM expenses
         WHERE (?1 IS NULL OR project_id=?1) ORDER BY date, id",
    )?;
    let rows = stmt.query_map(params![project_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, Option<i64>>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, Option<String>>(6)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, pid, amount, category, date, description, note) = row?;
        let what = format!("expense {}", id);
        out.push(Expense {
            id,
            project_id: pid,
            amount: stored_decimal(&amount, &what)?,
            category,
            date: stored_date(&date, &what)?,
            description,
            note,
        });
    }
    Ok(out)
}

pub fn payments_for(conn: &Connection, project_id: Option<i64>) -> Result<Vec<ProjectPayment>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, income_id, amount, payment_date, payment_type, note
         FROM project_payments WHERE (?1 IS NULL OR project_id=?1) ORDER BY payment_date, id",
    )?;
    let rows = stmt.query_map(params![project_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, Option<i64>>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, Option<String>>(6)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, pid, income_id, amount, date, payment_type, note) = row?;
        let what = format!("payment {}", id);
        out.push(ProjectPayment {
            id,
            project_id: pid,
            income_id,
            amount: stored_decimal(&amount, &what)?,
            payment_date: stored_date(&date, &what)?,
            payment_type,
            note,
        });
    }
    Ok(out)
}
