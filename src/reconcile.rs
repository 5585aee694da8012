// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Consistency checks and repairs for derived project financials.
//!
//! Every pass handles projects one at a time. A project that fails is
//! logged and itemized in the report; the pass moves on to the next one.

use crate::finance::{self, Financials, ProjectLedger};
use crate::utils::stored_decimal;
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

pub const ADJUSTMENT_NOTE: &str =
    "reconciliation adjustment; dated from the latest income, attribution is approximate";

#[derive(Debug, Clone, Serialize)]
pub struct ProjectReconciliation {
    pub project_id: i64,
    pub code: String,
    pub consistent: bool,
    pub issues: Vec<String>,
    pub corrections: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationReport {
    pub total_projects: usize,
    pub consistent_projects: usize,
    pub inconsistent_projects: usize,
    pub failed_projects: usize,
    pub total_issues: usize,
    pub total_corrections: usize,
    pub details: Vec<ProjectReconciliation>,
    pub notes: Vec<String>,
}

/// Bring every project's stored financials and payment history back in line
/// with its incomes and expenses.
pub fn reconcile_all(conn: &Connection) -> Result<ReconciliationReport> {
    let ids = finance::project_ids(conn)?;
    let mut report = ReconciliationReport {
        total_projects: ids.len(),
        ..Default::default()
    };
    let mut synthesized = 0usize;

    for id in ids {
        let detail = match reconcile_project(conn, id) {
            Ok((detail, created)) => {
                synthesized += created;
                detail
            }
            Err(e) => {
                tracing::error!(project_id = id, error = %format!("{:#}", e), "reconciliation failed");
                ProjectReconciliation {
                    project_id: id,
                    code: project_code(conn, id),
                    consistent: false,
                    issues: Vec::new(),
                    corrections: Vec::new(),
                    error: Some(format!("{:#}", e)),
                }
            }
        };
        if detail.error.is_some() {
            report.failed_projects += 1;
        } else if detail.consistent {
            report.consistent_projects += 1;
        } else {
            report.inconsistent_projects += 1;
        }
        report.total_issues += detail.issues.len();
        report.total_corrections += detail.corrections.len();
        report.details.push(detail);
    }

    if synthesized > 0 {
        report.notes.push(format!(
            "{} synthetic payment(s) were dated from each project's latest income; review their dates",
            synthesized
        ));
    }
    tracing::info!(
        projects = report.total_projects,
        issues = report.total_issues,
        corrections = report.total_corrections,
        failed = report.failed_projects,
        "reconciliation sweep finished"
    );
    Ok(report)
}

/// Returns the project detail and the number of synthetic payments created.
fn reconcile_project(conn: &Connection, project_id: i64) -> Result<(ProjectReconciliation, usize)> {
    let tx = conn.unchecked_transaction()?;
    let ledger = ProjectLedger::load(&tx, project_id)?;
    let stored = ledger.stored();
    let expected = ledger.expected();

    let mut issues = Vec::new();
    let mut corrections = Vec::new();
    for (field, have, want) in field_pairs(&stored, &expected) {
        if have != want {
            issues.push(format!("{}: stored {} vs expected {}", field, have, want));
            corrections.push(format!("{} set to {}", field, want));
        }
    }
    if stored != expected {
        finance::write_financials(&tx, project_id, &expected)?;
    }

    let mut created = 0;
    let paid = ledger.payments_total();
    if paid < expected.received_amt {
        let shortfall = expected.received_amt - paid;
        match ledger.latest_income().map(|i| i.date) {
            Some(date) => {
                issues.push(format!(
                    "payments total {} vs income total {} (short by {})",
                    paid, expected.received_amt, shortfall
                ));
                insert_adjustment(&tx, project_id, shortfall, date)?;
                corrections.push(format!(
                    "created partial payment of {} dated {}",
                    shortfall, date
                ));
                created += 1;
            }
            // Only reachable with negative stored payments; there is no date to use.
            None => issues.push(format!(
                "payments total {} vs income total {} (short by {}); no income to date an adjustment from, not corrected",
                paid, expected.received_amt, shortfall
            )),
        }
    } else if paid > expected.received_amt {
        issues.push(format!(
            "payments total {} exceeds income total {} by {}; not corrected",
            paid,
            expected.received_amt,
            paid - expected.received_amt
        ));
    }

    tx.commit()?;
    if !issues.is_empty() {
        tracing::warn!(project = %ledger.project.code, issues = issues.len(), "drift corrected");
    }
    Ok((
        ProjectReconciliation {
            project_id,
            code: ledger.project.code.clone(),
            consistent: issues.is_empty(),
            issues,
            corrections,
            error: None,
        },
        created,
    ))
}

fn field_pairs(stored: &Financials, expected: &Financials) -> [(&'static str, Decimal, Decimal); 3] {
    [
        ("received_amt", stored.received_amt, expected.received_amt),
        ("pending_amt", stored.pending_amt, expected.pending_amt),
        ("profit", stored.profit, expected.profit),
    ]
}

fn insert_adjustment(
    conn: &Connection,
    project_id: i64,
    amount: Decimal,
    date: NaiveDate,
) -> Result<()> {
    conn.execute(
        "INSERT INTO project_payments(project_id, income_id, amount, payment_date, payment_type, note)
         VALUES (?1, NULL, ?2, ?3, 'partial', ?4)",
        params![project_id, amount.to_string(), date.to_string(), ADJUSTMENT_NOTE],
    )?;
    Ok(())
}

fn project_code(conn: &Connection, project_id: i64) -> String {
    conn.query_row(
        "SELECT code FROM projects WHERE id=?1",
        params![project_id],
        |r| r.get::<_, Option<String>>(0),
    )
    .ok()
    .flatten()
    .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DerivedDrift,
    PaymentShortfall,
    PaymentSurplus,
    OrphanedIncome,
    OrphanedExpense,
    NegativePending,
    NegativeProfit,
    DuplicatePayment,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::DerivedDrift => "derived_drift",
            IssueKind::PaymentShortfall => "payment_shortfall",
            IssueKind::PaymentSurplus => "payment_surplus",
            IssueKind::OrphanedIncome => "orphaned_income",
            IssueKind::OrphanedExpense => "orphaned_expense",
            IssueKind::NegativePending => "negative_pending",
            IssueKind::NegativeProfit => "negative_profit",
            IssueKind::DuplicatePayment => "duplicate_payment",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyIssue {
    pub kind: IssueKind,
    pub entity: &'static str,
    pub entity_id: i64,
    pub description: String,
    pub remediation: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyReport {
    pub projects_checked: usize,
    pub issues: Vec<ConsistencyIssue>,
    pub failures: Vec<String>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty() && self.failures.is_empty()
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

/// Read-only audit. Reports problems with suggested fixes; writes nothing.
pub fn validate_consistency(conn: &Connection) -> Result<ConsistencyReport> {
    let mut report = ConsistencyReport::default();

    for id in finance::project_ids(conn)? {
        report.projects_checked += 1;
        match ProjectLedger::load(conn, id) {
            Ok(ledger) => audit_project(&ledger, &mut report.issues),
            Err(e) => {
                tracing::error!(project_id = id, error = %format!("{:#}", e), "consistency check failed");
                report.failures.push(format!("project {}: {:#}", id, e));
            }
        }
    }

    for (table, entity, kind) in [
        ("incomes", "income", IssueKind::OrphanedIncome),
        ("expenses", "expense", IssueKind::OrphanedExpense),
    ] {
        match orphans(conn, table) {
            Ok(rows) => {
                for (row_id, project_id) in rows {
                    report.issues.push(ConsistencyIssue {
                        kind,
                        entity,
                        entity_id: row_id,
                        description: format!(
                            "{} {} references missing project {}",
                            entity, row_id, project_id
                        ),
                        remediation: "clear the project reference (reconcile fix) or reassign it"
                            .into(),
                    });
                }
            }
            Err(e) => report.failures.push(format!("{} orphan scan: {:#}", entity, e)),
        }
    }

    match duplicate_payments(conn) {
        Ok(rows) => {
            for (project_id, income_id, count) in rows {
                report.issues.push(ConsistencyIssue {
                    kind: IssueKind::DuplicatePayment,
                    entity: "income",
                    entity_id: income_id,
                    description: format!(
                        "{} payments in project {} point at income {}",
                        count, project_id, income_id
                    ),
                    remediation: "delete the extra payment records, keeping one per income".into(),
                });
            }
        }
        Err(e) => report.failures.push(format!("duplicate payment scan: {:#}", e)),
    }

    tracing::info!(
        projects = report.projects_checked,
        issues = report.issues.len(),
        "consistency check finished"
    );
    Ok(report)
}

fn audit_project(ledger: &ProjectLedger, issues: &mut Vec<ConsistencyIssue>) {
    let id = ledger.project.id;
    let code = &ledger.project.code;
    let stored = ledger.stored();
    let expected = ledger.expected();

    for (field, have, want) in field_pairs(&stored, &expected) {
        if have != want {
            issues.push(ConsistencyIssue {
                kind: IssueKind::DerivedDrift,
                entity: "project",
                entity_id: id,
                description: format!("{} {}: stored {} vs expected {}", code, field, have, want),
                remediation: "run reconcile to rewrite derived fields".into(),
            });
        }
    }

    let paid = ledger.payments_total();
    if paid < expected.received_amt {
        issues.push(ConsistencyIssue {
            kind: IssueKind::PaymentShortfall,
            entity: "project",
            entity_id: id,
            description: format!(
                "{} payments {} fall short of income {}",
                code, paid, expected.received_amt
            ),
            remediation: "record the missing payment, or run reconcile to add an adjustment".into(),
        });
    } else if paid > expected.received_amt {
        issues.push(ConsistencyIssue {
            kind: IssueKind::PaymentSurplus,
            entity: "project",
            entity_id: id,
            description: format!(
                "{} payments {} exceed income {}",
                code, paid, expected.received_amt
            ),
            remediation: "remove payments that have no matching income, or record the income"
                .into(),
        });
    }

    if stored.pending_amt < Decimal::ZERO {
        issues.push(ConsistencyIssue {
            kind: IssueKind::NegativePending,
            entity: "project",
            entity_id: id,
            description: format!("{} pending amount is {}", code, stored.pending_amt),
            remediation: "check for overpayment or raise the contract amount".into(),
        });
    }
    if stored.profit < Decimal::ZERO {
        issues.push(ConsistencyIssue {
            kind: IssueKind::NegativeProfit,
            entity: "project",
            entity_id: id,
            description: format!("{} profit is {}", code, stored.profit),
            remediation: "review expenses and outsourcing costs for this project".into(),
        });
    }
}

fn orphans(conn: &Connection, table: &str) -> Result<Vec<(i64, i64)>> {
    let sql = format!(
        "SELECT t.id, t.project_id FROM {} t
         WHERE t.project_id IS NOT NULL
           AND NOT EXISTS (SELECT 1 FROM projects p WHERE p.id=t.project_id)
         ORDER BY t.id",
        table
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?)))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn duplicate_payments(conn: &Connection) -> Result<Vec<(i64, i64, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT project_id, income_id, COUNT(*) FROM project_payments
         WHERE income_id IS NOT NULL
         GROUP BY project_id, income_id HAVING COUNT(*) > 1
         ORDER BY project_id, income_id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, i64>(2)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CorrectionSummary {
    pub orphaned_incomes_cleared: usize,
    pub orphaned_expenses_cleared: usize,
    pub negative_pending_clamped: usize,
    pub corrections_applied: usize,
    pub errors: Vec<String>,
}

/// Apply only the unambiguous repairs: detach orphaned incomes/expenses and
/// clamp negative pending amounts to zero.
pub fn perform_automated_corrections(conn: &Connection) -> Result<CorrectionSummary> {
    let mut summary = CorrectionSummary::default();

    match clear_orphans(conn, "incomes") {
        Ok(n) => summary.orphaned_incomes_cleared = n,
        Err(e) => summary.errors.push(format!("orphaned incomes: {:#}", e)),
    }
    match clear_orphans(conn, "expenses") {
        Ok(n) => summary.orphaned_expenses_cleared = n,
        Err(e) => summary.errors.push(format!("orphaned expenses: {:#}", e)),
    }
    match clamp_negative_pending(conn, &mut summary.errors) {
        Ok(n) => summary.negative_pending_clamped = n,
        Err(e) => summary.errors.push(format!("negative pending: {:#}", e)),
    }

    summary.corrections_applied = summary.orphaned_incomes_cleared
        + summary.orphaned_expenses_cleared
        + summary.negative_pending_clamped;
    for e in &summary.errors {
        tracing::error!(error = %e, "automated correction failed");
    }
    tracing::info!(
        applied = summary.corrections_applied,
        errors = summary.errors.len(),
        "automated corrections finished"
    );
    Ok(summary)
}

fn clear_orphans(conn: &Connection, table: &str) -> Result<usize> {
    let sql = format!(
        "UPDATE {} SET project_id=NULL
         WHERE project_id IS NOT NULL
           AND NOT EXISTS (SELECT 1 FROM projects p WHERE p.id={}.project_id)",
        table, table
    );
    Ok(conn.execute(&sql, [])?)
}

fn clamp_negative_pending(conn: &Connection, errors: &mut Vec<String>) -> Result<usize> {
    let mut stmt = conn.prepare("SELECT id, pending_amt FROM projects ORDER BY id")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
    let mut negative = Vec::new();
    for row in rows {
        let (id, raw) = row?;
        match stored_decimal(&raw, &format!("project {}", id)) {
            Ok(p) if p < Decimal::ZERO => negative.push(id),
            Ok(_) => {}
            Err(e) => errors.push(format!("negative pending: {:#}", e)),
        }
    }

    let mut clamped = 0;
    for id in negative {
        match conn.execute(
            "UPDATE projects SET pending_amt='0' WHERE id=?1",
            params![id],
        ) {
            Ok(_) => clamped += 1,
            Err(e) => errors.push(format!("negative pending, project {}: {}", id, e)),
        }
    }
    Ok(clamped)
}
