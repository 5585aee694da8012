// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::reconcile::{perform_automated_corrections, reconcile_all, validate_consistency};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("run", sub)) => run(conn, sub)?,
        Some(("validate", sub)) => validate(conn, sub)?,
        Some(("fix", sub)) => fix(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn run(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let report = reconcile_all(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["Projects", "Consistent", "Inconsistent", "Failed", "Issues", "Corrections"],
            vec![vec![
                report.total_projects.to_string(),
                report.consistent_projects.to_string(),
                report.inconsistent_projects.to_string(),
                report.failed_projects.to_string(),
                report.total_issues.to_string(),
                report.total_corrections.to_string(),
            ]],
        )
    );
    let rows: Vec<Vec<String>> = report
        .details
        .iter()
        .filter(|d| !d.consistent)
        .map(|d| {
            vec![
                d.code.clone(),
                d.issues.join("\n"),
                d.corrections.join("\n"),
                d.error.clone().unwrap_or_default(),
            ]
        })
        .collect();
    if !rows.is_empty() {
        println!(
            "{}",
            pretty_table(&["Project", "Issues", "Corrections", "Error"], rows)
        );
    }
    for note in &report.notes {
        println!("note: {}", note);
    }
    Ok(())
}

fn validate(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let report = validate_consistency(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    if report.is_consistent() {
        println!("validate: {} project(s), no issues found", report.projects_checked);
        return Ok(());
    }
    let rows = report
        .issues
        .iter()
        .map(|i| {
            vec![
                i.kind.as_str().to_string(),
                format!("{} {}", i.entity, i.entity_id),
                i.description.clone(),
                i.remediation.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Issue", "Entity", "Detail", "Suggested fix"], rows)
    );
    for f in &report.failures {
        println!("failed: {}", f);
    }
    Ok(())
}

fn fix(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let summary = perform_automated_corrections(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["Correction", "Count"],
            vec![
                vec![
                    "Orphaned incomes detached".into(),
                    summary.orphaned_incomes_cleared.to_string()
                ],
                vec![
                    "Orphaned expenses detached".into(),
                    summary.orphaned_expenses_cleared.to_string()
                ],
                vec![
                    "Negative pending clamped".into(),
                    summary.negative_pending_clamped.to_string()
                ],
                vec!["Errors".into(), summary.errors.len().to_string()],
            ],
        )
    );
    for e in &summary.errors {
        println!("error: {}", e);
    }
    Ok(())
}
