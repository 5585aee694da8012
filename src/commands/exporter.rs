// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::projects::query_rows;
use crate::error::StudioError;
use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("projects", sub)) => export_projects(conn, sub),
        _ => Ok(()),
    }
}

fn export_projects(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();
    let rows = query_rows(conn, None)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "code",
                "name",
                "client",
                "status",
                "amount",
                "outsourcing_amt",
                "received_amt",
                "pending_amt",
                "profit",
            ])?;
            for r in &rows {
                wtr.write_record([
                    r.code.clone(),
                    r.name.clone(),
                    r.client.clone(),
                    r.status.clone(),
                    r.amount.to_string(),
                    r.outsourcing_amt.to_string(),
                    r.received_amt.to_string(),
                    r.pending_amt.to_string(),
                    r.profit.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = rows
                .iter()
                .map(|r| {
                    json!({
                        "code": r.code, "name": r.name, "client": r.client, "status": r.status,
                        "amount": r.amount.to_string(),
                        "outsourcing_amt": r.outsourcing_amt.to_string(),
                        "received_amt": r.received_amt.to_string(),
                        "pending_amt": r.pending_amt.to_string(),
                        "profit": r.profit.to_string()
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => {
            return Err(
                StudioError::Validation(format!("Unknown format: {} (use csv|json)", fmt)).into(),
            );
        }
    }
    tracing::info!(rows = rows.len(), out, "projects exported");
    println!("Exported {} project(s) to {}", rows.len(), out);
    Ok(())
}
