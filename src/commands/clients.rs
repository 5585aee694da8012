// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::StudioError;
use crate::models::Client;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let phone = sub.get_one::<String>("phone").map(|s| s.trim().to_string());
            let email = sub.get_one::<String>("email").map(|s| s.trim().to_string());
            if name.is_empty() {
                return Err(StudioError::Validation("client name is empty".into()).into());
            }
            conn.execute(
                "INSERT INTO clients(name, phone, email) VALUES (?1, ?2, ?3)",
                params![name, phone, email],
            )?;
            tracing::info!(client = name, "client added");
            println!("Added client '{}'", name);
        }
        Some(("list", sub)) => {
            let clients = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &clients)? {
                let data = clients
                    .into_iter()
                    .map(|c| {
                        vec![
                            c.name,
                            c.phone.unwrap_or_default(),
                            c.email.unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Name", "Phone", "Email"], data));
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let n = conn.execute("DELETE FROM clients WHERE name=?1", params![name])?;
            if n == 0 {
                return Err(StudioError::not_found("Client", name).into());
            }
            println!("Removed client '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn list(conn: &Connection) -> Result<Vec<Client>> {
    let mut stmt = conn.prepare("SELECT id, name, phone, email FROM clients ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(Client {
            id: r.get(0)?,
            name: r.get(1)?,
            phone: r.get(2)?,
            email: r.get(3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
