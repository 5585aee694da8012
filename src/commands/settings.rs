// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            println!("{}", config::get(conn, key)?);
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap();
            config::set(conn, key, value)?;
            println!("{} = {}", key, config::get(conn, key)?);
        }
        Some(("list", _)) => {
            let mut data = Vec::new();
            for (key, default) in config::KNOWN {
                data.push(vec![
                    key.to_string(),
                    config::get(conn, key)?,
                    default.to_string(),
                ]);
            }
            println!("{}", pretty_table(&["Key", "Value", "Default"], data));
        }
        _ => {}
    }
    Ok(())
}
