// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Operator settings stored in the `settings` table.

use crate::error::StudioError;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub const CURRENCY: &str = "currency";
pub const CODE_PREFIX: &str = "code_prefix";
pub const ALLOW_FORCE_DELETE: &str = "allow_force_delete";

/// Known keys with their defaults.
pub const KNOWN: [(&str, &str); 3] = [
    (CURRENCY, "INR"),
    (CODE_PREFIX, "PRJ"),
    (ALLOW_FORCE_DELETE, "false"),
];

pub fn default_for(key: &str) -> Option<&'static str> {
    KNOWN.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

pub fn get(conn: &Connection, key: &str) -> Result<String> {
    let default = default_for(key)
        .ok_or_else(|| StudioError::Validation(format!("unknown setting '{}'", key)))?;
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.unwrap_or_else(|| default.to_string()))
}

pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if default_for(key).is_none() {
        return Err(StudioError::Validation(format!("unknown setting '{}'", key)).into());
    }
    let value = value.trim();
    match key {
        ALLOW_FORCE_DELETE => {
            parse_bool(value)?;
        }
        CODE_PREFIX | CURRENCY if value.is_empty() => {
            return Err(StudioError::Validation(format!("'{}' cannot be empty", key)).into());
        }
        _ => {}
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    tracing::info!(key, value, "setting updated");
    Ok(())
}

pub fn currency(conn: &Connection) -> Result<String> {
    get(conn, CURRENCY)
}

pub fn code_prefix(conn: &Connection) -> Result<String> {
    get(conn, CODE_PREFIX)
}

pub fn allow_force_delete(conn: &Connection) -> Result<bool> {
    parse_bool(&get(conn, ALLOW_FORCE_DELETE)?)
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(StudioError::Validation(format!("expected true/false, got '{}'", s)).into()),
    }
}
