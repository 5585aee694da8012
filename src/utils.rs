// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::StudioError;
use crate::models::PAYMENT_TYPES;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

static PROJECT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*-\d+$").expect("static regex"));

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        StudioError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", s)).into()
    })
}

pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").map_err(|_| {
        StudioError::Validation(format!("Invalid month '{}', expected YYYY-MM", s))
    })?;
    Ok(s.to_string())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_| StudioError::Validation(format!("Invalid decimal '{}'", s)).into())
}

/// Money entered by the operator: a decimal that is not negative.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let d = parse_decimal(s)?;
    if d.is_sign_negative() && !d.is_zero() {
        return Err(StudioError::Validation(format!("Amount '{}' must not be negative", s)).into());
    }
    Ok(d)
}

pub fn parse_payment_type(s: &str) -> Result<String> {
    let t = s.trim().to_lowercase();
    if PAYMENT_TYPES.contains(&t.as_str()) {
        Ok(t)
    } else {
        Err(StudioError::Validation(format!(
            "Invalid payment type '{}', expected one of {}",
            s,
            PAYMENT_TYPES.join("|")
        ))
        .into())
    }
}

/// Decimal column stored as TEXT.
pub fn stored_decimal(raw: &str, what: &str) -> Result<Decimal> {
    raw.parse::<Decimal>()
        .with_context(|| format!("Invalid stored amount '{}' in {}", raw, what))
}

pub fn stored_date(raw: &str, what: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid stored date '{}' in {}", raw, what))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

/// Resolve a project by numeric id or by its code (e.g. `PRJ-0007`).
pub fn id_for_project(conn: &Connection, key: &str) -> Result<i64> {
    let key = key.trim();
    let found: Option<i64> = if let Ok(id) = key.parse::<i64>() {
        conn.query_row("SELECT id FROM projects WHERE id=?1", params![id], |r| {
            r.get(0)
        })
        .optional()?
    } else if PROJECT_CODE.is_match(key) {
        conn.query_row(
            "SELECT id FROM projects WHERE code=?1 COLLATE NOCASE",
            params![key],
            |r| r.get(0),
        )
        .optional()?
    } else {
        None
    };
    found.ok_or_else(|| StudioError::not_found("Project", key).into())
}

pub fn id_for_client(conn: &Connection, name: &str) -> Result<i64> {
    let name = name.trim();
    let id: Option<i64> = conn
        .query_row("SELECT id FROM clients WHERE name=?1", params![name], |r| {
            r.get(0)
        })
        .optional()?;
    id.ok_or_else(|| StudioError::not_found("Client", name).into())
}

/// Update value for an optional text field: absent keeps it, `none` clears it.
pub fn clearable(raw: Option<&String>) -> Option<Option<String>> {
    match raw.map(|s| s.trim()) {
        None => None,
        Some(s) if s.eq_ignore_ascii_case("none") => Some(None),
        Some(s) => Some(Some(s.to_string())),
    }
}

pub fn parse_id(s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| StudioError::Validation(format!("Invalid id '{}'", s)).into())
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
