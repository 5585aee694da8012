// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use studiobooks::commands::projects::{self, NewProject};
use studiobooks::{cli, commands::exporter, db};
use tempfile::tempdir;

fn base_conn() -> Connection {
    let conn = db::open_in_memory().unwrap();
    projects::create(
        &conn,
        &NewProject {
            name: "Corner Cafe Menu".into(),
            amount: Decimal::new(1250050, 2),
            outsourcing_amt: Decimal::from(2000),
            client_id: None,
            shoot_date: None,
        },
    )
    .unwrap();
    conn
}

fn export(conn: &Connection, format: &str, out: &str) {
    let matches = cli::build_cli().get_matches_from([
        "studiobooks",
        "export",
        "projects",
        "--format",
        format,
        "--out",
        out,
    ]);
    if let Some(("export", m)) = matches.subcommand() {
        exporter::handle(conn, m).unwrap();
    } else {
        panic!("export command not parsed");
    }
}

#[test]
fn export_projects_json() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("projects.json");
    export(&conn, "json", &out_path.to_string_lossy());

    let body = std::fs::read_to_string(&out_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    let first = &v.as_array().unwrap()[0];
    assert_eq!(first["code"], "PRJ-0001");
    assert_eq!(first["amount"], "12500.50");
    assert_eq!(first["pending_amt"], "12500.50");
    assert_eq!(first["profit"], "-2000");
}

#[test]
fn export_projects_csv() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("projects.csv");
    export(&conn, "CSV", &out_path.to_string_lossy());

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "code");
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][1], "Corner Cafe Menu");
}

#[test]
fn unknown_format_is_an_error() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("projects.xml");
    let out = out_path.to_string_lossy().to_string();
    let matches = cli::build_cli().get_matches_from([
        "studiobooks",
        "export",
        "projects",
        "--format",
        "xml",
        "--out",
        out.as_str(),
    ]);
    if let Some(("export", m)) = matches.subcommand() {
        assert!(exporter::handle(&conn, m).is_err());
    } else {
        panic!("export command not parsed");
    }
    assert!(!out_path.exists());
}
