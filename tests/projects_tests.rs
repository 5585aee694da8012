// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use studiobooks::commands::expenses::{self, NewExpense};
use studiobooks::commands::incomes::{self, NewIncome};
use studiobooks::commands::projects::{self, NewProject};
use studiobooks::error::StudioError;
use studiobooks::{cli, commands, config, db, finance, utils};

fn setup() -> Connection {
    db::open_in_memory().unwrap()
}

fn new_project(conn: &Connection, name: &str) -> i64 {
    projects::create(
        conn,
        &NewProject {
            name: name.into(),
            amount: Decimal::from(1000),
            outsourcing_amt: Decimal::ZERO,
            client_id: None,
            shoot_date: None,
        },
    )
    .unwrap()
    .id
}

fn with_history(conn: &Connection, project_id: i64) {
    incomes::record(
        conn,
        &NewIncome {
            project_id: Some(project_id),
            amount: Decimal::from(100),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            description: String::new(),
            note: None,
            payment_type: "advance".into(),
        },
    )
    .unwrap();
    expenses::record(
        conn,
        &NewExpense {
            project_id: Some(project_id),
            amount: Decimal::from(30),
            category: "Prints".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            description: String::new(),
            note: None,
        },
    )
    .unwrap();
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

#[test]
fn codes_follow_ids_and_prefix_setting() {
    let conn = setup();
    let a = new_project(&conn, "First");
    config::set(&conn, config::CODE_PREFIX, "STU").unwrap();
    let b = new_project(&conn, "Second");
    assert_eq!(finance::load_project(&conn, a).unwrap().code, "PRJ-0001");
    assert_eq!(finance::load_project(&conn, b).unwrap().code, "STU-0002");
    assert_eq!(utils::id_for_project(&conn, "stu-0002").unwrap(), b);
    assert_eq!(utils::id_for_project(&conn, " 1 ").unwrap(), a);
    assert!(utils::id_for_project(&conn, "PRJ-0099").is_err());
}

#[test]
fn delete_without_history_needs_no_force() {
    let conn = setup();
    let id = new_project(&conn, "Empty");
    let out = projects::delete(&conn, id, false).unwrap();
    assert_eq!(out.code, "PRJ-0001");
    assert_eq!(count(&conn, "projects"), 0);
}

#[test]
fn delete_with_history_is_blocked() {
    let conn = setup();
    let id = new_project(&conn, "Busy");
    with_history(&conn, id);
    let err = projects::delete(&conn, id, false).unwrap_err();
    match err.downcast_ref::<StudioError>() {
        Some(StudioError::DeleteBlocked {
            incomes, expenses, ..
        }) => {
            assert_eq!(*incomes, 1);
            assert_eq!(*expenses, 1);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(count(&conn, "projects"), 1);
}

#[test]
fn force_delete_respects_setting() {
    let conn = setup();
    let id = new_project(&conn, "Busy");
    with_history(&conn, id);

    let err = projects::delete(&conn, id, true).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StudioError>(),
        Some(StudioError::ForceDeleteDisabled)
    ));

    config::set(&conn, config::ALLOW_FORCE_DELETE, "true").unwrap();
    let out = projects::delete(&conn, id, true).unwrap();
    assert_eq!((out.incomes, out.expenses, out.payments), (1, 1, 1));
    for table in ["projects", "incomes", "expenses", "project_payments"] {
        assert_eq!(count(&conn, table), 0, "{} not emptied", table);
    }
}

#[test]
fn cli_rm_with_force_flag() {
    let conn = setup();
    let id = new_project(&conn, "Busy");
    with_history(&conn, id);
    config::set(&conn, config::ALLOW_FORCE_DELETE, "yes").unwrap();
    let matches = cli::build_cli().get_matches_from([
        "studiobooks",
        "project",
        "rm",
        "--project",
        "PRJ-0001",
        "--force",
    ]);
    if let Some(("project", m)) = matches.subcommand() {
        projects::handle(&conn, m).unwrap();
    } else {
        panic!("project command not parsed");
    }
    assert_eq!(count(&conn, "projects"), 0);
}

#[test]
fn negative_amounts_and_bad_dates_are_rejected() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "studiobooks",
        "project",
        "add",
        "--name",
        "Bad",
        "--amount=-5",
    ]);
    if let Some(("project", m)) = matches.subcommand() {
        let err = projects::handle(&conn, m).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StudioError>(),
            Some(StudioError::Validation(_))
        ));
    } else {
        panic!("project command not parsed");
    }
    assert!(utils::parse_date("2025-13-01").is_err());
    assert!(utils::parse_payment_type("deposit").is_err());
    assert_eq!(utils::parse_payment_type(" Final ").unwrap(), "final");
    assert_eq!(count(&conn, "projects"), 0);
}

#[test]
fn invalid_status_update_is_rejected() {
    let conn = setup();
    let id = new_project(&conn, "Status");
    let err = projects::update(
        &conn,
        id,
        &projects::ProjectChanges {
            status: Some("paused".into()),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("Invalid status"));
    let p = projects::update(
        &conn,
        id,
        &projects::ProjectChanges {
            status: Some("completed".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(p.status, "completed");
}

#[test]
fn clients_link_to_projects() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "studiobooks",
        "client",
        "add",
        "--name",
        " Rao Family ",
        "--phone",
        "555-0100",
    ]);
    if let Some(("client", m)) = matches.subcommand() {
        commands::clients::handle(&conn, m).unwrap();
    } else {
        panic!("client command not parsed");
    }
    let client_id = utils::id_for_client(&conn, "Rao Family").unwrap();
    let p = projects::create(
        &conn,
        &NewProject {
            name: "Rao Anniversary".into(),
            amount: Decimal::from(2500),
            outsourcing_amt: Decimal::ZERO,
            client_id: Some(client_id),
            shoot_date: NaiveDate::from_ymd_opt(2025, 9, 14),
        },
    )
    .unwrap();
    let rows = projects::query_rows(&conn, Some("active")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].client, "Rao Family");
    assert_eq!(p.shoot_date, NaiveDate::from_ymd_opt(2025, 9, 14));
}

#[test]
fn client_can_be_unlinked_with_none() {
    let conn = setup();
    conn.execute("INSERT INTO clients(name) VALUES ('Iyer Studio')", [])
        .unwrap();
    let id = new_project(&conn, "Catalogue");
    let run = |args: &[&str]| {
        let mut argv = vec!["studiobooks", "project", "update", "--project", "PRJ-0001"];
        argv.extend_from_slice(args);
        let matches = cli::build_cli().get_matches_from(argv);
        if let Some(("project", m)) = matches.subcommand() {
            projects::handle(&conn, m).unwrap();
        } else {
            panic!("project command not parsed");
        }
    };

    run(&["--client", "Iyer Studio"]);
    let linked = finance::load_project(&conn, id).unwrap();
    assert_eq!(
        linked.client_id,
        Some(utils::id_for_client(&conn, "Iyer Studio").unwrap())
    );

    run(&["--name", "Spring Catalogue"]);
    assert!(finance::load_project(&conn, id).unwrap().client_id.is_some());

    run(&["--client", "none"]);
    let p = finance::load_project(&conn, id).unwrap();
    assert_eq!(p.client_id, None);
    assert_eq!(p.name, "Spring Catalogue");
}

#[test]
fn settings_reject_unknown_keys_and_bad_bools() {
    let conn = setup();
    assert_eq!(config::currency(&conn).unwrap(), "INR");
    assert!(config::set(&conn, "theme", "dark").is_err());
    assert!(config::set(&conn, config::ALLOW_FORCE_DELETE, "maybe").is_err());
    assert!(!config::allow_force_delete(&conn).unwrap());
    config::set(&conn, config::CURRENCY, " USD ").unwrap();
    assert_eq!(config::currency(&conn).unwrap(), "USD");
}
