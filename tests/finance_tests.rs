// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use studiobooks::commands::expenses::{self, ExpenseChanges, NewExpense};
use studiobooks::commands::incomes::{self, IncomeChanges, NewIncome};
use studiobooks::commands::payments::{self, NewPayment};
use studiobooks::commands::projects::{self, NewProject};
use studiobooks::finance::{self, ProjectLedger};
use studiobooks::{cli, db};

fn setup() -> Connection {
    db::open_in_memory().unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn new_project(conn: &Connection, name: &str, amount: &str, outsourcing: &str) -> i64 {
    projects::create(
        conn,
        &NewProject {
            name: name.into(),
            amount: dec(amount),
            outsourcing_amt: dec(outsourcing),
            client_id: None,
            shoot_date: None,
        },
    )
    .unwrap()
    .id
}

fn add_income(conn: &Connection, project_id: Option<i64>, amount: &str, on: &str) -> i64 {
    incomes::record(
        conn,
        &NewIncome {
            project_id,
            amount: dec(amount),
            date: date(on),
            description: "shoot fee".into(),
            note: None,
            payment_type: "partial".into(),
        },
    )
    .unwrap()
}

fn add_expense(conn: &Connection, project_id: Option<i64>, amount: &str, category: &str) -> i64 {
    expenses::record(
        conn,
        &NewExpense {
            project_id,
            amount: dec(amount),
            category: category.into(),
            date: date("2025-03-10"),
            description: String::new(),
            note: None,
        },
    )
    .unwrap()
}

fn payments_total(conn: &Connection, project_id: i64) -> Decimal {
    finance::payments_for(conn, Some(project_id))
        .unwrap()
        .iter()
        .map(|p| p.amount)
        .sum()
}

#[test]
fn wedding_scenario_through_the_cli() {
    let conn = setup();
    let run = |args: &[&str]| {
        let mut argv = vec!["studiobooks"];
        argv.extend_from_slice(args);
        let matches = cli::build_cli().get_matches_from(argv);
        match matches.subcommand() {
            Some(("project", m)) => projects::handle(&conn, m).unwrap(),
            Some(("income", m)) => incomes::handle(&conn, m).unwrap(),
            Some(("expense", m)) => expenses::handle(&conn, m).unwrap(),
            _ => panic!("unexpected command"),
        }
    };
    run(&[
        "project",
        "add",
        "--name",
        "Mehta Wedding",
        "--amount",
        "50000",
        "--outsourcing",
        "10000",
    ]);
    run(&[
        "income", "add", "--project", "PRJ-0001", "--amount", "20000", "--date", "2025-03-02",
    ]);
    run(&[
        "expense",
        "add",
        "--project",
        "1",
        "--amount",
        "5000",
        "--category",
        "Travel",
        "--date",
        "2025-03-03",
    ]);

    let p = finance::load_project(&conn, 1).unwrap();
    assert_eq!(p.code, "PRJ-0001");
    assert_eq!(p.received_amt, dec("20000"));
    assert_eq!(p.pending_amt, dec("30000"));
    assert_eq!(p.profit, dec("5000"));
    assert_eq!(payments_total(&conn, 1), dec("20000"));
}

#[test]
fn new_project_starts_with_empty_financials() {
    let conn = setup();
    let id = new_project(&conn, "Catalogue", "1200.50", "300");
    let p = finance::load_project(&conn, id).unwrap();
    assert!(p.received_amt.is_zero());
    assert_eq!(p.pending_amt, dec("1200.50"));
    assert_eq!(p.profit, dec("-300"));
}

#[test]
fn recompute_is_idempotent() {
    let conn = setup();
    let id = new_project(&conn, "Reel", "8000", "500");
    add_income(&conn, Some(id), "2500", "2025-05-01");
    add_expense(&conn, Some(id), "120.75", "Props");

    let first = finance::recompute(&conn, id).unwrap();
    let second = finance::recompute(&conn, id).unwrap();
    assert_eq!(first, second);
    let stored = ProjectLedger::load(&conn, id).unwrap().stored();
    assert_eq!(stored, second);
    assert_eq!(second.profit, dec("1879.25"));
}

#[test]
fn recompute_unknown_project_is_not_found() {
    let conn = setup();
    let err = finance::recompute(&conn, 42).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<studiobooks::error::StudioError>(),
        Some(studiobooks::error::StudioError::NotFound { .. })
    ));
}

#[test]
fn derived_fields_track_every_mutation() {
    let conn = setup();
    let id = new_project(&conn, "Portraits", "10000", "1000");
    let mut incomes_seen = Vec::new();
    for (amount, on) in [("1500", "2025-01-05"), ("2250.50", "2025-01-20"), ("999.99", "2025-02-01")] {
        incomes_seen.push(add_income(&conn, Some(id), amount, on));
    }
    let e1 = add_expense(&conn, Some(id), "400", "Printing");
    add_expense(&conn, Some(id), "35.10", "Travel");

    let check = |conn: &Connection| {
        let l = ProjectLedger::load(conn, id).unwrap();
        let received: Decimal = l.incomes.iter().map(|i| i.amount).sum();
        let spent: Decimal = l.expenses.iter().map(|e| e.amount).sum();
        assert_eq!(l.project.received_amt, received);
        assert_eq!(l.project.pending_amt, l.project.amount - received);
        assert_eq!(
            l.project.profit,
            received - (l.project.outsourcing_amt + spent)
        );
        assert_eq!(l.payments_total(), received);
    };
    check(&conn);

    incomes::update(
        &conn,
        incomes_seen[1],
        &IncomeChanges {
            amount: Some(dec("3000")),
            ..Default::default()
        },
    )
    .unwrap();
    check(&conn);

    incomes::delete(&conn, incomes_seen[0]).unwrap();
    check(&conn);

    expenses::update(
        &conn,
        e1,
        &ExpenseChanges {
            amount: Some(dec("450")),
            ..Default::default()
        },
    )
    .unwrap();
    check(&conn);

    expenses::delete(&conn, e1).unwrap();
    check(&conn);

    projects::update(
        &conn,
        id,
        &projects::ProjectChanges {
            amount: Some(dec("12000")),
            outsourcing_amt: Some(dec("0")),
            ..Default::default()
        },
    )
    .unwrap();
    check(&conn);
}

#[test]
fn moving_an_income_recomputes_both_projects() {
    let conn = setup();
    let a = new_project(&conn, "A", "1000", "0");
    let b = new_project(&conn, "B", "2000", "0");
    let inc = add_income(&conn, Some(a), "400", "2025-06-01");

    incomes::update(
        &conn,
        inc,
        &IncomeChanges {
            project_id: Some(Some(b)),
            ..Default::default()
        },
    )
    .unwrap();

    let pa = finance::load_project(&conn, a).unwrap();
    let pb = finance::load_project(&conn, b).unwrap();
    assert!(pa.received_amt.is_zero());
    assert_eq!(pa.pending_amt, dec("1000"));
    assert_eq!(pb.received_amt, dec("400"));
    assert!(payments_total(&conn, a).is_zero());
    assert_eq!(payments_total(&conn, b), dec("400"));

    incomes::update(
        &conn,
        inc,
        &IncomeChanges {
            project_id: Some(None),
            ..Default::default()
        },
    )
    .unwrap();
    let pb = finance::load_project(&conn, b).unwrap();
    assert!(pb.received_amt.is_zero());
    assert!(payments_total(&conn, b).is_zero());
}

#[test]
fn unassigned_rows_touch_no_project() {
    let conn = setup();
    let id = new_project(&conn, "Event", "500", "0");
    add_income(&conn, None, "75", "2025-02-02");
    add_expense(&conn, None, "20", "Office");
    let p = finance::load_project(&conn, id).unwrap();
    assert!(p.received_amt.is_zero());
    assert!(p.profit.is_zero());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM project_payments", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn payment_add_records_matching_income() {
    let conn = setup();
    let id = new_project(&conn, "Album", "9000", "0");
    let pay = payments::record(
        &conn,
        &NewPayment {
            project_id: id,
            amount: dec("3000"),
            date: date("2025-07-01"),
            payment_type: "advance".into(),
            income_id: None,
            note: None,
        },
    )
    .unwrap();

    let (income_id, ptype): (Option<i64>, String) = conn
        .query_row(
            "SELECT income_id, payment_type FROM project_payments WHERE id=?1",
            params![pay],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(ptype, "advance");
    let income = incomes::get(&conn, income_id.unwrap()).unwrap();
    assert_eq!(income.amount, dec("3000"));
    let p = finance::load_project(&conn, id).unwrap();
    assert_eq!(p.received_amt, dec("3000"));
    assert_eq!(p.pending_amt, dec("6000"));

    payments::delete(&conn, pay, true).unwrap();
    let p = finance::load_project(&conn, id).unwrap();
    assert!(p.received_amt.is_zero());
    assert!(incomes::get(&conn, income.id).is_err());
}

#[test]
fn linking_an_income_twice_is_rejected() {
    let conn = setup();
    let id = new_project(&conn, "Album", "9000", "0");
    let inc = add_income(&conn, Some(id), "100", "2025-07-01");
    let err = payments::record(
        &conn,
        &NewPayment {
            project_id: id,
            amount: dec("100"),
            date: date("2025-07-01"),
            payment_type: "partial".into(),
            income_id: Some(inc),
            note: None,
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("already has payment"));
}

#[test]
fn income_for_missing_project_is_rejected() {
    let conn = setup();
    let err = incomes::record(
        &conn,
        &NewIncome {
            project_id: Some(7),
            amount: dec("10"),
            date: date("2025-01-01"),
            description: String::new(),
            note: None,
            payment_type: "partial".into(),
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("Project '7' not found"));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM incomes", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn linked_payments_stay_in_step_with_their_income() {
    let conn = setup();
    let id = new_project(&conn, "Portraits", "2000", "0");
    let inc = add_income(&conn, Some(id), "500", "2025-08-01");
    let pay: i64 = conn
        .query_row(
            "SELECT id FROM project_payments WHERE income_id=?1",
            params![inc],
            |r| r.get(0),
        )
        .unwrap();

    let err = payments::delete(&conn, pay, false).unwrap_err();
    assert!(err.to_string().contains("--with-income"));
    assert_eq!(payments_total(&conn, id), dec("500"));

    // Re-linking needs the income's own amount.
    conn.execute("DELETE FROM project_payments WHERE id=?1", params![pay])
        .unwrap();
    let link = |amount: &str| {
        payments::record(
            &conn,
            &NewPayment {
                project_id: id,
                amount: dec(amount),
                date: date("2025-08-01"),
                payment_type: "final".into(),
                income_id: Some(inc),
                note: None,
            },
        )
    };
    let err = link("100").unwrap_err();
    assert!(err.to_string().contains("does not match income"));
    link("500").unwrap();

    let p = finance::load_project(&conn, id).unwrap();
    assert_eq!(payments_total(&conn, id), p.received_amt);
    assert_eq!(p.received_amt, dec("500"));
}

#[test]
fn unlinked_payment_can_be_removed_alone() {
    let conn = setup();
    let id = new_project(&conn, "Reel", "800", "0");
    conn.execute(
        "INSERT INTO project_payments(project_id, amount, payment_date, payment_type) VALUES (?1, '40', '2025-01-05', 'partial')",
        params![id],
    )
    .unwrap();
    let pay = conn.last_insert_rowid();
    payments::delete(&conn, pay, false).unwrap();
    assert!(payments_total(&conn, id).is_zero());
}

#[test]
fn income_update_touches_only_the_first_linked_payment() {
    let conn = setup();
    let id = new_project(&conn, "Duplicates", "3000", "0");
    let inc = add_income(&conn, Some(id), "1000", "2025-05-01");
    conn.execute(
        "INSERT INTO project_payments(project_id, income_id, amount, payment_date, payment_type)
         VALUES (?1, ?2, '1000', '2025-05-01', 'partial')",
        params![id, inc],
    )
    .unwrap();

    incomes::update(
        &conn,
        inc,
        &IncomeChanges {
            amount: Some(dec("1200")),
            ..Default::default()
        },
    )
    .unwrap();

    let amounts: Vec<Decimal> = finance::payments_for(&conn, Some(id))
        .unwrap()
        .iter()
        .map(|p| p.amount)
        .collect();
    assert_eq!(amounts, [dec("1200"), dec("1000")]);
    assert_eq!(payments_total(&conn, id), dec("2200"));
}

#[test]
fn notes_can_be_cleared_with_none() {
    let conn = setup();
    let id = new_project(&conn, "Notes", "100", "0");
    let inc = add_income(&conn, Some(id), "10", "2025-01-01").to_string();
    let exp = add_expense(&conn, Some(id), "5", "Props").to_string();
    let run = |args: &[&str]| {
        let mut argv = vec!["studiobooks"];
        argv.extend_from_slice(args);
        let matches = cli::build_cli().get_matches_from(argv);
        match matches.subcommand() {
            Some(("income", m)) => incomes::handle(&conn, m).unwrap(),
            Some(("expense", m)) => expenses::handle(&conn, m).unwrap(),
            _ => panic!("unexpected command"),
        }
    };

    run(&["income", "update", "--id", &inc, "--note", "cash"]);
    run(&["expense", "update", "--id", &exp, "--note", "receipt lost"]);
    let income = incomes::get(&conn, inc.parse().unwrap()).unwrap();
    assert_eq!(income.note.as_deref(), Some("cash"));

    // Other updates leave the note alone.
    run(&["expense", "update", "--id", &exp, "--amount", "6"]);
    let expense = expenses::get(&conn, exp.parse().unwrap()).unwrap();
    assert_eq!(expense.note.as_deref(), Some("receipt lost"));

    run(&["income", "update", "--id", &inc, "--note", "none"]);
    run(&["expense", "update", "--id", &exp, "--note", "NONE"]);
    assert_eq!(incomes::get(&conn, inc.parse().unwrap()).unwrap().note, None);
    assert_eq!(expenses::get(&conn, exp.parse().unwrap()).unwrap().note, None);
}
