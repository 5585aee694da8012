// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use studiobooks::commands::{budgets, reports};
use studiobooks::{cli, db};

fn setup() -> Connection {
    db::open_in_memory().unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn seed(conn: &Connection) {
    conn.execute_batch(
        r#"
        INSERT INTO projects(id, code, name, status, amount, outsourcing_amt, received_amt, pending_amt, profit)
            VALUES (1, 'PRJ-0001', 'Wedding', 'active', '50000', '10000', '20000', '30000', '5000');
        INSERT INTO projects(id, code, name, status, amount, outsourcing_amt, received_amt, pending_amt, profit)
            VALUES (2, 'PRJ-0002', 'Catalogue', 'completed', '8000', '0', '8000', '0', '7600');
        INSERT INTO incomes(project_id, amount, date) VALUES (1, '20000', '2025-03-02');
        INSERT INTO incomes(project_id, amount, date) VALUES (2, '8000', '2025-04-11');
        INSERT INTO incomes(project_id, amount, date) VALUES (NULL, '150', '2025-04-20');
        INSERT INTO expenses(project_id, amount, category, date) VALUES (1, '5000', 'Travel', '2025-03-03');
        INSERT INTO expenses(project_id, amount, category, date) VALUES (2, '400', 'Printing', '2025-04-12');
        INSERT INTO expenses(project_id, amount, category, date) VALUES (NULL, '99.50', 'Travel', '2025-04-15');
        "#,
    )
    .unwrap();
}

#[test]
fn read_views_tolerate_an_empty_database() {
    let conn = setup();
    let d = reports::dashboard(&conn).unwrap();
    assert_eq!(d.projects, 0);
    assert!(d.received.is_zero());
    assert!(d.profit.is_zero());
    assert!(reports::by_category(&conn, None).unwrap().is_empty());
    assert!(reports::by_month(&conn, 12).unwrap().is_empty());
    assert!(reports::by_project(&conn).unwrap().is_empty());
    assert!(budgets::budget_vs_actual(&conn, "2025-04").unwrap().is_empty());
}

#[test]
fn dashboard_sums_stored_figures() {
    let conn = setup();
    seed(&conn);
    let d = reports::dashboard(&conn).unwrap();
    assert_eq!(d.projects, 2);
    assert_eq!(d.active_projects, 1);
    assert_eq!(d.contract_value, dec("58000"));
    assert_eq!(d.received, dec("28000"));
    assert_eq!(d.pending, dec("30000"));
    assert_eq!(d.outsourcing, dec("10000"));
    assert_eq!(d.expenses, dec("5499.50"));
    assert_eq!(d.profit, dec("12600"));
    assert_eq!(d.unassigned_income, dec("150"));
    assert_eq!(d.unassigned_expenses, dec("99.50"));
}

#[test]
fn totals_by_category_month_and_project() {
    let conn = setup();
    seed(&conn);

    let cats = reports::by_category(&conn, None).unwrap();
    assert_eq!(cats[0].category, "Travel");
    assert_eq!(cats[0].count, 2);
    assert_eq!(cats[0].total, dec("5099.50"));
    let april = reports::by_category(&conn, Some("2025-04")).unwrap();
    assert_eq!(april.len(), 2);

    let months = reports::by_month(&conn, 12).unwrap();
    assert_eq!(months[0].month, "2025-04");
    assert_eq!(months[0].income, dec("8150"));
    assert_eq!(months[0].expense, dec("499.50"));
    assert_eq!(months[0].net, dec("7650.50"));
    assert_eq!(reports::by_month(&conn, 1).unwrap().len(), 1);

    let per_project = reports::by_project(&conn).unwrap();
    assert_eq!(per_project[0].code, "PRJ-0001");
    assert_eq!(per_project[0].expenses, dec("5000"));
    assert_eq!(per_project[1].pending, Decimal::ZERO);
}

#[test]
fn budget_vs_actual_joins_plans_and_spend() {
    let conn = setup();
    seed(&conn);
    let matches = cli::build_cli().get_matches_from([
        "studiobooks",
        "budget",
        "set",
        "--month",
        " 2025-04 ",
        "--category",
        " Travel ",
        "--amount",
        "250",
    ]);
    if let Some(("budget", m)) = matches.subcommand() {
        budgets::handle(&conn, m).unwrap();
    } else {
        panic!("budget command not parsed");
    }
    conn.execute(
        "INSERT INTO budgets(month, category, amount) VALUES (?1, 'Gear', '1000')",
        params!["2025-04"],
    )
    .unwrap();

    let lines = budgets::budget_vs_actual(&conn, "2025-04").unwrap();
    let names: Vec<&str> = lines.iter().map(|l| l.category.as_str()).collect();
    assert_eq!(names, ["Gear", "Printing", "Travel"]);
    let travel = &lines[2];
    assert_eq!(travel.budget, dec("250"));
    assert_eq!(travel.spent, dec("99.50"));
    assert_eq!(travel.remaining, dec("150.50"));
    let printing = &lines[1];
    assert!(printing.budget.is_zero());
    assert_eq!(printing.remaining, dec("-400"));
}
