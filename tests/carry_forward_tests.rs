// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use moneyflow::commands::accounts::add_account;
use moneyflow::commands::recurring::{add_recurring, set_override};
use moneyflow::commands::transactions::{NewOneTime, add_one_time};
use moneyflow::db;
use moneyflow::engine::carry::{OpeningSource, end_of_month_balance, resolve_opening_balance};
use moneyflow::engine::month::YearMonth;
use moneyflow::error::BalanceError;
use moneyflow::models::Direction;
use moneyflow::store::Store;
use rusqlite::Connection;
use rust_decimal::Decimal;

const CAP: u32 = 1200;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn ym(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dec(v: i64) -> Decimal {
    Decimal::from(v)
}

fn salary_account(conn: &Connection, live: i64) -> i64 {
    let id = add_account(conn, 1, "Checking", dec(live), None).unwrap();
    add_recurring(conn, 1, Some(id), dec(500), Direction::Income, 25, Some("Salary".into())).unwrap();
    add_recurring(conn, 1, Some(id), dec(200), Direction::Expense, 27, Some("Rent".into())).unwrap();
    id
}

#[test]
fn carries_recurring_items_forward_from_anchor() {
    let conn = setup();
    let id = salary_account(&conn, 0);
    conn.upsert_monthly_snapshot(id, ym(2024, 1), dec(1000)).unwrap();

    let opening = resolve_opening_balance(&conn, id, ym(2024, 4), d(2025, 6, 15), CAP).unwrap();
    assert_eq!(opening.amount, dec(1900));
    assert_eq!(
        opening.source,
        OpeningSource::CarriedForward {
            anchor: ym(2024, 1),
            months: 3
        }
    );
}

#[test]
fn walk_crosses_year_boundary() {
    let conn = setup();
    let id = add_account(&conn, 1, "Wallet", dec(0), None).unwrap();
    add_recurring(&conn, 1, Some(id), dec(10), Direction::Expense, 1, None).unwrap();
    conn.upsert_monthly_snapshot(id, ym(2023, 11), dec(100)).unwrap();
    add_one_time(
        &conn,
        1,
        &NewOneTime {
            account_id: id,
            amount: dec(50),
            direction: Direction::Income,
            date: d(2023, 12, 10),
            description: None,
        },
        d(2025, 6, 15),
    )
    .unwrap();

    // Nov: -10, Dec: +50 -10, Jan: -10
    let opening = resolve_opening_balance(&conn, id, ym(2024, 2), d(2025, 6, 15), CAP).unwrap();
    assert_eq!(opening.amount, dec(120));
}

#[test]
fn recorded_snapshot_wins_over_carry_forward() {
    let conn = setup();
    let id = salary_account(&conn, 0);
    conn.upsert_monthly_snapshot(id, ym(2024, 1), dec(1000)).unwrap();
    conn.upsert_monthly_snapshot(id, ym(2024, 3), dec(42)).unwrap();

    let at_march = resolve_opening_balance(&conn, id, ym(2024, 3), d(2025, 6, 15), CAP).unwrap();
    assert_eq!(at_march.amount, dec(42));
    assert_eq!(at_march.source, OpeningSource::Snapshot);

    // April anchors on the nearest snapshot, not the oldest.
    let at_april = resolve_opening_balance(&conn, id, ym(2024, 4), d(2025, 6, 15), CAP).unwrap();
    assert_eq!(at_april.amount, dec(342));
}

#[test]
fn without_any_snapshot_live_balance_is_returned() {
    let conn = setup();
    let id = salary_account(&conn, 777);
    let today = d(2025, 6, 15);

    for target in [ym(1990, 1), ym(2024, 4), ym(2030, 12)] {
        let opening = resolve_opening_balance(&conn, id, target, today, CAP).unwrap();
        assert_eq!(opening.amount, dec(777));
        assert_eq!(opening.source, OpeningSource::NoHistory);
    }
}

#[test]
fn current_month_uses_live_balance() {
    let conn = setup();
    let id = salary_account(&conn, 5000);
    conn.upsert_monthly_snapshot(id, ym(2025, 1), dec(1000)).unwrap();

    let opening = resolve_opening_balance(&conn, id, ym(2025, 6), d(2025, 6, 15), CAP).unwrap();
    assert_eq!(opening.amount, dec(5000));
    assert_eq!(opening.source, OpeningSource::LiveBalance);
}

#[test]
fn future_months_project_from_current_snapshot() {
    let conn = setup();
    let id = salary_account(&conn, 5000);
    conn.upsert_monthly_snapshot(id, ym(2025, 6), dec(5000)).unwrap();

    let opening = resolve_opening_balance(&conn, id, ym(2025, 9), d(2025, 6, 15), CAP).unwrap();
    assert_eq!(opening.amount, dec(5900));
}

#[test]
fn override_changes_a_single_month() {
    let conn = setup();
    let id = add_account(&conn, 1, "Card", dec(0), None).unwrap();
    let bill = add_recurring(&conn, 1, Some(id), dec(200), Direction::Expense, 10, None).unwrap();
    set_override(&conn, 1, bill, ym(2024, 2), Some(dec(500)), d(2025, 6, 15)).unwrap();
    conn.upsert_monthly_snapshot(id, ym(2024, 1), dec(1000)).unwrap();

    let opening = resolve_opening_balance(&conn, id, ym(2024, 4), d(2025, 6, 15), CAP).unwrap();
    assert_eq!(opening.amount, dec(100));
}

#[test]
fn long_walk_is_linear_in_month_distance() {
    let conn = setup();
    let id = salary_account(&conn, 0);
    conn.upsert_monthly_snapshot(id, ym(2010, 1), dec(0)).unwrap();

    let opening = resolve_opening_balance(&conn, id, ym(2020, 1), d(2025, 6, 15), CAP).unwrap();
    assert_eq!(opening.amount, dec(120 * 300));
}

#[test]
fn walk_beyond_limit_falls_back_to_live_balance() {
    let conn = setup();
    let id = salary_account(&conn, 999);
    conn.upsert_monthly_snapshot(id, ym(2000, 1), dec(5)).unwrap();

    let opening = resolve_opening_balance(&conn, id, ym(2024, 1), d(2025, 6, 15), 12).unwrap();
    assert_eq!(opening.amount, dec(999));
    assert_eq!(
        opening.source,
        OpeningSource::WalkLimit {
            anchor: ym(2000, 1),
            months: 288
        }
    );
}

#[test]
fn unknown_account_is_an_error() {
    let conn = setup();
    let err = resolve_opening_balance(&conn, 42, ym(2024, 1), d(2025, 6, 15), CAP).unwrap_err();
    assert!(matches!(err, BalanceError::AccountNotFound(42)));
}

#[test]
fn end_of_month_adds_the_month_itself() {
    let conn = setup();
    let id = salary_account(&conn, 0);
    conn.upsert_monthly_snapshot(id, ym(2024, 1), dec(1000)).unwrap();

    let end = end_of_month_balance(&conn, id, ym(2024, 4), d(2025, 6, 15), CAP).unwrap();
    assert_eq!(end, dec(2200));
}

#[test]
fn walk_overflow_is_an_error() {
    let conn = setup();
    let id = add_account(&conn, 1, "Wallet", dec(0), None).unwrap();
    conn.upsert_monthly_snapshot(id, ym(2024, 4), Decimal::MAX).unwrap();
    add_recurring(&conn, 1, Some(id), dec(1), Direction::Income, 1, None).unwrap();

    let err = resolve_opening_balance(&conn, id, ym(2024, 6), d(2025, 6, 15), CAP).unwrap_err();
    assert!(matches!(err, BalanceError::Overflow));
}
