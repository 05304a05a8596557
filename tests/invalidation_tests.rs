// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use moneyflow::commands::accounts::add_account;
use moneyflow::commands::recurring::{add_recurring, set_override};
use moneyflow::commands::transactions::{NewOneTime, OneTimeEdit, add_one_time, edit_one_time};
use moneyflow::config::EngineConfig;
use moneyflow::{cli, commands::balances, db};
use moneyflow::engine::carry::OpeningSource;
use moneyflow::engine::invalidation::{
    invalidate_future_monthly_balances, record_monthly_balances, record_proactive,
};
use moneyflow::engine::month::YearMonth;
use moneyflow::engine::summary::monthly_summary;
use moneyflow::models::Direction;
use moneyflow::store::Store;
use rusqlite::Connection;
use rust_decimal::Decimal;

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

fn months_recorded(conn: &Connection, account_id: i64) -> Vec<YearMonth> {
    conn.monthly_snapshots(Some(account_id))
        .unwrap()
        .into_iter()
        .map(|s| s.month)
        .collect()
}

fn seed_half_year(conn: &Connection, account_id: i64) {
    for m in 1..=6 {
        conn.upsert_monthly_snapshot(account_id, ym(2024, m), dec(100 * m as i64))
            .unwrap();
    }
}

#[test]
fn invalidation_drops_later_months_and_summary_carries_forward() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    seed_half_year(&conn, a);

    let removed = invalidate_future_monthly_balances(&conn, 1, ym(2024, 3)).unwrap();
    assert_eq!(removed, 3);
    assert_eq!(months_recorded(&conn, a), vec![ym(2024, 1), ym(2024, 2), ym(2024, 3)]);

    let summary =
        monthly_summary(&conn, 1, ym(2024, 5), d(2025, 6, 20), &EngineConfig::default()).unwrap();
    assert_eq!(
        summary.per_account[0].opening_source,
        OpeningSource::CarriedForward {
            anchor: ym(2024, 3),
            months: 2
        }
    );
    assert_eq!(summary.per_account[0].opening_balance, dec(300));
}

#[test]
fn invalidating_twice_removes_nothing_more() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    seed_half_year(&conn, a);

    assert_eq!(invalidate_future_monthly_balances(&conn, 1, ym(2024, 2)).unwrap(), 4);
    assert_eq!(invalidate_future_monthly_balances(&conn, 1, ym(2024, 2)).unwrap(), 0);
}

#[test]
fn invalidation_is_scoped_to_the_user() {
    let conn = setup();
    let mine = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    let theirs = add_account(&conn, 2, "Checking", dec(0), None).unwrap();
    seed_half_year(&conn, mine);
    seed_half_year(&conn, theirs);

    invalidate_future_monthly_balances(&conn, 1, ym(2024, 1)).unwrap();
    assert_eq!(months_recorded(&conn, mine).len(), 1);
    assert_eq!(months_recorded(&conn, theirs).len(), 6);
}

#[test]
fn backdated_transaction_invalidates_after_its_month() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    seed_half_year(&conn, a);

    let tx = NewOneTime {
        account_id: a,
        amount: dec(40),
        direction: Direction::Expense,
        date: d(2024, 2, 10),
        description: Some("Late bill".into()),
    };
    add_one_time(&conn, 1, &tx, d(2025, 6, 20)).unwrap();
    assert_eq!(months_recorded(&conn, a), vec![ym(2024, 1), ym(2024, 2)]);
}

#[test]
fn future_transaction_keeps_snapshots() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    seed_half_year(&conn, a);

    let tx = NewOneTime {
        account_id: a,
        amount: dec(40),
        direction: Direction::Income,
        date: d(2025, 7, 1),
        description: None,
    };
    add_one_time(&conn, 1, &tx, d(2025, 6, 20)).unwrap();
    assert_eq!(months_recorded(&conn, a).len(), 6);
}

#[test]
fn moving_a_transaction_earlier_invalidates_from_the_earlier_month() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    let tx = NewOneTime {
        account_id: a,
        amount: dec(40),
        direction: Direction::Expense,
        date: d(2024, 5, 10),
        description: None,
    };
    let id = add_one_time(&conn, 1, &tx, d(2025, 6, 20)).unwrap();
    seed_half_year(&conn, a);

    let note_only = OneTimeEdit {
        description: Some("groceries".into()),
        ..OneTimeEdit::default()
    };
    edit_one_time(&conn, 1, id, &note_only, d(2025, 6, 20)).unwrap();
    assert_eq!(months_recorded(&conn, a).len(), 6);

    let moved = OneTimeEdit {
        date: Some(d(2024, 2, 1)),
        ..OneTimeEdit::default()
    };
    edit_one_time(&conn, 1, id, &moved, d(2025, 6, 20)).unwrap();
    assert_eq!(months_recorded(&conn, a), vec![ym(2024, 1), ym(2024, 2)]);
}

#[test]
fn override_for_started_month_invalidates_later_months() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    let rent = add_recurring(&conn, 1, Some(a), dec(700), Direction::Expense, 1, None).unwrap();
    seed_half_year(&conn, a);

    set_override(&conn, 1, rent, ym(2025, 9), Some(dec(750)), d(2025, 6, 20)).unwrap();
    assert_eq!(months_recorded(&conn, a).len(), 6);

    set_override(&conn, 1, rent, ym(2024, 4), Some(dec(750)), d(2025, 6, 20)).unwrap();
    assert_eq!(months_recorded(&conn, a).len(), 4);
}

#[test]
fn recording_twice_is_idempotent() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    add_recurring(&conn, 1, Some(a), dec(500), Direction::Income, 25, None).unwrap();
    add_recurring(&conn, 1, Some(a), dec(200), Direction::Expense, 27, None).unwrap();
    conn.upsert_monthly_snapshot(a, ym(2024, 1), dec(1000)).unwrap();

    let first = record_monthly_balances(&conn, 1, ym(2024, 4), d(2025, 6, 20), 1200);
    assert!(first.success);
    assert_eq!(first.recorded, 1);
    assert_eq!(conn.monthly_snapshot(a, ym(2024, 4)).unwrap(), Some(dec(1900)));

    let second = record_monthly_balances(&conn, 1, ym(2024, 4), d(2025, 6, 20), 1200);
    assert!(second.success);
    assert_eq!(second.recorded, 0);
    assert_eq!(conn.monthly_snapshot(a, ym(2024, 4)).unwrap(), Some(dec(1900)));
}

#[test]
fn proactive_recording_only_inside_window() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(1234), None).unwrap();

    assert_eq!(record_proactive(&conn, 1, d(2025, 3, 6), 5).unwrap(), 0);
    assert!(months_recorded(&conn, a).is_empty());

    assert_eq!(record_proactive(&conn, 1, d(2025, 3, 5), 5).unwrap(), 1);
    assert_eq!(conn.monthly_snapshot(a, ym(2025, 3)).unwrap(), Some(dec(1234)));
    assert_eq!(record_proactive(&conn, 1, d(2025, 3, 5), 5).unwrap(), 0);
}

#[test]
fn failed_recording_is_reported_as_an_error() {
    let conn = setup();
    conn.execute(
        "INSERT INTO accounts(user_id, name, current_balance) VALUES (1, 'Broken', 'not-a-number')",
        [],
    )
    .unwrap();

    let outcome = record_monthly_balances(&conn, 1, ym(2024, 4), d(2025, 6, 20), 1200);
    assert!(!outcome.success);
    assert!(outcome.error.is_some());

    let matches =
        cli::build_cli().get_matches_from(["moneyflow", "balances", "record", "--month", "2024-04", "--json"]);
    if let Some(("balances", balances_m)) = matches.subcommand() {
        assert!(balances::handle(&conn, balances_m).is_err());
    } else {
        panic!("no balances subcommand");
    }
}
