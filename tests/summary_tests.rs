// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use moneyflow::commands::accounts::add_account;
use moneyflow::commands::recurring::add_recurring;
use moneyflow::commands::transactions::{NewOneTime, add_one_time};
use moneyflow::config::EngineConfig;
use moneyflow::db;
use moneyflow::engine::carry::OpeningSource;
use moneyflow::engine::ledger::transactions_for_account_and_month;
use moneyflow::engine::month::YearMonth;
use moneyflow::engine::summary::monthly_summary;
use moneyflow::error::BalanceError;
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

fn one_time(conn: &Connection, account_id: i64, amount: i64, direction: Direction, date: NaiveDate) {
    let tx = NewOneTime {
        account_id,
        amount: dec(amount),
        direction,
        date,
        description: None,
    };
    add_one_time(conn, 1, &tx, d(2025, 6, 20)).unwrap();
}

#[test]
fn timeline_runs_in_date_order_and_ends_at_end_balance() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    let b = add_account(&conn, 1, "Savings", dec(0), None).unwrap();
    conn.upsert_monthly_snapshot(a, ym(2024, 5), dec(1000)).unwrap();
    conn.upsert_monthly_snapshot(b, ym(2024, 5), dec(500)).unwrap();

    one_time(&conn, a, 100, Direction::Expense, d(2024, 5, 20));
    one_time(&conn, a, 300, Direction::Income, d(2024, 5, 3));
    add_recurring(&conn, 1, Some(a), dec(50), Direction::Expense, 31, None).unwrap();
    add_recurring(&conn, 1, Some(a), dec(20), Direction::Income, 1, None).unwrap();

    let summary = monthly_summary(&conn, 1, ym(2024, 5), d(2025, 6, 20), &EngineConfig::default()).unwrap();
    let checking = &summary.per_account[0];
    assert_eq!(checking.opening_balance, dec(1000));
    assert_eq!(checking.opening_source, OpeningSource::Snapshot);
    assert_eq!(checking.income, dec(320));
    assert_eq!(checking.expense, dec(150));

    let dates: Vec<NaiveDate> = checking.timeline.iter().map(|t| t.entry.date).collect();
    assert_eq!(
        dates,
        vec![d(2024, 5, 1), d(2024, 5, 3), d(2024, 5, 20), d(2024, 5, 31)]
    );
    let balances: Vec<Decimal> = checking.timeline.iter().map(|t| t.balance).collect();
    assert_eq!(balances, vec![dec(1020), dec(1320), dec(1220), dec(1170)]);
    assert_eq!(checking.end_balance, dec(1170));

    assert_eq!(summary.per_account[1].end_balance, dec(500));
    assert_eq!(summary.total_end_of_month_balance, dec(1670));
    assert_eq!(summary.net_balance, dec(170));
}

#[test]
fn day_31_item_lands_on_last_day_of_february() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    add_recurring(&conn, 1, Some(a), dec(10), Direction::Expense, 31, None).unwrap();

    let ledger = transactions_for_account_and_month(&conn, a, ym(2024, 2)).unwrap();
    let entries = ledger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].date, d(2024, 2, 29));
}

#[test]
fn unassigned_items_count_in_totals_only() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    conn.upsert_monthly_snapshot(a, ym(2024, 5), dec(1000)).unwrap();
    add_recurring(&conn, 1, Some(a), dec(200), Direction::Income, 10, None).unwrap();
    add_recurring(&conn, 1, None, dec(80), Direction::Expense, 15, Some("Pension".into())).unwrap();

    let summary = monthly_summary(&conn, 1, ym(2024, 5), d(2025, 6, 20), &EngineConfig::default()).unwrap();
    assert_eq!(summary.unassigned.len(), 1);
    assert_eq!(summary.total_income, dec(200));
    assert_eq!(summary.total_expense, dec(80));
    assert_eq!(summary.net_balance, dec(120));
    assert_eq!(summary.total_end_of_month_balance, dec(1200));
}

#[test]
fn transfers_do_not_change_totals_across_accounts() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    let b = add_account(&conn, 1, "Savings", dec(0), None).unwrap();
    conn.upsert_monthly_snapshot(a, ym(2024, 5), dec(1000)).unwrap();
    conn.upsert_monthly_snapshot(b, ym(2024, 5), dec(0)).unwrap();
    moneyflow::commands::transactions::create_transfer(
        &conn,
        1,
        a,
        b,
        dec(300),
        d(2024, 5, 10),
        None,
        d(2025, 6, 20),
    )
    .unwrap();

    let summary = monthly_summary(&conn, 1, ym(2024, 5), d(2025, 6, 20), &EngineConfig::default()).unwrap();
    assert_eq!(summary.net_balance, Decimal::ZERO);
    assert_eq!(summary.per_account[0].end_balance, dec(700));
    assert_eq!(summary.per_account[1].end_balance, dec(300));
    assert_eq!(summary.total_end_of_month_balance, dec(1000));
}

#[test]
fn summary_records_current_month_inside_window() {
    let conn = setup();
    add_account(&conn, 1, "Checking", dec(1500), None).unwrap();
    add_account(&conn, 1, "Savings", dec(250), None).unwrap();
    let cfg = EngineConfig::default();

    let first = monthly_summary(&conn, 1, ym(2025, 3), d(2025, 3, 2), &cfg).unwrap();
    assert_eq!(first.snapshots_recorded, 2);
    assert_eq!(first.per_account[0].opening_balance, dec(1500));
    assert_eq!(first.per_account[0].opening_source, OpeningSource::Snapshot);

    let second = monthly_summary(&conn, 1, ym(2025, 3), d(2025, 3, 2), &cfg).unwrap();
    assert_eq!(second.snapshots_recorded, 0);
    assert_eq!(conn.monthly_snapshots(None).unwrap().len(), 2);
}

#[test]
fn summary_outside_window_reads_live_balance() {
    let conn = setup();
    add_account(&conn, 1, "Checking", dec(1500), None).unwrap();

    let summary =
        monthly_summary(&conn, 1, ym(2025, 3), d(2025, 3, 20), &EngineConfig::default()).unwrap();
    assert_eq!(summary.snapshots_recorded, 0);
    assert_eq!(summary.per_account[0].opening_source, OpeningSource::LiveBalance);
    assert_eq!(summary.per_account[0].opening_balance, dec(1500));
    assert!(conn.monthly_snapshots(None).unwrap().is_empty());
}

#[test]
fn empty_user_has_zero_summary() {
    let conn = setup();
    let summary =
        monthly_summary(&conn, 7, ym(2024, 1), d(2025, 6, 20), &EngineConfig::default()).unwrap();
    assert!(summary.per_account.is_empty());
    assert_eq!(summary.total_income, Decimal::ZERO);
    assert_eq!(summary.total_end_of_month_balance, Decimal::ZERO);
}

#[test]
fn amounts_beyond_decimal_range_fail_instead_of_panicking() {
    let conn = setup();
    let a = add_account(&conn, 1, "Checking", dec(0), None).unwrap();
    conn.upsert_monthly_snapshot(a, ym(2024, 5), dec(0)).unwrap();
    for day in [3, 4] {
        let tx = NewOneTime {
            account_id: a,
            amount: Decimal::MAX,
            direction: Direction::Income,
            date: d(2024, 5, day),
            description: None,
        };
        add_one_time(&conn, 1, &tx, d(2025, 6, 20)).unwrap();
    }

    let err = monthly_summary(&conn, 1, ym(2024, 5), d(2025, 6, 20), &EngineConfig::default())
        .unwrap_err();
    assert!(matches!(err, BalanceError::Overflow));
}
