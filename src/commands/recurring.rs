// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::EngineConfig;
use crate::engine::invalidation::invalidate_future_monthly_balances;
use crate::engine::month::YearMonth;
use crate::error::BalanceError;
use crate::models::{Direction, ensure_non_negative};
use crate::store::Store;
use crate::utils::{
    fmt_money, id_for_account, maybe_print_json, parse_amount, parse_direction, parse_month,
    pretty_table, today,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let cfg = EngineConfig::load(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let account_id = match sub.get_one::<String>("account") {
                Some(name) => Some(id_for_account(conn, cfg.user_id, name)?),
                None => None,
            };
            let day = *sub.get_one::<u32>("day").unwrap();
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            let direction = parse_direction(sub.get_one::<String>("type").unwrap())?;
            let note = sub.get_one::<String>("note").map(|s| s.trim().to_string());
            let id = add_recurring(conn, cfg.user_id, account_id, amount, direction, day, note)?;
            println!(
                "Added recurring #{}: {} {} on day {}",
                id,
                direction,
                fmt_money(&amount),
                day
            );
        }
        Some(("list", sub)) => list(conn, &cfg, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "DELETE FROM recurring_transactions WHERE id=?1 AND user_id=?2",
                params![id, cfg.user_id],
            )?;
            if n == 0 {
                return Err(BalanceError::RecurringNotFound(id).into());
            }
            println!("Removed recurring #{}", id);
        }
        Some(("override", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let month = parse_month(sub.get_one::<String>("month").unwrap())?;
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            set_override(conn, cfg.user_id, id, month, Some(amount), today())?;
            println!("Recurring #{} uses {} in {}", id, fmt_money(&amount), month);
        }
        Some(("clear-override", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let month = parse_month(sub.get_one::<String>("month").unwrap())?;
            set_override(conn, cfg.user_id, id, month, None, today())?;
            println!("Recurring #{} uses its default amount in {}", id, month);
        }
        _ => {}
    }
    Ok(())
}

pub fn add_recurring(
    conn: &Connection,
    user_id: i64,
    account_id: Option<i64>,
    amount: Decimal,
    direction: Direction,
    day_of_month: u32,
    description: Option<String>,
) -> Result<i64> {
    if !(1..=31).contains(&day_of_month) {
        return Err(BalanceError::InvalidDayOfMonth(day_of_month).into());
    }
    ensure_non_negative(amount)?;
    if let Some(id) = account_id {
        match conn.account(id)? {
            Some(a) if a.user_id == user_id => {}
            _ => return Err(BalanceError::AccountNotFound(id).into()),
        }
    }
    conn.execute(
        "INSERT INTO recurring_transactions(user_id, account_id, amount, direction, day_of_month, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            account_id,
            amount.to_string(),
            direction.as_str(),
            day_of_month,
            description
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Sets (`Some`) or clears (`None`) the amount used by a recurring item in one
/// month. Changing a month that has already started drops later snapshots.
pub fn set_override(
    conn: &Connection,
    user_id: i64,
    recurring_id: i64,
    month: YearMonth,
    amount: Option<Decimal>,
    today: NaiveDate,
) -> Result<()> {
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM recurring_transactions WHERE id=?1 AND user_id=?2",
        params![recurring_id, user_id],
        |r| r.get(0),
    )?;
    if exists == 0 {
        return Err(BalanceError::RecurringNotFound(recurring_id).into());
    }

    let db = conn.unchecked_transaction()?;
    match amount {
        Some(a) => {
            ensure_non_negative(a)?;
            db.execute(
                "INSERT INTO recurring_transaction_amounts(recurring_id, year, month, amount) VALUES (?1,?2,?3,?4)
                 ON CONFLICT(recurring_id, year, month) DO UPDATE SET amount=excluded.amount",
                params![recurring_id, month.year(), month.month(), a.to_string()],
            )?;
        }
        None => {
            db.execute(
                "DELETE FROM recurring_transaction_amounts WHERE recurring_id=?1 AND year=?2 AND month=?3",
                params![recurring_id, month.year(), month.month()],
            )?;
        }
    }
    if month.first_day() <= today {
        invalidate_future_monthly_balances(&*db, user_id, month)?;
    }
    db.commit()?;
    Ok(())
}

#[derive(Serialize)]
struct RecurringRow {
    id: i64,
    account: String,
    day: u32,
    direction: String,
    amount: String,
    note: String,
}

fn list(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let mut data = Vec::new();
    for account in conn.accounts(cfg.user_id)? {
        for r in conn.recurring_transactions(account.id)? {
            data.push(RecurringRow {
                id: r.id,
                account: account.name.clone(),
                day: r.day_of_month,
                direction: r.direction.to_string(),
                amount: fmt_money(&r.amount),
                note: r.description.unwrap_or_default(),
            });
        }
    }
    for r in conn.unassigned_recurring(cfg.user_id)? {
        data.push(RecurringRow {
            id: r.id,
            account: "(none)".into(),
            day: r.day_of_month,
            direction: r.direction.to_string(),
            amount: fmt_money(&r.amount),
            note: r.description.unwrap_or_default(),
        });
    }

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.account.clone(),
                    r.day.to_string(),
                    r.direction.clone(),
                    r.amount.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Account", "Day", "Type", "Amount", "Note"], rows)
        );
    }
    Ok(())
}
