// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! One-time transactions and transfers.
//!
//! Every write that touches a date before today drops the monthly snapshots
//! after that month so the next summary recomputes them.

use crate::config::EngineConfig;
use crate::engine::invalidation::invalidate_for_transaction_change;
use crate::error::BalanceError;
use crate::models::{DateRange, Direction, OneTimeTransaction, ensure_non_negative};
use crate::store::Store;
use crate::utils::{
    fmt_money, id_for_account, maybe_print_json, parse_amount, parse_date, parse_direction,
    parse_month, pretty_table, today,
};
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let cfg = EngineConfig::load(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => add(conn, &cfg, sub)?,
        Some(("list", sub)) => list(conn, &cfg, sub)?,
        Some(("edit", sub)) => edit(conn, &cfg, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let removed = delete_one_time(conn, cfg.user_id, id, today())?;
            println!("Removed {} transaction(s)", removed);
        }
        Some(("transfer", sub)) => transfer(conn, &cfg, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewOneTime {
    pub account_id: i64,
    pub amount: Decimal,
    pub direction: Direction,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Fields to change on an existing one-time transaction; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct OneTimeEdit {
    pub amount: Option<Decimal>,
    pub direction: Option<Direction>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

fn insert_one_time(
    conn: &Connection,
    user_id: i64,
    tx: &NewOneTime,
    transfer_id: Option<i64>,
) -> Result<i64> {
    ensure_non_negative(tx.amount)?;
    match conn.account(tx.account_id)? {
        Some(a) if a.user_id == user_id => {}
        _ => return Err(BalanceError::AccountNotFound(tx.account_id).into()),
    }
    conn.execute(
        "INSERT INTO one_time_transactions(account_id, amount, direction, date, description, transfer_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            tx.account_id,
            tx.amount.to_string(),
            tx.direction.as_str(),
            tx.date.to_string(),
            tx.description,
            transfer_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn add_one_time(
    conn: &Connection,
    user_id: i64,
    tx: &NewOneTime,
    today: NaiveDate,
) -> Result<i64> {
    let db = conn.unchecked_transaction()?;
    let id = insert_one_time(&db, user_id, tx, None)?;
    invalidate_for_transaction_change(&*db, user_id, &[tx.date], today)?;
    db.commit()?;
    Ok(id)
}

/// Loads a one-time transaction owned by `user_id`. Other users' ids are
/// reported as not found.
pub fn get_one_time(conn: &Connection, user_id: i64, id: i64) -> Result<OneTimeTransaction> {
    let raw: Option<(i64, String, String, String, Option<String>, Option<i64>)> = conn
        .query_row(
            "SELECT t.account_id, t.amount, t.direction, t.date, t.description, t.transfer_id
             FROM one_time_transactions t JOIN accounts a ON t.account_id=a.id
             WHERE t.id=?1 AND a.user_id=?2",
            params![id, user_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?)),
        )
        .optional()?;
    let (account_id, amount, direction, date, description, transfer_id) =
        raw.ok_or(BalanceError::TransactionNotFound(id))?;
    Ok(OneTimeTransaction {
        id,
        account_id,
        amount: crate::store::parse_amount(&amount)?,
        direction: direction.parse::<Direction>()?,
        date: parse_date(&date)?,
        description,
        transfer_id,
    })
}

pub fn edit_one_time(
    conn: &Connection,
    user_id: i64,
    id: i64,
    edit: &OneTimeEdit,
    today: NaiveDate,
) -> Result<OneTimeTransaction> {
    let old = get_one_time(conn, user_id, id)?;
    let updated = OneTimeTransaction {
        amount: ensure_non_negative(edit.amount.unwrap_or(old.amount))?,
        direction: edit.direction.unwrap_or(old.direction),
        date: edit.date.unwrap_or(old.date),
        description: edit.description.clone().or_else(|| old.description.clone()),
        ..old.clone()
    };

    let db = conn.unchecked_transaction()?;
    db.execute(
        "UPDATE one_time_transactions SET amount=?1, direction=?2, date=?3, description=?4 WHERE id=?5",
        params![
            updated.amount.to_string(),
            updated.direction.as_str(),
            updated.date.to_string(),
            updated.description,
            id
        ],
    )?;
    let moved = updated.amount != old.amount
        || updated.direction != old.direction
        || updated.date != old.date;
    if moved {
        invalidate_for_transaction_change(&*db, user_id, &[old.date, updated.date], today)?;
    }
    db.commit()?;
    Ok(updated)
}

/// Deletes a one-time transaction. Deleting either leg of a transfer deletes
/// both legs. Returns the number of rows removed.
pub fn delete_one_time(conn: &Connection, user_id: i64, id: i64, today: NaiveDate) -> Result<usize> {
    let tx = get_one_time(conn, user_id, id)?;
    let legs = match tx.transfer_id {
        Some(transfer_id) => transfer_legs(conn, user_id, transfer_id)?,
        None => vec![tx],
    };

    let db = conn.unchecked_transaction()?;
    for leg in &legs {
        db.execute("DELETE FROM one_time_transactions WHERE id=?1", params![leg.id])?;
    }
    if let Some(transfer_id) = legs.first().and_then(|l| l.transfer_id) {
        db.execute("DELETE FROM transfers WHERE id=?1", params![transfer_id])?;
    }
    let dates: Vec<NaiveDate> = legs.iter().map(|l| l.date).collect();
    invalidate_for_transaction_change(&*db, user_id, &dates, today)?;
    db.commit()?;
    info!(id, legs = legs.len(), "deleted one-time transaction");
    Ok(legs.len())
}

pub fn transfer_legs(
    conn: &Connection,
    user_id: i64,
    transfer_id: i64,
) -> Result<Vec<OneTimeTransaction>> {
    let mut stmt = conn.prepare(
        "SELECT t.id FROM one_time_transactions t JOIN accounts a ON t.account_id=a.id
         WHERE t.transfer_id=?1 AND a.user_id=?2 ORDER BY t.id",
    )?;
    let ids = stmt
        .query_map(params![transfer_id, user_id], |r| r.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    ids.into_iter().map(|id| get_one_time(conn, user_id, id)).collect()
}

/// Records a transfer as an expense on `from` and an income on `to`, both
/// linked by a shared transfer id which is returned.
pub fn create_transfer(
    conn: &Connection,
    user_id: i64,
    from: i64,
    to: i64,
    amount: Decimal,
    date: NaiveDate,
    description: Option<String>,
    today: NaiveDate,
) -> Result<i64> {
    if from == to {
        return Err(anyhow!("Transfer source and destination must differ"));
    }
    ensure_non_negative(amount)?;

    let db = conn.unchecked_transaction()?;
    db.execute("INSERT INTO transfers DEFAULT VALUES", [])?;
    let transfer_id = db.last_insert_rowid();
    for (account_id, direction) in [(from, Direction::Expense), (to, Direction::Income)] {
        let leg = NewOneTime {
            account_id,
            amount,
            direction,
            date,
            description: description.clone(),
        };
        insert_one_time(&db, user_id, &leg, Some(transfer_id))?;
    }
    invalidate_for_transaction_change(&*db, user_id, &[date], today)?;
    db.commit()?;
    Ok(transfer_id)
}

fn add(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let account_name = sub.get_one::<String>("account").unwrap();
    let tx = NewOneTime {
        account_id: id_for_account(conn, cfg.user_id, account_name)?,
        amount: parse_amount(sub.get_one::<String>("amount").unwrap())?,
        direction: parse_direction(sub.get_one::<String>("type").unwrap())?,
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
        description: sub.get_one::<String>("note").map(|s| s.trim().to_string()),
    };
    let id = add_one_time(conn, cfg.user_id, &tx, today())?;
    println!(
        "Recorded #{} {} {} on {} (acct: {})",
        id,
        tx.direction,
        fmt_money(&tx.amount),
        tx.date,
        account_name.trim()
    );
    Ok(())
}

fn edit(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let edit = OneTimeEdit {
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_amount(s))
            .transpose()?,
        direction: sub
            .get_one::<String>("type")
            .map(|s| parse_direction(s))
            .transpose()?,
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
        description: sub.get_one::<String>("note").map(|s| s.trim().to_string()),
    };
    let updated = edit_one_time(conn, cfg.user_id, id, &edit, today())?;
    println!(
        "Updated #{}: {} {} on {}",
        id,
        updated.direction,
        fmt_money(&updated.amount),
        updated.date
    );
    Ok(())
}

fn transfer(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let from_name = sub.get_one::<String>("from").unwrap();
    let to_name = sub.get_one::<String>("to").unwrap();
    let from = id_for_account(conn, cfg.user_id, from_name)?;
    let to = id_for_account(conn, cfg.user_id, to_name)?;
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let note = sub.get_one::<String>("note").map(|s| s.trim().to_string());
    let transfer_id = create_transfer(conn, cfg.user_id, from, to, amount, date, note, today())?;
    println!(
        "Transfer #{}: {} from '{}' to '{}' on {}",
        transfer_id,
        fmt_money(&amount),
        from_name.trim(),
        to_name.trim(),
        date
    );
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub account: String,
    pub direction: String,
    pub amount: String,
    pub note: String,
    pub transfer_id: Option<i64>,
}

fn list(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, cfg.user_id, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.account.clone(),
                    r.direction.clone(),
                    r.amount.clone(),
                    r.note.clone(),
                    r.transfer_id.map(|t| t.to_string()).unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Account", "Type", "Amount", "Note", "Transfer"],
                rows
            )
        );
    }
    Ok(())
}

pub fn query_rows(
    conn: &Connection,
    user_id: i64,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let account_id = match sub.get_one::<String>("account") {
        Some(name) => Some(id_for_account(conn, user_id, name)?),
        None => None,
    };
    let range = match sub.get_one::<String>("month") {
        Some(m) => Some(DateRange::month(parse_month(m)?)),
        None => None,
    };
    let names: std::collections::HashMap<i64, String> = conn
        .accounts(user_id)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();

    let mut txs: Vec<OneTimeTransaction> = conn
        .one_time_transactions(account_id, range)?
        .into_iter()
        .filter(|t| names.contains_key(&t.account_id))
        .collect();
    txs.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id)));
    if let Some(limit) = sub.get_one::<usize>("limit") {
        txs.truncate(*limit);
    }

    Ok(txs
        .into_iter()
        .map(|t| TransactionRow {
            id: t.id,
            date: t.date.to_string(),
            account: names.get(&t.account_id).cloned().unwrap_or_default(),
            direction: t.direction.to_string(),
            amount: fmt_money(&t.amount),
            note: t.description.unwrap_or_default(),
            transfer_id: t.transfer_id,
        })
        .collect())
}

