// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::transfer_legs;
use crate::config::EngineConfig;
use crate::engine::invalidation::invalidate_for_transaction_change;
use crate::error::BalanceError;
use crate::store::Store;
use crate::utils::{
    fmt_money, id_for_account, maybe_print_json, parse_decimal, pretty_table, today,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let cfg = EngineConfig::load(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
            let position = sub.get_one::<i64>("position").copied();
            add_account(conn, cfg.user_id, name, balance, position)?;
            println!("Added account '{}' with balance {}", name, fmt_money(&balance));
        }
        Some(("list", sub)) => {
            let accounts = conn.accounts(cfg.user_id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
                let data = accounts
                    .iter()
                    .map(|a| {
                        vec![
                            a.position.to_string(),
                            a.name.clone(),
                            fmt_money(&a.current_balance),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["#", "Name", "Balance"], data));
            }
        }
        Some(("set-balance", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
            let id = id_for_account(conn, cfg.user_id, name)?;
            conn.update_account_balance(id, balance)?;
            println!("Balance of '{}' set to {}", name.trim(), fmt_money(&balance));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_account(conn, cfg.user_id, name)?;
            let legs = remove_account(conn, cfg.user_id, id, today())?;
            if legs > 0 {
                println!(
                    "Removed account '{}' and {} transfer leg(s) on other accounts",
                    name.trim(),
                    legs
                );
            } else {
                println!("Removed account '{}'", name.trim());
            }
        }
        _ => {}
    }
    Ok(())
}

/// Inserts an account; without an explicit position it is placed last.
pub fn add_account(
    conn: &Connection,
    user_id: i64,
    name: &str,
    balance: Decimal,
    position: Option<i64>,
) -> Result<i64> {
    let position = match position {
        Some(p) => p,
        None => conn.query_row(
            "SELECT IFNULL(MAX(position), -1) + 1 FROM accounts WHERE user_id=?1",
            params![user_id],
            |r| r.get(0),
        )?,
    };
    conn.execute(
        "INSERT INTO accounts(user_id, name, current_balance, position) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, name.trim(), balance.to_string(), position],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Deletes an account together with its transactions, recurring items and
/// snapshots. A transfer touching the account is removed as a whole, so the
/// other account loses its leg as well. Returns the number of such legs.
pub fn remove_account(
    conn: &Connection,
    user_id: i64,
    account_id: i64,
    today: NaiveDate,
) -> Result<usize> {
    match conn.account(account_id)? {
        Some(a) if a.user_id == user_id => {}
        _ => return Err(BalanceError::AccountNotFound(account_id).into()),
    }

    let db = conn.unchecked_transaction()?;
    let transfer_ids = {
        let mut stmt = db.prepare(
            "SELECT DISTINCT transfer_id FROM one_time_transactions
             WHERE account_id=?1 AND transfer_id IS NOT NULL",
        )?;
        let ids = stmt
            .query_map(params![account_id], |r| r.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        ids
    };

    let mut dates = Vec::new();
    for transfer_id in transfer_ids {
        for leg in transfer_legs(&db, user_id, transfer_id)? {
            if leg.account_id != account_id {
                db.execute("DELETE FROM one_time_transactions WHERE id=?1", params![leg.id])?;
                dates.push(leg.date);
            }
        }
        db.execute("DELETE FROM transfers WHERE id=?1", params![transfer_id])?;
    }
    db.execute("DELETE FROM accounts WHERE id=?1", params![account_id])?;
    invalidate_for_transaction_change(&*db, user_id, &dates, today)?;
    db.commit()?;
    info!(account = account_id, counterpart_legs = dates.len(), "removed account");
    Ok(dates.len())
}
