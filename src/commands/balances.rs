// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::summary::source_label;
use crate::config::EngineConfig;
use crate::engine::carry::resolve_opening_balance;
use crate::engine::invalidation::{invalidate_future_monthly_balances, record_monthly_balances};
use crate::store::Store;
use crate::utils::{fmt_money, id_for_account, maybe_print_json, parse_month, pretty_table, today};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let cfg = EngineConfig::load(conn)?;
    match m.subcommand() {
        Some(("record", sub)) => {
            let month = parse_month(sub.get_one::<String>("month").unwrap())?;
            let outcome =
                record_monthly_balances(conn, cfg.user_id, month, today(), cfg.max_walk_months);
            let printed = maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &outcome)?;
            if let Some(e) = &outcome.error {
                return Err(anyhow!("Recording balances for {} failed: {}", month, e));
            }
            if !printed {
                println!("Recorded {} opening balance(s) for {}", outcome.recorded, month);
            }
        }
        Some(("invalidate", sub)) => {
            let month = parse_month(sub.get_one::<String>("month").unwrap())?;
            let n = invalidate_future_monthly_balances(conn, cfg.user_id, month)?;
            println!("Removed {} snapshot(s) after {}", n, month);
        }
        Some(("list", sub)) => list(conn, &cfg, sub)?,
        Some(("opening", sub)) => {
            let account_id = id_for_account(conn, cfg.user_id, sub.get_one::<String>("account").unwrap())?;
            let month = parse_month(sub.get_one::<String>("month").unwrap())?;
            let opening =
                resolve_opening_balance(conn, account_id, month, today(), cfg.max_walk_months)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &opening)? {
                println!(
                    "{} opening balance: {} ({})",
                    month,
                    fmt_money(&opening.amount),
                    source_label(&opening.source)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct SnapshotRow {
    account: String,
    month: String,
    balance: String,
}

fn list(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = match sub.get_one::<String>("account") {
        Some(name) => Some(id_for_account(conn, cfg.user_id, name)?),
        None => None,
    };
    let names: HashMap<i64, String> = conn
        .accounts(cfg.user_id)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let data: Vec<SnapshotRow> = conn
        .monthly_snapshots(account_id)?
        .into_iter()
        .filter_map(|s| {
            names.get(&s.account_id).map(|name| SnapshotRow {
                account: name.clone(),
                month: s.month.to_string(),
                balance: fmt_money(&s.balance),
            })
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| vec![r.account.clone(), r.month.clone(), r.balance.clone()])
            .collect();
        println!("{}", pretty_table(&["Account", "Month", "Opening"], rows));
    }
    Ok(())
}
