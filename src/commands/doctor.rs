// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::EngineConfig;
use crate::engine::change::{checked_add, net_change};
use crate::engine::ledger::transactions_for_account_and_month;
use crate::models::Direction;
use crate::store::{Store, parse_amount};
use crate::utils::{fmt_money, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

pub fn handle(conn: &Connection) -> Result<()> {
    let cfg = EngineConfig::load(conn)?;
    let issues = diagnose(conn, cfg.user_id)?;
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn diagnose(conn: &Connection, user_id: i64) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) Snapshot history: gaps between recorded months, and months whose
    //    opening balance disagrees with the previous month carried forward.
    for account in conn.accounts(user_id)? {
        let snaps = conn.monthly_snapshots(Some(account.id))?;
        for pair in snaps.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.month.next() != next.month {
                issues.push(Issue {
                    kind: "snapshot_gap",
                    detail: format!("{}: {} -> {}", account.name, prev.month, next.month),
                });
                continue;
            }
            let ledger = transactions_for_account_and_month(conn, account.id, prev.month)?;
            let expected = checked_add(prev.balance, net_change(ledger.entries())?)?;
            if expected != next.balance {
                issues.push(Issue {
                    kind: "snapshot_drift",
                    detail: format!(
                        "{} {}: recorded {}, carried {}",
                        account.name,
                        next.month,
                        fmt_money(&next.balance),
                        fmt_money(&expected)
                    ),
                });
            }
        }
    }

    // 2) Transfer pairs: exactly one expense and one income leg of equal amount.
    let mut stmt = conn.prepare(
        "SELECT t.transfer_id, t.direction, t.amount FROM one_time_transactions t
         JOIN accounts a ON t.account_id=a.id
         WHERE t.transfer_id IS NOT NULL AND a.user_id=?1
         ORDER BY t.transfer_id, t.id",
    )?;
    let rows = stmt
        .query_map(params![user_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut groups: BTreeMap<i64, Vec<(Direction, Decimal)>> = BTreeMap::new();
    for (transfer_id, direction, amount) in rows {
        groups
            .entry(transfer_id)
            .or_default()
            .push((direction.parse::<Direction>()?, parse_amount(&amount)?));
    }
    for (transfer_id, legs) in groups {
        let net = net_change(&legs)?;
        if legs.len() != 2 {
            issues.push(Issue {
                kind: "transfer_orphan",
                detail: format!("transfer #{} has {} leg(s)", transfer_id, legs.len()),
            });
        } else if !net.is_zero() || legs[0].0 == legs[1].0 {
            issues.push(Issue {
                kind: "transfer_unbalanced",
                detail: format!("transfer #{} nets to {}", transfer_id, fmt_money(&net)),
            });
        }
    }

    Ok(issues)
}
