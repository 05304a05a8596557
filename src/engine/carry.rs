// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Opening-balance resolution.
//!
//! Resolution order for `(account, month)`:
//!
//! 1. a recorded snapshot for that month,
//! 2. the live account balance when the month is the current calendar month,
//! 3. the nearest earlier snapshot (the anchor) carried forward month by month,
//! 4. the live account balance when the account has no earlier snapshot.
//!
//! Step 3 relies on `opening(M) = opening(M-1) + net(M-1)`. Snapshots are
//! taken as ground truth and are never rewritten here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::change::{checked_add, net_change};
use crate::engine::ledger::transactions_for_account_and_month;
use crate::engine::month::YearMonth;
use crate::error::{BalanceError, BalanceResult};
use crate::models::Account;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpeningSource {
    Snapshot,
    LiveBalance,
    CarriedForward { anchor: YearMonth, months: u32 },
    /// No snapshot exists before the month; the live balance is a best guess.
    NoHistory,
    /// The anchor was further away than the configured walk limit.
    WalkLimit { anchor: YearMonth, months: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpeningBalance {
    pub amount: Decimal,
    pub source: OpeningSource,
}

pub fn resolve_opening_balance<S: Store + ?Sized>(
    store: &S,
    account_id: i64,
    target: YearMonth,
    today: NaiveDate,
    max_walk_months: u32,
) -> BalanceResult<OpeningBalance> {
    let account = store
        .account(account_id)?
        .ok_or(BalanceError::AccountNotFound(account_id))?;
    resolve_for_account(store, &account, target, today, max_walk_months)
}

pub(crate) fn resolve_for_account<S: Store + ?Sized>(
    store: &S,
    account: &Account,
    target: YearMonth,
    today: NaiveDate,
    max_walk_months: u32,
) -> BalanceResult<OpeningBalance> {
    if let Some(amount) = store.monthly_snapshot(account.id, target)? {
        return Ok(OpeningBalance {
            amount,
            source: OpeningSource::Snapshot,
        });
    }

    if target == YearMonth::of(today) {
        return Ok(OpeningBalance {
            amount: account.current_balance,
            source: OpeningSource::LiveBalance,
        });
    }

    let Some(anchor) = store.latest_snapshot_before(account.id, target)? else {
        debug!(account = account.id, month = %target, "no anchor snapshot, using live balance");
        return Ok(OpeningBalance {
            amount: account.current_balance,
            source: OpeningSource::NoHistory,
        });
    };

    let distance = anchor.month.months_until(target);
    let months = u32::try_from(distance).unwrap_or(u32::MAX);
    if months > max_walk_months {
        warn!(
            account = account.id,
            anchor = %anchor.month,
            month = %target,
            months,
            limit = max_walk_months,
            "carry-forward walk exceeds limit, using live balance"
        );
        return Ok(OpeningBalance {
            amount: account.current_balance,
            source: OpeningSource::WalkLimit {
                anchor: anchor.month,
                months,
            },
        });
    }

    let mut balance = anchor.balance;
    let mut cursor = anchor.month;
    while cursor < target {
        let ledger = transactions_for_account_and_month(store, account.id, cursor)?;
        let delta = net_change(ledger.entries())?;
        debug!(account = account.id, month = %cursor, %delta, "carry forward");
        balance = checked_add(balance, delta)?;
        cursor = cursor.next();
    }

    Ok(OpeningBalance {
        amount: balance,
        source: OpeningSource::CarriedForward {
            anchor: anchor.month,
            months,
        },
    })
}

/// Opening balance of `month` plus every movement within it.
pub fn end_of_month_balance<S: Store + ?Sized>(
    store: &S,
    account_id: i64,
    month: YearMonth,
    today: NaiveDate,
    max_walk_months: u32,
) -> BalanceResult<Decimal> {
    let opening = resolve_opening_balance(store, account_id, month, today, max_walk_months)?;
    let ledger = transactions_for_account_and_month(store, account_id, month)?;
    checked_add(opening.amount, net_change(ledger.entries())?)
}
