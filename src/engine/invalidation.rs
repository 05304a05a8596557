// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Snapshot lifecycle: recording and invalidation.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::engine::carry::resolve_for_account;
use crate::engine::month::YearMonth;
use crate::error::BalanceResult;
use crate::store::Store;

/// Deletes every snapshot strictly after `month` for the user's accounts.
/// Returns the number of snapshots removed; zero is not an error.
pub fn invalidate_future_monthly_balances<S: Store + ?Sized>(
    store: &S,
    user_id: i64,
    month: YearMonth,
) -> BalanceResult<usize> {
    let n = store.delete_monthly_snapshots_after(user_id, month)?;
    if n > 0 {
        info!(user = user_id, after = %month, removed = n, "invalidated monthly balances");
    }
    Ok(n)
}

/// Invalidation hook for a one-time transaction whose amount or date changed.
///
/// `dates` holds every date the transaction has occupied (old and new). If any
/// of them is before `today`, snapshots after the earliest such month are
/// dropped.
pub fn invalidate_for_transaction_change<S: Store + ?Sized>(
    store: &S,
    user_id: i64,
    dates: &[NaiveDate],
    today: NaiveDate,
) -> BalanceResult<usize> {
    if !dates.iter().any(|d| *d < today) {
        return Ok(0);
    }
    match dates.iter().min() {
        Some(earliest) => invalidate_future_monthly_balances(store, user_id, YearMonth::of(*earliest)),
        None => Ok(0),
    }
}

/// Copies live balances into snapshots for the current month when `today`
/// falls in the first `window_days` days of it. Accounts that already have a
/// snapshot are left alone.
pub fn record_proactive<S: Store + ?Sized>(
    store: &S,
    user_id: i64,
    today: NaiveDate,
    window_days: u32,
) -> BalanceResult<usize> {
    if today.day() > window_days {
        return Ok(0);
    }
    let month = YearMonth::of(today);
    let mut recorded = 0;
    for account in store.accounts(user_id)? {
        if store.monthly_snapshot(account.id, month)?.is_some() {
            continue;
        }
        store.upsert_monthly_snapshot(account.id, month, account.current_balance)?;
        info!(account = account.id, month = %month, balance = %account.current_balance, "recorded opening balance");
        recorded += 1;
    }
    Ok(recorded)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub success: bool,
    pub recorded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Stores an opening-balance snapshot of `month` for every account of the
/// user that lacks one. Running it twice records nothing the second time.
pub fn record_monthly_balances<S: Store + ?Sized>(
    store: &S,
    user_id: i64,
    month: YearMonth,
    today: NaiveDate,
    max_walk_months: u32,
) -> RecordOutcome {
    match record_missing(store, user_id, month, today, max_walk_months) {
        Ok(recorded) => RecordOutcome {
            success: true,
            recorded,
            error: None,
        },
        Err(e) => {
            warn!(user = user_id, month = %month, error = %e, "recording monthly balances failed");
            RecordOutcome {
                success: false,
                recorded: 0,
                error: Some(e.to_string()),
            }
        }
    }
}

fn record_missing<S: Store + ?Sized>(
    store: &S,
    user_id: i64,
    month: YearMonth,
    today: NaiveDate,
    max_walk_months: u32,
) -> BalanceResult<usize> {
    let mut recorded = 0;
    for account in store.accounts(user_id)? {
        if store.monthly_snapshot(account.id, month)?.is_some() {
            continue;
        }
        let opening = resolve_for_account(store, &account, month, today, max_walk_months)?;
        store.upsert_monthly_snapshot(account.id, month, opening.amount)?;
        info!(account = account.id, month = %month, balance = %opening.amount, "recorded opening balance");
        recorded += 1;
    }
    Ok(recorded)
}
