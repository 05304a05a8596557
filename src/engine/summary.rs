// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly summary across a user's accounts.
//!
//! Building a summary is not a pure read: during the first
//! `proactive_window_days` of a real month it records opening-balance
//! snapshots for the current month (see [`record_proactive`]). Callers that
//! need a side-effect-free read should use the carry-forward resolver
//! directly.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::carry::{OpeningSource, resolve_for_account};
use crate::engine::change::{checked_add, checked_sum, totals};
use crate::engine::invalidation::record_proactive;
use crate::engine::ledger::{
    LedgerEntry, RecurringOccurrence, transactions_for_account_and_month, unassigned_recurring_for_month,
};
use crate::engine::month::YearMonth;
use crate::error::{BalanceError, BalanceResult};
use crate::models::Account;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    /// Balance right after this entry.
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub account_id: i64,
    pub name: String,
    pub opening_balance: Decimal,
    pub opening_source: OpeningSource,
    pub income: Decimal,
    pub expense: Decimal,
    pub end_balance: Decimal,
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_balance: Decimal,
    pub per_account: Vec<AccountSummary>,
    /// Recurring items without an account. Counted in the totals only.
    pub unassigned: Vec<LedgerEntry>,
    pub total_end_of_month_balance: Decimal,
    pub snapshots_recorded: usize,
}

pub fn monthly_summary<S: Store + ?Sized>(
    store: &S,
    user_id: i64,
    month: YearMonth,
    today: NaiveDate,
    config: &EngineConfig,
) -> BalanceResult<MonthlySummary> {
    let snapshots_recorded = record_proactive(store, user_id, today, config.proactive_window_days)?;

    let mut per_account = Vec::new();
    for account in store.accounts(user_id)? {
        per_account.push(account_summary(store, &account, month, today, config)?);
    }

    let unassigned: Vec<LedgerEntry> = unassigned_recurring_for_month(store, user_id, month)?
        .iter()
        .map(RecurringOccurrence::entry)
        .collect();
    let (extra_income, extra_expense) = totals(&unassigned)?;

    let total_income = checked_add(checked_sum(per_account.iter().map(|a| a.income))?, extra_income)?;
    let total_expense =
        checked_add(checked_sum(per_account.iter().map(|a| a.expense))?, extra_expense)?;
    let total_end_of_month_balance = checked_sum(per_account.iter().map(|a| a.end_balance))?;
    let net_balance = total_income
        .checked_sub(total_expense)
        .ok_or(BalanceError::Overflow)?;

    debug!(user = user_id, month = %month, accounts = per_account.len(), "built monthly summary");

    Ok(MonthlySummary {
        month,
        total_income,
        total_expense,
        net_balance,
        per_account,
        unassigned,
        total_end_of_month_balance,
        snapshots_recorded,
    })
}

fn account_summary<S: Store + ?Sized>(
    store: &S,
    account: &Account,
    month: YearMonth,
    today: NaiveDate,
    config: &EngineConfig,
) -> BalanceResult<AccountSummary> {
    let opening = resolve_for_account(store, account, month, today, config.max_walk_months)?;
    let entries = transactions_for_account_and_month(store, account.id, month)?.entries();
    let (income, expense) = totals(&entries)?;

    let mut running = opening.amount;
    let mut timeline = Vec::with_capacity(entries.len());
    for entry in entries {
        running = checked_add(running, entry.direction.apply(entry.amount))?;
        timeline.push(TimelineEntry {
            entry,
            balance: running,
        });
    }

    Ok(AccountSummary {
        account_id: account.id,
        name: account.name.clone(),
        opening_balance: opening.amount,
        opening_source: opening.source,
        income,
        expense,
        end_balance: running,
        timeline,
    })
}
