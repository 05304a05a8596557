// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only view of what moves an account's balance within one month.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::engine::change::Movement;
use crate::engine::month::YearMonth;
use crate::error::BalanceResult;
use crate::models::{DateRange, Direction, OneTimeTransaction, RecurringTransaction};
use crate::store::Store;

/// A recurring transaction as it lands in one particular month.
#[derive(Debug, Clone, Serialize)]
pub struct RecurringOccurrence {
    pub transaction: RecurringTransaction,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub overridden: bool,
}

impl RecurringOccurrence {
    pub fn entry(&self) -> LedgerEntry {
        LedgerEntry {
            date: self.date,
            source: EntrySource::Recurring,
            source_id: self.transaction.id,
            direction: self.transaction.direction,
            amount: self.amount,
            description: self.transaction.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    OneTime,
    Recurring,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub source: EntrySource,
    pub source_id: i64,
    pub direction: Direction,
    pub amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthLedger {
    pub month: YearMonth,
    pub one_time: Vec<OneTimeTransaction>,
    pub recurring: Vec<RecurringOccurrence>,
}

impl MonthLedger {
    /// Every movement of the month, ordered by date, one-time before recurring, then id.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        let mut out: Vec<LedgerEntry> = self
            .one_time
            .iter()
            .map(|t| LedgerEntry {
                date: t.date,
                source: EntrySource::OneTime,
                source_id: t.id,
                direction: t.direction,
                amount: t.amount,
                description: t.description.clone(),
            })
            .chain(self.recurring.iter().map(RecurringOccurrence::entry))
            .collect();
        out.sort_by(|a, b| (a.date, a.source, a.source_id).cmp(&(b.date, b.source, b.source_id)));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.one_time.is_empty() && self.recurring.is_empty()
    }
}

impl Movement for OneTimeTransaction {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

impl Movement for RecurringOccurrence {
    fn direction(&self) -> Direction {
        self.transaction.direction
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

impl Movement for LedgerEntry {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

pub fn transactions_for_account_and_month<S: Store + ?Sized>(
    store: &S,
    account_id: i64,
    month: YearMonth,
) -> BalanceResult<MonthLedger> {
    let one_time = store.one_time_transactions(Some(account_id), Some(DateRange::month(month)))?;
    let recurring = store.recurring_transactions(account_id)?;
    Ok(MonthLedger {
        month,
        one_time,
        recurring: occurrences(store, recurring, month)?,
    })
}

/// Recurring items with no owning account, as they fall in `month`.
pub fn unassigned_recurring_for_month<S: Store + ?Sized>(
    store: &S,
    user_id: i64,
    month: YearMonth,
) -> BalanceResult<Vec<RecurringOccurrence>> {
    let recurring = store.unassigned_recurring(user_id)?;
    occurrences(store, recurring, month)
}

fn occurrences<S: Store + ?Sized>(
    store: &S,
    recurring: Vec<RecurringTransaction>,
    month: YearMonth,
) -> BalanceResult<Vec<RecurringOccurrence>> {
    let mut out = Vec::with_capacity(recurring.len());
    for tx in recurring {
        let over = store.recurring_amount_override(tx.id, month)?;
        out.push(RecurringOccurrence {
            date: month.day(tx.day_of_month),
            amount: over.unwrap_or(tx.amount),
            overridden: over.is_some(),
            transaction: tx,
        });
    }
    Ok(out)
}
