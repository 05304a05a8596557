// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the balance engine and the store behind it.
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("account {0} not found")]
    AccountNotFound(i64),

    #[error("transaction {0} not found")]
    TransactionNotFound(i64),

    #[error("recurring transaction {0} not found")]
    RecurringNotFound(i64),

    #[error("invalid month {year}-{month:02}, expected year 1900-9999 and month 1-12")]
    InvalidMonth { year: i32, month: u32 },

    #[error("invalid day of month {0}, expected 1-31")]
    InvalidDayOfMonth(u32),

    #[error("amount must not be negative, got {0}")]
    NegativeAmount(Decimal),

    #[error("stored amount '{0}' is not a valid decimal")]
    CorruptAmount(String),

    #[error("stored date '{0}' is not a valid YYYY-MM-DD date")]
    CorruptDate(String),

    #[error("unknown direction '{0}', expected income or expense")]
    UnknownDirection(String),

    #[error("balance arithmetic overflowed")]
    Overflow,
}

pub type BalanceResult<T> = Result<T, BalanceError>;
