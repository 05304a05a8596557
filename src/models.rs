// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::month::YearMonth;
use crate::error::{BalanceError, BalanceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Income => "income",
            Direction::Expense => "expense",
        }
    }

    /// Signed effect of `amount` on a balance.
    pub fn apply(&self, amount: Decimal) -> Decimal {
        match self {
            Direction::Income => amount,
            Direction::Expense => -amount,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Ok(Direction::Income),
            "expense" | "out" => Ok(Direction::Expense),
            other => Err(BalanceError::UnknownDirection(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub current_balance: Decimal,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimeTransaction {
    pub id: i64,
    pub account_id: i64,
    pub amount: Decimal,
    pub direction: Direction,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub transfer_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: Option<i64>,
    pub amount: Decimal,
    pub direction: Direction,
    pub day_of_month: u32,
    pub description: Option<String>,
}

/// Opening balance of an account at the first instant of a month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySnapshot {
    pub account_id: i64,
    pub month: YearMonth,
    pub balance: Decimal,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn month(ym: YearMonth) -> Self {
        DateRange {
            start: ym.first_day(),
            end: ym.last_day(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

pub fn ensure_non_negative(amount: Decimal) -> BalanceResult<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(BalanceError::NegativeAmount(amount));
    }
    Ok(amount)
}
