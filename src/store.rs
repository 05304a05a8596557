// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistence seam used by the balance engine.
//!
//! The engine never issues SQL itself; everything it reads or writes goes
//! through [`Store`]. The SQLite implementation lives on
//! [`rusqlite::Connection`] so command handlers can hand their connection
//! straight to the engine.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::engine::month::YearMonth;
use crate::error::{BalanceError, BalanceResult};
use crate::models::{
    Account, DateRange, Direction, MonthlySnapshot, OneTimeTransaction, RecurringTransaction,
};

pub trait Store {
    fn accounts(&self, user_id: i64) -> BalanceResult<Vec<Account>>;

    fn account(&self, account_id: i64) -> BalanceResult<Option<Account>>;

    fn update_account_balance(&self, account_id: i64, balance: Decimal) -> BalanceResult<()>;

    fn one_time_transactions(
        &self,
        account_id: Option<i64>,
        range: Option<DateRange>,
    ) -> BalanceResult<Vec<OneTimeTransaction>>;

    fn recurring_transactions(&self, account_id: i64) -> BalanceResult<Vec<RecurringTransaction>>;

    /// Recurring items not tied to any account (externally managed obligations).
    fn unassigned_recurring(&self, user_id: i64) -> BalanceResult<Vec<RecurringTransaction>>;

    fn recurring_amount_override(
        &self,
        recurring_id: i64,
        month: YearMonth,
    ) -> BalanceResult<Option<Decimal>>;

    fn monthly_snapshot(&self, account_id: i64, month: YearMonth)
        -> BalanceResult<Option<Decimal>>;

    /// Nearest snapshot strictly before `month`.
    fn latest_snapshot_before(
        &self,
        account_id: i64,
        month: YearMonth,
    ) -> BalanceResult<Option<MonthlySnapshot>>;

    fn monthly_snapshots(&self, account_id: Option<i64>) -> BalanceResult<Vec<MonthlySnapshot>>;

    fn upsert_monthly_snapshot(
        &self,
        account_id: i64,
        month: YearMonth,
        balance: Decimal,
    ) -> BalanceResult<()>;

    /// Deletes every snapshot of the user's accounts strictly after `month`.
    fn delete_monthly_snapshots_after(&self, user_id: i64, month: YearMonth)
        -> BalanceResult<usize>;
}

pub(crate) fn parse_amount(s: &str) -> BalanceResult<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_| BalanceError::CorruptAmount(s.to_string()))
}

fn parse_stored_date(s: &str) -> BalanceResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| BalanceError::CorruptDate(s.to_string()))
}

fn stored_month(year: i32, month: u32) -> BalanceResult<YearMonth> {
    YearMonth::new(year, month)
}

type RawAccount = (i64, i64, String, String, i64);
type RawOneTime = (i64, i64, String, String, String, Option<String>, Option<i64>);
type RawRecurring = (i64, i64, Option<i64>, String, String, u32, Option<String>);

fn raw_account(r: &Row<'_>) -> rusqlite::Result<RawAccount> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
}

fn account_from_raw((id, user_id, name, bal, position): RawAccount) -> BalanceResult<Account> {
    Ok(Account {
        id,
        user_id,
        name,
        current_balance: parse_amount(&bal)?,
        position,
    })
}

fn raw_one_time(r: &Row<'_>) -> rusqlite::Result<RawOneTime> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
    ))
}

fn one_time_from_raw(
    (id, account_id, amount, direction, date, description, transfer_id): RawOneTime,
) -> BalanceResult<OneTimeTransaction> {
    Ok(OneTimeTransaction {
        id,
        account_id,
        amount: parse_amount(&amount)?,
        direction: direction.parse::<Direction>()?,
        date: parse_stored_date(&date)?,
        description,
        transfer_id,
    })
}

fn raw_recurring(r: &Row<'_>) -> rusqlite::Result<RawRecurring> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
    ))
}

fn recurring_from_raw(
    (id, user_id, account_id, amount, direction, day_of_month, description): RawRecurring,
) -> BalanceResult<RecurringTransaction> {
    Ok(RecurringTransaction {
        id,
        user_id,
        account_id,
        amount: parse_amount(&amount)?,
        direction: direction.parse::<Direction>()?,
        day_of_month,
        description,
    })
}

const ACCOUNT_COLS: &str = "id, user_id, name, current_balance, position";
const ONE_TIME_COLS: &str = "id, account_id, amount, direction, date, description, transfer_id";
const RECURRING_COLS: &str =
    "id, user_id, account_id, amount, direction, day_of_month, description";

impl Store for Connection {
    fn accounts(&self, user_id: i64) -> BalanceResult<Vec<Account>> {
        let mut stmt = self.prepare_cached(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE user_id=?1 ORDER BY position, name"
        ))?;
        let rows = stmt
            .query_map(params![user_id], raw_account)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(account_from_raw).collect()
    }

    fn account(&self, account_id: i64) -> BalanceResult<Option<Account>> {
        let raw = self
            .query_row(
                &format!("SELECT {ACCOUNT_COLS} FROM accounts WHERE id=?1"),
                params![account_id],
                raw_account,
            )
            .optional()?;
        raw.map(account_from_raw).transpose()
    }

    fn update_account_balance(&self, account_id: i64, balance: Decimal) -> BalanceResult<()> {
        let n = self.execute(
            "UPDATE accounts SET current_balance=?1 WHERE id=?2",
            params![balance.to_string(), account_id],
        )?;
        if n == 0 {
            return Err(BalanceError::AccountNotFound(account_id));
        }
        Ok(())
    }

    fn one_time_transactions(
        &self,
        account_id: Option<i64>,
        range: Option<DateRange>,
    ) -> BalanceResult<Vec<OneTimeTransaction>> {
        let mut sql = format!("SELECT {ONE_TIME_COLS} FROM one_time_transactions WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(id) = account_id {
            sql.push_str(" AND account_id=?");
            params_vec.push(Box::new(id));
        }
        if let Some(r) = range {
            sql.push_str(" AND date>=? AND date<=?");
            params_vec.push(Box::new(r.start.to_string()));
            params_vec.push(Box::new(r.end.to_string()));
        }
        sql.push_str(" ORDER BY date, id");

        let mut stmt = self.prepare(&sql)?;
        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(params_vec.iter().map(|p| p.as_ref())),
                raw_one_time,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(one_time_from_raw).collect()
    }

    fn recurring_transactions(&self, account_id: i64) -> BalanceResult<Vec<RecurringTransaction>> {
        let mut stmt = self.prepare_cached(&format!(
            "SELECT {RECURRING_COLS} FROM recurring_transactions WHERE account_id=?1 ORDER BY day_of_month, id"
        ))?;
        let rows = stmt
            .query_map(params![account_id], raw_recurring)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(recurring_from_raw).collect()
    }

    fn unassigned_recurring(&self, user_id: i64) -> BalanceResult<Vec<RecurringTransaction>> {
        let mut stmt = self.prepare_cached(&format!(
            "SELECT {RECURRING_COLS} FROM recurring_transactions WHERE user_id=?1 AND account_id IS NULL ORDER BY day_of_month, id"
        ))?;
        let rows = stmt
            .query_map(params![user_id], raw_recurring)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(recurring_from_raw).collect()
    }

    fn recurring_amount_override(
        &self,
        recurring_id: i64,
        month: YearMonth,
    ) -> BalanceResult<Option<Decimal>> {
        let v: Option<String> = self
            .query_row(
                "SELECT amount FROM recurring_transaction_amounts WHERE recurring_id=?1 AND year=?2 AND month=?3",
                params![recurring_id, month.year(), month.month()],
                |r| r.get(0),
            )
            .optional()?;
        v.map(|s| parse_amount(&s)).transpose()
    }

    fn monthly_snapshot(
        &self,
        account_id: i64,
        month: YearMonth,
    ) -> BalanceResult<Option<Decimal>> {
        let v: Option<String> = self
            .query_row(
                "SELECT balance FROM monthly_account_balances WHERE account_id=?1 AND year=?2 AND month=?3",
                params![account_id, month.year(), month.month()],
                |r| r.get(0),
            )
            .optional()?;
        v.map(|s| parse_amount(&s)).transpose()
    }

    fn latest_snapshot_before(
        &self,
        account_id: i64,
        month: YearMonth,
    ) -> BalanceResult<Option<MonthlySnapshot>> {
        let raw: Option<(i32, u32, String)> = self
            .query_row(
                "SELECT year, month, balance FROM monthly_account_balances
                 WHERE account_id=?1 AND (year < ?2 OR (year = ?2 AND month < ?3))
                 ORDER BY year DESC, month DESC LIMIT 1",
                params![account_id, month.year(), month.month()],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?;
        match raw {
            Some((y, m, bal)) => Ok(Some(MonthlySnapshot {
                account_id,
                month: stored_month(y, m)?,
                balance: parse_amount(&bal)?,
            })),
            None => Ok(None),
        }
    }

    fn monthly_snapshots(&self, account_id: Option<i64>) -> BalanceResult<Vec<MonthlySnapshot>> {
        let mut stmt = self.prepare(
            "SELECT account_id, year, month, balance FROM monthly_account_balances
             WHERE ?1 IS NULL OR account_id = ?1
             ORDER BY account_id, year, month",
        )?;
        let rows = stmt
            .query_map(params![account_id], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i32>(1)?,
                    r.get::<_, u32>(2)?,
                    r.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(account_id, y, m, bal)| {
                Ok(MonthlySnapshot {
                    account_id,
                    month: stored_month(y, m)?,
                    balance: parse_amount(&bal)?,
                })
            })
            .collect()
    }

    fn upsert_monthly_snapshot(
        &self,
        account_id: i64,
        month: YearMonth,
        balance: Decimal,
    ) -> BalanceResult<()> {
        self.execute(
            "INSERT INTO monthly_account_balances(account_id, year, month, balance) VALUES (?1,?2,?3,?4)
             ON CONFLICT(account_id, year, month) DO UPDATE SET balance=excluded.balance",
            params![account_id, month.year(), month.month(), balance.to_string()],
        )?;
        Ok(())
    }

    fn delete_monthly_snapshots_after(
        &self,
        user_id: i64,
        month: YearMonth,
    ) -> BalanceResult<usize> {
        let n = self.execute(
            "DELETE FROM monthly_account_balances
             WHERE account_id IN (SELECT id FROM accounts WHERE user_id=?1)
               AND (year > ?2 OR (year = ?2 AND month > ?3))",
            params![user_id, month.year(), month.month()],
        )?;
        Ok(n)
    }
}
