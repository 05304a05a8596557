// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::recurring::add_recurring;
use crate::config::EngineConfig;
use crate::engine::invalidation::invalidate_future_monthly_balances;
use crate::engine::tax::installments;
use crate::models::Direction;
use crate::store::parse_amount as parse_stored_amount;
use crate::utils::{
    fmt_money, id_for_account, maybe_print_json, parse_amount, pretty_table, today,
};
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let cfg = EngineConfig::load(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let year = *sub.get_one::<i32>("year").unwrap();
            let annual = parse_amount(sub.get_one::<String>("annual").unwrap())?;
            let account_id = match sub.get_one::<String>("account") {
                Some(name) => Some(id_for_account(conn, cfg.user_id, name)?),
                None => None,
            };
            let recurring_id =
                add_resident_tax(conn, cfg.user_id, year, annual, account_id, today())?;
            println!(
                "Resident tax {} of {} scheduled as recurring #{}",
                year,
                fmt_money(&annual),
                recurring_id
            );
        }
        Some(("list", sub)) => list(conn, &cfg, sub)?,
        _ => {}
    }
    Ok(())
}

/// Creates a recurring expense for the fiscal year's resident tax with a zero
/// default amount and one override per installment month. Returns the
/// recurring transaction id.
pub fn add_resident_tax(
    conn: &Connection,
    user_id: i64,
    fiscal_year: i32,
    annual: Decimal,
    account_id: Option<i64>,
    today: NaiveDate,
) -> Result<i64> {
    let plan = installments(fiscal_year, annual)?;
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM resident_tax_settings WHERE user_id=?1 AND fiscal_year=?2",
            params![user_id, fiscal_year],
            |r| r.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(anyhow!("Resident tax for {} already exists", fiscal_year));
    }

    let db = conn.unchecked_transaction()?;
    let recurring_id = add_recurring(
        &db,
        user_id,
        account_id,
        Decimal::ZERO,
        Direction::Expense,
        31,
        Some(format!("Resident tax {}", fiscal_year)),
    )?;
    for (month, amount) in &plan {
        db.execute(
            "INSERT INTO recurring_transaction_amounts(recurring_id, year, month, amount) VALUES (?1,?2,?3,?4)",
            params![recurring_id, month.year(), month.month(), amount.to_string()],
        )?;
    }
    db.execute(
        "INSERT INTO resident_tax_settings(user_id, fiscal_year, annual_amount, account_id, recurring_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, fiscal_year, annual.to_string(), account_id, recurring_id],
    )?;
    if let Some((first, _)) = plan.first() {
        if first.first_day() <= today {
            invalidate_future_monthly_balances(&*db, user_id, *first)?;
        }
    }
    db.commit()?;
    Ok(recurring_id)
}

#[derive(Serialize)]
struct TaxRow {
    fiscal_year: i32,
    annual_amount: String,
    account: String,
    recurring_id: i64,
}

fn list(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT t.fiscal_year, t.annual_amount, a.name, t.recurring_id
         FROM resident_tax_settings t LEFT JOIN accounts a ON t.account_id=a.id
         WHERE t.user_id=?1 ORDER BY t.fiscal_year",
    )?;
    let rows = stmt.query_map(params![cfg.user_id], |r| {
        Ok((
            r.get::<_, i32>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
            r.get::<_, i64>(3)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (fiscal_year, annual, account, recurring_id) = row?;
        data.push(TaxRow {
            fiscal_year,
            annual_amount: fmt_money(&parse_stored_amount(&annual)?),
            account: account.unwrap_or_else(|| "(none)".into()),
            recurring_id,
        });
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let table_rows = data
            .iter()
            .map(|t| {
                vec![
                    t.fiscal_year.to_string(),
                    t.annual_amount.clone(),
                    t.account.clone(),
                    t.recurring_id.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Year", "Annual", "Account", "Recurring"], table_rows)
        );
    }
    Ok(())
}
