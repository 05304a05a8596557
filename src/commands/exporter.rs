// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::EngineConfig;
use crate::engine::summary::monthly_summary;
use crate::utils::{fmt_money, parse_month, today};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => export_summary(conn, sub),
        _ => Ok(()),
    }
}

fn export_summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    if fmt != "csv" && fmt != "json" {
        return Err(anyhow!("Unknown format: {} (use csv|json)", fmt));
    }

    let cfg = EngineConfig::load(conn)?;
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let summary = monthly_summary(conn, cfg.user_id, month, today(), &cfg)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["month", "account", "opening", "income", "expense", "end"])?;
            for a in &summary.per_account {
                wtr.write_record([
                    summary.month.to_string(),
                    a.name.clone(),
                    fmt_money(&a.opening_balance),
                    fmt_money(&a.income),
                    fmt_money(&a.expense),
                    fmt_money(&a.end_balance),
                ])?;
            }
            wtr.write_record([
                summary.month.to_string(),
                "TOTAL".to_string(),
                String::new(),
                fmt_money(&summary.total_income),
                fmt_money(&summary.total_expense),
                fmt_money(&summary.total_end_of_month_balance),
            ])?;
            wtr.flush()?;
        }
        _ => {
            std::fs::write(out, serde_json::to_string_pretty(&summary)?)?;
        }
    }
    println!("Exported {} summary to {}", month, out);
    Ok(())
}
