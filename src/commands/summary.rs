// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::EngineConfig;
use crate::engine::carry::OpeningSource;
use crate::engine::summary::{MonthlySummary, monthly_summary};
use crate::utils::{fmt_money, maybe_print_json, parse_month, pretty_table, today};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let cfg = EngineConfig::load(conn)?;
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let summary = monthly_summary(conn, cfg.user_id, month, today(), &cfg)
        .with_context(|| format!("Summary for {}", month))?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
        return Ok(());
    }
    print_summary(&summary, sub.get_flag("detail"))
}

pub fn source_label(source: &OpeningSource) -> String {
    match source {
        OpeningSource::Snapshot => "snapshot".into(),
        OpeningSource::LiveBalance => "live".into(),
        OpeningSource::CarriedForward { anchor, months } => {
            format!("carried {} month(s) from {}", months, anchor)
        }
        OpeningSource::NoHistory => "live (no history)".into(),
        OpeningSource::WalkLimit { anchor, .. } => format!("live (anchor {} too far)", anchor),
    }
}

fn print_summary(s: &MonthlySummary, detail: bool) -> Result<()> {
    let mut rows: Vec<Vec<String>> = s
        .per_account
        .iter()
        .map(|a| {
            vec![
                a.name.clone(),
                fmt_money(&a.opening_balance),
                fmt_money(&a.income),
                fmt_money(&a.expense),
                fmt_money(&a.end_balance),
                source_label(&a.opening_source),
            ]
        })
        .collect();
    if !s.unassigned.is_empty() {
        let (inc, exp) = crate::engine::change::totals(&s.unassigned)?;
        rows.push(vec![
            "(no account)".into(),
            String::new(),
            fmt_money(&inc),
            fmt_money(&exp),
            String::new(),
            String::new(),
        ]);
    }
    rows.push(vec![
        "Total".into(),
        String::new(),
        fmt_money(&s.total_income),
        fmt_money(&s.total_expense),
        fmt_money(&s.total_end_of_month_balance),
        format!("net {}", fmt_money(&s.net_balance)),
    ]);
    println!("Summary for {}", s.month);
    println!(
        "{}",
        pretty_table(
            &["Account", "Opening", "Income", "Expense", "End", "Source"],
            rows
        )
    );

    if detail {
        for a in &s.per_account {
            if a.timeline.is_empty() {
                continue;
            }
            let rows = a
                .timeline
                .iter()
                .map(|t| {
                    vec![
                        t.entry.date.to_string(),
                        t.entry.direction.to_string(),
                        fmt_money(&t.entry.amount),
                        t.entry.description.clone().unwrap_or_default(),
                        fmt_money(&t.balance),
                    ]
                })
                .collect();
            println!("{}", a.name);
            println!(
                "{}",
                pretty_table(&["Date", "Type", "Amount", "Note", "Balance"], rows)
            );
        }
    }
    Ok(())
}
