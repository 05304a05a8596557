// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

pub const USER_ID: &str = "user_id";
pub const PROACTIVE_WINDOW_DAYS: &str = "proactive_window_days";
pub const MAX_WALK_MONTHS: &str = "max_walk_months";

pub const KEYS: [&str; 3] = [USER_ID, PROACTIVE_WINDOW_DAYS, MAX_WALK_MONTHS];

/// Engine settings, persisted in the `settings` table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineConfig {
    /// User whose accounts the CLI operates on.
    pub user_id: i64,
    /// Snapshots of the current month are recorded on days `1..=proactive_window_days`.
    pub proactive_window_days: u32,
    /// Longest carry-forward walk, in months, before falling back to the live balance.
    pub max_walk_months: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            user_id: 1,
            proactive_window_days: 5,
            max_walk_months: 1200,
        }
    }
}

impl EngineConfig {
    pub fn load(conn: &Connection) -> Result<Self> {
        let d = EngineConfig::default();
        Ok(EngineConfig {
            user_id: get_parsed(conn, USER_ID)?.unwrap_or(d.user_id),
            proactive_window_days: get_parsed(conn, PROACTIVE_WINDOW_DAYS)?
                .unwrap_or(d.proactive_window_days),
            max_walk_months: get_parsed(conn, MAX_WALK_MONTHS)?.unwrap_or(d.max_walk_months),
        })
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

fn get_parsed<T: std::str::FromStr>(conn: &Connection, key: &str) -> Result<Option<T>> {
    match get_setting(conn, key)? {
        Some(s) => {
            let v = s
                .trim()
                .parse::<T>()
                .map_err(|_| anyhow!("Invalid value '{}' for setting {}", s, key))?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    match key {
        USER_ID => {
            value
                .parse::<i64>()
                .with_context(|| format!("Invalid user id '{}'", value))?;
        }
        PROACTIVE_WINDOW_DAYS => {
            let days = value
                .parse::<u32>()
                .with_context(|| format!("Invalid day count '{}'", value))?;
            if days > 31 {
                return Err(anyhow!("{} must be between 0 and 31", key));
            }
        }
        MAX_WALK_MONTHS => {
            let months = value
                .parse::<u32>()
                .with_context(|| format!("Invalid month count '{}'", value))?;
            if months == 0 {
                return Err(anyhow!("{} must be positive", key));
            }
        }
        other => {
            return Err(anyhow!(
                "Unknown setting '{}' (expected one of {})",
                other,
                KEYS.join(", ")
            ));
        }
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}
