// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::processor::DEFAULT_MAX_OCCURRENCES;
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;

pub const KEY_CURRENCY: &str = "currency";
pub const KEY_MAX_OCCURRENCES: &str = "max_occurrences_per_run";
pub const KEY_AUTO_SYNC: &str = "auto_sync";
pub const KEY_LEGACY_MIGRATED: &str = "legacy_migrated";

pub const DEFAULT_CURRENCY: &str = "₹";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub currency: String,
    pub max_occurrences_per_run: usize,
    pub auto_sync: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            max_occurrences_per_run: DEFAULT_MAX_OCCURRENCES,
            auto_sync: true,
        }
    }
}

pub fn get_settings(conn: &Connection) -> Result<Settings> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;

    let mut settings = Settings::default();
    for row in rows {
        let (key, value) = row?;
        match key.as_str() {
            KEY_CURRENCY => settings.currency = value,
            KEY_MAX_OCCURRENCES => {
                match value.parse::<usize>() {
                    Ok(n) if n > 0 => settings.max_occurrences_per_run = n,
                    _ => tracing::warn!(%value, "ignoring invalid {}", KEY_MAX_OCCURRENCES),
                }
            }
            KEY_AUTO_SYNC => settings.auto_sync = parse_bool(&value).unwrap_or(true),
            _ => {}
        }
    }
    Ok(settings)
}

/// Validates and stores one user-editable setting.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    let normalized = match key {
        KEY_CURRENCY => {
            if value.is_empty() {
                return Err(anyhow!("Currency symbol must not be empty"));
            }
            value.to_string()
        }
        KEY_MAX_OCCURRENCES => match value.parse::<usize>() {
            Ok(n) if n > 0 => n.to_string(),
            _ => return Err(anyhow!("'{}' must be a positive integer", key)),
        },
        KEY_AUTO_SYNC => match parse_bool(value) {
            Some(true) => "on".to_string(),
            Some(false) => "off".to_string(),
            None => return Err(anyhow!("'{}' must be on|off", key)),
        },
        other => {
            return Err(anyhow!(
                "Unknown setting '{}' (use {}|{}|{})",
                other,
                KEY_CURRENCY,
                KEY_MAX_OCCURRENCES,
                KEY_AUTO_SYNC
            ));
        }
    };
    crate::utils::set_setting(conn, key, &normalized)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
