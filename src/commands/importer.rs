// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! One-shot migration from the JSON snapshot written by the old key/value
//! storage (camelCase fields, ISO-8601 timestamps, string ids).

use crate::db::{DATETIME_FMT, DEFAULT_CATEGORIES};
use crate::models::{Interval, Kind, NewTransaction};
use crate::settings::KEY_LEGACY_MIGRATED;
use crate::store::insert_transaction;
use crate::utils::{get_setting, parse_datetime, set_setting};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Datelike, Local, NaiveDateTime, Timelike};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("legacy", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let raw = std::fs::read_to_string(path).with_context(|| format!("Open {}", path))?;
            match import_legacy(conn, &raw)? {
                Some(s) => println!(
                    "Migrated {} categories, {} transactions, {} templates, {} subscriptions",
                    s.categories, s.transactions, s.templates, s.subscriptions
                ),
                None => println!("Legacy data already migrated; nothing to do"),
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegacySnapshot {
    pub transactions: Vec<LegacyTransaction>,
    pub categories: Vec<LegacyCategory>,
    pub templates: Vec<LegacyTemplate>,
    pub subscriptions: Vec<LegacySubscription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCategory {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTransaction {
    #[serde(rename = "type")]
    pub kind: Kind,
    pub title: String,
    pub amount: Decimal,
    pub category_id: String,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTemplate {
    #[serde(rename = "type")]
    pub kind: Kind,
    pub title: String,
    pub amount: Decimal,
    pub category_id: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySubscription {
    #[serde(rename = "type")]
    pub kind: Kind,
    pub title: String,
    pub amount: Decimal,
    pub category_id: String,
    pub interval: String,
    pub next_billing_date: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub anchor_day: Option<i32>,
    #[serde(default)]
    pub anchor_month: Option<i32>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub categories: usize,
    pub transactions: usize,
    pub templates: usize,
    pub subscriptions: usize,
}

/// Ids the old app used for its built-in categories, in DEFAULT_CATEGORIES order.
const LEGACY_DEFAULT_IDS: [&str; 12] = [
    "cat_food",
    "cat_transport",
    "cat_shopping",
    "cat_bills",
    "cat_entertainment",
    "cat_health",
    "cat_education",
    "cat_other_exp",
    "cat_salary",
    "cat_freelance",
    "cat_investment",
    "cat_other_inc",
];

/// Old timestamps are UTC instants; billing dates are kept in local time.
pub fn legacy_instant(s: &str) -> Result<NaiveDateTime> {
    let naive = match DateTime::parse_from_rfc3339(s.trim()) {
        Ok(dt) => dt.with_timezone(&Local).naive_local(),
        Err(_) => parse_datetime(s)?,
    };
    Ok(naive.with_nanosecond(0).unwrap_or(naive))
}

/// Older records may lack anchors; monthly and yearly ones take them from
/// their next billing date so month-end days survive short months.
fn legacy_anchors(s: &LegacySubscription, next: NaiveDateTime) -> (Option<i32>, Option<i32>) {
    let day = s.anchor_day.or(Some(next.day() as i32));
    match Interval::from(s.interval.as_str()) {
        Interval::Monthly => (day, s.anchor_month),
        Interval::Yearly => (day, s.anchor_month.or(Some(next.month0() as i32))),
        _ => (s.anchor_day, s.anchor_month),
    }
}

fn ensure_category(conn: &Connection, name: &str, kind: Kind, icon: &str) -> Result<(i64, bool)> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories WHERE name=?1 AND kind=?2",
            params![name, kind.as_str()],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok((id, false));
    }
    conn.execute(
        "INSERT INTO categories(name, kind, icon) VALUES (?1, ?2, ?3)",
        params![name, kind.as_str(), icon],
    )?;
    Ok((conn.last_insert_rowid(), true))
}

/// Imports `raw` in one SQL transaction. Returns `None` if a previous import
/// already completed.
pub fn import_legacy(conn: &mut Connection, raw: &str) -> Result<Option<ImportSummary>> {
    if get_setting(conn, KEY_LEGACY_MIGRATED)?.is_some() {
        return Ok(None);
    }
    let snapshot: LegacySnapshot =
        serde_json::from_str(raw).context("Invalid legacy snapshot JSON")?;

    let tx = conn.transaction()?;
    let mut summary = ImportSummary::default();
    let mut category_ids: HashMap<String, i64> = HashMap::new();

    for (legacy_id, (name, kind, icon)) in LEGACY_DEFAULT_IDS.iter().zip(DEFAULT_CATEGORIES) {
        let kind = kind.parse::<Kind>().map_err(|e| anyhow!(e))?;
        let (id, _) = ensure_category(&tx, name, kind, icon)?;
        category_ids.insert(legacy_id.to_string(), id);
    }
    for c in &snapshot.categories {
        let (id, created) = ensure_category(&tx, c.name.trim(), c.kind, &c.icon)?;
        category_ids.insert(c.id.clone(), id);
        if created {
            summary.categories += 1;
        }
    }
    let other_expense = category_ids
        .get("cat_other_exp")
        .copied()
        .context("default expense category missing")?;
    let other_income = category_ids
        .get("cat_other_inc")
        .copied()
        .context("default income category missing")?;
    // Unknown references land in the kind's "Other" category.
    let resolve = |legacy: &str, kind: Kind| {
        category_ids.get(legacy).copied().unwrap_or(match kind {
            Kind::Expense => other_expense,
            Kind::Income => other_income,
        })
    };

    for t in &snapshot.transactions {
        let date = legacy_instant(&t.date)
            .with_context(|| format!("Invalid date '{}' for '{}'", t.date, t.title))?
            .date();
        insert_transaction(
            &tx,
            &NewTransaction {
                kind: t.kind,
                title: t.title.clone(),
                amount: t.amount,
                category_id: resolve(&t.category_id, t.kind),
                date,
                notes: t.notes.clone().unwrap_or_default(),
            },
        )?;
        summary.transactions += 1;
    }

    for t in &snapshot.templates {
        tx.execute(
            "INSERT INTO templates(kind, title, amount, category_id, notes) VALUES (?1,?2,?3,?4,?5)",
            params![
                t.kind.as_str(),
                t.title,
                t.amount.to_string(),
                resolve(&t.category_id, t.kind),
                t.notes.clone().unwrap_or_default()
            ],
        )?;
        summary.templates += 1;
    }

    for s in &snapshot.subscriptions {
        let next = legacy_instant(&s.next_billing_date).with_context(|| {
            format!("Invalid nextBillingDate '{}' for '{}'", s.next_billing_date, s.title)
        })?;
        let (anchor_day, anchor_month) = legacy_anchors(s, next);
        tx.execute(
            "INSERT INTO subscriptions(kind, title, amount, category_id, interval, next_billing_date, notes, anchor_day, anchor_month)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                s.kind.as_str(),
                s.title,
                s.amount.to_string(),
                resolve(&s.category_id, s.kind),
                s.interval,
                next.format(DATETIME_FMT).to_string(),
                s.notes.clone().unwrap_or_default(),
                anchor_day,
                anchor_month
            ],
        )?;
        summary.subscriptions += 1;
    }

    set_setting(&tx, KEY_LEGACY_MIGRATED, "1")?;
    tx.commit()?;
    tracing::info!(?summary, "legacy snapshot migrated");
    Ok(Some(summary))
}
