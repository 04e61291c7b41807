// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::{EntryFields, entry_from_args, parse_id};
use crate::db::DATETIME_FMT;
use crate::models::{Interval, Subscription};
use crate::processor::SubscriptionProcessor;
use crate::schedule::{FirstOccurrence, StartParams, first_occurrence};
use crate::settings::get_settings;
use crate::store::{SqliteStore, load_subscriptions};
use crate::utils::{
    category_name, fmt_money, maybe_print_json, parse_datetime, pretty_table,
};
use anyhow::{Context, Result, anyhow};
use chrono::{Month, NaiveDateTime, Weekday};
use rusqlite::{Connection, params};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let n = conn.execute("DELETE FROM subscriptions WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(anyhow!("Subscription {} not found", id));
            }
            println!("Stopped tracking subscription {}", id);
        }
        Some(("sync", sub)) => {
            let now = sub
                .get_one::<String>("now")
                .map(|s| parse_datetime(s))
                .transpose()?;
            let created = process_due(conn, now)?;
            println!("Created {} transaction(s) from due subscriptions", created);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let entry = entry_from_args(conn, sub)?;
    let interval = Interval::from(sub.get_one::<String>("interval").unwrap().as_str());
    let params = start_params_from_args(sub)?;
    let now = chrono::Local::now().naive_local();

    let (id, first) = add_subscription(conn, &entry, &interval, params, now)?;
    let symbol = get_settings(conn)?.currency;
    println!(
        "Added {} subscription #{} '{}' {}; first billing {}",
        interval,
        id,
        entry.title,
        fmt_money(&entry.amount, &symbol),
        first.next_billing_date.format("%Y-%m-%d %H:%M")
    );

    // A same-day start is already due.
    let created = process_due(conn, Some(now))?;
    if created > 0 {
        println!("Created {} transaction(s) from due subscriptions", created);
    }
    Ok(())
}

pub fn start_params_from_args(sub: &clap::ArgMatches) -> Result<StartParams> {
    let weekday = sub
        .get_one::<String>("weekday")
        .map(|s| {
            s.trim()
                .parse::<Weekday>()
                .map_err(|_| anyhow!("Invalid weekday '{}', expected mon..sun", s))
        })
        .transpose()?;
    let month_day = sub
        .get_one::<String>("day")
        .map(|s| {
            s.trim()
                .parse::<i32>()
                .with_context(|| format!("Invalid day of month '{}'", s))
        })
        .transpose()?;
    let month = sub
        .get_one::<String>("month")
        .map(|s| parse_month_arg(s))
        .transpose()?;
    Ok(StartParams {
        weekday,
        month_day,
        month,
    })
}

/// `1`-`12` or a month name, as a 0-based month.
pub fn parse_month_arg(s: &str) -> Result<i32> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i32>() {
        if (1..=12).contains(&n) {
            return Ok(n - 1);
        }
        return Err(anyhow!("Month {} out of range, expected 1-12", n));
    }
    let month = s
        .parse::<Month>()
        .map_err(|_| anyhow!("Invalid month '{}', expected 1-12 or jan..dec", s))?;
    Ok(month.number_from_month() as i32 - 1)
}

/// Stores a new subscription with its first billing date and anchors.
pub fn add_subscription(
    conn: &Connection,
    entry: &EntryFields,
    interval: &Interval,
    params: StartParams,
    now: NaiveDateTime,
) -> Result<(i64, FirstOccurrence)> {
    let first = first_occurrence(interval, params, now);
    conn.execute(
        "INSERT INTO subscriptions(kind, title, amount, category_id, interval, next_billing_date, notes, anchor_day, anchor_month)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            entry.kind.as_str(),
            entry.title,
            entry.amount.to_string(),
            entry.category_id,
            interval.as_str(),
            first.next_billing_date.format(DATETIME_FMT).to_string(),
            entry.notes,
            first.anchor_day,
            first.anchor_month
        ],
    )?;
    Ok((conn.last_insert_rowid(), first))
}

/// Runs the processor against `conn` with the configured cap.
pub fn process_due(conn: &mut Connection, now: Option<NaiveDateTime>) -> Result<usize> {
    let cap = get_settings(conn)?.max_occurrences_per_run;
    let mut store = SqliteStore::new(conn);
    store.on_commit(|changes| {
        tracing::debug!(
            created = changes.transactions_created,
            advanced = ?changes.subscriptions_advanced,
            "ledger changed"
        );
    });
    let mut processor = SubscriptionProcessor::new(store).with_max_occurrences(cap);
    Ok(processor.run(now))
}

fn anchor_label(s: &Subscription) -> String {
    match (&s.interval, s.anchor_day, s.anchor_month) {
        (Interval::Monthly, Some(d), _) => format!("day {}", d),
        (Interval::Yearly, d, Some(m)) => {
            let name = Month::try_from((m.rem_euclid(12) + 1) as u8)
                .map(|m| m.name().to_string())
                .unwrap_or_default();
            format!("{} {}", name, d.unwrap_or(1))
        }
        (Interval::Weekly, _, _) => s.next_billing_date.format("%A").to_string(),
        _ => String::new(),
    }
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = load_subscriptions(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let symbol = get_settings(conn)?.currency;
        let mut rows = Vec::new();
        for s in &data {
            rows.push(vec![
                s.id.to_string(),
                s.title.clone(),
                s.kind.to_string(),
                fmt_money(&s.amount, &symbol),
                s.interval.to_string(),
                anchor_label(s),
                s.next_billing_date.format("%Y-%m-%d %H:%M").to_string(),
                category_name(conn, s.category_id)?.unwrap_or_default(),
            ]);
        }
        println!(
            "{}",
            pretty_table(
                &["ID", "Title", "Kind", "Amount", "Interval", "Anchor", "Next billing", "Category"],
                rows,
            )
        );
    }
    Ok(())
}
