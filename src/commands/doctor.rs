// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Interval;
use crate::store::parse_billing_date;
use crate::utils::pretty_table;
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::Connection;

pub fn handle(conn: &Connection) -> Result<()> {
    let now = chrono::Local::now().naive_local();
    let rows: Vec<Vec<String>> = diagnose(conn, now)?
        .into_iter()
        .map(|(issue, detail)| vec![issue, detail])
        .collect();
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// (issue, detail) pairs, subscriptions first.
pub fn diagnose(conn: &Connection, now: NaiveDateTime) -> Result<Vec<(String, String)>> {
    let mut issues = Vec::new();

    let mut stmt = conn.prepare(
        "SELECT id, title, interval, next_billing_date, anchor_day, anchor_month FROM subscriptions ORDER BY id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let title: String = r.get(1)?;
        let interval = Interval::from(r.get::<_, String>(2)?);
        let next_s: String = r.get(3)?;
        let anchor_day: Option<i32> = r.get(4)?;
        let anchor_month: Option<i32> = r.get(5)?;
        let label = format!("#{} {}", id, title);

        match parse_billing_date(&next_s) {
            Ok(next) if next <= now => {
                issues.push(("subscription_due".into(), format!("{} since {}", label, next)));
            }
            Ok(_) => {}
            Err(reason) => issues.push((
                "bad_next_billing_date".into(),
                format!("{} {}", label, reason),
            )),
        }
        if !interval.is_recognised() {
            issues.push((
                "unknown_interval".into(),
                format!("{} '{}' (advances 30 days)", label, interval),
            ));
        }
        match interval {
            Interval::Monthly if anchor_day.is_none() => {
                issues.push(("missing_anchor".into(), format!("{} has no anchor day", label)));
            }
            Interval::Yearly if anchor_day.is_none() || anchor_month.is_none() => {
                issues.push(("missing_anchor".into(), format!("{} has no anchor month/day", label)));
            }
            _ => {}
        }
        if let Some(d) = anchor_day.filter(|d| !(1..=31).contains(d)) {
            issues.push(("anchor_out_of_range".into(), format!("{} day {}", label, d)));
        }
        if let Some(m) = anchor_month.filter(|m| !(0..=11).contains(m)) {
            issues.push(("anchor_out_of_range".into(), format!("{} month {}", label, m)));
        }
    }

    let mut stmt2 = conn.prepare(
        "SELECT t.category_id, COUNT(*) FROM transactions t
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE c.id IS NULL GROUP BY t.category_id ORDER BY t.category_id",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let cat: i64 = r.get(0)?;
        let n: i64 = r.get(1)?;
        issues.push((
            "unknown_category".into(),
            format!("category {} used by {} transaction(s)", cat, n),
        ));
    }
    Ok(issues)
}
