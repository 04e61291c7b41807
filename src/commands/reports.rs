// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Kind;
use crate::settings::get_settings;
use crate::utils::{fmt_money, maybe_print_json, parse_kind, parse_month, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary_cmd(conn, sub)?,
        Some(("by-category", sub)) => by_category_cmd(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub income: Decimal,
    pub expenses: Decimal,
    pub balance: Decimal,
}

/// Rows of (kind, category_id, amount), optionally limited to one `YYYY-MM`.
fn amounts(conn: &Connection, month: Option<&str>) -> Result<Vec<(Kind, i64, Decimal)>> {
    let mut stmt = conn.prepare(
        "SELECT kind, category_id, amount FROM transactions WHERE (?1 IS NULL OR substr(date,1,7)=?1)",
    )?;
    let rows = stmt.query_map(params![month], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (kind, cat, amt_s) = row?;
        let amt = amt_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in transactions", amt_s))?;
        out.push((parse_kind(&kind)?, cat, amt));
    }
    Ok(out)
}

pub fn summary(conn: &Connection, month: Option<&str>) -> Result<Summary> {
    let mut s = Summary::default();
    for (kind, _, amt) in amounts(conn, month)? {
        match kind {
            Kind::Income => s.income += amt,
            Kind::Expense => s.expenses += amt,
        }
    }
    s.balance = s.income - s.expenses;
    Ok(s)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub icon: String,
    pub total: Decimal,
}

/// Totals per category for `kind`, largest first. Transactions whose
/// category no longer exists are grouped under "Other".
pub fn by_category(conn: &Connection, month: Option<&str>, kind: Kind) -> Result<Vec<CategoryTotal>> {
    let mut totals: HashMap<i64, Decimal> = HashMap::new();
    for (k, cat, amt) in amounts(conn, month)? {
        if k == kind {
            *totals.entry(cat).or_insert(Decimal::ZERO) += amt;
        }
    }

    let mut stmt = conn.prepare("SELECT id, name, icon FROM categories")?;
    let names: HashMap<i64, (String, String)> = stmt
        .query_map([], |r| {
            Ok((r.get::<_, i64>(0)?, (r.get::<_, String>(1)?, r.get::<_, String>(2)?)))
        })?
        .collect::<rusqlite::Result<_>>()?;

    let mut merged: HashMap<(String, String), Decimal> = HashMap::new();
    for (cat, total) in totals {
        let key = names
            .get(&cat)
            .cloned()
            .unwrap_or_else(|| ("Other".to_string(), "📦".to_string()));
        *merged.entry(key).or_insert(Decimal::ZERO) += total;
    }
    let mut data: Vec<CategoryTotal> = merged
        .into_iter()
        .map(|((category, icon), total)| CategoryTotal {
            category,
            icon,
            total,
        })
        .collect();
    data.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    Ok(data)
}

fn summary_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub.get_one::<String>("month").map(|m| parse_month(m)).transpose()?;
    let s = summary(conn, month.as_deref())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        let symbol = get_settings(conn)?.currency;
        let rows = vec![
            vec!["Income".to_string(), fmt_money(&s.income, &symbol)],
            vec!["Expenses".to_string(), fmt_money(&s.expenses, &symbol)],
            vec!["Balance".to_string(), fmt_money(&s.balance, &symbol)],
        ];
        let period = month.unwrap_or_else(|| "All time".to_string());
        println!("{}", pretty_table(&[period.as_str(), ""], rows));
    }
    Ok(())
}

fn by_category_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub.get_one::<String>("month").map(|m| parse_month(m)).transpose()?;
    let kind = parse_kind(sub.get_one::<String>("kind").unwrap())?;
    let data = by_category(conn, month.as_deref(), kind)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let symbol = get_settings(conn)?.currency;
        let grand: Decimal = data.iter().map(|c| c.total).sum();
        let rows = data
            .iter()
            .map(|c| {
                let share = if grand.is_zero() {
                    Decimal::ZERO
                } else {
                    c.total * Decimal::ONE_HUNDRED / grand
                };
                vec![
                    format!("{} {}", c.icon, c.category),
                    fmt_money(&c.total, &symbol),
                    format!("{:.1}%", share),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Category", "Total", "Share"], rows));
    }
    Ok(())
}
