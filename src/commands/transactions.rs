// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::DATE_FMT;
use crate::models::{Kind, NewTransaction};
use crate::settings::get_settings;
use crate::store::insert_transaction;
use crate::utils::{
    fmt_money, id_for_category, maybe_print_json, parse_date, parse_kind, parse_month,
    pretty_table, today,
};
use crate::validation::{validate_amount, validate_category, validate_date, validate_title};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Validated fields shared by transactions, templates and subscriptions.
pub struct EntryFields {
    pub kind: Kind,
    pub title: String,
    pub amount: Decimal,
    pub category_id: i64,
    pub notes: String,
}

pub fn entry_from_args(conn: &Connection, sub: &clap::ArgMatches) -> Result<EntryFields> {
    let kind = parse_kind(sub.get_one::<String>("kind").unwrap())?;
    let title = validate_title(sub.get_one::<String>("title").unwrap())?;
    let amount = validate_amount(sub.get_one::<String>("amount").unwrap())?;
    let category = validate_category(sub.get_one::<String>("category").map(|s| s.as_str()))?;
    let category_id = id_for_category(conn, &category, Some(kind))?;
    let notes = sub
        .get_one::<String>("notes")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    Ok(EntryFields {
        kind,
        title,
        amount,
        category_id,
        notes,
    })
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let entry = entry_from_args(conn, sub)?;
    let today = today();
    let date = match sub.get_one::<String>("date") {
        Some(d) => validate_date(parse_date(d)?, today)?,
        None => today,
    };
    let tx = NewTransaction {
        kind: entry.kind,
        title: entry.title,
        amount: entry.amount,
        category_id: entry.category_id,
        date,
        notes: entry.notes,
    };
    let id = insert_transaction(conn, &tx)?;
    let symbol = get_settings(conn)?.currency;
    println!(
        "Recorded {} #{} '{}' {} on {}",
        tx.kind,
        id,
        tx.title,
        fmt_money(&tx.amount, &symbol),
        tx.date
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.kind.clone(),
                    r.title.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.notes.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Kind", "Title", "Amount", "Category", "Notes"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub kind: String,
    pub title: String,
    pub amount: String,
    pub category: String,
    pub notes: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, t.kind, t.title, t.amount, c.name, t.notes FROM transactions t LEFT JOIN categories c ON t.category_id=c.id WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(parse_month(month)?);
    }
    if let Some(kind) = sub.get_one::<String>("kind") {
        sql.push_str(" AND t.kind=?");
        params_vec.push(parse_kind(kind)?.as_str().to_string());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND c.name=? COLLATE NOCASE");
        params_vec.push(cat.trim().into());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let category: Option<String> = r.get(5)?;
        data.push(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            kind: r.get(2)?,
            title: r.get(3)?,
            amount: r.get(4)?,
            category: category.unwrap_or_default(),
            notes: r.get(6)?,
        });
    }
    Ok(data)
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(sub.get_one::<String>("id").unwrap())?;
    let current: Option<(String, String, String, i64, String, String)> = conn
        .query_row(
            "SELECT kind, title, amount, category_id, date, notes FROM transactions WHERE id=?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?)),
        )
        .optional()?;
    let (kind_s, title, amount_s, category_id, date_s, notes) =
        current.ok_or_else(|| anyhow!("Transaction {} not found", id))?;

    let kind = match sub.get_one::<String>("kind") {
        Some(k) => parse_kind(k)?,
        None => parse_kind(&kind_s)?,
    };
    let title = match sub.get_one::<String>("title") {
        Some(t) => validate_title(t)?,
        None => title,
    };
    let amount = match sub.get_one::<String>("amount") {
        Some(a) => validate_amount(a)?,
        None => amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid stored amount '{}'", amount_s))?,
    };
    let category_id = match sub.get_one::<String>("category") {
        Some(c) => id_for_category(conn, &validate_category(Some(c))?, Some(kind))?,
        None => category_id,
    };
    let date = match sub.get_one::<String>("date") {
        Some(d) => validate_date(parse_date(d)?, today())?,
        None => parse_date(&date_s)?,
    };
    let notes = sub
        .get_one::<String>("notes")
        .map(|s| s.trim().to_string())
        .unwrap_or(notes);

    conn.execute(
        "UPDATE transactions SET kind=?1, title=?2, amount=?3, category_id=?4, date=?5, notes=?6, updated_at=datetime('now')
         WHERE id=?7",
        params![
            kind.as_str(),
            title,
            amount.to_string(),
            category_id,
            date.format(DATE_FMT).to_string(),
            notes,
            id
        ],
    )?;
    println!("Updated transaction {}", id);
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(sub.get_one::<String>("id").unwrap())?;
    let n = conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(anyhow!("Transaction {} not found", id));
    }
    println!("Removed transaction {}", id);
    Ok(())
}

pub fn parse_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid id '{}'", raw))
}
