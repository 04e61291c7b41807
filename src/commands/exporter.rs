// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

type ExportRow = (String, String, String, String, Option<String>, String);

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();
    if fmt != "csv" && fmt != "json" {
        return Err(anyhow!("Unknown format: {} (use csv|json)", fmt));
    }

    let mut stmt = conn.prepare(
        "SELECT t.date, t.kind, t.title, t.amount, c.name as category, t.notes
         FROM transactions t
         LEFT JOIN categories c ON t.category_id=c.id
         ORDER BY t.date, t.id",
    )?;
    let rows = stmt.query_map([], |r| -> rusqlite::Result<ExportRow> {
        Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
    })?;

    let mut count = 0usize;
    if fmt == "csv" {
        let mut wtr =
            csv::Writer::from_path(out).with_context(|| format!("Create {}", out))?;
        wtr.write_record(["date", "kind", "title", "amount", "category", "notes"])?;
        for row in rows {
            let (d, k, t, amt, cat, notes) = row?;
            wtr.write_record([d, k, t, amt, cat.unwrap_or_default(), notes])?;
            count += 1;
        }
        wtr.flush()?;
    } else {
        let mut items = Vec::new();
        for row in rows {
            let (d, k, t, amt, cat, notes) = row?;
            items.push(json!({
                "date": d, "kind": k, "title": t, "amount": amt, "category": cat, "notes": notes
            }));
        }
        count = items.len();
        std::fs::write(out, serde_json::to_string_pretty(&items)?)
            .with_context(|| format!("Write {}", out))?;
    }
    println!("Exported {} transaction(s) to {}", count, out);
    Ok(())
}
