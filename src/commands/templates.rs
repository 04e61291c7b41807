// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::{entry_from_args, parse_id};
use crate::models::Template;
use crate::store::{insert_transaction, parse_amount};
use crate::utils::{
    category_name, maybe_print_json, parse_date, parse_kind, pretty_table, today,
};
use crate::validation::validate_date;
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let e = entry_from_args(conn, sub)?;
            conn.execute(
                "INSERT INTO templates(kind, title, amount, category_id, notes) VALUES (?1,?2,?3,?4,?5)",
                params![e.kind.as_str(), e.title, e.amount.to_string(), e.category_id, e.notes],
            )?;
            println!("Saved template #{} '{}'", conn.last_insert_rowid(), e.title);
        }
        Some(("list", sub)) => {
            let data = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let mut rows = Vec::new();
                for t in data {
                    rows.push(vec![
                        t.id.to_string(),
                        t.kind.to_string(),
                        t.title,
                        t.amount.to_string(),
                        category_name(conn, t.category_id)?.unwrap_or_default(),
                        t.notes,
                    ]);
                }
                println!(
                    "{}",
                    pretty_table(&["ID", "Kind", "Title", "Amount", "Category", "Notes"], rows)
                );
            }
        }
        Some(("use", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let template = get(conn, id)?;
            let today = today();
            let date = match sub.get_one::<String>("date") {
                Some(d) => validate_date(parse_date(d)?, today)?,
                None => today,
            };
            let tx_id = insert_transaction(conn, &template.instantiate(date))?;
            println!(
                "Recorded transaction #{} from template '{}' on {}",
                tx_id, template.title, date
            );
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub.get_one::<String>("id").unwrap())?;
            let n = conn.execute("DELETE FROM templates WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(anyhow!("Template {} not found", id));
            }
            println!("Removed template {}", id);
        }
        _ => {}
    }
    Ok(())
}

type TemplateRow = (i64, String, String, String, i64, String);

fn from_row(row: TemplateRow) -> Result<Template> {
    let (id, kind, title, amount, category_id, notes) = row;
    Ok(Template {
        id,
        kind: parse_kind(&kind)?,
        title,
        amount: parse_amount(&amount).map_err(|e| anyhow!("template {}: {}", id, e))?,
        category_id,
        notes,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<Template>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, title, amount, category_id, notes FROM templates ORDER BY title, id",
    )?;
    let rows = stmt.query_map([], |r| -> rusqlite::Result<TemplateRow> {
        Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(from_row(row?)?);
    }
    Ok(data)
}

pub fn get(conn: &Connection, id: i64) -> Result<Template> {
    let row: Option<TemplateRow> = conn
        .query_row(
            "SELECT id, kind, title, amount, category_id, notes FROM templates WHERE id=?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?)),
        )
        .optional()?;
    from_row(row.ok_or_else(|| anyhow!("Template {} not found", id))?)
}
