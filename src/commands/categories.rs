// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Category, Kind};
use crate::utils::{id_for_category, maybe_print_json, parse_kind, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            if name.is_empty() {
                return Err(anyhow!("Please enter a category name"));
            }
            let kind = parse_kind(sub.get_one::<String>("kind").unwrap())?;
            let icon = sub.get_one::<String>("icon").map(|s| s.trim()).unwrap_or("");
            conn.execute(
                "INSERT INTO categories(name, kind, icon) VALUES (?1, ?2, ?3)",
                params![name, kind.as_str(), icon],
            )?;
            println!("Added {} category '{}'", kind, name);
        }
        Some(("list", sub)) => {
            let kind = sub
                .get_one::<String>("kind")
                .map(|s| parse_kind(s))
                .transpose()?;
            let data = list(conn, kind)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.icon, c.name, c.kind.to_string()])
                    .collect();
                println!("{}", pretty_table(&["ID", "", "Category", "Kind"], rows));
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind = sub
                .get_one::<String>("kind")
                .map(|s| parse_kind(s))
                .transpose()?;
            let id = id_for_category(conn, name, kind)?;
            conn.execute("DELETE FROM categories WHERE id=?1", params![id])?;
            println!("Removed category '{}'", name.trim());
        }
        _ => {}
    }
    Ok(())
}

pub fn list(conn: &Connection, kind: Option<Kind>) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, kind, icon FROM categories WHERE (?1 IS NULL OR kind=?1) ORDER BY kind DESC, name",
    )?;
    let rows = stmt.query_map(params![kind.map(|k| k.as_str())], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (id, name, kind, icon) = row?;
        data.push(Category {
            id,
            name,
            kind: parse_kind(&kind)?,
            icon,
        });
    }
    Ok(data)
}
