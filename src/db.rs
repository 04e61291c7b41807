// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Billclip", "billclip"));

/// Storage format of billing instants (local time, second precision).
pub const DATETIME_FMT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DATE_FMT: &str = "%Y-%m-%d";

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("billclip.sqlite"))
}

pub fn open_at(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    conn.busy_timeout(Duration::from_secs(5))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// (name, kind, icon)
pub const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Food", "expense", "🍔"),
    ("Transport", "expense", "🚗"),
    ("Shopping", "expense", "🛒"),
    ("Bills", "expense", "🧾"),
    ("Entertainment", "expense", "🎬"),
    ("Health", "expense", "🏥"),
    ("Education", "expense", "📚"),
    ("Other", "expense", "📦"),
    ("Salary", "income", "💰"),
    ("Freelance", "income", "💼"),
    ("Investment", "income", "📈"),
    ("Other", "income", "🏷️"),
];

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('income','expense')),
        icon TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(name, kind)
    );

    -- category_id is a plain reference: deleting a category leaves history intact
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL CHECK(kind IN ('income','expense')),
        title TEXT NOT NULL,
        amount TEXT NOT NULL,
        category_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        notes TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
    CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);

    CREATE TABLE IF NOT EXISTS templates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL CHECK(kind IN ('income','expense')),
        title TEXT NOT NULL,
        amount TEXT NOT NULL,
        category_id INTEGER NOT NULL,
        notes TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS subscriptions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL CHECK(kind IN ('income','expense')),
        title TEXT NOT NULL,
        amount TEXT NOT NULL,
        category_id INTEGER NOT NULL,
        interval TEXT NOT NULL,
        next_billing_date TEXT NOT NULL, -- local time, DATETIME_FMT
        notes TEXT NOT NULL DEFAULT '',
        anchor_day INTEGER,
        anchor_month INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    )?;
    seed_default_categories(conn)?;
    Ok(())
}

fn seed_default_categories(conn: &Connection) -> Result<()> {
    // Seed once; a user who deletes every category keeps an empty list.
    let seeded: i64 = conn.query_row(
        "SELECT COUNT(*) FROM settings WHERE key='categories_seeded'",
        [],
        |r| r.get(0),
    )?;
    if seeded > 0 {
        return Ok(());
    }
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO categories(name, kind, icon) VALUES (?1, ?2, ?3)",
    )?;
    for (name, kind, icon) in DEFAULT_CATEGORIES {
        stmt.execute(params![name, kind, icon])?;
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('categories_seeded', '1')",
        [],
    )?;
    Ok(())
}
