// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billclip::commands::importer::{self, ImportSummary, import_legacy};
use billclip::models::Interval;
use billclip::store::load_subscriptions;
use billclip::{cli, db};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::io::Write;
use std::str::FromStr;
use tempfile::NamedTempFile;

const SNAPSHOT: &str = r#"{
  "categories": [
    {"id": "cat_food", "name": "Food", "type": "expense", "icon": "🍔"},
    {"id": "c_1712", "name": "Pets", "type": "expense", "icon": "🐶"}
  ],
  "transactions": [
    {"id": "t1", "type": "expense", "title": "Kibble", "amount": 15.5, "categoryId": "c_1712", "date": "2025-01-10T12:00:00"},
    {"id": "t2", "type": "income", "title": "Gig", "amount": 650, "categoryId": "cat_freelance", "date": "2025-01-11T12:00:00", "notes": "logo"},
    {"id": "t3", "type": "expense", "title": "Mystery", "amount": 3, "categoryId": "c_gone", "date": "2025-01-12T12:00:00"}
  ],
  "templates": [
    {"id": "p1", "type": "expense", "title": "Coffee", "amount": 4, "categoryId": "cat_food"}
  ],
  "subscriptions": [
    {"id": "s1", "type": "expense", "title": "Vet plan", "amount": 20, "categoryId": "c_1712",
     "interval": "monthly", "nextBillingDate": "2025-02-28T12:00:00", "anchorDay": 31},
    {"id": "s2", "type": "expense", "title": "Domain", "amount": 12, "categoryId": "cat_bills",
     "interval": "yearly", "nextBillingDate": "2026-01-01T12:00:00", "anchorDay": 1, "anchorMonth": 0},
    {"id": "s3", "type": "income", "title": "Stipend", "amount": 100, "categoryId": "nope",
     "interval": "quarterly", "nextBillingDate": "2025-04-01T12:00:00"}
  ]
}"#;

fn category_of(conn: &Connection, title: &str) -> (String, String) {
    conn.query_row(
        "SELECT c.name, c.kind FROM transactions t JOIN categories c ON c.id=t.category_id WHERE t.title=?1",
        [title],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .unwrap()
}

#[test]
fn legacy_snapshot_is_migrated_once() {
    let mut conn = db::open_in_memory().unwrap();
    let summary = import_legacy(&mut conn, SNAPSHOT).unwrap();
    assert_eq!(
        summary,
        Some(ImportSummary {
            categories: 1,
            transactions: 3,
            templates: 1,
            subscriptions: 3,
        })
    );
    // the marker makes a second attempt a no-op
    assert_eq!(import_legacy(&mut conn, SNAPSHOT).unwrap(), None);
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 3);
}

#[test]
fn legacy_category_ids_are_remapped() {
    let mut conn = db::open_in_memory().unwrap();
    import_legacy(&mut conn, SNAPSHOT).unwrap();
    assert_eq!(category_of(&conn, "Kibble"), ("Pets".into(), "expense".into()));
    assert_eq!(category_of(&conn, "Gig"), ("Freelance".into(), "income".into()));
    assert_eq!(category_of(&conn, "Mystery"), ("Other".into(), "expense".into()));

    let (amount, date, notes): (String, String, String) = conn
        .query_row(
            "SELECT amount, date, notes FROM transactions WHERE title='Kibble'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(Decimal::from_str(&amount).unwrap(), Decimal::from_str("15.5").unwrap());
    assert_eq!(date, "2025-01-10");
    assert_eq!(notes, "");
}

#[test]
fn legacy_subscriptions_keep_schedule_and_anchors() {
    let mut conn = db::open_in_memory().unwrap();
    import_legacy(&mut conn, SNAPSHOT).unwrap();
    let subs = load_subscriptions(&conn).unwrap();
    assert_eq!(subs.len(), 3);

    let vet = &subs[0];
    assert_eq!(vet.interval, Interval::Monthly);
    assert_eq!(
        vet.next_billing_date,
        NaiveDate::from_ymd_opt(2025, 2, 28).unwrap().and_hms_opt(12, 0, 0).unwrap()
    );
    assert_eq!(vet.anchor_day, Some(31));

    let domain = &subs[1];
    assert_eq!((domain.anchor_day, domain.anchor_month), (Some(1), Some(0)));

    let stipend = &subs[2];
    assert_eq!(stipend.interval, Interval::Other("quarterly".into()));
    let (name, kind): (String, String) = conn
        .query_row(
            "SELECT name, kind FROM categories WHERE id=?1",
            [stipend.category_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!((name.as_str(), kind.as_str()), ("Other", "income"));
}

#[test]
fn invalid_snapshot_leaves_database_untouched() {
    let mut conn = db::open_in_memory().unwrap();
    let bad = r#"{"transactions": [
        {"type": "expense", "title": "Ok", "amount": 1, "categoryId": "cat_food", "date": "2025-01-01T12:00:00"},
        {"type": "expense", "title": "Bad", "amount": 1, "categoryId": "cat_food", "date": "yesterday"}
    ]}"#;
    assert!(import_legacy(&mut conn, bad).is_err());
    assert!(import_legacy(&mut conn, "not json").is_err());
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
    // a failed attempt does not mark the migration as done
    assert!(import_legacy(&mut conn, "{}").unwrap().is_some());
}

#[test]
fn import_legacy_command_reads_file() {
    let mut conn = db::open_in_memory().unwrap();
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", SNAPSHOT).unwrap();
    let path = file.path().to_string_lossy().to_string();

    let matches =
        cli::build_cli().get_matches_from(["billclip", "import", "legacy", "--path", path.as_str()]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&mut conn, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM subscriptions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 3);
}

#[test]
fn legacy_subscriptions_without_anchors_get_them_from_billing_date() {
    let mut conn = db::open_in_memory().unwrap();
    let snapshot = r#"{"subscriptions": [
        {"type": "expense", "title": "Rent", "amount": 900, "categoryId": "cat_bills",
         "interval": "monthly", "nextBillingDate": "2025-01-31T12:00:00"},
        {"type": "expense", "title": "Club", "amount": 50, "categoryId": "cat_bills",
         "interval": "yearly", "nextBillingDate": "2025-03-15T12:00:00"},
        {"type": "expense", "title": "Paper", "amount": 2, "categoryId": "cat_bills",
         "interval": "weekly", "nextBillingDate": "2025-03-15T12:00:00"}
    ]}"#;
    import_legacy(&mut conn, snapshot).unwrap();
    let subs = load_subscriptions(&conn).unwrap();
    assert_eq!((subs[0].anchor_day, subs[0].anchor_month), (Some(31), None));
    assert_eq!((subs[1].anchor_day, subs[1].anchor_month), (Some(15), Some(2)));
    assert_eq!((subs[2].anchor_day, subs[2].anchor_month), (None, None));

    let now = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
    billclip::commands::subscriptions::process_due(&mut conn, Some(now)).unwrap();
    let mut stmt = conn
        .prepare("SELECT date FROM transactions WHERE title='Rent' ORDER BY date")
        .unwrap();
    let dates: Vec<String> = stmt
        .query_map([], |r| r.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(dates, vec!["2025-01-31", "2025-02-28", "2025-03-31"]);
}
