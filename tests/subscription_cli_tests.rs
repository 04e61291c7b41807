// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billclip::commands::doctor::diagnose;
use billclip::commands::subscriptions::{self, parse_month_arg, start_params_from_args};
use billclip::db::{self, DATETIME_FMT};
use billclip::{cli, schedule::StartParams};
use billclip::store::parse_billing_date;
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use rusqlite::{Connection, params};

fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn sub_cmd(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let argv = ["billclip", "sub"].iter().chain(args.iter()).copied();
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("sub", sub_m)) => subscriptions::handle(conn, sub_m),
        _ => panic!("no sub subcommand"),
    }
}

fn add_params(args: &[&str]) -> anyhow::Result<StartParams> {
    let argv = [
        "billclip", "sub", "add", "--title", "T", "--amount", "1", "--category", "Bills",
        "--interval", "monthly",
    ]
    .iter()
    .chain(args.iter())
    .copied();
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, sub_m) = matches.subcommand().unwrap();
    let (_, add_m) = sub_m.subcommand().unwrap();
    start_params_from_args(add_m)
}

fn insert_raw(conn: &Connection, title: &str, interval: &str, next: &str, day: Option<i32>, month: Option<i32>) {
    conn.execute(
        "INSERT INTO subscriptions(kind, title, amount, category_id, interval, next_billing_date, notes, anchor_day, anchor_month)
         VALUES ('expense', ?1, '5', 4, ?2, ?3, '', ?4, ?5)",
        params![title, interval, next, day, month],
    )
    .unwrap();
}

#[test]
fn start_params_parse_each_field() {
    let p = add_params(&["--weekday", "fri", "--day", "31", "--month", "feb"]).unwrap();
    assert_eq!(
        p,
        StartParams {
            weekday: Some(Weekday::Fri),
            month_day: Some(31),
            month: Some(1),
        }
    );
    assert_eq!(add_params(&[]).unwrap(), StartParams::default());
    assert!(add_params(&["--weekday", "someday"]).is_err());
    assert!(add_params(&["--day", "x"]).is_err());
}

#[test]
fn month_argument_is_zero_based() {
    assert_eq!(parse_month_arg("1").unwrap(), 0);
    assert_eq!(parse_month_arg("12").unwrap(), 11);
    assert_eq!(parse_month_arg("December").unwrap(), 11);
    assert!(parse_month_arg("13").is_err());
    assert!(parse_month_arg("smarch").is_err());
}

#[test]
fn add_stores_anchor_and_first_billing() {
    let mut conn = db::open_in_memory().unwrap();
    sub_cmd(
        &mut conn,
        &[
            "add", "--title", "Insurance", "--amount", "80", "--category", "Bills",
            "--interval", "yearly", "--month", "12",
        ],
    )
    .unwrap();
    let (interval, next, day, month): (String, String, Option<i32>, Option<i32>) = conn
        .query_row(
            "SELECT interval, next_billing_date, anchor_day, anchor_month FROM subscriptions",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!(interval, "yearly");
    assert!(next.ends_with("-12-01T12:00:00"));
    assert_eq!((day, month), (Some(1), Some(11)));
}

#[test]
fn add_validates_entry_fields() {
    let mut conn = db::open_in_memory().unwrap();
    let err = sub_cmd(
        &mut conn,
        &[
            "add", "--title", " ", "--amount", "5", "--category", "Bills", "--interval", "daily",
        ],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Title is required.");
}

#[test]
fn sync_with_explicit_now_and_rm() {
    let mut conn = db::open_in_memory().unwrap();
    insert_raw(&conn, "Daily", "daily", "2025-06-01T12:00:00", None, None);
    sub_cmd(&mut conn, &["sync", "--now", "2025-06-03"]).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 3);
    let next: String = conn
        .query_row("SELECT next_billing_date FROM subscriptions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(next, noon(2025, 6, 4).format(DATETIME_FMT).to_string());

    sub_cmd(&mut conn, &["rm", "--id", "1"]).unwrap();
    assert!(sub_cmd(&mut conn, &["rm", "--id", "1"]).is_err());
    // history stays after the subscription is gone
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 3);
}

#[test]
fn doctor_reports_problem_rows() {
    let conn = db::open_in_memory().unwrap();
    insert_raw(&conn, "Due", "monthly", "2025-01-15T12:00:00", Some(15), None);
    insert_raw(&conn, "Broken", "weekly", "someday", None, None);
    insert_raw(&conn, "Odd", "fortnightly", "2026-01-01T12:00:00", None, None);
    insert_raw(&conn, "Bare", "yearly", "2026-01-01T12:00:00", None, Some(14));
    conn.execute(
        "INSERT INTO transactions(kind,title,amount,category_id,date,notes) VALUES ('expense','x','1',404,'2025-01-01','')",
        [],
    )
    .unwrap();

    let issues = diagnose(&conn, noon(2025, 3, 1)).unwrap();
    let kinds: Vec<&str> = issues.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        kinds,
        vec![
            "subscription_due",
            "bad_next_billing_date",
            "unknown_interval",
            "missing_anchor",
            "anchor_out_of_range",
            "unknown_category",
        ]
    );
    assert!(issues[0].1.contains("#1 Due"));
    assert!(issues[5].1.contains("404"));
}

#[test]
fn doctor_is_quiet_on_clean_data() {
    let conn = db::open_in_memory().unwrap();
    insert_raw(&conn, "Fine", "monthly", "2025-04-15T12:00:00", Some(15), None);
    assert!(diagnose(&conn, noon(2025, 3, 1)).unwrap().is_empty());
}

#[test]
fn doctor_flags_non_canonical_billing_text() {
    let conn = db::open_in_memory().unwrap();
    insert_raw(&conn, "Sloppy", "monthly", "2025-3-1T12:00:00", Some(1), None);
    let issues = diagnose(&conn, noon(2025, 1, 1)).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].0, "bad_next_billing_date");
    assert!(parse_billing_date("2025-03-01T12:00:00").is_ok());
    assert!(parse_billing_date("2025-3-1T12:00:00").is_err());
}

#[test]
fn startup_sync_leaves_explicit_sync_alone() {
    let wants = |args: &[&str]| {
        let argv = ["billclip"].iter().chain(args.iter()).copied();
        cli::wants_startup_sync(&cli::build_cli().get_matches_from(argv))
    };
    assert!(!wants(&["sub", "sync", "--now", "2025-01-01"]));
    assert!(!wants(&["sub", "sync"]));
    assert!(!wants(&["init"]));
    assert!(!wants(&["import", "legacy", "--path", "x.json"]));
    assert!(!wants(&["--no-sync", "tx", "list"]));
    assert!(wants(&["sub", "list"]));
    assert!(wants(&["report", "summary"]));
    assert!(wants(&[]));
}
