// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistence boundary used by the subscription processor.
//!
//! A run only needs two things from storage: the current subscriptions, and
//! an all-or-nothing commit of the transactions and date updates it derived
//! from them. [`SqliteStore`] provides both on top of a rusqlite connection.

use crate::db::{DATE_FMT, DATETIME_FMT};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Interval, Kind, NewTransaction, Subscription};
use chrono::NaiveDateTime;
use rusqlite::{Connection, Row, TransactionBehavior, params};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    CreateTransaction(NewTransaction),
    /// Moves `next_billing_date` from `from` to `to`. Rejected if the stored
    /// value is no longer `from`.
    AdvanceSubscription {
        id: i64,
        from: NaiveDateTime,
        to: NaiveDateTime,
    },
}

pub fn create_transaction(fields: NewTransaction) -> BatchOp {
    BatchOp::CreateTransaction(fields)
}

pub fn update_subscription_next_billing_date(
    id: i64,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> BatchOp {
    BatchOp::AdvanceSubscription { id, from, to }
}

/// Summary of one committed batch, handed to commit listeners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub transactions_created: usize,
    pub subscriptions_advanced: Vec<i64>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.transactions_created == 0 && self.subscriptions_advanced.is_empty()
    }
}

pub trait LedgerStore {
    fn list_subscriptions(&self) -> LedgerResult<Vec<Subscription>>;

    /// Applies every op or none of them.
    fn commit_batch(&mut self, ops: &[BatchOp]) -> LedgerResult<ChangeSet>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for &mut S {
    fn list_subscriptions(&self) -> LedgerResult<Vec<Subscription>> {
        (**self).list_subscriptions()
    }

    fn commit_batch(&mut self, ops: &[BatchOp]) -> LedgerResult<ChangeSet> {
        (**self).commit_batch(ops)
    }
}

type Listener<'c> = Box<dyn Fn(&ChangeSet) + 'c>;

pub struct SqliteStore<'c> {
    conn: &'c mut Connection,
    listeners: Vec<Listener<'c>>,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c mut Connection) -> Self {
        Self {
            conn,
            listeners: Vec::new(),
        }
    }

    /// Registers a callback run after every successful, non-empty commit.
    pub fn on_commit(&mut self, listener: impl Fn(&ChangeSet) + 'c) {
        self.listeners.push(Box::new(listener));
    }
}

impl LedgerStore for SqliteStore<'_> {
    fn list_subscriptions(&self) -> LedgerResult<Vec<Subscription>> {
        load_subscriptions(&*self.conn)
    }

    fn commit_batch(&mut self, ops: &[BatchOp]) -> LedgerResult<ChangeSet> {
        // IMMEDIATE takes the write lock up front, so concurrent runs queue
        // behind each other instead of interleaving.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut changes = ChangeSet::default();
        for op in ops {
            match op {
                BatchOp::CreateTransaction(t) => {
                    insert_transaction(&tx, t)?;
                    changes.transactions_created += 1;
                }
                BatchOp::AdvanceSubscription { id, from, to } => {
                    let n = tx.execute(
                        "UPDATE subscriptions SET next_billing_date=?1, updated_at=datetime('now')
                         WHERE id=?2 AND next_billing_date=?3",
                        params![
                            to.format(DATETIME_FMT).to_string(),
                            id,
                            from.format(DATETIME_FMT).to_string()
                        ],
                    )?;
                    if n == 0 {
                        return Err(LedgerError::Conflict { id: *id });
                    }
                    changes.subscriptions_advanced.push(*id);
                }
            }
        }
        tx.commit()?;
        if !changes.is_empty() {
            for listener in &self.listeners {
                listener(&changes);
            }
        }
        Ok(changes)
    }
}

pub fn insert_transaction(conn: &Connection, t: &NewTransaction) -> LedgerResult<i64> {
    conn.execute(
        "INSERT INTO transactions(kind, title, amount, category_id, date, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            t.kind.as_str(),
            t.title,
            t.amount.to_string(),
            t.category_id,
            t.date.format(DATE_FMT).to_string(),
            t.notes
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const SUBSCRIPTION_COLUMNS: &str = "id, kind, title, amount, category_id, notes, interval, next_billing_date, anchor_day, anchor_month";

/// All subscriptions, by id. Rows that cannot be interpreted are skipped with
/// a warning so one bad record does not block the rest.
pub fn load_subscriptions(conn: &Connection) -> LedgerResult<Vec<Subscription>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM subscriptions ORDER BY id",
        SUBSCRIPTION_COLUMNS
    ))?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        match subscription_from_row(r) {
            Ok(sub) => out.push(sub),
            Err(LedgerError::Corrupt { table, id, reason }) => {
                tracing::warn!(table, id, %reason, "skipping unreadable subscription");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

pub fn get_subscription(conn: &Connection, id: i64) -> LedgerResult<Subscription> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM subscriptions WHERE id=?1",
        SUBSCRIPTION_COLUMNS
    ))?;
    let mut rows = stmt.query(params![id])?;
    let found = match rows.next()? {
        Some(r) => subscription_from_row(r),
        None => Err(LedgerError::NotFound {
            what: "subscription",
            id,
        }),
    };
    found
}

fn subscription_from_row(r: &Row<'_>) -> LedgerResult<Subscription> {
    let id: i64 = r.get(0)?;
    let corrupt = |reason: String| LedgerError::Corrupt {
        table: "subscriptions",
        id,
        reason,
    };
    let kind_s: String = r.get(1)?;
    let amount_s: String = r.get(3)?;
    let interval_s: String = r.get(6)?;
    let next_s: String = r.get(7)?;
    Ok(Subscription {
        id,
        kind: kind_s.parse::<Kind>().map_err(corrupt)?,
        title: r.get(2)?,
        amount: parse_amount(&amount_s).map_err(corrupt)?,
        category_id: r.get(4)?,
        notes: r.get(5)?,
        interval: Interval::from(interval_s),
        next_billing_date: parse_billing_date(&next_s).map_err(corrupt)?,
        anchor_day: r.get(8)?,
        anchor_month: r.get(9)?,
    })
}

/// Parses a stored billing instant. Only the exact `DATETIME_FMT` rendering
/// is accepted: advances compare the stored text, so a value that does not
/// format back to itself could never be updated.
pub fn parse_billing_date(s: &str) -> Result<NaiveDateTime, String> {
    let parsed = NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .map_err(|e| format!("next_billing_date '{}': {}", s, e))?;
    if parsed.format(DATETIME_FMT).to_string() != s {
        return Err(format!(
            "next_billing_date '{}' is not in canonical form '{}'",
            s,
            parsed.format(DATETIME_FMT)
        ));
    }
    Ok(parsed)
}

pub(crate) fn parse_amount(s: &str) -> Result<Decimal, String> {
    s.parse::<Decimal>()
        .map_err(|e| format!("amount '{}': {}", s, e))
}
