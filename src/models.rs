// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Kind::Income),
            "expense" => Ok(Kind::Expense),
            other => Err(format!("Unknown kind '{}', expected income|expense", other)),
        }
    }
}

/// Recurrence cadence of a subscription.
///
/// Stored as text. Values this build does not recognise are kept verbatim in
/// `Other` so that a round trip through the database never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Other(String),
}

impl Interval {
    pub fn as_str(&self) -> &str {
        match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
            Interval::Yearly => "yearly",
            Interval::Other(s) => s.as_str(),
        }
    }

    pub fn is_recognised(&self) -> bool {
        !matches!(self, Interval::Other(_))
    }
}

impl From<&str> for Interval {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Interval::Daily,
            "weekly" => Interval::Weekly,
            "monthly" => Interval::Monthly,
            "yearly" => Interval::Yearly,
            _ => Interval::Other(s.to_string()),
        }
    }
}

impl From<String> for Interval {
    fn from(s: String) -> Self {
        Interval::from(s.as_str())
    }
}

impl From<Interval> for String {
    fn from(i: Interval) -> Self {
        i.as_str().to_string()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: Kind,
    pub icon: String,
}

/// A transaction that has not been written yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub kind: Kind,
    pub title: String,
    pub amount: Decimal,
    pub category_id: i64,
    pub date: NaiveDate,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub kind: Kind,
    pub title: String,
    pub amount: Decimal,
    pub category_id: i64,
    pub notes: String,
}

impl Template {
    pub fn instantiate(&self, date: NaiveDate) -> NewTransaction {
        NewTransaction {
            kind: self.kind,
            title: self.title.clone(),
            amount: self.amount,
            category_id: self.category_id,
            date,
            notes: self.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub kind: Kind,
    pub title: String,
    pub amount: Decimal,
    pub category_id: i64,
    pub notes: String,
    pub interval: Interval,
    pub next_billing_date: NaiveDateTime,
    pub anchor_day: Option<i32>, // 1-31
    pub anchor_month: Option<i32>, // 0-11
}

pub const AUTO_NOTE_PREFIX: &str = "[Auto]";
pub const AUTO_NOTE_DEFAULT: &str = "[Auto-Subscription]";

impl Subscription {
    /// The transaction materialized for the occurrence due at `on`.
    pub fn occurrence(&self, on: NaiveDateTime) -> NewTransaction {
        let notes = if self.notes.trim().is_empty() {
            AUTO_NOTE_DEFAULT.to_string()
        } else {
            format!("{} {}", AUTO_NOTE_PREFIX, self.notes)
        };
        NewTransaction {
            kind: self.kind,
            title: self.title.clone(),
            amount: self.amount,
            category_id: self.category_id,
            date: on.date(),
            notes,
        }
    }
}
