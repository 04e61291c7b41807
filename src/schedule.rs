// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurrence date arithmetic.
//!
//! Everything here is pure: no clock reads, no I/O. Billing instants are
//! local date-times pinned to [`BILLING_HOUR`] so that a shift across a
//! daylight-saving boundary can never move an occurrence onto another day.

use crate::models::Interval;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

pub const BILLING_HOUR: u32 = 12;

/// Step used for intervals this build does not understand.
pub const FALLBACK_DAYS: i64 = 30;

/// Number of days in `month0` (0 = January) of `year`.
pub fn days_in_month(year: i32, month0: u32) -> u32 {
    // Day 0 of the following month is the last day of this one.
    let (next_year, next_month0) = next_month(year, month0);
    NaiveDate::from_ymd_opt(next_year, next_month0 + 1, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

pub fn clamp_day(year: i32, month0: u32, day: i32) -> u32 {
    day.clamp(1, days_in_month(year, month0) as i32) as u32
}

/// Folds any integer month into 0..=11.
pub fn normalize_month(month: i32) -> u32 {
    month.rem_euclid(12) as u32
}

fn next_month(year: i32, month0: u32) -> (i32, u32) {
    if month0 >= 11 {
        (year + 1, 0)
    } else {
        (year, month0 + 1)
    }
}

pub fn at_billing_hour(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(BILLING_HOUR, 0, 0)
        .unwrap_or_else(|| date.and_time(NaiveTime::default()))
}

/// Billing instant on `day` (clamped) of `month0` in `year`.
pub fn billing_instant(year: i32, month0: u32, day: i32) -> NaiveDateTime {
    let month0 = normalize_month(month0 as i32);
    let date = NaiveDate::from_ymd_opt(year, month0 + 1, clamp_day(year, month0, day))
        .unwrap_or(NaiveDate::MAX);
    at_billing_hour(date)
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MAX)
}

/// Next occurrence strictly after `current`.
///
/// Anchors are the recurrence rule, not the previous result: a monthly
/// subscription anchored to day 31 lands on Feb 28/29 and then goes back to
/// Mar 31. Without an anchor the day (monthly) or month (yearly) of `current`
/// is used instead.
pub fn advance(
    current: NaiveDateTime,
    interval: &Interval,
    anchor_day: Option<i32>,
    anchor_month: Option<i32>,
) -> NaiveDateTime {
    let date = current.date();
    match interval {
        Interval::Daily => at_billing_hour(add_days(date, 1)),
        Interval::Weekly => at_billing_hour(add_days(date, 7)),
        Interval::Monthly => {
            let day = anchor_day.unwrap_or(date.day() as i32);
            let (year, month0) = next_month(date.year(), date.month0());
            billing_instant(year, month0, day)
        }
        Interval::Yearly => {
            let month0 = anchor_month.map(normalize_month).unwrap_or(date.month0());
            let day = anchor_day.unwrap_or(1);
            billing_instant(date.year().saturating_add(1), month0, day)
        }
        Interval::Other(raw) => {
            if cfg!(debug_assertions) {
                tracing::warn!(interval = %raw, "unrecognised interval, advancing {} days", FALLBACK_DAYS);
            }
            at_billing_hour(add_days(date, FALLBACK_DAYS))
        }
    }
}

/// User choices made when a subscription is created. Only the field that
/// matches the interval is read; missing values default to "today".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartParams {
    pub weekday: Option<Weekday>,
    pub month_day: Option<i32>,
    pub month: Option<i32>, // 0-11
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstOccurrence {
    pub next_billing_date: NaiveDateTime,
    pub anchor_day: Option<i32>,
    pub anchor_month: Option<i32>,
}

pub fn first_occurrence(
    interval: &Interval,
    params: StartParams,
    now: NaiveDateTime,
) -> FirstOccurrence {
    let today = now.date();
    match interval {
        Interval::Weekly => {
            let target = params.weekday.unwrap_or(today.weekday());
            let offset = (target.num_days_from_sunday() + 7
                - today.weekday().num_days_from_sunday())
                % 7;
            FirstOccurrence {
                next_billing_date: at_billing_hour(add_days(today, offset as i64)),
                anchor_day: None,
                anchor_month: None,
            }
        }
        Interval::Monthly => {
            let target = params.month_day.unwrap_or(today.day() as i32).clamp(1, 31);
            let mut candidate = billing_instant(today.year(), today.month0(), target);
            if candidate <= now {
                let (year, month0) = next_month(today.year(), today.month0());
                candidate = billing_instant(year, month0, target);
            }
            FirstOccurrence {
                next_billing_date: candidate,
                anchor_day: Some(target),
                anchor_month: None,
            }
        }
        Interval::Yearly => {
            let month0 = params.month.map(normalize_month).unwrap_or(today.month0());
            let mut candidate = billing_instant(today.year(), month0, 1);
            if candidate <= now {
                candidate = billing_instant(today.year() + 1, month0, 1);
            }
            FirstOccurrence {
                next_billing_date: candidate,
                anchor_day: Some(1),
                anchor_month: Some(month0 as i32),
            }
        }
        Interval::Daily | Interval::Other(_) => FirstOccurrence {
            next_billing_date: at_billing_hour(today),
            anchor_day: None,
            anchor_month: None,
        },
    }
}
