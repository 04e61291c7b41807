// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Catch-up of due subscriptions.
//!
//! A run reads every subscription once, walks each one forward from its
//! stored `next_billing_date` until that date is after `now`, and writes one
//! transaction per step dated at the occurrence itself. All writes of a run
//! go to the store as a single batch; if the batch fails nothing is applied
//! and every skipped occurrence is still due on the next run.

use crate::error::LedgerResult;
use crate::models::Subscription;
use crate::schedule::advance;
use crate::store::{BatchOp, LedgerStore, create_transaction, update_subscription_next_billing_date};
use chrono::{Local, NaiveDateTime};

/// Upper bound on occurrences materialized by one run.
pub const DEFAULT_MAX_OCCURRENCES: usize = 500;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatchUpPlan {
    pub ops: Vec<BatchOp>,
    pub occurrences: usize,
    /// Some due occurrence was left for a later run because of the cap.
    pub capped: bool,
}

/// Computes the batch for one run without touching storage.
///
/// Subscriptions are visited in slice order; within a subscription
/// occurrences come out oldest first. Once `max_occurrences` is reached the
/// remaining due occurrences (of this and later subscriptions) are left as
/// they are, and whatever progress was made is still recorded.
pub fn plan_catch_up(
    subscriptions: &[Subscription],
    now: NaiveDateTime,
    max_occurrences: usize,
) -> CatchUpPlan {
    let mut plan = CatchUpPlan::default();
    for sub in subscriptions {
        let mut billing = sub.next_billing_date;
        let mut emitted = 0usize;
        while billing <= now {
            if plan.occurrences >= max_occurrences {
                plan.capped = true;
                break;
            }
            let next = advance(billing, &sub.interval, sub.anchor_day, sub.anchor_month);
            if next <= billing {
                tracing::warn!(subscription = sub.id, %billing, "billing date cannot advance further");
                break;
            }
            tracing::debug!(subscription = sub.id, date = %billing.date(), "materializing occurrence");
            plan.ops.push(create_transaction(sub.occurrence(billing)));
            plan.occurrences += 1;
            emitted += 1;
            billing = next;
        }
        if emitted > 0 {
            plan.ops.push(update_subscription_next_billing_date(
                sub.id,
                sub.next_billing_date,
                billing,
            ));
        }
    }
    plan
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub created: usize,
    pub subscriptions_advanced: usize,
    pub capped: bool,
}

pub struct SubscriptionProcessor<S> {
    store: S,
    max_occurrences: usize,
}

impl<S: LedgerStore> SubscriptionProcessor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
        }
    }

    pub fn with_max_occurrences(mut self, max_occurrences: usize) -> Self {
        self.max_occurrences = max_occurrences;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Processes everything due at `now_override` (or the local wall clock)
    /// and returns the number of transactions created.
    ///
    /// Never fails: load and commit errors are logged and reported as zero,
    /// and the next run picks up the same work.
    pub fn run(&mut self, now_override: Option<NaiveDateTime>) -> usize {
        let now = now_override.unwrap_or_else(|| Local::now().naive_local());
        match self.try_run(now) {
            Ok(report) => report.created,
            Err(err) => {
                tracing::error!(error = %err, "subscription processing failed");
                0
            }
        }
    }

    pub fn try_run(&mut self, now: NaiveDateTime) -> LedgerResult<RunReport> {
        let subscriptions = self.store.list_subscriptions()?;
        let plan = plan_catch_up(&subscriptions, now, self.max_occurrences);
        if plan.capped {
            tracing::warn!(
                cap = self.max_occurrences,
                "occurrence cap reached, remaining occurrences deferred to the next run"
            );
        }
        if plan.ops.is_empty() {
            return Ok(RunReport::default());
        }
        let changes = self.store.commit_batch(&plan.ops)?;
        let report = RunReport {
            created: changes.transactions_created,
            subscriptions_advanced: changes.subscriptions_advanced.len(),
            capped: plan.capped,
        };
        tracing::info!(
            created = report.created,
            subscriptions = report.subscriptions_advanced,
            capped = report.capped,
            %now,
            "processed due subscriptions"
        );
        Ok(report)
    }
}
