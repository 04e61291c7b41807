// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Checks applied to user-entered transactions, templates and subscriptions.
//! The processor never goes through these; it copies already-validated
//! subscription fields.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

pub const MAX_TITLE_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required.")]
    TitleMissing,
    #[error("Title must be 100 characters or fewer.")]
    TitleTooLong,
    #[error("Amount is required.")]
    AmountMissing,
    #[error("Amount must be a valid number.")]
    AmountInvalid,
    #[error("Amount must be greater than zero.")]
    AmountNotPositive,
    #[error("Date cannot be in the future.")]
    DateInFuture,
    #[error("Please select a category.")]
    CategoryMissing,
}

pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let t = title.trim();
    if t.is_empty() {
        return Err(ValidationError::TitleMissing);
    }
    if t.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(t.to_string())
}

pub fn validate_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ValidationError::AmountMissing);
    }
    let amount = s
        .parse::<Decimal>()
        .map_err(|_| ValidationError::AmountInvalid)?;
    if amount <= Decimal::ZERO {
        return Err(ValidationError::AmountNotPositive);
    }
    Ok(amount)
}

/// Dates up to and including `today` are accepted.
pub fn validate_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    if date > today {
        return Err(ValidationError::DateInFuture);
    }
    Ok(date)
}

pub fn validate_category(category: Option<&str>) -> Result<String, ValidationError> {
    match category.map(str::trim) {
        Some(c) if !c.is_empty() => Ok(c.to_string()),
        _ => Err(ValidationError::CategoryMissing),
    }
}
