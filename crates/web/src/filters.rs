//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Estimated reading time in whole minutes (at least one).
///
/// Usage in templates: `{{ card.content|reading_minutes }}`
#[askama::filter_fn]
pub fn reading_minutes(text: impl Display, _env: &dyn askama::Values) -> askama::Result<usize> {
    Ok(minutes_for(&text.to_string()))
}

const WORDS_PER_MINUTE: usize = 200;

fn minutes_for(text: &str) -> usize {
    text.split_whitespace().count().div_ceil(WORDS_PER_MINUTE).max(1)
}
