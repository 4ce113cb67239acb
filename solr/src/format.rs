//! Escaping and date arithmetic for Solr query values.

use crate::error::ConversionError;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::borrow::Cow;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Milliseconds of one day, used by day-aligned function queries
pub(crate) const MILLIS_PER_DAY: i64 = 86_400_000;

fn needs_escape(c: char) -> bool {
    matches!(c, '+' | '-' | '&' | '|' | '!' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '"' | '~' | '*' | '?' | ':' | '/' | '\\')
        || c.is_whitespace()
}

/// Escapes the Solr query syntax characters and whitespace of a value.
///
/// Returns the input unchanged (borrowed) if there is nothing to escape.
pub fn escape(value: &str) -> Cow<'_, str> {
    if !value.chars().any(needs_escape) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        if needs_escape(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

/// Parses an Audlang date (`yyyy-MM-dd`) or date-time (`yyyy-MM-dd HH:mm:ss`) value
pub(crate) fn parse_date_time(arg_name: &str, value: &str) -> Result<NaiveDateTime, ConversionError> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT)
        .map_err(|_| ConversionError::formatting(arg_name, value, "expected a date (yyyy-MM-dd) or date-time (yyyy-MM-dd HH:mm:ss)"))
}

/// Moves a date value by the given number of days, dropping any time part.
pub(crate) fn shift_date(arg_name: &str, value: &str, days: i64) -> Result<String, ConversionError> {
    let date = parse_date_time(arg_name, value)?.date();
    let shifted = date
        .checked_add_signed(Duration::days(days))
        .ok_or_else(|| ConversionError::formatting(arg_name, value, "date out of range"))?;
    Ok(shifted.format(DATE_FORMAT).to_string())
}
