//! Per-column filter predicates.
//!
//! An unset or empty-valued predicate matches every row; the default grid
//! state is "no filtering".

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use oi_core::{format_timestamp, parse_timestamp, ArticleField, ArticleRow};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "value", rename_all = "camelCase")]
pub enum FilterPredicate {
    Contains(String),
    Equals(String),
    StartsWith(String),
    EndsWith(String),
    IsEmpty,
    IsNotEmpty,
    /// Strictly earlier than the value. Timestamp columns compare as times,
    /// text columns lexically.
    Before(String),
    /// Strictly later than the value.
    After(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("unknown filter operator \"{0}\"")]
    UnknownOperator(String),

    #[error("filter operator \"{0}\" requires a value")]
    MissingValue(String),
}

impl FilterPredicate {
    /// Builds a predicate from an operator name (`contains`, `startsWith`,
    /// `is-empty`, ...) and its optional value.
    ///
    /// # Errors
    ///
    /// Returns [`FilterParseError`] for an unknown operator or a missing
    /// value on an operator that needs one.
    pub fn from_parts(op: &str, value: Option<&str>) -> Result<Self, FilterParseError> {
        let key: String = op
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        let value = || {
            value
                .map(str::to_owned)
                .ok_or_else(|| FilterParseError::MissingValue(op.to_owned()))
        };
        Ok(match key.as_str() {
            "contains" => FilterPredicate::Contains(value()?),
            "equals" | "eq" => FilterPredicate::Equals(value()?),
            "startswith" => FilterPredicate::StartsWith(value()?),
            "endswith" => FilterPredicate::EndsWith(value()?),
            "isempty" => FilterPredicate::IsEmpty,
            "isnotempty" => FilterPredicate::IsNotEmpty,
            "before" => FilterPredicate::Before(value()?),
            "after" => FilterPredicate::After(value()?),
            _ => return Err(FilterParseError::UnknownOperator(op.to_owned())),
        })
    }

    /// Whether `row`'s value in `field` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, row: &ArticleRow, field: ArticleField) -> bool {
        if let Some(ts) = row.timestamp(field) {
            return self.matches_timestamp(ts);
        }
        let text = row.text(field).unwrap_or_default();
        match self {
            FilterPredicate::IsEmpty => text.trim().is_empty(),
            FilterPredicate::IsNotEmpty => !text.trim().is_empty(),
            FilterPredicate::Before(bound) if !bound.is_empty() => text < bound.as_str(),
            FilterPredicate::After(bound) if !bound.is_empty() => text > bound.as_str(),
            other => other.matches_text(text),
        }
    }

    fn matches_timestamp(&self, ts: NaiveDateTime) -> bool {
        match self {
            FilterPredicate::IsEmpty => false,
            FilterPredicate::IsNotEmpty => true,
            FilterPredicate::Before(bound) => parse_bound(bound).is_none_or(|b| ts < b),
            FilterPredicate::After(bound) => parse_bound(bound).is_none_or(|b| ts > b),
            other => other.matches_text(&format_timestamp(ts)),
        }
    }

    /// Case-insensitive text comparison; empty needles match everything.
    fn matches_text(&self, text: &str) -> bool {
        let needle = match self {
            FilterPredicate::Contains(v)
            | FilterPredicate::Equals(v)
            | FilterPredicate::StartsWith(v)
            | FilterPredicate::EndsWith(v)
            | FilterPredicate::Before(v)
            | FilterPredicate::After(v) => v,
            FilterPredicate::IsEmpty | FilterPredicate::IsNotEmpty => return true,
        };
        if needle.is_empty() {
            return true;
        }
        let text = text.to_lowercase();
        let needle = needle.to_lowercase();
        match self {
            FilterPredicate::Contains(_) => text.contains(&needle),
            FilterPredicate::Equals(_) => text == needle,
            FilterPredicate::StartsWith(_) => text.starts_with(&needle),
            FilterPredicate::EndsWith(_) => text.ends_with(&needle),
            _ => true,
        }
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterPredicate::Contains(v) => write!(f, "contains \"{v}\""),
            FilterPredicate::Equals(v) => write!(f, "equals \"{v}\""),
            FilterPredicate::StartsWith(v) => write!(f, "starts with \"{v}\""),
            FilterPredicate::EndsWith(v) => write!(f, "ends with \"{v}\""),
            FilterPredicate::IsEmpty => f.write_str("is empty"),
            FilterPredicate::IsNotEmpty => f.write_str("is not empty"),
            FilterPredicate::Before(v) => write!(f, "before \"{v}\""),
            FilterPredicate::After(v) => write!(f, "after \"{v}\""),
        }
    }
}

/// Accepts a full timestamp or a bare `YYYY-MM-DD` date (midnight).
/// Unparseable bounds leave the filter unset.
fn parse_bound(raw: &str) -> Option<NaiveDateTime> {
    parse_timestamp(raw).or_else(|| {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}
