//! Decoding of untyped backend records into [`ArticleRow`]s.
//!
//! Nothing here fails: records that cannot become rows are dropped with a
//! [`DataWarning`] and the rest of the batch is still returned.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::NaiveDateTime;
use oi_core::{is_linkable_url, parse_timestamp, ArticleField, ArticleRow};
use serde::Serialize;
use serde_json::{Map, Value};

/// Legacy key under which the backend reports the author.
const LEGACY_AUTHOR_KEY: &str = "auther";

/// A non-fatal data-quality finding for one record.
///
/// `position` is the record's index in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DataWarning {
    /// A required field was absent, null, of the wrong type, or unparseable.
    /// The record was dropped.
    MissingField {
        position: usize,
        id: Option<String>,
        field: ArticleField,
    },
    /// The URL is not an absolute http(s) URL. The row is kept and shown as
    /// plain text.
    InvalidUrl {
        position: usize,
        id: String,
        url: String,
    },
    /// A later record reused an id; its values replaced the earlier row.
    DuplicateId {
        id: String,
        position: usize,
        replaced_position: usize,
    },
    /// The record was not a JSON object. The record was dropped.
    MalformedRecord { position: usize },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::MissingField {
                position,
                id: Some(id),
                field,
            } => write!(f, "record {position} ({id}): missing {field}"),
            DataWarning::MissingField {
                position,
                id: None,
                field,
            } => write!(f, "record {position}: missing {field}"),
            DataWarning::InvalidUrl { position, id, url } => {
                write!(f, "record {position} ({id}): invalid url \"{url}\"")
            }
            DataWarning::DuplicateId {
                id,
                position,
                replaced_position,
            } => write!(
                f,
                "record {position}: duplicate id {id} replaces record {replaced_position}"
            ),
            DataWarning::MalformedRecord { position } => {
                write!(f, "record {position}: not an object")
            }
        }
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub rows: Vec<ArticleRow>,
    pub warnings: Vec<DataWarning>,
}

impl Normalized {
    /// Number of records dropped for missing or malformed data.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.warnings
            .iter()
            .filter_map(|w| match w {
                DataWarning::MissingField { position, .. }
                | DataWarning::MalformedRecord { position } => Some(*position),
                _ => None,
            })
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Converts raw records into rows, in payload order with duplicates
/// collapsed.
///
/// A duplicate id keeps the position of its first occurrence and takes the
/// values of its last one.
#[must_use]
pub fn normalize(records: &[Value]) -> Normalized {
    let mut out = Normalized::default();
    // id -> (index into out.rows, payload position of the row's current value)
    let mut seen: HashMap<String, (usize, usize)> = HashMap::with_capacity(records.len());

    for (position, record) in records.iter().enumerate() {
        let Some(object) = record.as_object() else {
            out.warnings.push(DataWarning::MalformedRecord { position });
            continue;
        };

        let row = match decode_record(position, object) {
            Ok(row) => row,
            Err(missing) => {
                out.warnings.extend(missing);
                continue;
            }
        };

        if !is_linkable_url(&row.url) {
            out.warnings.push(DataWarning::InvalidUrl {
                position,
                id: row.id.clone(),
                url: row.url.clone(),
            });
        }

        if let Some((index, replaced_position)) = seen.get(&row.id).copied() {
            tracing::warn!(
                id = %row.id,
                position,
                replaced_position,
                "duplicate article id in payload, keeping the later record"
            );
            out.warnings.push(DataWarning::DuplicateId {
                id: row.id.clone(),
                position,
                replaced_position,
            });
            seen.insert(row.id.clone(), (index, position));
            out.rows[index] = row;
        } else {
            seen.insert(row.id.clone(), (out.rows.len(), position));
            out.rows.push(row);
        }
    }

    tracing::debug!(
        records = records.len(),
        rows = out.rows.len(),
        warnings = out.warnings.len(),
        "normalized article batch"
    );
    out
}

/// Builds one row, or returns a `MissingField` warning for every required
/// field that could not be read.
fn decode_record(
    position: usize,
    object: &Map<String, Value>,
) -> Result<ArticleRow, Vec<DataWarning>> {
    let id = text_field(object, ArticleField::Id).filter(|id| !id.trim().is_empty());
    let title = text_field(object, ArticleField::Title);
    let media = text_field(object, ArticleField::Media);
    let url = text_field(object, ArticleField::Url);
    let created_at = timestamp_field(object, ArticleField::CreatedAt);
    let crawled_at = timestamp_field(object, ArticleField::CrawledAt);

    if let (Some(id), Some(title), Some(media), Some(url), Some(created_at), Some(crawled_at)) =
        (id, title, media, url, created_at, crawled_at)
    {
        return Ok(ArticleRow {
            id: id.to_owned(),
            title: title.to_owned(),
            author: optional_text(object, &[ArticleField::Author.wire_name(), LEGACY_AUTHOR_KEY]),
            media: media.to_owned(),
            url: url.to_owned(),
            summary: optional_text(object, &[ArticleField::Summary.wire_name()]),
            created_at,
            crawled_at,
        });
    }

    let missing = [
        (ArticleField::Id, id.is_none()),
        (ArticleField::Title, title.is_none()),
        (ArticleField::Media, media.is_none()),
        (ArticleField::Url, url.is_none()),
        (ArticleField::CreatedAt, created_at.is_none()),
        (ArticleField::CrawledAt, crawled_at.is_none()),
    ];
    let known_id = id.map(str::to_owned);
    Err(missing
        .into_iter()
        .filter(|(_, is_missing)| *is_missing)
        .map(|(field, _)| DataWarning::MissingField {
            position,
            id: known_id.clone(),
            field,
        })
        .collect())
}

fn text_field(object: &Map<String, Value>, field: ArticleField) -> Option<&str> {
    object.get(field.wire_name()).and_then(Value::as_str)
}

fn timestamp_field(object: &Map<String, Value>, field: ArticleField) -> Option<NaiveDateTime> {
    text_field(object, field).and_then(parse_timestamp)
}

/// First string value among `keys`, or empty.
fn optional_text(object: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
