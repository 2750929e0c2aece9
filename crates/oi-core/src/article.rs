//! The canonical article row shown in the catalog table.
//!
//! Rows are produced fresh by the normalizer on every successful query and
//! are never mutated afterwards; the controller swaps whole row sets.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A crawled article in its validated, display-ready form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRow {
    /// Stable identity; unique within one rendered dataset and never empty.
    pub id: String,
    pub title: String,
    /// May be empty. Several sources (Qiita, for one) never report an author.
    pub author: String,
    /// Source platform label, e.g. `"qiita"` or `"Youtube"`.
    pub media: String,
    /// Kept verbatim even when it fails validation; see [`is_linkable_url`].
    pub url: String,
    pub summary: String,
    /// Original publish time.
    pub created_at: NaiveDateTime,
    /// Last time the crawler observed the article. Usually `>= created_at`,
    /// but violations are data, not errors.
    pub crawled_at: NaiveDateTime,
}

impl ArticleRow {
    /// Returns the row's value for a text-like field, or `None` for the
    /// timestamp fields.
    #[must_use]
    pub fn text(&self, field: ArticleField) -> Option<&str> {
        match field {
            ArticleField::Id => Some(&self.id),
            ArticleField::Title => Some(&self.title),
            ArticleField::Author => Some(&self.author),
            ArticleField::Media => Some(&self.media),
            ArticleField::Url => Some(&self.url),
            ArticleField::Summary => Some(&self.summary),
            ArticleField::CreatedAt | ArticleField::CrawledAt => None,
        }
    }

    /// Returns the row's value for a timestamp field, or `None` for the
    /// text fields.
    #[must_use]
    pub fn timestamp(&self, field: ArticleField) -> Option<NaiveDateTime> {
        match field {
            ArticleField::CreatedAt => Some(self.created_at),
            ArticleField::CrawledAt => Some(self.crawled_at),
            _ => None,
        }
    }

    /// The URL to link to, if the stored value is safe to render as a link.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        is_linkable_url(&self.url).then_some(self.url.as_str())
    }
}

/// The fields of an [`ArticleRow`], in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArticleField {
    Id,
    Title,
    Author,
    Media,
    Url,
    Summary,
    CreatedAt,
    CrawledAt,
}

impl ArticleField {
    pub const ALL: [ArticleField; 8] = [
        ArticleField::Id,
        ArticleField::Title,
        ArticleField::Author,
        ArticleField::Media,
        ArticleField::Url,
        ArticleField::Summary,
        ArticleField::CreatedAt,
        ArticleField::CrawledAt,
    ];

    /// Key used for this field in API payloads.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            ArticleField::Id => "id",
            ArticleField::Title => "title",
            ArticleField::Author => "author",
            ArticleField::Media => "media",
            ArticleField::Url => "url",
            ArticleField::Summary => "summary",
            ArticleField::CreatedAt => "createdAt",
            ArticleField::CrawledAt => "crawledAt",
        }
    }

    /// Whether a record lacking this field must be dropped.
    ///
    /// `author` and `summary` are optional and default to the empty string.
    #[must_use]
    pub fn is_required(self) -> bool {
        !matches!(self, ArticleField::Author | ArticleField::Summary)
    }

    #[must_use]
    pub fn is_timestamp(self) -> bool {
        matches!(self, ArticleField::CreatedAt | ArticleField::CrawledAt)
    }
}

impl fmt::Display for ArticleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown article field \"{0}\"")]
pub struct UnknownFieldError(pub String);

impl FromStr for ArticleField {
    type Err = UnknownFieldError;

    /// Accepts the wire name (`createdAt`) as well as snake/kebab case
    /// (`created_at`, `created-at`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        ArticleField::ALL
            .into_iter()
            .find(|field| field.wire_name().to_ascii_lowercase() == key)
            .ok_or_else(|| UnknownFieldError(s.to_owned()))
    }
}

/// Returns `true` when `raw` is an absolute `http`/`https` URL.
///
/// Other schemes parse as URLs too (`javascript:`, `data:`), but they must
/// never become clickable links, so they count as invalid here.
#[must_use]
pub fn is_linkable_url(raw: &str) -> bool {
    url::Url::parse(raw.trim())
        .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}
