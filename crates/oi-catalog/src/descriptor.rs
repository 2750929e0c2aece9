//! The fixed table of triggerable backend operations.

use std::fmt;
use std::str::FromStr;

use oi_graphql::{documents, GraphqlRequest};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A triggerable backend action, keyed by its presentation-level name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationName {
    Scan,
    FullCrawlAndStore,
    IsLatest,
    Update,
}

impl OperationName {
    pub const ALL: [OperationName; 4] = [
        OperationName::Scan,
        OperationName::FullCrawlAndStore,
        OperationName::IsLatest,
        OperationName::Update,
    ];

    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            OperationName::Scan => "scan",
            OperationName::FullCrawlAndStore => "fullCrawlAndStore",
            OperationName::IsLatest => "isLatest",
            OperationName::Update => "update",
        }
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation \"{0}\"")]
pub struct UnknownOperationError(pub String);

impl FromStr for OperationName {
    type Err = UnknownOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationName::ALL
            .into_iter()
            .find(|name| name.wire_name() == s)
            .ok_or_else(|| UnknownOperationError(s.to_owned()))
    }
}

/// How a row-producing result is combined with the displayed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMerge {
    /// The result is the complete dataset.
    Replace,
    /// The result holds only new or changed articles; they are merged by id
    /// into the displayed rows.
    Upsert,
}

/// The JSON type a status-only result must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Boolean,
    Number,
    Text,
}

impl StatusKind {
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            StatusKind::Boolean => value.is_boolean(),
            StatusKind::Number => value.is_number(),
            StatusKind::Text => value.is_string(),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Boolean => "a boolean",
            StatusKind::Number => "a number",
            StatusKind::Text => "a string",
        }
    }
}

/// Where an operation's result lives in the GraphQL `data` object and what
/// it means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultShape {
    Rows { path: String, merge: RowMerge },
    /// A status-only result. Never touches the displayed rows.
    Status { path: String, kind: StatusKind },
}

impl ResultShape {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            ResultShape::Rows { path, .. } | ResultShape::Status { path, .. } => path,
        }
    }

    #[must_use]
    pub fn produces_rows(&self) -> bool {
        matches!(self, ResultShape::Rows { .. })
    }

    /// Follows the dotted result path through `data`.
    #[must_use]
    pub fn extract<'a>(&self, data: &'a Value) -> Option<&'a Value> {
        self.path()
            .split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(data, |value, segment| value.get(segment))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: OperationName,
    pub request: GraphqlRequest,
    pub result: ResultShape,
}

impl OperationDescriptor {
    pub fn rows(
        name: OperationName,
        request: GraphqlRequest,
        path: impl Into<String>,
        merge: RowMerge,
    ) -> Self {
        Self {
            name,
            request,
            result: ResultShape::Rows {
                path: path.into(),
                merge,
            },
        }
    }

    pub fn status(
        name: OperationName,
        request: GraphqlRequest,
        path: impl Into<String>,
        kind: StatusKind,
    ) -> Self {
        Self {
            name,
            request,
            result: ResultShape::Status {
                path: path.into(),
                kind,
            },
        }
    }
}

/// The descriptors for the crawler backend's schema.
///
/// `update` is bound to the differential `crawlAndStore` mutation, which
/// returns only newly stored articles, so its rows are upserted rather
/// than replacing the table.
#[must_use]
pub fn default_descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor::rows(
            OperationName::Scan,
            GraphqlRequest::query("Scan", documents::SCAN),
            "scan",
            RowMerge::Replace,
        ),
        OperationDescriptor::rows(
            OperationName::FullCrawlAndStore,
            GraphqlRequest::mutation("FullCrawlAndStore", documents::FULL_CRAWL_AND_STORE),
            "fullCrawlAndStore",
            RowMerge::Replace,
        ),
        OperationDescriptor::status(
            OperationName::IsLatest,
            GraphqlRequest::query("IsLatest", documents::IS_LATEST),
            "isLatest",
            StatusKind::Boolean,
        ),
        OperationDescriptor::rows(
            OperationName::Update,
            GraphqlRequest::mutation("CrawlAndStore", documents::CRAWL_AND_STORE),
            "crawlAndStore",
            RowMerge::Upsert,
        ),
    ]
}
