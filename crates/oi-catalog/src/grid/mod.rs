//! Table derivation: column schema, sort/filter state, and the ordered view
//! over a row snapshot.

pub mod columns;
pub mod filter;
pub mod selection;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use oi_core::{format_timestamp, ArticleField, ArticleRow};
use serde::Serialize;
use thiserror::Error;

pub use columns::{CellFormat, ColumnDef, COLUMNS};
pub use filter::{FilterParseError, FilterPredicate};
pub use selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort direction \"{0}\" (expected asc or desc)")]
pub struct UnknownDirectionError(pub String);

impl FromStr for SortDirection {
    type Err = UnknownDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(UnknownDirectionError(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: ArticleField,
    pub direction: SortDirection,
}

/// Requested sort and filters. Single sort key; at most one predicate per
/// column, all predicates combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridQuery {
    pub sort: Option<SortSpec>,
    pub filters: BTreeMap<ArticleField, FilterPredicate>,
}

impl GridQuery {
    pub fn set_sort(&mut self, field: ArticleField, direction: SortDirection) {
        self.sort = Some(SortSpec { field, direction });
    }

    /// Cycles `field` through ascending, descending, unsorted. Another
    /// column's sort is replaced by ascending on `field`.
    pub fn toggle_sort(&mut self, field: ArticleField) -> Option<SortDirection> {
        let next = match self.sort {
            Some(SortSpec {
                field: current,
                direction: SortDirection::Ascending,
            }) if current == field => Some(SortDirection::Descending),
            Some(SortSpec {
                field: current,
                direction: SortDirection::Descending,
            }) if current == field => None,
            _ => Some(SortDirection::Ascending),
        };
        self.sort = next.map(|direction| SortSpec { field, direction });
        next
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    pub fn set_filter(&mut self, field: ArticleField, predicate: FilterPredicate) {
        self.filters.insert(field, predicate);
    }

    pub fn clear_filter(&mut self, field: ArticleField) {
        self.filters.remove(&field);
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    fn accepts(&self, row: &ArticleRow) -> bool {
        self.filters
            .iter()
            .all(|(field, predicate)| predicate.matches(row, *field))
    }
}

/// Stateless derivation of the visible table from a row snapshot.
pub struct GridViewModel;

impl GridViewModel {
    #[must_use]
    pub fn columns() -> &'static [ColumnDef] {
        &COLUMNS
    }

    /// Filters then stably sorts `rows`. Ties keep their snapshot order in
    /// both directions.
    #[must_use]
    pub fn derive(rows: Arc<[ArticleRow]>, query: &GridQuery) -> GridView {
        let mut order: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| query.accepts(row))
            .map(|(index, _)| index)
            .collect();

        if let Some(SortSpec { field, direction }) = query.sort {
            order.sort_by(|&a, &b| {
                let ordering = compare(&rows[a], &rows[b], field);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        GridView { rows, order }
    }
}

fn compare(a: &ArticleRow, b: &ArticleRow, field: ArticleField) -> Ordering {
    match (a.timestamp(field), b.timestamp(field)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.text(field).cmp(&b.text(field)),
    }
}

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell<'a> {
    pub text: String,
    /// Set only for link columns holding a linkable URL.
    pub href: Option<&'a str>,
}

/// The filtered, sorted view over one row snapshot.
#[derive(Debug, Clone)]
pub struct GridView {
    rows: Arc<[ArticleRow]>,
    order: Vec<usize>,
}

impl GridView {
    /// Visible row count after filtering.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Row count before filtering.
    #[must_use]
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArticleRow> {
        self.order.iter().map(|&index| &self.rows[index])
    }

    /// Rows of the zero-based page `index`; empty past the last page.
    pub fn page(&self, index: usize, size: usize) -> impl Iterator<Item = &ArticleRow> {
        self.iter().skip(index.saturating_mul(size)).take(size)
    }

    #[must_use]
    pub fn page_count(&self, size: usize) -> usize {
        if size == 0 {
            0
        } else {
            self.order.len().div_ceil(size)
        }
    }

    #[must_use]
    pub fn cell<'a>(&self, row: &'a ArticleRow, field: ArticleField) -> Cell<'a> {
        let column = ColumnDef::for_field(field);
        match column.format {
            CellFormat::Timestamp => Cell {
                text: row.timestamp(field).map(format_timestamp).unwrap_or_default(),
                href: None,
            },
            CellFormat::Link => Cell {
                text: row.url.clone(),
                href: row.href(),
            },
            CellFormat::Text => Cell {
                text: row.text(field).unwrap_or_default().to_owned(),
                href: None,
            },
        }
    }
}
