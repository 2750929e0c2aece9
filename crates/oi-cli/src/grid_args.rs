//! Parsers for the `--sort` and `--filter` flags.

use oi_catalog::grid::FilterPredicate;
use oi_catalog::{SortDirection, SortSpec};
use oi_core::ArticleField;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FilterArg {
    pub field: ArticleField,
    pub predicate: FilterPredicate,
}

/// Parses `<column>[:asc|desc]`; the direction defaults to ascending.
pub(crate) fn parse_sort(raw: &str) -> Result<SortSpec, String> {
    let (column, direction) = match raw.split_once(':') {
        Some((column, direction)) => (
            column,
            direction.parse::<SortDirection>().map_err(|e| e.to_string())?,
        ),
        None => (raw, SortDirection::Ascending),
    };
    let field = column.parse::<ArticleField>().map_err(|e| e.to_string())?;
    Ok(SortSpec { field, direction })
}

/// Parses `<column>:<op>[:<value>]`. The value may itself contain `:`,
/// so timestamps such as `createdAt:after:2022-01-01 09:00:00` work.
pub(crate) fn parse_filter(raw: &str) -> Result<FilterArg, String> {
    let mut parts = raw.splitn(3, ':');
    let column = parts.next().unwrap_or_default();
    let op = parts
        .next()
        .ok_or_else(|| format!("expected <column>:<op>[:<value>], got \"{raw}\""))?;
    let value = parts.next();

    let field = column.parse::<ArticleField>().map_err(|e| e.to_string())?;
    let predicate = FilterPredicate::from_parts(op, value).map_err(|e| e.to_string())?;
    Ok(FilterArg { field, predicate })
}
