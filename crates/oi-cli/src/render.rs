//! Terminal output for the catalog view.

use oi_catalog::grid::{CellFormat, ColumnDef, GridView};
use oi_catalog::{
    CatalogViewModel, DataWarning, GridViewModel, OperationName, OperationStatus, SortDirection,
    SortSpec, TriggerOutcome,
};
use oi_core::ArticleRow;
use serde::Serialize;

/// Table line budget when `COLUMNS` is unset.
const DEFAULT_LINE_WIDTH: usize = 160;
/// `YYYY-MM-DD HH:MM:SS`
const TIMESTAMP_CHARS: usize = 19;
const MIN_COLUMN_CHARS: usize = 4;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Page {
    /// Zero-based.
    pub index: usize,
    pub size: usize,
}

pub(crate) fn outcome_label(outcome: &TriggerOutcome) -> String {
    match outcome {
        TriggerOutcome::Completed(status) => status.to_string(),
        TriggerOutcome::AlreadyInFlight => "already running".to_owned(),
        TriggerOutcome::Superseded => "superseded".to_owned(),
        TriggerOutcome::Unsupported => "unsupported".to_owned(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_owned()
    }
}

/// A grid column sized in characters for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableColumn {
    pub def: &'static ColumnDef,
    pub header: String,
    pub chars: usize,
}

pub(crate) fn line_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|&w: &usize| w > 0)
        .unwrap_or(DEFAULT_LINE_WIDTH)
}

/// Scales the grid's column widths to `line_width` characters. A column
/// never gets narrower than its header, and timestamps are never cut.
pub(crate) fn table_columns(line_width: usize, sort: Option<SortSpec>) -> Vec<TableColumn> {
    let columns = GridViewModel::columns();
    let total: usize = columns.iter().map(|c| usize::from(c.width)).sum();
    columns
        .iter()
        .map(|def| {
            let mut header = def.header.to_uppercase();
            if let Some(spec) = sort.filter(|s| def.sortable && s.field == def.field) {
                header.push_str(match spec.direction {
                    SortDirection::Ascending => " ^",
                    SortDirection::Descending => " v",
                });
            }
            let scaled = usize::from(def.width) * line_width / total.max(1);
            let floor = match def.format {
                CellFormat::Timestamp => TIMESTAMP_CHARS,
                CellFormat::Text | CellFormat::Link => MIN_COLUMN_CHARS,
            };
            let chars = scaled.max(floor).max(header.chars().count());
            TableColumn { def, header, chars }
        })
        .collect()
}

fn join_cells<'a>(columns: &[TableColumn], cells: impl Iterator<Item = &'a str>) -> String {
    let line: Vec<String> = columns
        .iter()
        .zip(cells)
        .map(|(column, text)| {
            let flat = text.replace(['\n', '\r', '\t'], " ");
            format!("{:<width$}", truncate(&flat, column.chars), width = column.chars)
        })
        .collect();
    line.join(" ").trim_end().to_owned()
}

pub(crate) fn header_line(columns: &[TableColumn]) -> String {
    join_cells(columns, columns.iter().map(|c| c.header.as_str()))
}

pub(crate) fn row_line(columns: &[TableColumn], view: &GridView, row: &ArticleRow) -> String {
    let cells: Vec<String> = columns
        .iter()
        .map(|c| view.cell(row, c.def.field).text)
        .collect();
    join_cells(columns, cells.iter().map(String::as_str))
}

pub(crate) fn print_table(
    operation: OperationName,
    outcome: &TriggerOutcome,
    vm: &CatalogViewModel,
    view: &GridView,
    page: Page,
    sort: Option<SortSpec>,
) {
    println!("{operation}: {}", outcome_label(outcome));
    if let Some(latest) = vm.is_latest {
        println!(
            "catalog is {}",
            if latest { "up to date" } else { "behind the sources" }
        );
    }
    if let Some(error) = &vm.last_error {
        eprintln!("error: {error}");
    }
    if !vm.warnings.is_empty() {
        eprintln!("{} data warnings:", vm.warnings.len());
        for warning in vm.warnings.iter() {
            eprintln!("  {warning}");
        }
    }

    if view.is_empty() {
        println!("no articles to show");
        return;
    }

    let columns = table_columns(line_width(), sort);
    println!("{}", header_line(&columns));
    for row in view.page(page.index, page.size) {
        println!("{}", row_line(&columns, view, row));
    }
    println!(
        "page {}/{} ({} of {} articles)",
        page.index + 1,
        view.page_count(page.size).max(1),
        view.len(),
        view.total()
    );
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    operation: OperationName,
    outcome: String,
    status: Option<&'a OperationStatus>,
    is_latest: Option<bool>,
    last_error: Option<&'a str>,
    total: usize,
    matched: usize,
    page: usize,
    page_count: usize,
    columns: &'static [ColumnDef],
    rows: Vec<&'a ArticleRow>,
    warnings: &'a [DataWarning],
}

pub(crate) fn print_json(
    operation: OperationName,
    outcome: &TriggerOutcome,
    vm: &CatalogViewModel,
    view: &GridView,
    page: Page,
) -> anyhow::Result<()> {
    let output = JsonOutput {
        operation,
        outcome: outcome_label(outcome),
        status: vm.operation_states.get(&operation),
        is_latest: vm.is_latest,
        last_error: vm.last_error.as_deref(),
        total: view.total(),
        matched: view.len(),
        page: page.index + 1,
        page_count: view.page_count(page.size),
        columns: GridViewModel::columns(),
        rows: view.page(page.index, page.size).collect(),
        warnings: &vm.warnings,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
