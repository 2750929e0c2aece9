use oi_core::ArticleField;
use serde::Serialize;

/// How a column's cells are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CellFormat {
    Text,
    /// Rendered as a link when the value is a linkable URL, else as text.
    Link,
    /// Rendered with [`oi_core::format_timestamp`].
    Timestamp,
}

/// Width is in the original grid's pixels; renderers scale it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub field: ArticleField,
    pub header: &'static str,
    pub width: u16,
    pub sortable: bool,
    pub format: CellFormat,
}

impl ColumnDef {
    #[must_use]
    pub const fn for_field(field: ArticleField) -> ColumnDef {
        let (header, width, format) = match field {
            ArticleField::Id => ("ID", 120, CellFormat::Text),
            ArticleField::Title => ("Title", 800, CellFormat::Text),
            ArticleField::Author => ("Author", 130, CellFormat::Text),
            ArticleField::Media => ("Media", 90, CellFormat::Text),
            ArticleField::Url => ("URL", 300, CellFormat::Link),
            ArticleField::Summary => ("Summary", 300, CellFormat::Text),
            ArticleField::CreatedAt => ("Created At", 160, CellFormat::Timestamp),
            ArticleField::CrawledAt => ("Crawled At", 160, CellFormat::Timestamp),
        };
        ColumnDef {
            field,
            header,
            width,
            sortable: true,
            format,
        }
    }
}

/// The catalog table's columns in display order.
pub const COLUMNS: [ColumnDef; 8] = [
    ColumnDef::for_field(ArticleField::Id),
    ColumnDef::for_field(ArticleField::Title),
    ColumnDef::for_field(ArticleField::Author),
    ColumnDef::for_field(ArticleField::Media),
    ColumnDef::for_field(ArticleField::Url),
    ColumnDef::for_field(ArticleField::Summary),
    ColumnDef::for_field(ArticleField::CreatedAt),
    ColumnDef::for_field(ArticleField::CrawledAt),
];
