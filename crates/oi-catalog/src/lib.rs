//! Query/command orchestration for the article catalog.
//!
//! [`normalize`] turns untyped backend records into [`ArticleRow`]s,
//! [`OperationState`] tracks each triggerable backend operation, and
//! [`CatalogController`] decides which result is displayed. [`grid`]
//! derives the sorted, filtered, paginated table from the current rows.
//!
//! [`ArticleRow`]: oi_core::ArticleRow

pub mod controller;
pub mod descriptor;
pub mod error;
pub mod grid;
pub mod normalize;
pub mod operation;

pub use controller::{
    CatalogController, CatalogControllerBuilder, CatalogEvent, CatalogViewModel, TriggerOutcome,
};
pub use descriptor::{
    default_descriptors, OperationDescriptor, OperationName, ResultShape, RowMerge, StatusKind,
    UnknownOperationError,
};
pub use error::{CatalogError, TransitionError};
pub use grid::{GridQuery, GridView, GridViewModel, SortDirection, SortSpec};
pub use normalize::{normalize, DataWarning, Normalized};
pub use operation::{OperationState, OperationStatus, Ticket};
