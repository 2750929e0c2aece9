//! The single source of truth for what the catalog displays.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! await: an operation enters `Loading` under the lock before its request
//! is sent, and its result is applied under the lock after the response
//! has been decoded and normalized. Rows are an `Arc<[ArticleRow]>`, so a
//! replacement is a single pointer swap and readers holding a snapshot
//! never see a partial update.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use oi_core::{ArticleField, ArticleRow};
use oi_graphql::{Transport, TransportError};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::descriptor::{default_descriptors, OperationDescriptor, OperationName, ResultShape, RowMerge};
use crate::error::{CatalogError, TransitionError};
use crate::grid::{FilterPredicate, GridQuery, GridView, GridViewModel, Selection, SortDirection};
use crate::normalize::{normalize, DataWarning, Normalized};
use crate::operation::{OperationState, OperationStatus, Ticket};

const EVENT_CAPACITY: usize = 64;

/// Status message of an invocation whose trigger was dropped mid-flight.
const CANCELLED: &str = "cancelled before completion";

/// Result of [`CatalogController::trigger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The invocation ran and finished in this status.
    Completed(OperationStatus),
    /// The operation was already loading; no request was sent.
    AlreadyInFlight,
    /// The response arrived for an invocation that is no longer current
    /// and was discarded.
    Superseded,
    /// No descriptor is registered under that name.
    Unsupported,
}

/// State-change notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    OperationChanged {
        operation: OperationName,
        status: OperationStatus,
    },
    RowsReplaced {
        operation: OperationName,
        rows: usize,
    },
}

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct CatalogViewModel {
    pub rows: Arc<[ArticleRow]>,
    pub is_busy: bool,
    pub operation_states: BTreeMap<OperationName, OperationStatus>,
    pub last_error: Option<String>,
    /// Normalization warnings for the displayed rows. Upserts append to them.
    pub warnings: Arc<[DataWarning]>,
    /// Last answer of the freshness check, if it has ever succeeded.
    pub is_latest: Option<bool>,
}

struct LastError {
    operation: OperationName,
    message: String,
}

struct ControllerState {
    rows: Arc<[ArticleRow]>,
    warnings: Arc<[DataWarning]>,
    operations: BTreeMap<OperationName, OperationState>,
    last_error: Option<LastError>,
    grid: GridQuery,
    selection: Selection,
}

/// A decoded, not yet applied, result.
enum Resolved {
    Rows { normalized: Normalized, merge: RowMerge },
    Status(Value),
}

/// Armed between `begin()` and `apply()`; cancels the invocation if the
/// trigger future is dropped in between.
struct InFlight<'a> {
    controller: &'a CatalogController,
    name: OperationName,
    ticket: Ticket,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.cancel(self.name, self.ticket);
        }
    }
}

pub struct CatalogControllerBuilder {
    transport: Arc<dyn Transport>,
    descriptors: Vec<OperationDescriptor>,
    operation_timeout: Option<Duration>,
}

impl CatalogControllerBuilder {
    /// Replaces the default descriptor table. A later descriptor with the
    /// same name overrides an earlier one.
    #[must_use]
    pub fn descriptors(mut self, descriptors: Vec<OperationDescriptor>) -> Self {
        self.descriptors = descriptors;
        self
    }

    /// Fails an invocation with [`TransportError::Timeout`] when the
    /// transport has not answered within `timeout`.
    #[must_use]
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn build(self) -> CatalogController {
        let descriptors: HashMap<OperationName, OperationDescriptor> =
            self.descriptors.into_iter().map(|d| (d.name, d)).collect();
        let operations = descriptors
            .keys()
            .map(|name| (*name, OperationState::new(*name)))
            .collect();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        CatalogController {
            transport: self.transport,
            descriptors,
            operation_timeout: self.operation_timeout,
            state: Mutex::new(ControllerState {
                rows: Arc::from(Vec::new()),
                warnings: Arc::from(Vec::new()),
                operations,
                last_error: None,
                grid: GridQuery::default(),
                selection: Selection::default(),
            }),
            events,
            mounted: AtomicBool::new(false),
        }
    }
}

pub struct CatalogController {
    transport: Arc<dyn Transport>,
    descriptors: HashMap<OperationName, OperationDescriptor>,
    operation_timeout: Option<Duration>,
    state: Mutex<ControllerState>,
    events: broadcast::Sender<CatalogEvent>,
    mounted: AtomicBool,
}

impl CatalogController {
    /// Starts building a controller over `transport` with the default
    /// descriptor table.
    #[must_use]
    pub fn builder(transport: Arc<dyn Transport>) -> CatalogControllerBuilder {
        CatalogControllerBuilder {
            transport,
            descriptors: default_descriptors(),
            operation_timeout: None,
        }
    }

    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::builder(transport).build()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    /// Runs the initial `scan`. Only the first call does anything; later
    /// calls return `None`.
    pub async fn mount(&self) -> Option<TriggerOutcome> {
        if self.mounted.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.trigger(OperationName::Scan).await)
    }

    /// Runs one invocation of `name` unless it is already in flight.
    ///
    /// Failures never escape: they land in the operation's `Error` status
    /// and in `last_error`, and the displayed rows stay as they were.
    pub async fn trigger(&self, name: OperationName) -> TriggerOutcome {
        let Some(descriptor) = self.descriptors.get(&name) else {
            tracing::warn!(operation = %name, "trigger for unregistered operation ignored");
            return TriggerOutcome::Unsupported;
        };

        let ticket = {
            let mut state = self.lock();
            let Some(operation) = state.operations.get_mut(&name) else {
                return TriggerOutcome::Unsupported;
            };
            match operation.begin() {
                Some(ticket) => ticket,
                None => {
                    tracing::debug!(operation = %name, "already in flight, trigger ignored");
                    return TriggerOutcome::AlreadyInFlight;
                }
            }
        };
        self.emit(CatalogEvent::OperationChanged {
            operation: name,
            status: OperationStatus::Loading,
        });
        tracing::info!(operation = %name, ticket = ticket.id(), "operation started");

        let mut in_flight = InFlight {
            controller: self,
            name,
            ticket,
            armed: true,
        };
        let resolved = match self.execute(descriptor).await {
            Ok(data) => decode(descriptor, &data),
            Err(e) => Err(e),
        };
        in_flight.armed = false;
        self.apply(name, ticket, resolved)
    }

    /// Whether a trigger for `name` would start a request right now.
    #[must_use]
    pub fn is_trigger_enabled(&self, name: OperationName) -> bool {
        self.lock()
            .operations
            .get(&name)
            .is_some_and(|op| !op.is_loading())
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock().operations.values().any(OperationState::is_loading)
    }

    #[must_use]
    pub fn status(&self, name: OperationName) -> Option<OperationStatus> {
        self.lock().operations.get(&name).map(|op| op.status().clone())
    }

    #[must_use]
    pub fn rows(&self) -> Arc<[ArticleRow]> {
        Arc::clone(&self.lock().rows)
    }

    #[must_use]
    pub fn view_model(&self) -> CatalogViewModel {
        let state = self.lock();
        CatalogViewModel {
            rows: Arc::clone(&state.rows),
            is_busy: state.operations.values().any(OperationState::is_loading),
            operation_states: state
                .operations
                .iter()
                .map(|(name, op)| (*name, op.status().clone()))
                .collect(),
            last_error: state.last_error.as_ref().map(|e| e.message.clone()),
            warnings: Arc::clone(&state.warnings),
            is_latest: state
                .operations
                .get(&OperationName::IsLatest)
                .and_then(OperationState::last_value)
                .and_then(Value::as_bool),
        }
    }

    pub fn set_sort(&self, field: ArticleField, direction: SortDirection) {
        self.lock().grid.set_sort(field, direction);
    }

    pub fn toggle_sort(&self, field: ArticleField) -> Option<SortDirection> {
        self.lock().grid.toggle_sort(field)
    }

    pub fn clear_sort(&self) {
        self.lock().grid.clear_sort();
    }

    pub fn set_filter(&self, field: ArticleField, predicate: FilterPredicate) {
        self.lock().grid.set_filter(field, predicate);
    }

    pub fn clear_filter(&self, field: ArticleField) {
        self.lock().grid.clear_filter(field);
    }

    pub fn clear_filters(&self) {
        self.lock().grid.clear_filters();
    }

    #[must_use]
    pub fn grid_query(&self) -> GridQuery {
        self.lock().grid.clone()
    }

    /// Flips the selection of a displayed row. Returns whether it is now
    /// selected; ids not currently displayed are never selected.
    pub fn toggle_selection(&self, id: &str) -> bool {
        let mut state = self.lock();
        if !state.rows.iter().any(|r| r.id == id) {
            return false;
        }
        state.selection.toggle(id)
    }

    /// Selects a displayed row. Returns `false` for unknown ids.
    pub fn select(&self, id: &str) -> bool {
        let mut state = self.lock();
        if !state.rows.iter().any(|r| r.id == id) {
            return false;
        }
        state.selection.select(id);
        true
    }

    pub fn deselect(&self, id: &str) {
        self.lock().selection.deselect(id);
    }

    pub fn clear_selection(&self) {
        self.lock().selection.clear();
    }

    #[must_use]
    pub fn selected_ids(&self) -> Vec<String> {
        self.lock().selection.ids().map(str::to_owned).collect()
    }

    /// The current rows under the current sort and filters.
    #[must_use]
    pub fn grid_view(&self) -> GridView {
        let state = self.lock();
        GridViewModel::derive(Arc::clone(&state.rows), &state.grid)
    }

    /// Fails an invocation whose trigger future was dropped before its
    /// result could be applied, so the operation does not stay `Loading`.
    fn cancel(&self, name: OperationName, ticket: Ticket) {
        let status = {
            let mut state = self.lock();
            let Some(operation) = state.operations.get_mut(&name) else {
                return;
            };
            if operation.fail(ticket, CANCELLED).is_err() {
                return;
            }
            operation.status().clone()
        };
        tracing::warn!(operation = %name, ticket = ticket.id(), "trigger dropped before completion");
        self.emit(CatalogEvent::OperationChanged {
            operation: name,
            status,
        });
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: CatalogEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn execute(&self, descriptor: &OperationDescriptor) -> Result<Value, CatalogError> {
        let request = self.transport.execute(&descriptor.request);
        let result = match self.operation_timeout {
            Some(limit) => match tokio::time::timeout(limit, request).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout {
                    operation: descriptor.request.operation_name.clone(),
                    after_secs: limit.as_secs(),
                }),
            },
            None => request.await,
        };
        result.map_err(CatalogError::from)
    }

    /// Finishes the invocation identified by `ticket` and publishes the
    /// result.
    fn apply(
        &self,
        name: OperationName,
        ticket: Ticket,
        resolved: Result<Resolved, CatalogError>,
    ) -> TriggerOutcome {
        let mut events = Vec::with_capacity(2);
        let outcome = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let Some(operation) = state.operations.get_mut(&name) else {
                return TriggerOutcome::Unsupported;
            };

            let finished = match resolved {
                Ok(Resolved::Rows { normalized, merge }) => {
                    let finished = operation.succeed(ticket, None);
                    if finished.is_ok() {
                        let received = normalized.rows.len();
                        match merge {
                            RowMerge::Replace => {
                                state.rows = Arc::from(normalized.rows);
                                state.warnings = Arc::from(normalized.warnings);
                            }
                            RowMerge::Upsert => {
                                state.rows = upsert(name, &state.rows, normalized.rows);
                                state.warnings = state
                                    .warnings
                                    .iter()
                                    .cloned()
                                    .chain(normalized.warnings)
                                    .collect();
                            }
                        }
                        let deselected = state.selection.retain_present(&state.rows);
                        tracing::info!(
                            operation = %name,
                            received,
                            rows = state.rows.len(),
                            warnings = state.warnings.len(),
                            deselected,
                            "rows replaced"
                        );
                        events.push(CatalogEvent::RowsReplaced {
                            operation: name,
                            rows: state.rows.len(),
                        });
                    }
                    finished
                }
                Ok(Resolved::Status(value)) => {
                    tracing::info!(operation = %name, value = %value, "status updated");
                    operation.succeed(ticket, Some(value))
                }
                Err(error) => {
                    let message = error.to_string();
                    tracing::error!(operation = %name, error = %message, "operation failed");
                    let finished = operation.fail(ticket, message.clone());
                    if finished.is_ok() {
                        state.last_error = Some(LastError {
                            operation: name,
                            message,
                        });
                    }
                    finished
                }
            };

            match finished {
                Ok(()) => {
                    let status = operation.status().clone();
                    if status == OperationStatus::Success
                        && state.last_error.as_ref().is_some_and(|e| e.operation == name)
                    {
                        state.last_error = None;
                    }
                    events.insert(
                        0,
                        CatalogEvent::OperationChanged {
                            operation: name,
                            status: status.clone(),
                        },
                    );
                    TriggerOutcome::Completed(status)
                }
                Err(TransitionError::StaleTicket { .. }) => {
                    tracing::warn!(operation = %name, ticket = ticket.id(), "discarding superseded response");
                    TriggerOutcome::Superseded
                }
                Err(e @ TransitionError::InvalidTransition { .. }) => {
                    tracing::warn!(operation = %name, error = %e, "discarding response");
                    TriggerOutcome::Superseded
                }
            }
        };

        for event in events {
            self.emit(event);
        }
        outcome
    }
}

/// Validates the payload shape and normalizes rows, outside the lock.
fn decode(descriptor: &OperationDescriptor, data: &Value) -> Result<Resolved, CatalogError> {
    let shape_error = |reason: String| CatalogError::PayloadShape {
        operation: descriptor.name,
        reason,
    };
    let path = descriptor.result.path();
    let value = descriptor
        .result
        .extract(data)
        .ok_or_else(|| shape_error(format!("no value at \"{path}\"")))?;

    match &descriptor.result {
        ResultShape::Status { kind, .. } => {
            if !kind.matches(value) {
                return Err(shape_error(format!(
                    "\"{path}\" is not {}: {value}",
                    kind.label()
                )));
            }
            Ok(Resolved::Status(value.clone()))
        }
        ResultShape::Rows { merge, .. } => {
            let records = value
                .as_array()
                .ok_or_else(|| shape_error(format!("\"{path}\" is not a list")))?;
            let normalized = normalize(records);
            if !records.is_empty() && normalized.rows.is_empty() {
                return Err(shape_error(format!(
                    "none of {} records could be read ({} warnings)",
                    records.len(),
                    normalized.warnings.len()
                )));
            }
            Ok(Resolved::Rows {
                normalized,
                merge: *merge,
            })
        }
    }
}

/// Merges `incoming` into `current` by id: matching rows are replaced in
/// place, new ids are appended in arrival order.
fn upsert(
    operation: OperationName,
    current: &[ArticleRow],
    incoming: Vec<ArticleRow>,
) -> Arc<[ArticleRow]> {
    let mut merged = current.to_vec();
    let mut index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, row)| (row.id.clone(), i))
        .collect();
    for row in incoming {
        if let Some(&i) = index.get(&row.id) {
            tracing::debug!(
                %operation,
                id = %row.id,
                position = i,
                "merged article replaces displayed row"
            );
            merged[i] = row;
        } else {
            index.insert(row.id.clone(), merged.len());
            merged.push(row);
        }
    }
    Arc::from(merged)
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
