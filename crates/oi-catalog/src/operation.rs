//! Per-operation lifecycle: `Idle -> Loading -> Success | Error`, with
//! re-triggering allowed from either terminal state.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::descriptor::OperationName;
use crate::error::TransitionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum OperationStatus {
    Idle,
    Loading,
    Success,
    Error { message: String },
}

impl OperationStatus {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, OperationStatus::Loading)
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            OperationStatus::Idle => "idle",
            OperationStatus::Loading => "loading",
            OperationStatus::Success => "success",
            OperationStatus::Error { .. } => "error",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Error { message } => write!(f, "error: {message}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Identifies one invocation of an operation. Only the ticket handed out by
/// the most recent [`OperationState::begin`] may finish it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct OperationState {
    name: OperationName,
    status: OperationStatus,
    in_flight: Option<Ticket>,
    issued: u64,
    /// Result of the last successful status-only invocation.
    last_value: Option<Value>,
}

impl OperationState {
    #[must_use]
    pub fn new(name: OperationName) -> Self {
        Self {
            name,
            status: OperationStatus::Idle,
            in_flight: None,
            issued: 0,
            last_value: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> OperationName {
        self.name
    }

    #[must_use]
    pub fn status(&self) -> &OperationStatus {
        &self.status
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    #[must_use]
    pub fn last_value(&self) -> Option<&Value> {
        self.last_value.as_ref()
    }

    /// Moves to `Loading` and returns the ticket for this invocation, or
    /// `None` when an invocation is already in flight.
    pub fn begin(&mut self) -> Option<Ticket> {
        if self.in_flight.is_some() {
            return None;
        }
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.in_flight = Some(ticket);
        self.status = OperationStatus::Loading;
        Some(ticket)
    }

    /// Completes the in-flight invocation successfully. `value` replaces the
    /// stored status value when present.
    ///
    /// # Errors
    ///
    /// See [`OperationState::fail`].
    pub fn succeed(&mut self, ticket: Ticket, value: Option<Value>) -> Result<(), TransitionError> {
        self.finish(ticket, OperationStatus::Success)?;
        if value.is_some() {
            self.last_value = value;
        }
        Ok(())
    }

    /// Completes the in-flight invocation with an error. Previously stored
    /// values are kept.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::InvalidTransition`] if nothing is in flight.
    /// - [`TransitionError::StaleTicket`] if `ticket` is not the in-flight one.
    pub fn fail(&mut self, ticket: Ticket, message: impl Into<String>) -> Result<(), TransitionError> {
        self.finish(
            ticket,
            OperationStatus::Error {
                message: message.into(),
            },
        )
    }

    fn finish(&mut self, ticket: Ticket, next: OperationStatus) -> Result<(), TransitionError> {
        match self.in_flight {
            None => Err(TransitionError::InvalidTransition {
                operation: self.name,
                expected: OperationStatus::Loading.label(),
                actual: self.status.label(),
            }),
            Some(current) if current != ticket => Err(TransitionError::StaleTicket {
                operation: self.name,
                ticket: ticket.0,
            }),
            Some(_) => {
                self.in_flight = None;
                self.status = next;
                Ok(())
            }
        }
    }
}
