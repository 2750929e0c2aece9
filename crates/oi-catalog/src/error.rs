use oi_graphql::TransportError;
use thiserror::Error;

use crate::descriptor::OperationName;

/// Failures that move an operation to its error state.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response decoded but did not have the shape the operation
    /// promises: result path absent, wrong JSON type, or no usable rows.
    #[error("unexpected {operation} payload: {reason}")]
    PayloadShape {
        operation: OperationName,
        reason: String,
    },
}

/// Rejected [`crate::OperationState`] transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{operation} cannot finish: expected status {expected}, found {actual}")]
    InvalidTransition {
        operation: OperationName,
        expected: &'static str,
        actual: &'static str,
    },

    /// The result belongs to a request that is no longer the one in flight.
    #[error("{operation} result for ticket {ticket} arrived after it was superseded")]
    StaleTicket { operation: OperationName, ticket: u64 },
}
