//! GraphQL-over-HTTP transport for the article catalog backend.
//!
//! The catalog controller only sees the [`Transport`] trait; [`GraphqlClient`]
//! is the production implementation and tests substitute fakes.

pub mod client;
pub mod documents;
pub mod error;
pub mod request;
mod retry;
pub mod transport;

pub use client::GraphqlClient;
pub use error::TransportError;
pub use request::{GraphqlRequest, OperationKind};
pub use transport::Transport;
