use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::GraphqlRequest;

/// Executes GraphQL requests against the catalog backend.
///
/// Implementations return the response's `data` object untouched; decoding
/// it into rows is the caller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &GraphqlRequest) -> Result<serde_json::Value, TransportError>;
}
