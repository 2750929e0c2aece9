//! HTTP client for the crawler backend's GraphQL endpoint.
//!
//! Wraps `reqwest` with GraphQL-specific error handling: non-2xx statuses,
//! undecodable bodies, GraphQL `errors` arrays, and missing `data` are all
//! surfaced as typed [`TransportError`]s.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::TransportError;
use crate::request::GraphqlRequest;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::transport::Transport;

/// Client for the catalog backend's GraphQL endpoint.
///
/// Holds no global state: each controller is handed its own client (or a
/// fake [`Transport`] in tests).
pub struct GraphqlClient {
    client: Client,
    endpoint: Url,
    /// Applied to queries only.
    retry: RetryPolicy,
}

impl GraphqlClient {
    /// Creates a client posting to `endpoint` with retries disabled.
    ///
    /// # Errors
    ///
    /// - [`TransportError::InvalidEndpoint`] if `endpoint` is not an
    ///   absolute `http`/`https` URL.
    /// - [`TransportError::Http`] if the underlying `reqwest::Client`
    ///   cannot be constructed.
    pub fn new(endpoint: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, TransportError> {
        let parsed = Url::parse(endpoint).map_err(|e| TransportError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::InvalidEndpoint {
                endpoint: endpoint.to_owned(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint: parsed,
            retry: RetryPolicy::default(),
        })
    }

    /// Creates a client from application configuration, with query retries
    /// enabled as configured.
    ///
    /// # Errors
    ///
    /// Same as [`GraphqlClient::new`].
    pub fn from_config(config: &oi_core::AppConfig) -> Result<Self, TransportError> {
        Ok(Self::new(
            config.graphql_endpoint.as_str(),
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_retry(config.query_max_retries, config.retry_backoff_base_ms))
    }

    /// Sets the retry policy used for idempotent queries.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.retry = RetryPolicy {
            max_retries,
            base_ms: backoff_base_ms,
        };
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends one POST and decodes the GraphQL envelope.
    async fn post_once(&self, request: &GraphqlRequest) -> Result<Value, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request.body())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
            });
        }

        let body = response.text().await?;
        let envelope: Value =
            serde_json::from_str(&body).map_err(|e| TransportError::Deserialize {
                context: format!("{} response", request.operation_name),
                source: e,
            })?;

        extract_data(&request.operation_name, envelope)
    }
}

#[async_trait]
impl Transport for GraphqlClient {
    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, TransportError> {
        tracing::debug!(
            operation = %request.operation_name,
            kind = ?request.kind,
            endpoint = %self.endpoint,
            "executing GraphQL request"
        );

        if request.kind.is_idempotent() {
            retry_with_backoff(&request.operation_name, self.retry, || {
                self.post_once(request)
            })
            .await
        } else {
            self.post_once(request).await
        }
    }
}

/// Pulls `data` out of a GraphQL response envelope.
///
/// A non-empty `errors` array wins over any partial `data`: the catalog
/// never renders half-failed results.
fn extract_data(operation: &str, mut envelope: Value) -> Result<Value, TransportError> {
    if let Some(errors) = envelope.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_owned()
                })
                .collect();
            return Err(TransportError::Graphql {
                operation: operation.to_owned(),
                messages,
            });
        }
    }

    match envelope.get_mut("data").map(Value::take) {
        Some(data @ Value::Object(_)) => Ok(data),
        _ => Err(TransportError::MissingData {
            operation: operation.to_owned(),
        }),
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
