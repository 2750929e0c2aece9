use thiserror::Error;

/// Failures reaching the backend or speaking its protocol.
///
/// Every variant moves the triggering operation to its error state; none of
/// them is surfaced past the controller as a panic or propagated error.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body was not valid JSON.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The server answered with a non-empty GraphQL `errors` array.
    #[error("GraphQL error in {operation}: {}", .messages.join("; "))]
    Graphql {
        operation: String,
        messages: Vec<String>,
    },

    /// The response carried neither `errors` nor a `data` object.
    #[error("GraphQL response for {operation} has no data")]
    MissingData { operation: String },

    #[error("{operation} did not complete within {after_secs}s")]
    Timeout { operation: String, after_secs: u64 },

    #[error("invalid GraphQL endpoint \"{endpoint}\": {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}
