use serde::Serialize;

/// Whether a request reads (`query`) or triggers work (`mutation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    /// Queries may be re-sent safely; mutations here start backend crawls
    /// and are sent at most once per trigger.
    #[must_use]
    pub fn is_idempotent(self) -> bool {
        matches!(self, OperationKind::Query)
    }
}

/// A named GraphQL document ready to be executed by a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphqlRequest {
    pub operation_name: String,
    pub kind: OperationKind,
    pub document: String,
}

/// Wire body of a GraphQL-over-HTTP POST.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestBody<'a> {
    pub query: &'a str,
    pub operation_name: &'a str,
}

impl GraphqlRequest {
    pub fn query(operation_name: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            kind: OperationKind::Query,
            document: document.into(),
        }
    }

    pub fn mutation(operation_name: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            kind: OperationKind::Mutation,
            document: document.into(),
        }
    }

    pub(crate) fn body(&self) -> RequestBody<'_> {
        RequestBody {
            query: &self.document,
            operation_name: &self.operation_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_serializes_with_operation_name_in_camel_case() {
        let request = GraphqlRequest::query("IsLatest", "query IsLatest { isLatest }");
        let json = serde_json::to_value(request.body()).unwrap();
        assert_eq!(json["query"], "query IsLatest { isLatest }");
        assert_eq!(json["operationName"], "IsLatest");
    }

    #[test]
    fn only_queries_are_idempotent() {
        assert!(OperationKind::Query.is_idempotent());
        assert!(!OperationKind::Mutation.is_idempotent());
    }
}
