use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Returned to the caller when an upstream failure carries no usable reason.
pub const GENERIC_FAILURE: &str = "Error processing the request";

/// Failure while invoking the remote agent or draining its completion.
///
/// Holds only the reason string, so nothing above the agent seam depends on
/// the error types of a particular client SDK.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The invocation could not be started.
    #[error("{0}")]
    Invocation(String),

    /// The completion stream failed after the invocation was accepted.
    #[error("{0}")]
    Stream(String),

    /// A payload was not valid UTF-8.
    #[error("{0}")]
    Decode(String),
}

impl UpstreamError {
    /// Reason suitable for the JSON error body.
    pub fn message(&self) -> &str {
        let reason = match self {
            UpstreamError::Invocation(reason)
            | UpstreamError::Stream(reason)
            | UpstreamError::Decode(reason) => reason.trim(),
        };
        if reason.is_empty() {
            GENERIC_FAILURE
        } else {
            reason
        }
    }
}

/// Every way a chat request can fail, mapped onto an HTTP status.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Configuration(_) | GatewayError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn message(&self) -> &str {
        match self {
            GatewayError::Validation(msg) | GatewayError::Configuration(msg) => msg,
            GatewayError::Upstream(err) => err.message(),
        }
    }

    /// Record the failure on the server side before it is turned into a response.
    pub fn log(&self) {
        match self {
            GatewayError::Validation(msg) => warn!("Rejected chat request: {}", msg),
            GatewayError::Configuration(msg) => error!("Chat gateway misconfigured: {}", msg),
            GatewayError::Upstream(err) => error!("Error invoking Bedrock agent: {:?}", err),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_passthrough() {
        let err = UpstreamError::Invocation("AccessDeniedException: not authorized".to_string());
        assert_eq!(err.message(), "AccessDeniedException: not authorized");
        assert_eq!(err.to_string(), "AccessDeniedException: not authorized");
    }

    #[test]
    fn test_upstream_empty_reason_falls_back() {
        assert_eq!(UpstreamError::Stream(String::new()).message(), GENERIC_FAILURE);
        assert_eq!(UpstreamError::Decode("   ".to_string()).message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_gateway_status_codes() {
        assert_eq!(
            GatewayError::Validation("message is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Configuration("Bedrock configuration incomplete".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let upstream: GatewayError = UpstreamError::Stream("connection reset".into()).into();
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.message(), "connection reset");
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = GatewayError::Validation("message is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": "message is required" }));
    }
}
