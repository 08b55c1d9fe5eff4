//! Dispatch errors.
//!
//! Local failures (validation, size, configuration, encoding) never reach the
//! network. Transport failures mean no response was received. Service and
//! HTTP failures carry the [`Response`] built from the reply so callers keep
//! the notification id.

use std::collections::HashMap;
use std::fmt;

use apns_payload::{EncodeError, ValidationError};
use thiserror::Error;

use crate::notification::{NotificationError, PushType};
use crate::response::{Response, ServiceError};
use crate::transport::TransportError;

/// Invalid use of the client independent of any single notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Multi-send with no tokens.
    #[error("token list is empty")]
    EmptyTokenList,

    /// Multi-send with more tokens than the configured limit.
    #[error("token limit exceeded: got {got} tokens, maximum allowed is {limit}")]
    TokenLimitExceeded {
        /// Tokens supplied.
        got: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Location pushes need provider-token authentication.
    #[error("location push type is not allowed with certificate-based connection")]
    LocationRequiresTokenAuth,
}

/// Failure of a single or multi-recipient push.
#[derive(Debug, Error)]
pub enum PushError {
    /// Envelope or payload validation failed.
    #[error(transparent)]
    Notification(#[from] NotificationError),

    /// Serialized payload exceeds the push type's ceiling.
    #[error("payload too large for {push_type}: {size} bytes (limit {limit})")]
    PayloadTooLarge {
        /// Push type of the envelope.
        push_type: PushType,
        /// Serialized size.
        size: usize,
        /// Ceiling for the push type.
        limit: usize,
    },

    /// Client misuse.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Payload could not be serialized.
    #[error("failed to encode payload: {0}")]
    Encode(#[from] EncodeError),

    /// No response was received.
    #[error("failed to send APNs request: {0}")]
    Transport(#[from] TransportError),

    /// Non-200 with a structured reason.
    #[error("{error}")]
    Service {
        /// Identifiers from the reply.
        response: Response,
        /// Parsed service error.
        error: ServiceError,
    },

    /// Non-200 without a usable reason.
    #[error("APNs transport error: {detail}")]
    Http {
        /// Identifiers from the reply.
        response: Response,
        /// HTTP status code.
        status: u16,
        /// What was wrong with the reply.
        detail: String,
    },

    /// The cancellation token fired before the request was issued.
    #[error("push cancelled")]
    Cancelled,

    /// A per-recipient task ended abnormally.
    #[error("send task failed: {0}")]
    Task(String),

    /// Some recipients of a multi-send failed.
    #[error(transparent)]
    Batch(MultiError),
}

impl From<ValidationError> for PushError {
    fn from(e: ValidationError) -> Self {
        Self::Notification(NotificationError::Payload(e))
    }
}

impl PushError {
    /// Reply identifiers, when the service answered.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Service { response, .. } | Self::Http { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Structured service error, if that is what this is.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Service { error, .. } => Some(error),
            _ => None,
        }
    }

    /// HTTP status of the reply, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { error, .. } => Some(error.status),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error was raised before any request was issued.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Notification(_) | Self::PayloadTooLarge { .. } | Self::Config(_) | Self::Encode(_)
        )
    }
}

/// Aggregate result of a multi-send with at least one failure.
#[derive(Debug, Default)]
pub struct MultiError {
    /// Recipients that were delivered, in completion order.
    pub successes: Vec<Response>,
    /// Failed recipients keyed by device token.
    pub failures: HashMap<String, PushError>,
}

impl MultiError {
    /// Failed device tokens in sorted order.
    pub fn failed_tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.failures.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "APNs batch failed for tokens: {:?}", self.failed_tokens())
    }
}

impl std::error::Error for MultiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_messages() {
        assert_eq!(ConfigError::EmptyTokenList.to_string(), "token list is empty");
        assert_eq!(
            ConfigError::TokenLimitExceeded { got: 101, limit: 100 }.to_string(),
            "token limit exceeded: got 101 tokens, maximum allowed is 100"
        );
    }

    #[test]
    fn payload_too_large_message() {
        let err = PushError::PayloadTooLarge {
            push_type: PushType::Alert,
            size: 4097,
            limit: 4096,
        };
        assert_eq!(err.to_string(), "payload too large for alert: 4097 bytes (limit 4096)");
        assert!(err.is_local());
    }

    #[test]
    fn validation_errors_convert() {
        let err = PushError::from(ValidationError::EmptyDictionary);
        assert!(err.is_local());
        assert_eq!(err.to_string(), "aps dictionary must not be empty");
    }

    #[test]
    fn transport_is_not_local() {
        let err = PushError::from(TransportError::Timeout);
        assert!(!err.is_local());
        assert!(err.response().is_none());
        assert_eq!(err.to_string(), "failed to send APNs request: request timed out");
    }

    #[test]
    fn multi_error_lists_sorted_tokens() {
        let mut failures = HashMap::new();
        let _ = failures.insert("bbb".to_string(), PushError::Cancelled);
        let _ = failures.insert("aaa".to_string(), PushError::Cancelled);
        let err = MultiError {
            successes: Vec::new(),
            failures,
        };
        assert_eq!(err.to_string(), r#"APNs batch failed for tokens: ["aaa", "bbb"]"#);
    }

    #[test]
    fn status_accessor() {
        let err = PushError::Http {
            response: Response::default(),
            status: 503,
            detail: "empty response body, status=503".into(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "APNs transport error: empty response body, status=503");
    }
}
