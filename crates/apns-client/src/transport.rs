//! The seam between dispatch and the network.
//!
//! A [`Transport`] takes one fully built [`PushRequest`] and returns the raw
//! status, headers and body. Classification of that result into success or a
//! typed error happens in the client, not here.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// How the transport authenticates with the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Signed provider tokens (`.p8` key).
    Token,
    /// TLS client certificate.
    Certificate,
}

/// One outbound push request.
#[derive(Debug, Clone)]
pub struct PushRequest {
    /// Destination device token (unescaped).
    pub device_token: String,
    /// `apns-*` headers in emission order.
    pub headers: Vec<(&'static str, String)>,
    /// Serialized payload, shared across recipients.
    pub body: Bytes,
}

impl PushRequest {
    /// Value of the header `name`, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response from the service.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The request never produced a response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS or protocol failure.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Deadline elapsed before a response arrived.
    #[error("request timed out")]
    Timeout,

    /// Provider token could not be produced.
    #[error("failed to sign provider token: {0}")]
    Auth(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Sends push requests to the service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Authentication mode of this transport.
    fn auth_mode(&self) -> AuthMode;

    /// Deliver one request.
    async fn send(&self, request: PushRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let resp = TransportResponse {
            status: 200,
            headers: vec![("Apns-Id".into(), "abc".into())],
            body: Bytes::new(),
        };
        assert_eq!(resp.header("apns-id"), Some("abc"));
        assert_eq!(resp.header("apns-unique-id"), None);
    }

    #[test]
    fn request_header_lookup() {
        let req = PushRequest {
            device_token: "t".into(),
            headers: vec![("apns-topic", "com.example".into())],
            body: Bytes::from_static(b"{}"),
        };
        assert_eq!(req.header("APNS-TOPIC"), Some("com.example"));
    }
}
