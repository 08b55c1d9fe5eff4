//! Service responses and their classification.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::client::Environment;
use crate::errors::PushError;
use crate::transport::TransportResponse;

/// Identifiers echoed by the service for one delivery attempt.
///
/// Built for every response that reaches the client, successful or not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// Device token the request was sent to.
    pub device_token: String,
    /// Canonical notification id (`apns-id`).
    pub apns_id: String,
    /// Delivery id (`apns-unique-id`), development environment only.
    pub unique_id: String,
}

/// A non-200 response carrying a structured `reason`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// HTTP status code.
    pub status: u16,
    /// Service reason, e.g. `BadDeviceToken`.
    pub reason: String,
    /// Milliseconds since the epoch, for `410 Unregistered`.
    pub timestamp: Option<i64>,
}

impl ServiceError {
    /// The timestamp as a calendar time.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "APNs error: status={} reason={}", self.status, self.reason)?;
        if let Some(ts) = self.timestamp {
            write!(f, " timestamp={ts}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    timestamp: i64,
}

/// Turn a raw transport response into a [`Response`] or a typed error.
pub(crate) fn classify(
    environment: Environment,
    device_token: &str,
    raw: &TransportResponse,
) -> Result<Response, PushError> {
    let response = Response {
        device_token: device_token.to_owned(),
        apns_id: raw.header("apns-id").unwrap_or_default().to_owned(),
        unique_id: match environment {
            Environment::Development => raw.header("apns-unique-id").unwrap_or_default().to_owned(),
            Environment::Production => String::new(),
        },
    };

    if raw.status == 200 {
        return Ok(response);
    }

    let status = raw.status;
    if raw.body.is_empty() {
        return Err(PushError::Http {
            response,
            status,
            detail: format!("empty response body, status={status}"),
        });
    }

    let parsed: ErrorBody = match serde_json::from_slice(&raw.body) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(status, error = %e, "unparsable error body");
            return Err(PushError::Http {
                response,
                status,
                detail: format!("request failed with status {status}: failed to parse error response: {e}"),
            });
        }
    };

    if parsed.reason.is_empty() {
        return Err(PushError::Http {
            response,
            status,
            detail: format!("request failed with status {status}"),
        });
    }

    Err(PushError::Service {
        response,
        error: ServiceError {
            status,
            reason: parsed.reason,
            timestamp: (parsed.timestamp != 0).then_some(parsed.timestamp),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use bytes::Bytes;

    fn raw(status: u16, body: &'static str) -> TransportResponse {
        TransportResponse {
            status,
            headers: vec![
                ("apns-id".into(), "id-1".into()),
                ("apns-unique-id".into(), "uniq-1".into()),
            ],
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn ok_carries_identifiers() {
        let resp = classify(Environment::Development, "tok", &raw(200, "")).unwrap();
        assert_eq!(resp.apns_id, "id-1");
        assert_eq!(resp.unique_id, "uniq-1");
        assert_eq!(resp.device_token, "tok");
    }

    #[test]
    fn unique_id_only_in_development() {
        let resp = classify(Environment::Production, "tok", &raw(200, "")).unwrap();
        assert_eq!(resp.apns_id, "id-1");
        assert!(resp.unique_id.is_empty());
    }

    #[test]
    fn structured_reason_is_service_error() {
        let err = classify(
            Environment::Production,
            "tok",
            &raw(410, r#"{"reason":"Unregistered","timestamp":1700000000000}"#),
        )
        .unwrap_err();
        assert_matches!(&err, PushError::Service { response, error } => {
            assert_eq!(response.apns_id, "id-1");
            assert_eq!(error.status, 410);
            assert_eq!(error.reason, "Unregistered");
            assert_eq!(error.timestamp, Some(1_700_000_000_000));
            assert_eq!(error.timestamp().map(|t| t.timestamp()), Some(1_700_000_000));
        });
        assert_eq!(
            err.to_string(),
            "APNs error: status=410 reason=Unregistered timestamp=1700000000000"
        );
    }

    #[test]
    fn reason_without_timestamp() {
        let err = classify(Environment::Production, "tok", &raw(400, r#"{"reason":"BadDeviceToken"}"#))
            .unwrap_err();
        assert_eq!(err.to_string(), "APNs error: status=400 reason=BadDeviceToken");
        assert_eq!(err.service_error().and_then(ServiceError::timestamp), None);
    }

    #[test]
    fn empty_body_is_generic() {
        let err = classify(Environment::Production, "tok", &raw(500, "")).unwrap_err();
        assert_matches!(&err, PushError::Http { status: 500, detail, .. } if detail == "empty response body, status=500");
        assert_eq!(err.response().map(|r| r.apns_id.as_str()), Some("id-1"));
    }

    #[test]
    fn unparsable_body_is_generic() {
        let err = classify(Environment::Production, "tok", &raw(502, "<html>")).unwrap_err();
        assert_matches!(&err, PushError::Http { status: 502, detail, .. } if detail.contains("failed to parse error response"));
    }

    #[test]
    fn body_without_reason_is_generic() {
        let err = classify(Environment::Production, "tok", &raw(403, r#"{"other":1}"#)).unwrap_err();
        assert_matches!(&err, PushError::Http { detail, .. } if detail == "request failed with status 403");
    }
}
