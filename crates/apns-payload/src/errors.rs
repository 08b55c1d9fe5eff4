//! Validation and encoding errors for payload types.
//!
//! Validation errors are field-qualified and never reach the network.
//! Encoding errors abort serialization entirely; no partial payload is returned.

use thiserror::Error;

/// A [`Ratio`](crate::Ratio) outside `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("ratio out of range: {0}")]
pub struct RatioError(pub f64);

/// Payload validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Neither a notification field nor live-activity data is present.
    #[error("aps dictionary must not be empty")]
    EmptyDictionary,

    /// Sound critical flag is neither 0 nor 1.
    #[error("invalid critical flag: {0}")]
    InvalidCriticalFlag(u8),

    /// Sound volume outside `[0.0, 1.0]`.
    #[error("volume field error: {0}")]
    InvalidVolume(#[source] RatioError),

    /// A presence flag (`content-available`, `mutable-content`) holds something other than 1.
    #[error("invalid value for aps.{field}: must be the integer 1, got {value}")]
    InvalidFlag {
        /// Wire name of the field.
        field: &'static str,
        /// Offending value.
        value: i64,
    },

    /// A string could not be parsed into one of a field's enumerated literals.
    #[error("invalid value for aps.{field}: {value}")]
    UnknownLiteral {
        /// Wire name of the field.
        field: &'static str,
        /// Offending literal.
        value: String,
    },

    /// Relevance score outside `[0.0, 1.0]` on a non-live-activity dictionary.
    #[error("relevance-score must be between 0.0 and 1.0 for standard notifications, but got {0:.6}")]
    RelevanceScoreOutOfRange(f64),

    /// Custom data uses the key reserved for the `aps` dictionary.
    #[error("custom data must not use the reserved key \"{0}\"")]
    ReservedKey(&'static str),
}

/// Payload encoding failure.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A dynamic value that has no JSON representation (e.g. a non-finite float).
    #[error("invalid type for APS field: {0}")]
    UnsupportedValue(String),

    /// A self-serializing value failed or produced malformed JSON.
    #[error("custom marshaler failed: {0}")]
    Marshaler(String),

    /// The reflective `serde_json` encoder failed.
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
