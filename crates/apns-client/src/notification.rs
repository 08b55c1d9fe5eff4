//! Notification envelope: routing metadata around a [`Payload`].
//!
//! The envelope carries everything that ends up in request headers (push
//! type, topic, id, expiration, priority, collapse id) plus the destination
//! device token. [`Notification::validate`] checks the envelope fields in a
//! fixed order and then cascades into payload validation.

use std::fmt;
use std::str::FromStr;

use apns_payload::{EpochTime, Payload, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Push type
// ─────────────────────────────────────────────────────────────────────────────

/// Payload ceiling for every push type except VoIP.
pub const MAX_PAYLOAD_SIZE: usize = 4096;

/// Payload ceiling for VoIP pushes.
pub const MAX_VOIP_PAYLOAD_SIZE: usize = 5120;

/// Value of the `apns-push-type` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushType {
    /// User-visible alert.
    #[default]
    Alert,
    /// Silent background update.
    Background,
    /// watchOS complication update.
    Complication,
    /// Controls widget reload.
    Controls,
    /// File provider change signal.
    Fileprovider,
    /// Live activity update.
    Liveactivity,
    /// Location query (token auth only).
    Location,
    /// Mobile device management wake-up.
    Mdm,
    /// Push to Talk.
    Pushtotalk,
    /// VoIP call.
    Voip,
    /// Widget reload.
    Widgets,
}

impl PushType {
    /// Header literal.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Background => "background",
            Self::Complication => "complication",
            Self::Controls => "controls",
            Self::Fileprovider => "fileprovider",
            Self::Liveactivity => "liveactivity",
            Self::Location => "location",
            Self::Mdm => "mdm",
            Self::Pushtotalk => "pushtotalk",
            Self::Voip => "voip",
            Self::Widgets => "widgets",
        }
    }

    /// Suffix appended to the bundle id to form `apns-topic`.
    pub fn topic_suffix(self) -> &'static str {
        match self {
            Self::Complication => ".complication",
            Self::Controls => ".push-type.controls",
            Self::Fileprovider => ".pushkit.fileprovider",
            Self::Liveactivity => ".push-type.liveactivity",
            Self::Location => ".location-query",
            Self::Pushtotalk => ".voip-ptt",
            Self::Voip => ".voip",
            Self::Widgets => ".push-type.widgets",
            Self::Alert | Self::Background | Self::Mdm => "",
        }
    }

    /// Largest serialized payload accepted for this push type.
    pub fn payload_limit(self) -> usize {
        if self == Self::Voip {
            MAX_VOIP_PAYLOAD_SIZE
        } else {
            MAX_PAYLOAD_SIZE
        }
    }

    /// Whether an envelope of this type must carry a payload.
    pub fn requires_payload(self) -> bool {
        matches!(self, Self::Alert | Self::Background)
    }
}

impl fmt::Display for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PushType {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "alert" => Self::Alert,
            "background" => Self::Background,
            "complication" => Self::Complication,
            "controls" => Self::Controls,
            "fileprovider" => Self::Fileprovider,
            "liveactivity" => Self::Liveactivity,
            "location" => Self::Location,
            "mdm" => Self::Mdm,
            "pushtotalk" => Self::Pushtotalk,
            "voip" => Self::Voip,
            "widgets" => Self::Widgets,
            "" => return Err(NotificationError::MissingPushType),
            other => return Err(NotificationError::InvalidPushType(other.to_owned())),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Priority
// ─────────────────────────────────────────────────────────────────────────────

/// Value of the `apns-priority` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Header omitted; the service applies its default.
    #[default]
    None,
    /// Deliver only while the device has power. Numeric value 1.
    PowerOnly,
    /// Deliver with power considerations. Numeric value 5.
    Conserve,
    /// Deliver immediately. Numeric value 10.
    Immediate,
}

impl Priority {
    /// Numeric wire value, `0` for [`Priority::None`].
    pub fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::PowerOnly => 1,
            Self::Conserve => 5,
            Self::Immediate => 10,
        }
    }

    /// Header value, `None` when the header is omitted.
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::PowerOnly => Some("1"),
            Self::Conserve => Some("5"),
            Self::Immediate => Some("10"),
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = NotificationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::PowerOnly),
            5 => Ok(Self::Conserve),
            10 => Ok(Self::Immediate),
            other => Err(NotificationError::InvalidPriority(other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Envelope validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotificationError {
    /// `bundle_id` is empty.
    #[error("bundle id is required")]
    MissingBundleId,

    /// `device_token` is empty.
    #[error("device token is required")]
    MissingDeviceToken,

    /// Empty push type literal.
    #[error("apns-push-type is required")]
    MissingPushType,

    /// Unknown push type literal.
    #[error("invalid apns-push-type: {0}")]
    InvalidPushType(String),

    /// `apns_id` is not a UUID.
    #[error("invalid apns-id: {0}")]
    InvalidApnsId(String),

    /// Priority outside 0/1/5/10.
    #[error("invalid apns-priority: {0}")]
    InvalidPriority(u8),

    /// Alert and background pushes need a payload.
    #[error("payload is required for {0} push type")]
    MissingPayload(PushType),

    /// Payload failed validation.
    #[error(transparent)]
    Payload(#[from] ValidationError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Notification
// ─────────────────────────────────────────────────────────────────────────────

/// A single push: destination, routing headers and payload.
#[derive(Debug, Clone, Default)]
pub struct Notification {
    /// App bundle identifier; the topic is derived from it.
    pub bundle_id: String,
    /// Hex device token.
    pub device_token: String,
    /// Push type header.
    pub push_type: PushType,
    /// Caller-chosen notification id (UUID).
    pub apns_id: Option<String>,
    /// When the service stops retrying delivery.
    pub expiration: Option<EpochTime>,
    /// Delivery priority.
    pub priority: Priority,
    /// Coalescing key for repeated notifications.
    pub collapse_id: Option<String>,
    /// Body. `None` is sent as an empty `aps` dictionary.
    pub payload: Option<Payload>,
}

impl Notification {
    /// Envelope with the required fields set and default headers.
    pub fn new(
        bundle_id: impl Into<String>,
        device_token: impl Into<String>,
        push_type: PushType,
        payload: Payload,
    ) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            device_token: device_token.into(),
            push_type,
            payload: Some(payload),
            ..Self::default()
        }
    }

    /// `apns-topic`: bundle id plus the push type's suffix.
    pub fn topic(&self) -> String {
        format!("{}{}", self.bundle_id, self.push_type.topic_suffix())
    }

    /// Validate the envelope, then the payload. The first failure wins.
    pub fn validate(&self) -> Result<(), NotificationError> {
        if self.bundle_id.is_empty() {
            return Err(NotificationError::MissingBundleId);
        }
        if self.device_token.is_empty() {
            return Err(NotificationError::MissingDeviceToken);
        }
        if let Some(id) = self.apns_id.as_deref().filter(|id| !id.is_empty()) {
            if Uuid::parse_str(id).is_err() {
                return Err(NotificationError::InvalidApnsId(id.to_owned()));
            }
        }
        match &self.payload {
            Some(payload) => payload.validate()?,
            None if self.push_type.requires_payload() => {
                return Err(NotificationError::MissingPayload(self.push_type));
            }
            None => {}
        }
        Ok(())
    }

    /// Request headers, optional ones omitted when unset.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("apns-push-type", self.push_type.as_str().to_owned()),
            ("apns-topic", self.topic()),
        ];
        if let Some(id) = self.apns_id.as_deref().filter(|id| !id.is_empty()) {
            headers.push(("apns-id", id.to_owned()));
        }
        if let Some(expiration) = self.expiration {
            headers.push(("apns-expiration", expiration.to_string()));
        }
        if let Some(priority) = self.priority.header_value() {
            headers.push(("apns-priority", priority.to_owned()));
        }
        if let Some(collapse_id) = self.collapse_id.as_deref().filter(|c| !c.is_empty()) {
            headers.push(("apns-collapse-id", collapse_id.to_owned()));
        }
        headers
    }
}
