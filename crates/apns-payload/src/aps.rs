//! The `aps` dictionary: system-recognized notification fields.
//!
//! A dictionary is a *notification* when any of `alert`, `badge`, `sound`,
//! `content-available` or `mutable-content` is present, and a *live activity*
//! when `content-state` or `attributes` is non-empty. At least one must hold.
//! The `[0.0, 1.0]` relevance-score bound only applies when the dictionary is
//! not a live activity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::encode::{FastEncode, ObjectWriter, write_f64, write_i64, write_str};
use crate::errors::{EncodeError, ValidationError};
use crate::sound::Sound;
use crate::time::EpochTime;
use crate::value::{DynamicMap, encode_map};

// ─────────────────────────────────────────────────────────────────────────────
// Field shapes
// ─────────────────────────────────────────────────────────────────────────────

/// `alert`: plain text or a structured [`Alert`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertValue {
    /// Plain alert text.
    Text(String),
    /// Structured alert dictionary.
    Dictionary(Alert),
}

impl From<&str> for AlertValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for AlertValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Alert> for AlertValue {
    fn from(alert: Alert) -> Self {
        Self::Dictionary(alert)
    }
}

impl FastEncode for AlertValue {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self {
            Self::Text(text) => {
                write_str(out, text);
                Ok(())
            }
            Self::Dictionary(alert) => alert.encode_into(out),
        }
    }
}

/// `sound`: a sound file name or a structured [`Sound`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SoundValue {
    /// Sound file name.
    Name(String),
    /// Sound dictionary (critical alerts).
    Dictionary(Sound),
}

impl From<&str> for SoundValue {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for SoundValue {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Sound> for SoundValue {
    fn from(sound: Sound) -> Self {
        Self::Dictionary(sound)
    }
}

impl FastEncode for SoundValue {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self {
            Self::Name(name) => {
                write_str(out, name);
                Ok(())
            }
            Self::Dictionary(sound) => sound.encode_into(out),
        }
    }
}

/// `relevance-score`: integer or float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelevanceScore {
    /// Integer score.
    Integer(i64),
    /// Floating-point score.
    Float(f64),
}

impl RelevanceScore {
    /// Numeric value used for range checks.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(v) => v as f64,
            Self::Float(v) => v,
        }
    }
}

impl From<f64> for RelevanceScore {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for RelevanceScore {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl FastEncode for RelevanceScore {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match *self {
            Self::Integer(v) => {
                write_i64(out, v);
                Ok(())
            }
            Self::Float(v) => write_f64(out, v),
        }
    }
}

/// `interruption-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterruptionLevel {
    /// Added to the list without lighting the screen or playing a sound.
    Passive,
    /// Presented immediately, lights the screen, may play a sound.
    Active,
    /// Presented immediately and can break through Focus.
    TimeSensitive,
    /// Presented immediately, bypasses the mute switch.
    Critical,
}

impl InterruptionLevel {
    /// Wire literal.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passive => "passive",
            Self::Active => "active",
            Self::TimeSensitive => "time-sensitive",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for InterruptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterruptionLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passive" => Ok(Self::Passive),
            "active" => Ok(Self::Active),
            "time-sensitive" => Ok(Self::TimeSensitive),
            "critical" => Ok(Self::Critical),
            other => Err(ValidationError::UnknownLiteral {
                field: "interruption-level",
                value: other.to_owned(),
            }),
        }
    }
}

/// `event`: live-activity lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveActivityEvent {
    /// Start a live activity.
    Start,
    /// Update a running live activity.
    Update,
    /// End a live activity.
    End,
}

impl LiveActivityEvent {
    /// Wire literal.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Update => "update",
            Self::End => "end",
        }
    }
}

impl fmt::Display for LiveActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LiveActivityEvent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "update" => Ok(Self::Update),
            "end" => Ok(Self::End),
            other => Err(ValidationError::UnknownLiteral {
                field: "event",
                value: other.to_owned(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aps
// ─────────────────────────────────────────────────────────────────────────────

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// The `aps` dictionary. Every field is optional; absent fields are omitted.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Aps {
    /// Alert text or dictionary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertValue>,
    /// Badge number; `Some(0)` clears the badge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
    /// Sound name or dictionary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<SoundValue>,
    /// Background update flag; must be 1 when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_available: Option<i64>,
    /// Notification service extension flag; must be 1 when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutable_content: Option<i64>,
    /// Actionable notification category.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub category: String,
    /// Grouping identifier.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thread_id: String,
    /// Importance and delivery timing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interruption_level: Option<InterruptionLevel>,
    /// Summary sort score (any value for live activities).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<RelevanceScore>,
    /// When a live activity becomes stale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_date: Option<EpochTime>,
    /// Focus filter criteria.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filter_criteria: String,
    /// When a live-activity update was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<EpochTime>,
    /// Window brought forward on open.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_content_id: String,
    /// Live-activity dynamic state.
    #[serde(skip_serializing_if = "DynamicMap::is_empty")]
    pub content_state: DynamicMap,
    /// Live-activity lifecycle event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<LiveActivityEvent>,
    /// When an ended live activity is dismissed (epoch seconds).
    #[serde(skip_serializing_if = "is_zero")]
    pub dismissal_date: i64,
    /// Name of the live-activity attributes type.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub attributes_type: String,
    /// Live-activity static attributes.
    #[serde(skip_serializing_if = "DynamicMap::is_empty")]
    pub attributes: DynamicMap,
}

fn check_flag(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v != 1 => Err(ValidationError::InvalidFlag { field, value: v }),
        _ => Ok(()),
    }
}

impl Aps {
    /// Whether any user-facing notification field is present.
    pub fn is_notification(&self) -> bool {
        self.alert.is_some()
            || self.badge.is_some()
            || self.sound.is_some()
            || self.content_available.is_some()
            || self.mutable_content.is_some()
    }

    /// Whether live-activity state or attributes are present.
    pub fn is_live_activity(&self) -> bool {
        !self.content_state.is_empty() || !self.attributes.is_empty()
    }

    /// Validate the dictionary.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// emptiness, sound, presence flags, relevance score.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let is_live_activity = self.is_live_activity();
        if !self.is_notification() && !is_live_activity {
            return Err(ValidationError::EmptyDictionary);
        }

        if let Some(SoundValue::Dictionary(sound)) = &self.sound {
            sound.validate()?;
        }

        check_flag("content-available", self.content_available)?;
        check_flag("mutable-content", self.mutable_content)?;

        if let Some(score) = self.relevance_score {
            let score = score.as_f64();
            if !is_live_activity && !(0.0..=1.0).contains(&score) {
                return Err(ValidationError::RelevanceScoreOutOfRange(score));
            }
        }

        Ok(())
    }
}

impl FastEncode for Aps {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let mut obj = ObjectWriter::begin(out);
        if let Some(alert) = &self.alert {
            obj.value("alert", alert)?;
        }
        if let Some(badge) = self.badge {
            obj.int("badge", i64::from(badge));
        }
        if let Some(sound) = &self.sound {
            obj.value("sound", sound)?;
        }
        if let Some(v) = self.content_available {
            obj.int("content-available", v);
        }
        if let Some(v) = self.mutable_content {
            obj.int("mutable-content", v);
        }
        obj.str("category", &self.category);
        obj.str("thread-id", &self.thread_id);
        if let Some(level) = self.interruption_level {
            obj.str("interruption-level", level.as_str());
        }
        if let Some(score) = &self.relevance_score {
            obj.value("relevance-score", score)?;
        }
        if let Some(date) = &self.stale_date {
            obj.value("stale-date", date)?;
        }
        obj.str("filter-criteria", &self.filter_criteria);
        if let Some(ts) = &self.timestamp {
            obj.value("timestamp", ts)?;
        }
        obj.str("target-content-id", &self.target_content_id);
        if !self.content_state.is_empty() {
            encode_map(obj.key("content-state"), &self.content_state)?;
        }
        if let Some(event) = self.event {
            obj.str("event", event.as_str());
        }
        if self.dismissal_date != 0 {
            obj.int("dismissal-date", self.dismissal_date);
        }
        obj.str("attributes-type", &self.attributes_type);
        if !self.attributes.is_empty() {
            encode_map(obj.key("attributes"), &self.attributes)?;
        }
        obj.end();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::CriticalFlag;
    use crate::value::DynamicValue;
    use crate::Ratio;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn fast(aps: &Aps) -> String {
        let mut out = Vec::new();
        aps.encode_into(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn state(key: &str, value: impl Into<DynamicValue>) -> DynamicMap {
        let mut map = DynamicMap::new();
        let _ = map.insert(key.to_owned(), value.into());
        map
    }

    fn alert(text: &str) -> Aps {
        Aps {
            alert: Some(text.into()),
            ..Aps::default()
        }
    }

    // ── validation ──────────────────────────────────────────────────────

    #[test]
    fn empty_dictionary_fails() {
        let err = Aps::default().validate().unwrap_err();
        assert_eq!(err, ValidationError::EmptyDictionary);
        assert_eq!(err.to_string(), "aps dictionary must not be empty");
    }

    #[test]
    fn non_classifying_fields_alone_are_empty() {
        let aps = Aps {
            category: "MESSAGE".into(),
            thread_id: "t1".into(),
            ..Aps::default()
        };
        assert_eq!(aps.validate(), Err(ValidationError::EmptyDictionary));
    }

    #[test]
    fn content_state_alone_is_a_live_activity() {
        let aps = Aps {
            content_state: state("score", 3_i64),
            ..Aps::default()
        };
        assert!(!aps.is_notification());
        assert!(aps.is_live_activity());
        assert!(aps.validate().is_ok());
    }

    #[test]
    fn attributes_alone_are_a_live_activity() {
        let aps = Aps {
            attributes: state("team", "blue"),
            ..Aps::default()
        };
        assert!(aps.validate().is_ok());
    }

    #[test]
    fn each_notification_field_classifies() {
        let cases = [
            alert("hi"),
            Aps {
                badge: Some(0),
                ..Aps::default()
            },
            Aps {
                sound: Some("default".into()),
                ..Aps::default()
            },
            Aps {
                content_available: Some(1),
                ..Aps::default()
            },
            Aps {
                mutable_content: Some(1),
                ..Aps::default()
            },
        ];
        for aps in cases {
            assert!(aps.is_notification());
            assert!(aps.validate().is_ok(), "{aps:?}");
        }
    }

    #[test]
    fn sound_dictionary_errors_propagate_unchanged() {
        let aps = Aps {
            sound: Some(
                Sound {
                    critical: CriticalFlag(3),
                    ..Sound::default()
                }
                .into(),
            ),
            ..Aps::default()
        };
        assert_eq!(aps.validate(), Err(ValidationError::InvalidCriticalFlag(3)));

        let aps = Aps {
            sound: Some(Sound::critical("alarm", 2.0).into()),
            ..Aps::default()
        };
        assert_matches!(aps.validate(), Err(ValidationError::InvalidVolume(_)));
    }

    #[test]
    fn presence_flags_must_be_one() {
        let aps = Aps {
            content_available: Some(0),
            ..Aps::default()
        };
        assert_eq!(
            aps.validate(),
            Err(ValidationError::InvalidFlag {
                field: "content-available",
                value: 0
            })
        );

        let aps = Aps {
            mutable_content: Some(2),
            ..alert("x")
        };
        assert_matches!(aps.validate(), Err(ValidationError::InvalidFlag { field: "mutable-content", .. }));
    }

    #[test]
    fn sound_is_checked_before_flags() {
        let aps = Aps {
            sound: Some(Sound::critical("a", 9.0).into()),
            content_available: Some(5),
            ..Aps::default()
        };
        assert_matches!(aps.validate(), Err(ValidationError::InvalidVolume(_)));
    }

    #[test]
    fn flags_are_checked_before_relevance() {
        let aps = Aps {
            content_available: Some(2),
            relevance_score: Some(5.0.into()),
            ..Aps::default()
        };
        assert_matches!(aps.validate(), Err(ValidationError::InvalidFlag { .. }));
    }

    #[test]
    fn relevance_range_depends_on_classification() {
        let plain = Aps {
            relevance_score: Some(1.1.into()),
            ..alert("hi")
        };
        assert_eq!(plain.validate(), Err(ValidationError::RelevanceScoreOutOfRange(1.1)));

        let live = Aps {
            relevance_score: Some(1.1.into()),
            content_state: state("progress", 0.5),
            ..Aps::default()
        };
        assert!(live.validate().is_ok());

        let live_negative = Aps {
            relevance_score: Some((-40_i64).into()),
            attributes: state("x", 1_i32),
            ..alert("also a notification")
        };
        assert!(live_negative.validate().is_ok());
    }

    #[test]
    fn relevance_accepts_integers_in_range() {
        let aps = Aps {
            relevance_score: Some(1_i64.into()),
            ..alert("x")
        };
        assert!(aps.validate().is_ok());
        let aps = Aps {
            relevance_score: Some(2_i64.into()),
            ..alert("x")
        };
        assert_eq!(aps.validate(), Err(ValidationError::RelevanceScoreOutOfRange(2.0)));
    }

    #[test]
    fn literal_parsing() {
        assert_eq!("time-sensitive".parse::<InterruptionLevel>(), Ok(InterruptionLevel::TimeSensitive));
        assert_eq!(
            "urgent".parse::<InterruptionLevel>(),
            Err(ValidationError::UnknownLiteral {
                field: "interruption-level",
                value: "urgent".into()
            })
        );
        assert_eq!("end".parse::<LiveActivityEvent>(), Ok(LiveActivityEvent::End));
        assert!("stop".parse::<LiveActivityEvent>().is_err());
    }

    // ── encoding ────────────────────────────────────────────────────────

    #[test]
    fn plain_alert() {
        assert_eq!(fast(&alert("simple alert")), r#"{"alert":"simple alert"}"#);
    }

    #[test]
    fn structured_alert_and_sound() {
        let aps = Aps {
            alert: Some(Alert::default().into()),
            sound: Some(Sound::default().into()),
            ..Aps::default()
        };
        assert_eq!(fast(&aps), r#"{"alert":{},"sound":{}}"#);
    }

    #[test]
    fn flags_and_zero_badge() {
        let aps = Aps {
            badge: Some(0),
            content_available: Some(1),
            mutable_content: Some(1),
            ..Aps::default()
        };
        assert_eq!(fast(&aps), r#"{"badge":0,"content-available":1,"mutable-content":1}"#);
    }

    #[test]
    fn empty_dictionary_encodes_as_empty_object() {
        assert_eq!(fast(&Aps::default()), "{}");
    }

    fn everything() -> Aps {
        let mut content_state = state("score", 3_i64);
        let _ = content_state.insert("names".into(), vec!["a".to_string(), "b".to_string()].into());
        Aps {
            alert: Some(Alert::new("Title", "Body").into()),
            badge: Some(7),
            sound: Some(
                Sound {
                    critical: CriticalFlag::CRITICAL,
                    name: "alarm.caf".into(),
                    volume: Ratio::new(0.8),
                }
                .into(),
            ),
            content_available: Some(1),
            mutable_content: Some(1),
            category: "GAME".into(),
            thread_id: "match-9".into(),
            interruption_level: Some(InterruptionLevel::TimeSensitive),
            relevance_score: Some(0.75.into()),
            stale_date: Some(EpochTime(1_700_000_100)),
            filter_criteria: "work".into(),
            timestamp: Some(EpochTime(1_700_000_000)),
            target_content_id: "window-1".into(),
            content_state,
            event: Some(LiveActivityEvent::Update),
            dismissal_date: 1_700_003_600,
            attributes_type: "MatchAttributes".into(),
            attributes: state("home", "Lions"),
        }
    }

    #[test]
    fn every_field_matches_serde_byte_for_byte() {
        let aps = everything();
        assert_eq!(fast(&aps), serde_json::to_string(&aps).unwrap());
    }

    #[test]
    fn wire_names() {
        let json: serde_json::Value = serde_json::from_str(&fast(&everything())).unwrap();
        assert_eq!(json["content-available"], 1);
        assert_eq!(json["thread-id"], "match-9");
        assert_eq!(json["interruption-level"], "time-sensitive");
        assert_eq!(json["relevance-score"], 0.75);
        assert_eq!(json["stale-date"], 1_700_000_100);
        assert_eq!(json["filter-criteria"], "work");
        assert_eq!(json["target-content-id"], "window-1");
        assert_eq!(json["content-state"], json!({"names": ["a", "b"], "score": 3}));
        assert_eq!(json["event"], "update");
        assert_eq!(json["dismissal-date"], 1_700_003_600);
        assert_eq!(json["attributes-type"], "MatchAttributes");
        assert_eq!(json["attributes"], json!({"home": "Lions"}));
    }

    #[test]
    fn integer_relevance_score_encodes() {
        let aps = Aps {
            relevance_score: Some(3_i64.into()),
            content_state: state("a", 1_i32),
            ..Aps::default()
        };
        assert_eq!(fast(&aps), r#"{"relevance-score":3,"content-state":{"a":1}}"#);
        assert_eq!(fast(&aps), serde_json::to_string(&aps).unwrap());
    }

    #[test]
    fn unsupported_value_in_state_aborts() {
        let aps = Aps {
            content_state: state("bad", f64::NAN),
            ..Aps::default()
        };
        let mut out = Vec::new();
        assert_matches!(aps.encode_into(&mut out), Err(EncodeError::UnsupportedValue(_)));
    }
}
