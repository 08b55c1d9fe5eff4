//! The `sound` dictionary used for critical alerts.

use serde::{Deserialize, Serialize};

use crate::encode::{FastEncode, ObjectWriter, write_f64};
use crate::errors::{EncodeError, ValidationError};
use crate::ratio::Ratio;

/// Critical-alert flag. Only [`CriticalFlag::NONE`] and [`CriticalFlag::CRITICAL`] are legal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriticalFlag(pub u8);

impl CriticalFlag {
    /// Regular notification sound.
    pub const NONE: Self = Self(0);
    /// Critical alert.
    pub const CRITICAL: Self = Self(1);

    /// Whether the flag is unset (omitted on the wire).
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// Sound dictionary: `{"critical":1,"name":"...","volume":0.5}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sound {
    /// Critical-alert flag.
    #[serde(skip_serializing_if = "CriticalFlag::is_none")]
    pub critical: CriticalFlag,
    /// Sound file in the app bundle.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Playback volume for critical alerts.
    #[serde(skip_serializing_if = "Ratio::is_zero")]
    pub volume: Ratio,
}

impl Sound {
    /// A critical alert sound at the given volume.
    pub fn critical(name: impl Into<String>, volume: f64) -> Self {
        Self {
            critical: CriticalFlag::CRITICAL,
            name: name.into(),
            volume: Ratio::new(volume),
        }
    }

    /// Check the flag, then the volume. The first failure wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.critical != CriticalFlag::NONE && self.critical != CriticalFlag::CRITICAL {
            return Err(ValidationError::InvalidCriticalFlag(self.critical.0));
        }
        self.volume.validate().map_err(ValidationError::InvalidVolume)
    }
}

impl FastEncode for Sound {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let mut obj = ObjectWriter::begin(out);
        if !self.critical.is_none() {
            obj.int("critical", i64::from(self.critical.0));
        }
        obj.str("name", &self.name);
        if !self.volume.is_zero() {
            write_f64(obj.key("volume"), self.volume.value())?;
        }
        obj.end();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn fast(sound: &Sound) -> String {
        let mut out = Vec::new();
        sound.encode_into(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn valid_sounds() {
        assert!(Sound::default().validate().is_ok());
        assert!(Sound::critical("alarm.caf", 1.0).validate().is_ok());
        assert!(
            Sound {
                name: "ping".into(),
                ..Sound::default()
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn invalid_flag() {
        let sound = Sound {
            critical: CriticalFlag(2),
            ..Sound::default()
        };
        assert_eq!(sound.validate(), Err(ValidationError::InvalidCriticalFlag(2)));
    }

    #[test]
    fn invalid_volume() {
        let sound = Sound::critical("alarm", 1.5);
        assert_matches!(sound.validate(), Err(ValidationError::InvalidVolume(e)) if e.0 == 1.5);
    }

    #[test]
    fn flag_is_checked_before_volume() {
        let sound = Sound {
            critical: CriticalFlag(7),
            name: String::new(),
            volume: Ratio::new(-3.0),
        };
        assert_eq!(sound.validate(), Err(ValidationError::InvalidCriticalFlag(7)));
    }

    #[test]
    fn empty_sound_encodes_as_empty_object() {
        assert_eq!(fast(&Sound::default()), "{}");
        assert_eq!(serde_json::to_string(&Sound::default()).unwrap(), "{}");
    }

    #[test]
    fn fast_matches_serde_byte_for_byte() {
        let cases = [
            Sound::critical("alarm.caf", 0.75),
            Sound::critical("", 1.0),
            Sound {
                name: "chime".into(),
                ..Sound::default()
            },
        ];
        for sound in cases {
            assert_eq!(fast(&sound), serde_json::to_string(&sound).unwrap());
        }
    }

    #[test]
    fn full_sound_layout() {
        assert_eq!(
            fast(&Sound::critical("alarm.caf", 0.5)),
            r#"{"critical":1,"name":"alarm.caf","volume":0.5}"#
        );
    }
}
