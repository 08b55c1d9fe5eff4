//! UNIX timestamps in whole seconds.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::encode::{FastEncode, write_i64};
use crate::errors::EncodeError;

/// Seconds since the UNIX epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochTime(pub i64);

impl EpochTime {
    /// Expiration of 0: deliver once, never store for later delivery.
    pub const EXPIRATION_ONCE: Self = Self(0);

    /// Wrap a raw seconds value.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Current time.
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Seconds since the epoch.
    pub const fn as_secs(self) -> i64 {
        self.0
    }

    /// Convert back to a calendar time, if representable.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }
}

impl From<DateTime<Utc>> for EpochTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp())
    }
}

impl fmt::Display for EpochTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FastEncode for EpochTime {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        write_i64(out, self.0);
        Ok(())
    }
}
