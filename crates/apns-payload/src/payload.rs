//! Top-level payload: the `aps` dictionary merged with custom data.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::aps::Aps;
use crate::encode::{FastEncode, write_str};
use crate::errors::{EncodeError, ValidationError};
use crate::value::{DynamicMap, DynamicValue};

/// Top-level key reserved for the [`Aps`] dictionary.
pub const APS_KEY: &str = "aps";

/// A complete notification payload.
///
/// On the wire `aps` and every custom key are siblings in one object, `aps`
/// first, custom keys in sorted order.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    /// System-recognized notification fields.
    pub aps: Aps,
    /// Application-defined root-level keys.
    pub custom_data: DynamicMap,
}

impl Payload {
    /// Payload with the given `aps` dictionary and no custom data.
    pub fn new(aps: Aps) -> Self {
        Self {
            aps,
            custom_data: DynamicMap::new(),
        }
    }

    /// Add a custom root-level key.
    #[must_use]
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        let _ = self.custom_data.insert(key.into(), value.into());
        self
    }

    /// Reject custom data that collides with `aps`, then validate `aps`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.custom_data.contains_key(APS_KEY) {
            return Err(ValidationError::ReservedKey(APS_KEY));
        }
        self.aps.validate()
    }

    fn custom_entries(&self) -> impl Iterator<Item = (&String, &DynamicValue)> {
        self.custom_data.iter().filter(|(k, _)| k.as_str() != APS_KEY)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(APS_KEY, &self.aps)?;
        for (k, v) in self.custom_entries() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl FastEncode for Payload {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.extend_from_slice(b"{\"aps\":");
        self.aps.encode_into(out)?;
        for (k, v) in self.custom_entries() {
            out.push(b',');
            write_str(out, k);
            out.push(b':');
            v.encode_into(out)?;
        }
        out.push(b'}');
        Ok(())
    }
}
