//! Application-supplied values: custom payload data and live-activity maps.
//!
//! [`DynamicValue`] is a closed set of shapes. Both encoders agree on every
//! variant; non-finite floats have no JSON form and abort the whole encode.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::Error as _;
use serde::{Serialize, Serializer};

use crate::encode::{FastEncode, write_f64, write_i64, write_str, write_str_list};
use crate::errors::EncodeError;
use crate::time::EpochTime;

/// String-keyed map of dynamic values. Keys serialize in sorted order.
pub type DynamicMap = BTreeMap<String, DynamicValue>;

/// A value that produces its own JSON.
///
/// The fast encoder splices the output verbatim after checking it is one
/// well-formed JSON value.
pub trait MarshalJson: fmt::Debug + Send + Sync {
    /// The JSON encoding of `self`.
    fn marshal_json(&self) -> Result<Vec<u8>, EncodeError>;
}

impl MarshalJson for serde_json::Value {
    fn marshal_json(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A dynamically shaped JSON value.
#[derive(Debug, Clone)]
pub enum DynamicValue {
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Int64(i64),
    /// Finite 64-bit float.
    Float(f64),
    /// Raw bytes, encoded as a string (invalid UTF-8 is replaced).
    Bytes(Vec<u8>),
    /// String.
    String(String),
    /// Homogeneous string list.
    StringList(Vec<String>),
    /// Homogeneous 32-bit integer list.
    IntList(Vec<i32>),
    /// Homogeneous 64-bit integer list.
    Int64List(Vec<i64>),
    /// Homogeneous float list.
    FloatList(Vec<f64>),
    /// Heterogeneous list.
    List(Vec<DynamicValue>),
    /// Nested object.
    Map(DynamicMap),
    /// Self-serializing value.
    Marshaler(Arc<dyn MarshalJson>),
}

impl DynamicValue {
    /// Wrap a self-serializing value.
    pub fn marshaler(value: impl MarshalJson + 'static) -> Self {
        Self::Marshaler(Arc::new(value))
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Int64(_) => "int64",
            Self::Float(_) => "float64",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::StringList(_) => "[]string",
            Self::IntList(_) => "[]int",
            Self::Int64List(_) => "[]int64",
            Self::FloatList(_) => "[]float64",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Marshaler(_) => "marshaler",
        }
    }

    fn marshaled(m: &dyn MarshalJson) -> Result<Vec<u8>, EncodeError> {
        let bytes = m.marshal_json()?;
        serde_json::from_slice::<serde::de::IgnoredAny>(&bytes)
            .map_err(|e| EncodeError::Marshaler(format!("output is not valid JSON: {e}")))?;
        Ok(bytes)
    }
}

fn check_finite(value: f64) -> Result<(), EncodeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EncodeError::UnsupportedValue(format!("non-finite float {value}")))
    }
}

pub(crate) fn encode_map(out: &mut Vec<u8>, map: &DynamicMap) -> Result<(), EncodeError> {
    out.push(b'{');
    for (i, (k, v)) in map.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        write_str(out, k);
        out.push(b':');
        v.encode_into(out)?;
    }
    out.push(b'}');
    Ok(())
}

impl FastEncode for DynamicValue {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self {
            Self::Null => out.extend_from_slice(b"null"),
            Self::Bool(true) => out.extend_from_slice(b"true"),
            Self::Bool(false) => out.extend_from_slice(b"false"),
            Self::Int(v) => write_i64(out, i64::from(*v)),
            Self::Int64(v) => write_i64(out, *v),
            Self::Float(v) => write_f64(out, *v)?,
            Self::Bytes(v) => write_str(out, &String::from_utf8_lossy(v)),
            Self::String(v) => write_str(out, v),
            Self::StringList(v) => write_str_list(out, v),
            Self::IntList(v) => {
                out.push(b'[');
                for (i, n) in v.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    write_i64(out, i64::from(*n));
                }
                out.push(b']');
            }
            Self::Int64List(v) => {
                out.push(b'[');
                for (i, n) in v.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    write_i64(out, *n);
                }
                out.push(b']');
            }
            Self::FloatList(v) => {
                out.push(b'[');
                for (i, n) in v.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    write_f64(out, *n)?;
                }
                out.push(b']');
            }
            Self::List(v) => {
                out.push(b'[');
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    item.encode_into(out)?;
                }
                out.push(b']');
            }
            Self::Map(m) => encode_map(out, m)?,
            Self::Marshaler(m) => out.extend_from_slice(&Self::marshaled(m.as_ref())?),
        }
        Ok(())
    }
}

impl Serialize for DynamicValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i32(*v),
            Self::Int64(v) => serializer.serialize_i64(*v),
            Self::Float(v) => {
                check_finite(*v).map_err(S::Error::custom)?;
                serializer.serialize_f64(*v)
            }
            Self::Bytes(v) => serializer.serialize_str(&String::from_utf8_lossy(v)),
            Self::String(v) => serializer.serialize_str(v),
            Self::StringList(v) => v.serialize(serializer),
            Self::IntList(v) => v.serialize(serializer),
            Self::Int64List(v) => v.serialize(serializer),
            Self::FloatList(v) => {
                for n in v {
                    check_finite(*n).map_err(S::Error::custom)?;
                }
                v.serialize(serializer)
            }
            Self::List(v) => v.serialize(serializer),
            Self::Map(m) => m.serialize(serializer),
            Self::Marshaler(m) => {
                let bytes = Self::marshaled(m.as_ref()).map_err(S::Error::custom)?;
                let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(S::Error::custom)?;
                value.serialize(serializer)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────────────

impl From<bool> for DynamicValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for DynamicValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for DynamicValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for DynamicValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for DynamicValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for DynamicValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for DynamicValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<String>> for DynamicValue {
    fn from(v: Vec<String>) -> Self {
        Self::StringList(v)
    }
}

impl From<Vec<i32>> for DynamicValue {
    fn from(v: Vec<i32>) -> Self {
        Self::IntList(v)
    }
}

impl From<Vec<i64>> for DynamicValue {
    fn from(v: Vec<i64>) -> Self {
        Self::Int64List(v)
    }
}

impl From<Vec<f64>> for DynamicValue {
    fn from(v: Vec<f64>) -> Self {
        Self::FloatList(v)
    }
}

impl From<Vec<DynamicValue>> for DynamicValue {
    fn from(v: Vec<DynamicValue>) -> Self {
        Self::List(v)
    }
}

impl From<DynamicMap> for DynamicValue {
    fn from(v: DynamicMap) -> Self {
        Self::Map(v)
    }
}

impl From<EpochTime> for DynamicValue {
    fn from(v: EpochTime) -> Self {
        Self::Int64(v.as_secs())
    }
}

impl From<serde_json::Value> for DynamicValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int64(i)
                } else if n.is_f64() {
                    n.as_f64().map_or(Self::Null, Self::Float)
                } else {
                    // u64 beyond i64::MAX: keep the exact digits
                    Self::marshaler(Value::Number(n))
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}
