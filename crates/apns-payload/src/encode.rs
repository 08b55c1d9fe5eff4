//! Hand-built JSON encoding.
//!
//! Every payload type implements [`FastEncode`] alongside `serde::Serialize`.
//! The fast path writes straight into a pooled buffer without reflection;
//! its output parses to the same JSON value as `serde_json` produces for the
//! same input (object key order per nesting level aside, array order kept).
//!
//! String escaping: `"` and `\` get a backslash, bytes `<= 0x1F` become
//! `\u00XX`, everything else passes through untouched.

use serde::{Deserialize, Serialize};

use crate::errors::EncodeError;
use crate::pool::BufferPool;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// A type that can append its JSON form to a byte buffer.
pub trait FastEncode {
    /// Append the JSON encoding of `self` to `out`.
    ///
    /// On error `out` may hold a partial encoding; callers discard it.
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError>;
}

/// Which encoder serializes a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderMode {
    /// Pooled hand-built encoder.
    #[default]
    Fast,
    /// Generic `serde_json` encoder.
    Reflective,
}

/// Encode with the pooled fast encoder.
///
/// A buffer is borrowed from `pool` for the duration of the call and returned
/// cleared on every exit path, including errors.
pub fn encode_fast<T: FastEncode + ?Sized>(value: &T, pool: &BufferPool) -> Result<Vec<u8>, EncodeError> {
    let mut buf = pool.acquire();
    value.encode_into(&mut buf)?;
    Ok(buf.to_vec())
}

/// Encode with `serde_json`.
pub fn encode_reflective<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(value)?)
}

/// Encode with the encoder selected by `mode`.
pub fn encode<T>(value: &T, mode: EncoderMode, pool: &BufferPool) -> Result<Vec<u8>, EncodeError>
where
    T: FastEncode + Serialize + ?Sized,
{
    match mode {
        EncoderMode::Fast => encode_fast(value, pool),
        EncoderMode::Reflective => encode_reflective(value),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scalar writers
// ─────────────────────────────────────────────────────────────────────────────

/// Append `s` as a quoted, escaped JSON string.
pub(crate) fn write_str(out: &mut Vec<u8>, s: &str) {
    out.reserve(s.len() + 2);
    out.push(b'"');
    let bytes = s.as_bytes();
    let mut start = 0;
    for (i, &c) in bytes.iter().enumerate() {
        if c != b'"' && c != b'\\' && c > 0x1F {
            continue;
        }
        out.extend_from_slice(&bytes[start..i]);
        if c == b'"' || c == b'\\' {
            out.extend_from_slice(&[b'\\', c]);
        } else {
            out.extend_from_slice(&[b'\\', b'u', b'0', b'0', HEX[(c >> 4) as usize], HEX[(c & 0xF) as usize]]);
        }
        start = i + 1;
    }
    out.extend_from_slice(&bytes[start..]);
    out.push(b'"');
}

/// Append a minimal decimal integer.
pub(crate) fn write_i64(out: &mut Vec<u8>, value: i64) {
    let mut digits = [0u8; 20];
    let mut n = value.unsigned_abs();
    let mut i = digits.len();
    loop {
        i -= 1;
        digits[i] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    if value < 0 {
        out.push(b'-');
    }
    out.extend_from_slice(&digits[i..]);
}

/// Append the shortest round-trippable decimal for `value`.
///
/// Uses the same float formatting as `serde_json` so both encoders agree
/// byte-for-byte on numbers. Non-finite values have no JSON form.
pub(crate) fn write_f64(out: &mut Vec<u8>, value: f64) -> Result<(), EncodeError> {
    if !value.is_finite() {
        return Err(EncodeError::UnsupportedValue(format!("non-finite float {value}")));
    }
    serde_json::to_writer(&mut *out, &value)?;
    Ok(())
}

pub(crate) fn write_str_list(out: &mut Vec<u8>, values: &[String]) {
    out.push(b'[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        write_str(out, v);
    }
    out.push(b']');
}

// ─────────────────────────────────────────────────────────────────────────────
// Object writer
// ─────────────────────────────────────────────────────────────────────────────

/// Writes one JSON object, inserting separators between members.
pub(crate) struct ObjectWriter<'a> {
    out: &'a mut Vec<u8>,
    first: bool,
}

impl<'a> ObjectWriter<'a> {
    pub(crate) fn begin(out: &'a mut Vec<u8>) -> Self {
        out.push(b'{');
        Self { out, first: true }
    }

    /// Write the separator and `"key":`, returning the buffer for the value.
    pub(crate) fn key(&mut self, key: &str) -> &mut Vec<u8> {
        if self.first {
            self.first = false;
        } else {
            self.out.push(b',');
        }
        write_str(self.out, key);
        self.out.push(b':');
        &mut *self.out
    }

    /// String member, omitted when empty.
    pub(crate) fn str(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            write_str(self.key(key), value);
        }
    }

    /// String-list member, omitted when empty.
    pub(crate) fn str_list(&mut self, key: &str, values: &[String]) {
        if !values.is_empty() {
            write_str_list(self.key(key), values);
        }
    }

    /// Integer member, always written.
    pub(crate) fn int(&mut self, key: &str, value: i64) {
        write_i64(self.key(key), value);
    }

    /// Nested encodable member, always written.
    pub(crate) fn value<T: FastEncode + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), EncodeError> {
        value.encode_into(self.key(key))
    }

    pub(crate) fn end(self) {
        self.out.push(b'}');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quoted(s: &str) -> String {
        let mut out = Vec::new();
        write_str(&mut out, s);
        String::from_utf8(out).unwrap()
    }

    fn int(v: i64) -> String {
        let mut out = Vec::new();
        write_i64(&mut out, v);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn escapes_quote_and_backslash() {
        assert_eq!(quoted(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn escapes_control_characters_as_unicode() {
        assert_eq!(quoted("a\nb\u{1f}"), r#""a\u000ab\u001f""#);
        assert_eq!(quoted("\t"), r#""\u0009""#);
    }

    #[test]
    fn multibyte_passes_through() {
        assert_eq!(quoted("こんにちは—ok"), "\"こんにちは—ok\"");
    }

    #[test]
    fn escaped_strings_parse_back() {
        let raw = "tab\tquote\"slash\\bell\u{7}";
        let parsed: String = serde_json::from_str(&quoted(raw)).unwrap();
        assert_eq!(parsed, raw);
    }

    #[test]
    fn integers_are_minimal() {
        assert_eq!(int(0), "0");
        assert_eq!(int(42), "42");
        assert_eq!(int(-7), "-7");
        assert_eq!(int(i64::MAX), i64::MAX.to_string());
        assert_eq!(int(i64::MIN), i64::MIN.to_string());
    }

    #[test]
    fn floats_match_serde_json() {
        for v in [0.5, 1.0, -2.25, 1e-7, 123_456.789, 1e21] {
            let mut out = Vec::new();
            write_f64(&mut out, v).unwrap();
            assert_eq!(out, serde_json::to_vec(&v).unwrap());
        }
    }

    #[test]
    fn non_finite_float_is_rejected() {
        let mut out = Vec::new();
        assert!(matches!(write_f64(&mut out, f64::NAN), Err(EncodeError::UnsupportedValue(_))));
        assert!(write_f64(&mut out, f64::INFINITY).is_err());
    }

    #[test]
    fn object_writer_separates_members() {
        let mut out = Vec::new();
        let mut obj = ObjectWriter::begin(&mut out);
        obj.str("a", "x");
        obj.str("skipped", "");
        obj.int("b", 2);
        obj.str_list("c", &["y".to_string()]);
        obj.end();
        assert_eq!(String::from_utf8(out).unwrap(), r#"{"a":"x","b":2,"c":["y"]}"#);
    }

    #[test]
    fn empty_object() {
        let mut out = Vec::new();
        ObjectWriter::begin(&mut out).end();
        assert_eq!(out, b"{}");
    }
}
