//! Miscellaneous common types used throughout the webpaywall codebase.

use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

/// Represents any JSON value. Used for serializing/deserializing arbitrary JSON data.
pub type AnyJson = serde_json::Value;

/// Insertion-ordered JSON object.
///
/// Ordering is preserved through the `preserve_order` feature of `serde_json`.
pub type Record = serde_json::Map<String, AnyJson>;

/// Template variables supplied by the host application, keyed by variable name.
pub type Variables = Record;

/// Version field of an inbound bridge envelope.
///
/// The version is carried for future negotiation. It is never branched on, so any integer is
/// accepted and written back unchanged.
///
/// ```
/// use webpaywall_core::types::EnvelopeVersion;
///
/// let version: EnvelopeVersion = serde_json::from_value(serde_json::json!(7)).unwrap();
/// assert_eq!(version, EnvelopeVersion(7));
/// assert_eq!(serde_json::to_value(version).unwrap(), serde_json::json!(7));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvelopeVersion(pub i64);

impl EnvelopeVersion {
    /// The version this build emits.
    pub const CURRENT: EnvelopeVersion = EnvelopeVersion(1);
}

impl Default for EnvelopeVersion {
    fn default() -> Self {
        EnvelopeVersion::CURRENT
    }
}

impl Serialize for EnvelopeVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for EnvelopeVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = i64::deserialize(deserializer)?;
        Ok(EnvelopeVersion(v))
    }
}

impl Display for EnvelopeVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque color token chosen by the paywall author, e.g. `"#0B0B0F"` or `"systemBackground"`.
///
/// The core never interprets it; the host resolves it when presenting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ColorToken(pub String);

impl Serialize for ColorToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ColorToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ColorToken(s))
    }
}

impl Display for ColorToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ColorToken {
    fn from(value: &str) -> Self {
        ColorToken(value.to_string())
    }
}
