//! Core identifier and wire-type vocabulary.

use serde::{Deserialize, Serialize};

/// Numeric identifier of a cluster (a named group of related attributes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub u16);

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

impl From<u16> for ClusterId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Numeric identifier of a single attribute within a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeId(pub u16);

impl std::fmt::Display for AttributeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

impl From<u16> for AttributeId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// On-wire representation of an attribute value.
///
/// The subset of ZCL data types the gateway decodes. Raw payloads are
/// carried as `i64` after the transport layer has stripped the type tag,
/// so every variant knows its own integer bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireType {
    Bool,
    U8,
    U16,
    U24,
    U32,
    I8,
    I16,
    I32,
    Enum8,
}

impl WireType {
    /// Inclusive integer bounds of this wire type.
    pub fn bounds(&self) -> (i64, i64) {
        match self {
            Self::Bool => (0, 1),
            Self::U8 | Self::Enum8 => (0, u8::MAX as i64),
            Self::U16 => (0, u16::MAX as i64),
            Self::U24 => (0, (1 << 24) - 1),
            Self::U32 => (0, u32::MAX as i64),
            Self::I8 => (i8::MIN as i64, i8::MAX as i64),
            Self::I16 => (i16::MIN as i64, i16::MAX as i64),
            Self::I32 => (i32::MIN as i64, i32::MAX as i64),
        }
    }

    /// Whether `raw` fits this wire type.
    pub fn contains(&self, raw: i64) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&raw)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U24 => "u24",
            Self::U32 => "u32",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::Enum8 => "enum8",
        }
    }
}

impl std::fmt::Display for WireType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        assert_eq!(ClusterId(0xFD09).to_string(), "0xFD09");
        assert_eq!(AttributeId(0).to_string(), "0x0000");
    }

    #[test]
    fn test_wire_type_bounds() {
        assert!(WireType::U16.contains(65535));
        assert!(!WireType::U16.contains(65536));
        assert!(!WireType::U16.contains(-1));
        assert!(WireType::I16.contains(-32768));
        assert!(!WireType::I16.contains(32768));
        assert!(WireType::Bool.contains(1));
        assert!(!WireType::Bool.contains(2));
    }

    #[test]
    fn test_wire_type_serde_lowercase() {
        let json = serde_json::to_string(&WireType::U16).unwrap();
        assert_eq!(json, "\"u16\"");
        let back: WireType = serde_json::from_str("\"enum8\"").unwrap();
        assert_eq!(back, WireType::Enum8);
    }
}
