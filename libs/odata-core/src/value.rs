//! Typed primitive values for key and filter literals
//!
//! The value-box pattern: a literal parsed from raw URL text, tagged with
//! its `Edm` primitive type. Parsing lives in the tokenizer; this module is
//! the data model.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Semantic type of a primitive literal, named after the `Edm` types it
/// represents on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Byte,
    Int32,
    Int64,
    Bool,
    String,
    Uuid,
    DateTime,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::Byte => write!(f, "Edm.Byte"),
            PrimitiveKind::Int32 => write!(f, "Edm.Int32"),
            PrimitiveKind::Int64 => write!(f, "Edm.Int64"),
            PrimitiveKind::Bool => write!(f, "Edm.Boolean"),
            PrimitiveKind::String => write!(f, "Edm.String"),
            PrimitiveKind::Uuid => write!(f, "Edm.Guid"),
            PrimitiveKind::DateTime => write!(f, "Edm.DateTimeOffset"),
        }
    }
}

/// One typed primitive value.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveValue {
    Byte(u8),
    Int32(i32),
    Int64(i64),
    Bool(bool),
    String(String),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
}

impl PrimitiveValue {
    #[must_use]
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveValue::Byte(_) => PrimitiveKind::Byte,
            PrimitiveValue::Int32(_) => PrimitiveKind::Int32,
            PrimitiveValue::Int64(_) => PrimitiveKind::Int64,
            PrimitiveValue::Bool(_) => PrimitiveKind::Bool,
            PrimitiveValue::String(_) => PrimitiveKind::String,
            PrimitiveValue::Uuid(_) => PrimitiveKind::Uuid,
            PrimitiveValue::DateTime(_) => PrimitiveKind::DateTime,
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Byte(v) => write!(f, "{v}"),
            PrimitiveValue::Int32(v) => write!(f, "{v}"),
            PrimitiveValue::Int64(v) => write!(f, "{v}"),
            PrimitiveValue::Bool(v) => write!(f, "{v}"),
            PrimitiveValue::String(v) => write!(f, "'{v}'"),
            PrimitiveValue::Uuid(v) => write!(f, "{v}"),
            PrimitiveValue::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

impl From<u8> for PrimitiveValue {
    fn from(v: u8) -> Self {
        PrimitiveValue::Byte(v)
    }
}

impl From<i32> for PrimitiveValue {
    fn from(v: i32) -> Self {
        PrimitiveValue::Int32(v)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(v: i64) -> Self {
        PrimitiveValue::Int64(v)
    }
}

impl From<bool> for PrimitiveValue {
    fn from(v: bool) -> Self {
        PrimitiveValue::Bool(v)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(v: &str) -> Self {
        PrimitiveValue::String(v.to_owned())
    }
}

impl From<String> for PrimitiveValue {
    fn from(v: String) -> Self {
        PrimitiveValue::String(v)
    }
}

impl From<Uuid> for PrimitiveValue {
    fn from(v: Uuid) -> Self {
        PrimitiveValue::Uuid(v)
    }
}

impl From<DateTime<Utc>> for PrimitiveValue {
    fn from(v: DateTime<Utc>) -> Self {
        PrimitiveValue::DateTime(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(PrimitiveValue::from(5i32).kind(), PrimitiveKind::Int32);
        assert_eq!(PrimitiveValue::from("x").kind(), PrimitiveKind::String);
        assert_eq!(PrimitiveValue::from(true).kind(), PrimitiveKind::Bool);
    }

    #[test]
    fn strings_render_quoted() {
        assert_eq!(PrimitiveValue::from("ABC").to_string(), "'ABC'");
        assert_eq!(PrimitiveValue::from(42i64).to_string(), "42");
    }
}
