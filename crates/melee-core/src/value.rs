//! Participant and entity metadata
//!
//! Metadata is an open key/value bag. The sync layer reads a handful of
//! well-known keys (remote marker, owning joiner, bot flag) and carries the
//! rest opaquely for codecs and effect appliers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered metadata bag; order is kept so encoded snapshots are stable.
pub type ValueMap = IndexMap<String, Value>;

/// One metadata entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Unset,
    Flag(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Nested(ValueMap),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Flag(flag) = self {
            Some(*flag)
        } else {
            None
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        if let Value::Int(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    /// Numeric view; integers widen so codecs may store coordinates either way.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float(x) => Some(x),
            Value::Int(n) => Some(n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Text(text) = self {
            Some(text.as_str())
        } else {
            None
        }
    }

    pub fn as_nested(&self) -> Option<&ValueMap> {
        if let Value::Nested(map) = self {
            Some(map)
        } else {
            None
        }
    }

    pub fn is_unset(&self) -> bool {
        *self == Value::Unset
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unset => f.write_str("-"),
            Value::Flag(flag) => write!(f, "{flag}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(text) => f.write_str(text),
            Value::Nested(map) => {
                let entries: Vec<String> = map.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{{{}}}", entries.join(" "))
            }
        }
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(n: $ty) -> Self {
                Value::Int(i64::from(n))
            }
        })*
    };
}

value_from_int!(i64, i32, u32, u8);

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Flag(flag)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Nested(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_match_variant() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(3u8).as_int(), Some(3));
        assert_eq!(Value::from(3u8).as_bool(), None);
        assert_eq!(Value::from("rare").as_str(), Some("rare"));
        assert!(Value::default().is_unset());
    }

    #[test]
    fn test_int_widens_to_float() {
        assert_eq!(Value::Int(4).as_float(), Some(4.0));
        assert_eq!(Value::from(0.5f32).as_float(), Some(0.5));
        assert_eq!(Value::Float(1.5).as_int(), None);
    }

    #[test]
    fn test_display_nested() {
        let mut inner = ValueMap::new();
        inner.insert("hp".into(), Value::Int(3));
        inner.insert("tag".into(), "glass".into());
        assert_eq!(Value::from(inner).to_string(), "{hp=3 tag=glass}");
    }
}
