//! Destination types and the typed values produced by conversion.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Destination type of a concept.
///
/// Closed over the kinds the converter knows how to build, plus
/// [`TargetType::Custom`] for types backed by a registered factory.
///
/// Names are matched case-insensitively when parsed; any unrecognized name
/// becomes a custom type and keeps its original spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetType {
    Text,
    Char,
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    F32,
    F64,
    Decimal,
    Date,
    DateTime,
    /// A date-time placed at the system's local time zone.
    Timestamp,
    /// Time of day of a date-time placed at the system's local time zone.
    Time,
    Custom(String),
}

impl TargetType {
    pub fn name(&self) -> &str {
        match self {
            TargetType::Text => "string",
            TargetType::Char => "char",
            TargetType::Bool => "bool",
            TargetType::I8 => "i8",
            TargetType::I16 => "i16",
            TargetType::I32 => "i32",
            TargetType::I64 => "i64",
            TargetType::I128 => "i128",
            TargetType::F32 => "f32",
            TargetType::F64 => "f64",
            TargetType::Decimal => "decimal",
            TargetType::Date => "date",
            TargetType::DateTime => "datetime",
            TargetType::Timestamp => "timestamp",
            TargetType::Time => "time",
            TargetType::Custom(name) => name,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TargetType::I8
                | TargetType::I16
                | TargetType::I32
                | TargetType::I64
                | TargetType::I128
                | TargetType::F32
                | TargetType::F64
                | TargetType::Decimal
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            TargetType::Date | TargetType::DateTime | TargetType::Timestamp | TargetType::Time
        )
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("target type name cannot be empty".to_string());
        }

        let target = match trimmed.to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => TargetType::Text,
            "char" | "character" => TargetType::Char,
            "bool" | "boolean" => TargetType::Bool,
            "i8" | "byte" => TargetType::I8,
            "i16" | "short" => TargetType::I16,
            "i32" | "int" | "integer" => TargetType::I32,
            "i64" | "long" => TargetType::I64,
            "i128" | "bigint" | "biginteger" => TargetType::I128,
            "f32" | "float" => TargetType::F32,
            "f64" | "double" => TargetType::F64,
            "decimal" | "bigdecimal" => TargetType::Decimal,
            "date" => TargetType::Date,
            "datetime" => TargetType::DateTime,
            "timestamp" => TargetType::Timestamp,
            "time" => TargetType::Time,
            _ => TargetType::Custom(trimmed.to_string()),
        };
        Ok(target)
    }
}

impl TryFrom<String> for TargetType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetType> for String {
    fn from(target: TargetType) -> Self {
        target.name().to_string()
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A converted value.
///
/// `Null` is what an empty raw value becomes unless an empty-value rule says
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Null,
    Text(String),
    Char(char),
    Bool(bool),
    Int(i64),
    BigInt(i128),
    Float(f64),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Local>),
    Time(NaiveTime),
    Custom {
        type_name: String,
        value: serde_json::Value,
    },
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Float(f) => Some(*f),
            TypedValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            TypedValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Null => write!(f, "null"),
            TypedValue::Text(s) => write!(f, "{}", s),
            TypedValue::Char(c) => write!(f, "{}", c),
            TypedValue::Bool(b) => write!(f, "{}", b),
            TypedValue::Int(i) => write!(f, "{}", i),
            TypedValue::BigInt(i) => write!(f, "{}", i),
            TypedValue::Float(fl) => write!(f, "{}", fl),
            TypedValue::Decimal(d) => write!(f, "{}", d),
            TypedValue::Date(d) => write!(f, "{}", d),
            TypedValue::DateTime(dt) => write!(f, "{}", dt),
            TypedValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            TypedValue::Time(t) => write!(f, "{}", t),
            TypedValue::Custom { value, .. } => write!(f, "{}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!("String".parse::<TargetType>().unwrap(), TargetType::Text);
        assert_eq!("integer".parse::<TargetType>().unwrap(), TargetType::I32);
        assert_eq!("Double".parse::<TargetType>().unwrap(), TargetType::F64);
        assert_eq!("decimal".parse::<TargetType>().unwrap(), TargetType::Decimal);
        assert_eq!("timestamp".parse::<TargetType>().unwrap(), TargetType::Timestamp);
    }

    #[test]
    fn test_unknown_name_is_custom() {
        let target: TargetType = "AccountNumber".parse().unwrap();
        assert_eq!(target, TargetType::Custom("AccountNumber".to_string()));
        assert_eq!(target.name(), "AccountNumber");
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!("  ".parse::<TargetType>().is_err());
    }

    #[test]
    fn test_target_type_serde_uses_names() {
        let target: TargetType = serde_json::from_str("\"long\"").unwrap();
        assert_eq!(target, TargetType::I64);
        assert_eq!(serde_json::to_string(&TargetType::I64).unwrap(), "\"i64\"");
    }

    #[test]
    fn test_typed_value_serializes_untagged() {
        assert_eq!(serde_json::to_string(&TypedValue::Int(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&TypedValue::Null).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&TypedValue::Text("abc".to_string())).unwrap(),
            "\"abc\""
        );
    }
}
