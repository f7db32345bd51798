//! String-to-typed-value conversion.
//!
//! [`ValueConverter::convert`] turns a raw extracted string into a
//! [`TypedValue`] of the requested [`TargetType`], following the empty-value,
//! numeric and date rules of a [`ConversionConfig`].

pub mod config;
pub mod registry;
pub mod value;

pub use config::{
    ConversionConfig, ConversionConfigBuilder, DateRule, EmptyRule, NumberRule,
    ISO_DATE_FORMAT, ISO_DATE_TIME_FORMAT,
};
pub use registry::{ConverterRegistry, ValueFactory};
pub use value::{TargetType, TypedValue};

use crate::error::ConversionError;
use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;
use std::fmt::Display;
use std::str::FromStr;

const TRUTHY: [&str; 9] = ["t", "true", "v", "verdadero", "y", "yes", "s", "si", "1"];
const FALSY: [&str; 6] = ["f", "false", "falso", "n", "no", "0"];

/// Converts raw strings into typed values.
///
/// Holds the factories for custom types; everything else comes from the
/// [`ConversionConfig`] passed to each call, so one converter serves any
/// number of configurations.
#[derive(Debug, Default)]
pub struct ValueConverter {
    registry: ConverterRegistry,
}

impl ValueConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: ConverterRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.registry
    }

    /// Convert `raw` to `target`.
    ///
    /// `None` and `""` are handled by the empty-value rule for `target`
    /// before any parsing happens.
    pub fn convert(
        &self,
        raw: Option<&str>,
        target: &TargetType,
        config: &ConversionConfig,
    ) -> Result<TypedValue, ConversionError> {
        let value = match raw {
            Some(value) if !value.is_empty() => value,
            _ => return handle_empty(raw.unwrap_or_default(), target, config),
        };

        match target {
            TargetType::Text => Ok(TypedValue::Text(value.to_string())),
            TargetType::Char => convert_char(value),
            TargetType::Bool => convert_bool(value),
            t if t.is_numeric() => convert_numeric(value, target, config),
            t if t.is_temporal() => convert_temporal(value, target, config),
            TargetType::Custom(name) => self.registry.build(name, value),
            _ => Err(mismatch(value, target)),
        }
    }
}

fn handle_empty(
    value: &str,
    target: &TargetType,
    config: &ConversionConfig,
) -> Result<TypedValue, ConversionError> {
    match config.empty_rule(target) {
        None | Some(EmptyRule::Null) => Ok(TypedValue::Null),
        Some(EmptyRule::Fail) => Err(ConversionError::EmptyNotAllowed {
            value: value.to_string(),
            target: target.name().to_string(),
        }),
        Some(EmptyRule::Default(default)) => Ok(default.clone()),
    }
}

fn convert_char(value: &str) -> Result<TypedValue, ConversionError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(TypedValue::Char(c)),
        _ => Err(mismatch(value, &TargetType::Char)),
    }
}

fn convert_bool(value: &str) -> Result<TypedValue, ConversionError> {
    if TRUTHY.iter().any(|token| token.eq_ignore_ascii_case(value)) {
        Ok(TypedValue::Bool(true))
    } else if FALSY.iter().any(|token| token.eq_ignore_ascii_case(value)) {
        Ok(TypedValue::Bool(false))
    } else {
        Err(mismatch(value, &TargetType::Bool))
    }
}

fn convert_numeric(
    value: &str,
    target: &TargetType,
    config: &ConversionConfig,
) -> Result<TypedValue, ConversionError> {
    let rule = config.number_rule();
    let clean = strip_group_separator(value, rule.group_separator());
    let clean = move_trailing_minus(&clean, rule.trailing_minus());

    // Errors report the value as extracted, not the cleaned-up one.
    let parsed = match target {
        TargetType::I8 => parse::<i8>(&clean).map(|v| TypedValue::Int(v.into())),
        TargetType::I16 => parse::<i16>(&clean).map(|v| TypedValue::Int(v.into())),
        TargetType::I32 => parse::<i32>(&clean).map(|v| TypedValue::Int(v.into())),
        TargetType::I64 => parse::<i64>(&clean).map(TypedValue::Int),
        TargetType::I128 => parse::<i128>(&clean).map(TypedValue::BigInt),
        TargetType::F32 => parse::<f32>(&clean).map(|v| TypedValue::Float(f64::from(v))),
        TargetType::F64 => parse::<f64>(&clean).map(TypedValue::Float),
        TargetType::Decimal => parse::<Decimal>(&clean).map(|d| match rule.round() {
            Some(places) => TypedValue::Decimal(d.round_dp(places)),
            None => TypedValue::Decimal(d),
        }),
        _ => return Err(mismatch(value, target)),
    };

    parsed.map_err(|reason| unparsable(value, target, reason))
}

fn convert_temporal(
    value: &str,
    target: &TargetType,
    config: &ConversionConfig,
) -> Result<TypedValue, ConversionError> {
    let rule = config.date_rule();
    match target {
        TargetType::Date => {
            let date = match rule.date_format() {
                Some(pattern) => NaiveDate::parse_from_str(value, pattern),
                None => value.parse::<NaiveDate>(),
            };
            date.map(TypedValue::Date)
                .map_err(|e| unparsable(value, target, e.to_string()))
        }
        TargetType::DateTime => parse_date_time(value, target, config).map(TypedValue::DateTime),
        TargetType::Timestamp | TargetType::Time => {
            let naive = parse_date_time(value, target, config)?;
            let local = Local.from_local_datetime(&naive).earliest().ok_or_else(|| {
                unparsable(value, target, "instant does not exist in the local time zone".to_string())
            })?;
            if *target == TargetType::Time {
                Ok(TypedValue::Time(local.time()))
            } else {
                Ok(TypedValue::Timestamp(local))
            }
        }
        _ => Err(mismatch(value, target)),
    }
}

fn parse_date_time(
    value: &str,
    target: &TargetType,
    config: &ConversionConfig,
) -> Result<NaiveDateTime, ConversionError> {
    let parsed = match config.date_rule().date_time_format() {
        Some(pattern) => NaiveDateTime::parse_from_str(value, pattern),
        None => value.parse::<NaiveDateTime>(),
    };
    parsed.map_err(|e| unparsable(value, target, e.to_string()))
}

fn strip_group_separator(value: &str, separator: char) -> String {
    if value.contains(separator) {
        value.chars().filter(|c| *c != separator).collect()
    } else {
        value.to_string()
    }
}

fn move_trailing_minus(value: &str, enabled: bool) -> String {
    match value.strip_suffix('-') {
        Some(body) if enabled => format!("-{}", body),
        _ => value.to_string(),
    }
}

fn parse<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse::<T>().map_err(|e| e.to_string())
}

fn mismatch(value: &str, target: &TargetType) -> ConversionError {
    ConversionError::Mismatch {
        value: value.to_string(),
        target: target.name().to_string(),
    }
}

fn unparsable(value: &str, target: &TargetType, reason: String) -> ConversionError {
    ConversionError::Unparsable {
        value: value.to_string(),
        target: target.name().to_string(),
        reason,
    }
}
