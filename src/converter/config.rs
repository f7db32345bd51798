//! Conversion policy: empty values, numbers and dates.

use crate::converter::value::{TargetType, TypedValue};
use crate::error::ConfigurationError;
use std::collections::HashMap;

/// Pattern used by [`DateRule::iso`] for dates.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Pattern used by [`DateRule::iso`] for date-times.
pub const ISO_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// What an empty (or absent) raw value becomes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EmptyRule {
    #[default]
    Null,
    Fail,
    Default(TypedValue),
}

/// Numeric clean-up applied before parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberRule {
    group_separator: char,
    trailing_minus: bool,
    round: Option<u32>,
}

impl Default for NumberRule {
    fn default() -> Self {
        Self {
            group_separator: ',',
            trailing_minus: false,
            round: None,
        }
    }
}

impl NumberRule {
    pub fn group_separator(&self) -> char {
        self.group_separator
    }

    /// Whether `"12.50-"` reads as `-12.50`.
    pub fn trailing_minus(&self) -> bool {
        self.trailing_minus
    }

    /// Decimal places kept on decimal results, if any.
    pub fn round(&self) -> Option<u32> {
        self.round
    }
}

/// Patterns (chrono `strftime` syntax) used to read dates.
///
/// An unset pattern falls back to ISO-8601 parsing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DateRule {
    date_format: Option<String>,
    date_time_format: Option<String>,
}

impl DateRule {
    pub fn iso() -> Self {
        Self {
            date_format: Some(ISO_DATE_FORMAT.to_string()),
            date_time_format: Some(ISO_DATE_TIME_FORMAT.to_string()),
        }
    }

    pub fn date_format(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    pub fn date_time_format(&self) -> Option<&str> {
        self.date_time_format.as_deref()
    }
}

/// Complete conversion policy handed to every conversion.
///
/// `ConversionConfig::default()` leaves every axis unset: empty values become
/// null, `,` is the group separator, no rounding, ISO dates.
/// [`ConversionConfig::standard`] is the usual configuration for statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversionConfig {
    empty_rules: HashMap<TargetType, EmptyRule>,
    number: NumberRule,
    date: DateRule,
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }

    /// Group separator `,`, two decimal places, explicit ISO patterns.
    pub fn standard() -> Self {
        Self {
            empty_rules: HashMap::new(),
            number: NumberRule {
                round: Some(2),
                ..NumberRule::default()
            },
            date: DateRule::iso(),
        }
    }

    /// Empty-value rule for `target`, `None` when unconfigured.
    pub fn empty_rule(&self, target: &TargetType) -> Option<&EmptyRule> {
        self.empty_rules.get(target)
    }

    pub fn empty_rules(&self) -> &HashMap<TargetType, EmptyRule> {
        &self.empty_rules
    }

    pub fn number_rule(&self) -> &NumberRule {
        &self.number
    }

    pub fn date_rule(&self) -> &DateRule {
        &self.date
    }
}

/// Single builder for [`ConversionConfig`].
///
/// Axes left untouched keep their defaults. Argument errors are remembered and
/// reported by [`ConversionConfigBuilder::build`].
///
/// ```ignore
/// let config = ConversionConfig::builder()
///     .group_separator('.')
///     .trailing_minus(true)
///     .round(4)
///     .date_format("%d/%m/%Y")
///     .when_empty(TargetType::I32, EmptyRule::Default(TypedValue::Int(0)))
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
    errors: Vec<String>,
}

impl ConversionConfigBuilder {
    pub fn when_empty(mut self, target: TargetType, rule: EmptyRule) -> Self {
        self.config.empty_rules.insert(target, rule);
        self
    }

    pub fn group_separator(mut self, separator: char) -> Self {
        self.config.number.group_separator = separator;
        self
    }

    pub fn trailing_minus(mut self, enabled: bool) -> Self {
        self.config.number.trailing_minus = enabled;
        self
    }

    /// Keep `places` decimal places; negative counts are rejected.
    pub fn round(mut self, places: i64) -> Self {
        match u32::try_from(places) {
            Ok(places) => self.config.number.round = Some(places),
            Err(_) if places < 0 => self
                .errors
                .push(format!("[round] must be zero or greater, got {}", places)),
            Err(_) => self.errors.push(format!(
                "[round] must be at most {}, got {}",
                u32::MAX,
                places
            )),
        }
        self
    }

    pub fn round_to_2(self) -> Self {
        self.round(2)
    }

    pub fn round_to_4(self) -> Self {
        self.round(4)
    }

    pub fn date_format(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if pattern.is_empty() {
            self.errors.push("[date_format] cannot be empty".to_string());
        } else {
            self.config.date.date_format = Some(pattern);
        }
        self
    }

    pub fn date_time_format(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if pattern.is_empty() {
            self.errors
                .push("[date_time_format] cannot be empty".to_string());
        } else {
            self.config.date.date_time_format = Some(pattern);
        }
        self
    }

    pub fn iso_dates(mut self) -> Self {
        self.config.date = DateRule::iso();
        self
    }

    pub fn build(self) -> Result<ConversionConfig, ConfigurationError> {
        if self.errors.is_empty() {
            Ok(self.config)
        } else {
            Err(ConfigurationError::InvalidSetting(self.errors.join("; ")))
        }
    }
}
