//! Rule and conversion file loading.
//!
//! Concept files are YAML or JSON, chosen by extension. They hold either a
//! bare list of concept records or a map with a `concepts` list:
//!
//! ```yaml
//! concepts:
//!   - description: account
//!     type: string
//!     strategy: offset
//!     page: 1
//!     line: 2
//!     leading_text: "Account:"
//! ```

use crate::concept::ConceptDefinition;
use crate::converter::{ConversionConfig, EmptyRule, TargetType, TypedValue, ValueConverter};
use crate::error::{ConfigurationError, LoadError};
use crate::resolver::ResolvedConcepts;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase) {
            Some(ext) if ext == "yaml" || ext == "yml" => Ok(FileFormat::Yaml),
            Some(ext) if ext == "json" => Ok(FileFormat::Json),
            _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    fn parse<T: for<'de> Deserialize<'de>>(&self, contents: &str) -> Result<T, LoadError> {
        match self {
            FileFormat::Yaml => Ok(serde_yaml::from_str(contents)?),
            FileFormat::Json => Ok(serde_json::from_str(contents)?),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConceptDocument {
    concepts: Vec<ConceptDefinition>,
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse concept records from text in the given format, without validating them.
pub fn parse_concept_definitions(
    contents: &str,
    format: FileFormat,
) -> Result<Vec<ConceptDefinition>, LoadError> {
    // Pick the shape first so record errors keep their own message and location.
    let wrapped = match format {
        FileFormat::Yaml => serde_yaml::from_str::<serde_yaml::Value>(contents)?.is_mapping(),
        FileFormat::Json => serde_json::from_str::<serde_json::Value>(contents)?.is_object(),
    };

    if wrapped {
        let document: ConceptDocument = format.parse(contents)?;
        Ok(document.concepts)
    } else {
        format.parse(contents)
    }
}

/// Read concept records from a file, without validating them.
pub fn read_concept_definitions<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<ConceptDefinition>, LoadError> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    parse_concept_definitions(&read(path)?, format)
}

/// Read, validate, order and bind the concepts of a file.
///
/// # Example
/// ```ignore
/// use gleaner::loader::load_concepts;
///
/// let concepts = load_concepts("rules/statement.yaml")?;
/// println!("Execution order: {:?}", concepts.descriptions());
/// ```
pub fn load_concepts<P: AsRef<Path>>(path: P) -> Result<ResolvedConcepts, LoadError> {
    let path = path.as_ref();
    let definitions = read_concept_definitions(path)?;
    let concepts = ResolvedConcepts::resolve(definitions)?;

    tracing::info!(
        path = %path.display(),
        concepts = concepts.len(),
        "Loaded concept definitions"
    );

    Ok(concepts)
}

/// What to do with an empty value, as written in a conversion file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyAction {
    #[default]
    Null,
    Fail,
    Default,
}

/// Empty-value rule for one destination type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyRuleSetting {
    #[serde(rename = "type")]
    pub target: TargetType,

    #[serde(default)]
    pub rule: EmptyAction,

    /// Raw default, converted to `target` when the file is loaded.
    #[serde(default)]
    pub value: Option<String>,
}

/// Conversion policy as written in a conversion file.
///
/// ```yaml
/// group_separator: "."
/// trailing_minus: true
/// round: 2
/// date_format: "%d/%m/%Y"
/// empty:
///   - type: decimal
///     rule: default
///     value: "0"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSettings {
    #[serde(default)]
    pub group_separator: Option<char>,

    #[serde(default)]
    pub trailing_minus: bool,

    #[serde(default)]
    pub round: Option<i64>,

    #[serde(default)]
    pub date_format: Option<String>,

    #[serde(default)]
    pub date_time_format: Option<String>,

    #[serde(default)]
    pub empty: Vec<EmptyRuleSetting>,
}

impl ConversionSettings {
    /// Build the conversion policy these settings describe.
    ///
    /// Default values for empty rules are converted with `converter` under the
    /// number and date settings of the same file.
    pub fn into_config(self, converter: &ValueConverter) -> Result<ConversionConfig, ConfigurationError> {
        let mut builder = ConversionConfig::builder().trailing_minus(self.trailing_minus);
        if let Some(separator) = self.group_separator {
            builder = builder.group_separator(separator);
        }
        if let Some(round) = self.round {
            builder = builder.round(round);
        }
        if let Some(pattern) = self.date_format {
            builder = builder.date_format(pattern);
        }
        if let Some(pattern) = self.date_time_format {
            builder = builder.date_time_format(pattern);
        }

        let base = builder.clone().build()?;
        for setting in self.empty {
            let rule = match setting.rule {
                EmptyAction::Null => EmptyRule::Null,
                EmptyAction::Fail => EmptyRule::Fail,
                EmptyAction::Default => EmptyRule::Default(default_value(&setting, converter, &base)?),
            };
            builder = builder.when_empty(setting.target, rule);
        }

        builder.build()
    }
}

fn default_value(
    setting: &EmptyRuleSetting,
    converter: &ValueConverter,
    config: &ConversionConfig,
) -> Result<TypedValue, ConfigurationError> {
    let raw = setting.value.as_deref().ok_or_else(|| {
        ConfigurationError::InvalidSetting(format!(
            "empty rule for {} needs a [value]",
            setting.target
        ))
    })?;

    converter
        .convert(Some(raw), &setting.target, config)
        .map_err(|e| ConfigurationError::InvalidSetting(format!("invalid default: {}", e)))
}

/// Read conversion settings from a YAML or JSON file.
pub fn load_conversion_config<P: AsRef<Path>>(
    path: P,
    converter: &ValueConverter,
) -> Result<ConversionConfig, LoadError> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    let settings: ConversionSettings = format.parse(&read(path)?)?;
    let config = settings.into_config(converter)?;

    tracing::info!(path = %path.display(), "Loaded conversion settings");

    Ok(config)
}
