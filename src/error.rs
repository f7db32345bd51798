//! Error taxonomy.
//!
//! Configuration problems are fatal and surface before any parsing starts.
//! Extraction and conversion problems are recovered per concept and per line
//! by the parser and reported as [`crate::ConceptError`] records.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single rule broken by a concept set, listing every offender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Dependency-based concepts that declare no `after_concept`.
    MissingDependency(Vec<String>),
    /// `after_concept` keys that name no concept in the set.
    UnknownDependency(Vec<String>),
    /// Concepts whose `after_concept` equals their own description.
    SelfReferential(Vec<String>),
    /// Descriptions declared more than once.
    DuplicateDescription(Vec<String>),
}

impl Violation {
    /// Descriptions (or keys) reported by this violation.
    pub fn offenders(&self) -> &[String] {
        match self {
            Violation::MissingDependency(names)
            | Violation::UnknownDependency(names)
            | Violation::SelfReferential(names)
            | Violation::DuplicateDescription(names) => names,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingDependency(names) => {
                write!(f, "[after_concept] is required for: {}", names.join(", "))
            }
            Violation::UnknownDependency(names) => {
                write!(f, "[after_concept] references unknown concepts: {}", names.join(", "))
            }
            Violation::SelfReferential(names) => write!(
                f,
                "[description] and [after_concept] hold the same value for: {}",
                names.join(", ")
            ),
            Violation::DuplicateDescription(names) => {
                write!(f, "[description] is declared more than once: {}", names.join(", "))
            }
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Invalid concept definitions or conversion settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("invalid concept set: {}", join_violations(.0))]
    Invalid(Vec<Violation>),

    #[error("concept '{concept}' is misconfigured: {reason}")]
    InvalidDefinition { concept: String, reason: String },

    #[error("extraction strategy '{0}' is not supported")]
    UnsupportedStrategy(String),

    #[error("dependency cycle detected: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("invalid conversion setting: {0}")]
    InvalidSetting(String),
}

impl ConfigurationError {
    pub(crate) fn definition(concept: &str, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidDefinition {
            concept: concept.to_string(),
            reason: reason.into(),
        }
    }

    /// Violations carried by an [`ConfigurationError::Invalid`] error.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ConfigurationError::Invalid(violations) => violations,
            _ => &[],
        }
    }
}

/// Malformed extraction bounds, detected while reading a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("[{length}] is larger than the characters available [{available}] from index {index}")]
    LengthOutOfBounds {
        index: usize,
        length: usize,
        available: usize,
    },

    #[error("index [{index}] lies past the end of a line of {len} characters")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// A raw value that could not become the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("value [{value}] cannot be converted to {target}")]
    Mismatch { value: String, target: String },

    #[error("value [{value}] cannot be converted to {target}: {reason}")]
    Unparsable {
        value: String,
        target: String,
        reason: String,
    },

    #[error("an empty value is not allowed for {target}")]
    EmptyNotAllowed { value: String, target: String },

    #[error("no factory is registered for {target}, cannot build it from [{value}]")]
    MissingFactory { value: String, target: String },
}

impl ConversionError {
    /// The offending raw value.
    pub fn value(&self) -> &str {
        match self {
            ConversionError::Mismatch { value, .. }
            | ConversionError::Unparsable { value, .. }
            | ConversionError::EmptyNotAllowed { value, .. }
            | ConversionError::MissingFactory { value, .. } => value,
        }
    }

    /// Name of the destination type.
    pub fn target(&self) -> &str {
        match self {
            ConversionError::Mismatch { target, .. }
            | ConversionError::Unparsable { target, .. }
            | ConversionError::EmptyNotAllowed { target, .. }
            | ConversionError::MissingFactory { target, .. } => target,
        }
    }
}

/// Failure while evaluating one concept on one line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Failure to read a document from disk.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("document {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read document {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to load rule or conversion files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported file format for {} (expected .yaml, .yml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_lists_every_violation() {
        let err = ConfigurationError::Invalid(vec![
            Violation::MissingDependency(vec!["A".to_string(), "B".to_string()]),
            Violation::SelfReferential(vec!["C".to_string()]),
        ]);

        let msg = err.to_string();
        assert!(msg.contains("A, B"));
        assert!(msg.contains("same value for: C"));
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_conversion_error_accessors() {
        let err = ConversionError::Mismatch {
            value: "abc".to_string(),
            target: "i32".to_string(),
        };

        assert_eq!(err.value(), "abc");
        assert_eq!(err.target(), "i32");
        assert_eq!(err.to_string(), "value [abc] cannot be converted to i32");
    }

    #[test]
    fn test_cycle_message() {
        let err = ConfigurationError::DependencyCycle(vec!["A".into(), "B".into(), "A".into()]);
        assert_eq!(err.to_string(), "dependency cycle detected: A -> B -> A");
    }
}
