//! Concept definitions and whole-set validation.
//!
//! A concept is one field to pull out of a document: where it lives
//! (anchor), how to cut it out of a line (strategy) and what it becomes
//! (target type).

use crate::converter::TargetType;
use crate::error::{ConfigurationError, Violation};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Position of a concept inside a resolved concept set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConceptId(pub(crate) usize);

impl ConceptId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// How a concept cuts its raw value out of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StrategyKind {
    WholeLine,
    Offset,
    Fixed,
    Between,
    Pattern,
    /// Text between another concept's value and a second pattern.
    ConceptAndPattern,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::WholeLine => "whole_line",
            StrategyKind::Offset => "offset",
            StrategyKind::Fixed => "fixed",
            StrategyKind::Between => "between",
            StrategyKind::Pattern => "pattern",
            StrategyKind::ConceptAndPattern => "concept_and_pattern",
        }
    }

    /// Whether results are trimmed when the concept does not say.
    pub fn trims_by_default(&self) -> bool {
        !matches!(self, StrategyKind::WholeLine | StrategyKind::Fixed)
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "whole_line" | "self" | "line" => Ok(StrategyKind::WholeLine),
            "offset" => Ok(StrategyKind::Offset),
            "fixed" => Ok(StrategyKind::Fixed),
            "between" => Ok(StrategyKind::Between),
            "pattern" | "regex" => Ok(StrategyKind::Pattern),
            "concept_and_pattern" | "between_concept_and_pattern" => {
                Ok(StrategyKind::ConceptAndPattern)
            }
            _ => Err(ConfigurationError::UnsupportedStrategy(s.to_string())),
        }
    }
}

impl TryFrom<String> for StrategyKind {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StrategyKind> for String {
    fn from(kind: StrategyKind) -> Self {
        kind.name().to_string()
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Page and line (both 1-based) where a concept is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub page: u32,
    pub line: u32,
}

impl Anchor {
    pub fn new(page: u32, line: u32) -> Self {
        Self { page, line }
    }

    /// True at this position or anywhere after it.
    pub fn is_reached_by(&self, page: u32, line: u32) -> bool {
        page > self.page || (page == self.page && line >= self.line)
    }
}

/// One field extraction rule.
///
/// Deserializes from records like:
///
/// ```yaml
/// - description: total
///   type: decimal
///   strategy: offset
///   page: 1
///   line: 12
///   leading_text: "Total:"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptDefinition {
    pub description: String,

    #[serde(rename = "type")]
    pub target: TargetType,

    pub strategy: StrategyKind,

    #[serde(default)]
    pub page: Option<u32>,

    #[serde(default)]
    pub line: Option<u32>,

    #[serde(default)]
    pub leading_text: Option<String>,

    #[serde(default)]
    pub trailing_text: Option<String>,

    /// Start of a fixed window, in characters.
    #[serde(default)]
    pub index: Option<usize>,

    /// Width of a fixed window; to end of line when unset.
    #[serde(default)]
    pub length: Option<usize>,

    #[serde(default)]
    pub stop_at_keyword: Option<String>,

    /// Matched on every line from the anchor onwards instead of only at it.
    #[serde(default)]
    pub detail: bool,

    #[serde(default)]
    pub regex: Option<String>,

    /// Patterns removed, in order, from a pattern match.
    #[serde(default)]
    pub cleanup: Vec<String>,

    #[serde(default)]
    pub after_concept: Option<String>,

    #[serde(default)]
    pub before_regex: Option<String>,

    #[serde(default)]
    pub trim: Option<bool>,
}

impl ConceptDefinition {
    pub fn new(description: impl Into<String>, target: TargetType, strategy: StrategyKind) -> Self {
        Self {
            description: description.into(),
            target,
            strategy,
            page: None,
            line: None,
            leading_text: None,
            trailing_text: None,
            index: None,
            length: None,
            stop_at_keyword: None,
            detail: false,
            regex: None,
            cleanup: Vec::new(),
            after_concept: None,
            before_regex: None,
            trim: None,
        }
    }

    pub fn with_anchor(mut self, page: u32, line: u32) -> Self {
        self.page = Some(page);
        self.line = Some(line);
        self
    }

    pub fn with_leading_text(mut self, text: impl Into<String>) -> Self {
        self.leading_text = Some(text.into());
        self
    }

    pub fn with_trailing_text(mut self, text: impl Into<String>) -> Self {
        self.trailing_text = Some(text.into());
        self
    }

    pub fn with_window(mut self, index: usize, length: Option<usize>) -> Self {
        self.index = Some(index);
        self.length = length;
        self
    }

    pub fn with_stop_at_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.stop_at_keyword = Some(keyword.into());
        self
    }

    pub fn as_detail(mut self) -> Self {
        self.detail = true;
        self
    }

    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    pub fn with_cleanup<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cleanup = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_after_concept(mut self, description: impl Into<String>) -> Self {
        self.after_concept = Some(description.into());
        self
    }

    pub fn with_before_regex(mut self, regex: impl Into<String>) -> Self {
        self.before_regex = Some(regex.into());
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = Some(trim);
        self
    }

    /// The anchor, present only when both page and line are set.
    pub fn anchor(&self) -> Option<Anchor> {
        match (self.page, self.line) {
            (Some(page), Some(line)) => Some(Anchor::new(page, line)),
            _ => None,
        }
    }

    /// Prerequisite concept, only meaningful for the dependency-based strategy.
    pub fn dependency(&self) -> Option<&str> {
        match self.strategy {
            StrategyKind::ConceptAndPattern => self.after_concept.as_deref(),
            _ => None,
        }
    }

    pub fn effective_trim(&self) -> bool {
        self.trim.unwrap_or_else(|| self.strategy.trims_by_default())
    }

    /// Whether `content` carries this concept's stop keyword.
    pub fn triggers_stop(&self, content: &str) -> bool {
        self.stop_at_keyword
            .as_deref()
            .is_some_and(|keyword| content.contains(keyword))
    }

    /// Anchor rule: exact position, or anywhere from the anchor on for details.
    pub fn is_anchored_at(&self, page: u32, line: u32) -> bool {
        match self.anchor() {
            Some(anchor) if self.detail => anchor.is_reached_by(page, line),
            Some(anchor) => anchor.page == page && anchor.line == line,
            None => false,
        }
    }
}

/// Check a whole concept set, collecting every violation.
///
/// Checks, in order: dependency-based concepts without `after_concept`,
/// `after_concept` keys naming no concept, self-references, and duplicate
/// descriptions.
pub fn validate_concepts(concepts: &[ConceptDefinition]) -> Result<(), ConfigurationError> {
    let mut violations = Vec::new();

    let missing: Vec<String> = concepts
        .iter()
        .filter(|c| c.strategy == StrategyKind::ConceptAndPattern && c.after_concept.is_none())
        .map(|c| c.description.clone())
        .collect();
    if !missing.is_empty() {
        violations.push(Violation::MissingDependency(missing));
    }

    let descriptions: HashSet<&str> = concepts.iter().map(|c| c.description.as_str()).collect();
    let mut unknown: Vec<String> = Vec::new();
    for key in concepts.iter().filter_map(|c| c.after_concept.as_deref()) {
        if !descriptions.contains(key) && !unknown.iter().any(|k| k == key) {
            unknown.push(key.to_string());
        }
    }
    if !unknown.is_empty() {
        violations.push(Violation::UnknownDependency(unknown));
    }

    let self_referential: Vec<String> = concepts
        .iter()
        .filter(|c| c.after_concept.as_deref() == Some(c.description.as_str()))
        .map(|c| c.description.clone())
        .collect();
    if !self_referential.is_empty() {
        violations.push(Violation::SelfReferential(self_referential));
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut duplicates: Vec<String> = Vec::new();
    for concept in concepts {
        let count = seen.entry(concept.description.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(concept.description.clone());
        }
    }
    if !duplicates.is_empty() {
        violations.push(Violation::DuplicateDescription(duplicates));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigurationError::Invalid(violations))
    }
}
