//! Text extraction strategies.
//!
//! Every strategy reads one line and returns the raw text of a concept. A
//! line without a match yields an empty string; errors are reserved for
//! bounds that the line cannot satisfy.

use crate::concept::{ConceptDefinition, ConceptId, StrategyKind};
use crate::error::{ConfigurationError, ExtractionError};
use regex::Regex;

/// Reads a raw value out of a single line.
pub trait TextExtractor {
    fn raw_value(&self, content: &str) -> Result<String, ExtractionError>;
}

/// Finds the bound strategy of another concept.
///
/// The dependency-based strategy resolves its prerequisite through this.
pub trait StrategyLookup {
    fn strategy(&self, id: ConceptId) -> Option<&ExtractionStrategy>;
}

impl StrategyLookup for [ExtractionStrategy] {
    fn strategy(&self, id: ConceptId) -> Option<&ExtractionStrategy> {
        self.get(id.index())
    }
}

impl StrategyLookup for Vec<ExtractionStrategy> {
    fn strategy(&self, id: ConceptId) -> Option<&ExtractionStrategy> {
        self.get(id.index())
    }
}

fn finish(value: &str, trim: bool) -> String {
    if trim {
        value.trim().to_string()
    } else {
        value.to_string()
    }
}

/// The entire line.
#[derive(Debug, Clone)]
pub struct WholeLineExtractor {
    trim: bool,
}

impl WholeLineExtractor {
    pub fn new(trim: bool) -> Self {
        Self { trim }
    }
}

impl TextExtractor for WholeLineExtractor {
    fn raw_value(&self, content: &str) -> Result<String, ExtractionError> {
        Ok(finish(content, self.trim))
    }
}

/// Everything after the first occurrence of a marker.
#[derive(Debug, Clone)]
pub struct OffsetExtractor {
    offset: String,
    trim: bool,
}

impl OffsetExtractor {
    pub fn new(offset: impl Into<String>, trim: bool) -> Self {
        Self {
            offset: offset.into(),
            trim,
        }
    }
}

impl TextExtractor for OffsetExtractor {
    fn raw_value(&self, content: &str) -> Result<String, ExtractionError> {
        match content.find(&self.offset) {
            Some(index) => Ok(finish(&content[index + self.offset.len()..], self.trim)),
            None => Ok(String::new()),
        }
    }
}

/// A window of characters starting at `index`.
#[derive(Debug, Clone)]
pub struct FixedExtractor {
    index: usize,
    length: Option<usize>,
    trim: bool,
}

impl FixedExtractor {
    pub fn new(index: usize, length: Option<usize>, trim: bool) -> Self {
        Self { index, length, trim }
    }
}

impl TextExtractor for FixedExtractor {
    fn raw_value(&self, content: &str) -> Result<String, ExtractionError> {
        let len = content.chars().count();
        if self.index > len {
            return Err(ExtractionError::IndexOutOfBounds {
                index: self.index,
                len,
            });
        }

        let available = len - self.index;
        let take = match self.length {
            Some(length) if length > available => {
                return Err(ExtractionError::LengthOutOfBounds {
                    index: self.index,
                    length,
                    available,
                })
            }
            Some(length) => length,
            None => available,
        };

        let window: String = content.chars().skip(self.index).take(take).collect();
        Ok(finish(&window, self.trim))
    }
}

/// Text strictly between two markers, or to end of line without the second.
#[derive(Debug, Clone)]
pub struct BetweenExtractor {
    leading: String,
    trailing: String,
    trim: bool,
}

impl BetweenExtractor {
    pub fn new(leading: impl Into<String>, trailing: impl Into<String>, trim: bool) -> Self {
        Self {
            leading: leading.into(),
            trailing: trailing.into(),
            trim,
        }
    }
}

impl TextExtractor for BetweenExtractor {
    fn raw_value(&self, content: &str) -> Result<String, ExtractionError> {
        let Some(found) = content.find(&self.leading) else {
            return Ok(String::new());
        };
        let from = found + self.leading.len();
        let rest = &content[from..];
        let value = match rest.find(&self.trailing) {
            Some(to) => &rest[..to],
            None => rest,
        };
        Ok(finish(value, self.trim))
    }
}

/// First match of a pattern, with cleanup patterns removed from it.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    pattern: Regex,
    cleanup: Vec<Regex>,
    trim: bool,
}

impl PatternExtractor {
    pub fn new(pattern: Regex, cleanup: Vec<Regex>, trim: bool) -> Self {
        Self {
            pattern,
            cleanup,
            trim,
        }
    }
}

impl TextExtractor for PatternExtractor {
    fn raw_value(&self, content: &str) -> Result<String, ExtractionError> {
        let Some(found) = self.pattern.find(content) else {
            return Ok(String::new());
        };
        let matched = finish(found.as_str(), self.trim);
        let cleaned = self.cleanup.iter().fold(matched, |value, pattern| {
            pattern.replace_all(&value, "").into_owned()
        });
        Ok(cleaned)
    }
}

/// Text between a prerequisite concept's value and a second pattern.
#[derive(Debug, Clone)]
pub struct ConceptAndPatternExtractor {
    after: ConceptId,
    before: Regex,
    trim: bool,
}

impl ConceptAndPatternExtractor {
    pub fn new(after: ConceptId, before: Regex, trim: bool) -> Self {
        Self { after, before, trim }
    }

    pub fn prerequisite(&self) -> ConceptId {
        self.after
    }

    /// Cut the value given the prerequisite's raw value on the same line.
    ///
    /// The second pattern is searched from the end of the prerequisite's text.
    pub fn raw_value_after(&self, content: &str, left: &str) -> String {
        if left.is_empty() {
            return String::new();
        }
        let Some(found) = content.find(left) else {
            return String::new();
        };
        let start = found + left.len();
        match self.before.find_at(content, start) {
            Some(end) => finish(&content[start..end.start()], self.trim),
            None => String::new(),
        }
    }
}

/// A strategy bound to one concept.
#[derive(Debug, Clone)]
pub enum ExtractionStrategy {
    WholeLine(WholeLineExtractor),
    Offset(OffsetExtractor),
    Fixed(FixedExtractor),
    Between(BetweenExtractor),
    Pattern(PatternExtractor),
    ConceptAndPattern(ConceptAndPatternExtractor),
}

impl ExtractionStrategy {
    /// Build the strategy a definition asks for.
    ///
    /// `prerequisite` is the id of the concept named by `after_concept`; the
    /// resolver supplies it once that concept has been bound.
    pub fn from_definition(
        concept: &ConceptDefinition,
        prerequisite: Option<ConceptId>,
    ) -> Result<Self, ConfigurationError> {
        let name = concept.description.as_str();
        let trim = concept.effective_trim();

        let strategy = match concept.strategy {
            StrategyKind::WholeLine => ExtractionStrategy::WholeLine(WholeLineExtractor::new(trim)),
            StrategyKind::Offset => {
                let offset = required(name, "leading_text", &concept.leading_text)?;
                ExtractionStrategy::Offset(OffsetExtractor::new(offset, trim))
            }
            StrategyKind::Fixed => {
                let index = concept
                    .index
                    .ok_or_else(|| ConfigurationError::definition(name, "[index] is required"))?;
                ExtractionStrategy::Fixed(FixedExtractor::new(index, concept.length, trim))
            }
            StrategyKind::Between => {
                let leading = required(name, "leading_text", &concept.leading_text)?;
                let trailing = required(name, "trailing_text", &concept.trailing_text)?;
                ExtractionStrategy::Between(BetweenExtractor::new(leading, trailing, trim))
            }
            StrategyKind::Pattern => {
                let regex = required(name, "regex", &concept.regex)?;
                let pattern = compile(name, "regex", regex)?;
                let cleanup = concept
                    .cleanup
                    .iter()
                    .map(|p| compile(name, "cleanup", p))
                    .collect::<Result<Vec<_>, _>>()?;
                ExtractionStrategy::Pattern(PatternExtractor::new(pattern, cleanup, trim))
            }
            StrategyKind::ConceptAndPattern => {
                let after = prerequisite.ok_or_else(|| {
                    ConfigurationError::definition(name, "[after_concept] has not been resolved")
                })?;
                let regex = required(name, "before_regex", &concept.before_regex)?;
                let before = compile(name, "before_regex", regex)?;
                ExtractionStrategy::ConceptAndPattern(ConceptAndPatternExtractor::new(after, before, trim))
            }
        };
        Ok(strategy)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            ExtractionStrategy::WholeLine(_) => StrategyKind::WholeLine,
            ExtractionStrategy::Offset(_) => StrategyKind::Offset,
            ExtractionStrategy::Fixed(_) => StrategyKind::Fixed,
            ExtractionStrategy::Between(_) => StrategyKind::Between,
            ExtractionStrategy::Pattern(_) => StrategyKind::Pattern,
            ExtractionStrategy::ConceptAndPattern(_) => StrategyKind::ConceptAndPattern,
        }
    }

    /// Raw value of this strategy on `content`.
    ///
    /// A prerequisite missing from `lookup` reads as no match.
    pub fn raw_value<L>(&self, content: &str, lookup: &L) -> Result<String, ExtractionError>
    where
        L: StrategyLookup + ?Sized,
    {
        match self {
            ExtractionStrategy::WholeLine(e) => e.raw_value(content),
            ExtractionStrategy::Offset(e) => e.raw_value(content),
            ExtractionStrategy::Fixed(e) => e.raw_value(content),
            ExtractionStrategy::Between(e) => e.raw_value(content),
            ExtractionStrategy::Pattern(e) => e.raw_value(content),
            ExtractionStrategy::ConceptAndPattern(e) => {
                let left = match lookup.strategy(e.prerequisite()) {
                    Some(prerequisite) => prerequisite.raw_value(content, lookup)?,
                    None => String::new(),
                };
                Ok(e.raw_value_after(content, &left))
            }
        }
    }
}

fn required<'a>(
    concept: &str,
    field: &str,
    value: &'a Option<String>,
) -> Result<&'a str, ConfigurationError> {
    value
        .as_deref()
        .ok_or_else(|| ConfigurationError::definition(concept, format!("[{}] is required", field)))
}

fn compile(concept: &str, field: &str, pattern: &str) -> Result<Regex, ConfigurationError> {
    Regex::new(pattern).map_err(|e| {
        ConfigurationError::definition(concept, format!("[{}] is not a valid pattern: {}", field, e))
    })
}
