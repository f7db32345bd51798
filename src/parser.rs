//! Line-by-line parse driver.
//!
//! Applies a resolved concept set to every line of a document. Each run owns
//! its stop marker; the concepts, converter and conversion policy are only
//! read, so one set can serve any number of runs.

use crate::concept::ConceptDefinition;
use crate::converter::{ConversionConfig, TypedValue, ValueConverter};
use crate::error::EvaluationError;
use crate::resolver::{ResolvedConcept, ResolvedConcepts};
use crate::source::{lines_from_text, DocumentLine};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt::Display;

/// Position from which nothing more is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopMarker {
    pub page: u32,
    pub line: u32,
}

impl StopMarker {
    /// Whether (page, line) is at or after the marker.
    pub fn has_been_reached(&self, page: u32, line: u32) -> bool {
        page > self.page || (page == self.page && line >= self.line)
    }
}

/// One successful match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptOutput {
    pub page: u32,
    pub line: u32,
    pub concept: String,
    pub value: TypedValue,
}

/// One failed match, with the line it failed on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptError {
    pub page: u32,
    pub line: u32,
    pub concept: String,
    pub content: String,
    #[serde(rename = "message", serialize_with = "serialize_display")]
    pub error: EvaluationError,
}

impl ConceptError {
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

fn serialize_display<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Outputs and errors of one parse run, in line-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseResult {
    outputs: Vec<ConceptOutput>,
    errors: Vec<ConceptError>,
    stop_marker: Option<StopMarker>,
}

impl ParseResult {
    pub fn outputs(&self) -> &[ConceptOutput] {
        &self.outputs
    }

    pub fn errors(&self) -> &[ConceptError] {
        &self.errors
    }

    /// Where the run stopped, if any stop keyword matched.
    pub fn stop_marker(&self) -> Option<StopMarker> {
        self.stop_marker
    }

    /// True when no concept failed on any line.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConceptOutput> {
        self.outputs.iter()
    }

    /// Every value produced for one concept, in order.
    pub fn values_for(&self, description: &str) -> Vec<&TypedValue> {
        self.outputs
            .iter()
            .filter(|o| o.concept == description)
            .map(|o| &o.value)
            .collect()
    }

    /// Outputs grouped by concept, in order of first appearance.
    pub fn by_concept(&self) -> IndexMap<&str, Vec<&ConceptOutput>> {
        let mut groups: IndexMap<&str, Vec<&ConceptOutput>> = IndexMap::new();
        for output in &self.outputs {
            groups.entry(output.concept.as_str()).or_default().push(output);
        }
        groups
    }

    pub fn into_parts(self) -> (Vec<ConceptOutput>, Vec<ConceptError>) {
        (self.outputs, self.errors)
    }
}

impl<'a> IntoIterator for &'a ParseResult {
    type Item = &'a ConceptOutput;
    type IntoIter = std::slice::Iter<'a, ConceptOutput>;

    fn into_iter(self) -> Self::IntoIter {
        self.outputs.iter()
    }
}

#[derive(Debug, Clone, Copy)]
enum RunState {
    Running,
    Stopped(StopMarker),
}

/// Drives a parse run over a line sequence.
///
/// # Example
/// ```ignore
/// use gleaner::{ConversionConfig, ResolvedConcepts, TextParser, ValueConverter};
///
/// let concepts = ResolvedConcepts::resolve(definitions)?;
/// let converter = ValueConverter::new();
/// let config = ConversionConfig::standard();
///
/// let result = TextParser::new(&concepts, &converter, &config).parse_text(&text);
/// for output in &result {
///     println!("{} = {}", output.concept, output.value);
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TextParser<'a> {
    concepts: &'a ResolvedConcepts,
    converter: &'a ValueConverter,
    config: &'a ConversionConfig,
}

impl<'a> TextParser<'a> {
    pub fn new(
        concepts: &'a ResolvedConcepts,
        converter: &'a ValueConverter,
        config: &'a ConversionConfig,
    ) -> Self {
        Self {
            concepts,
            converter,
            config,
        }
    }

    /// Run every concept over every line. Never fails; per-line failures end
    /// up in [`ParseResult::errors`].
    pub fn parse<I>(&self, lines: I) -> ParseResult
    where
        I: IntoIterator<Item = DocumentLine>,
    {
        let mut result = ParseResult::default();
        let mut state = RunState::Running;

        for DocumentLine { page, line, text } in lines {
            for concept in self.concepts {
                let definition = concept.definition();

                if let RunState::Running = state {
                    if definition.triggers_stop(&text) {
                        let marker = StopMarker { page, line };
                        tracing::debug!(
                            concept = %definition.description,
                            page,
                            line,
                            "Stop keyword reached"
                        );
                        state = RunState::Stopped(marker);
                        result.stop_marker = Some(marker);
                    }
                }

                if !is_processable(definition, state, page, line) {
                    continue;
                }

                match self.evaluate(concept, &text) {
                    Ok(value) => result.outputs.push(ConceptOutput {
                        page,
                        line,
                        concept: definition.description.clone(),
                        value,
                    }),
                    Err(error) => {
                        tracing::trace!(
                            concept = %definition.description,
                            page,
                            line,
                            %error,
                            "Concept failed"
                        );
                        result.errors.push(ConceptError {
                            page,
                            line,
                            concept: definition.description.clone(),
                            content: text.clone(),
                            error,
                        });
                    }
                }
            }
        }

        tracing::debug!(
            outputs = result.outputs.len(),
            errors = result.errors.len(),
            "Parse run finished"
        );
        result
    }

    /// Split `text` with [`lines_from_text`] and parse it.
    pub fn parse_text(&self, text: &str) -> ParseResult {
        self.parse(lines_from_text(text))
    }

    fn evaluate(&self, concept: &ResolvedConcept, content: &str) -> Result<TypedValue, EvaluationError> {
        let raw = self.concepts.raw_value(concept.id(), content)?;
        let value = self
            .converter
            .convert(Some(&raw), &concept.definition().target, self.config)?;
        Ok(value)
    }
}

fn is_processable(concept: &ConceptDefinition, state: RunState, page: u32, line: u32) -> bool {
    match state {
        RunState::Stopped(marker) if marker.has_been_reached(page, line) => false,
        _ => concept.is_anchored_at(page, line),
    }
}
