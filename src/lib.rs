//! # Gleaner: Concept Extraction for Line-Oriented Documents
//!
//! Gleaner pulls typed fields ("concepts") out of semi-structured text such as
//! bank statements and invoices. Each concept declares where it lives, how to
//! cut it out of a line and what type it becomes.
//!
//! ## Features
//!
//! - **Declarative rules**: concepts are plain records, loaded from YAML or JSON
//! - **Extraction strategies**: whole line, offset, fixed window, between markers,
//!   pattern with cleanup, and relative to another concept
//! - **Dependency ordering**: concepts depending on others are evaluated after them,
//!   with cycle detection
//! - **Typed conversion**: numbers, decimals, booleans, dates and custom types under
//!   an explicit conversion policy
//! - **Recoverable failures**: every failure is reported per concept and line; a run
//!   always completes
//!
//! ## Example: Statement Rules
//!
//! ```yaml
//! concepts:
//!   - description: account
//!     type: string
//!     strategy: offset
//!     page: 1
//!     line: 2
//!     leading_text: "Account:"
//!   - description: date
//!     type: string
//!     strategy: regex
//!     regex: "^\\d{2}/\\d{2}"
//!     page: 1
//!     line: 5
//!     detail: true
//!     stop_at_keyword: "Closing balance"
//!   - description: payee
//!     type: string
//!     strategy: concept_and_pattern
//!     after_concept: date
//!     before_regex: "-?[\\d,]+\\.\\d{2}"
//!     page: 1
//!     line: 5
//!     detail: true
//! ```

pub mod concept;
pub mod converter;
pub mod error;
pub mod extraction;
pub mod loader;
pub mod parser;
pub mod resolver;
pub mod serialization;
pub mod source;

// Re-export key types
pub use concept::{validate_concepts, Anchor, ConceptDefinition, ConceptId, StrategyKind};
pub use converter::{
    ConversionConfig, ConversionConfigBuilder, ConverterRegistry, EmptyRule, TargetType,
    TypedValue, ValueConverter, ValueFactory,
};
pub use error::{
    AcquisitionError, ConfigurationError, ConversionError, EvaluationError, ExtractionError,
    LoadError, Violation,
};
pub use extraction::{ExtractionStrategy, StrategyLookup, TextExtractor};
pub use loader::{load_concepts, load_conversion_config, ConversionSettings};
pub use parser::{ConceptError, ConceptOutput, ParseResult, StopMarker, TextParser};
pub use resolver::{compute_execution_order, ResolvedConcept, ResolvedConcepts};
pub use serialization::{JsonArrayWriter, NdjsonWriter, SerializationError};
pub use source::{lines_from_text, read_document, DocumentLine};
