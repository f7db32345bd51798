//! Writers for parse results.
//!
//! Outputs and errors are written as tagged records:
//!
//! ```json
//! {"kind":"output","page":1,"line":4,"concept":"total","value":"42.50"}
//! {"kind":"error","page":2,"line":7,"concept":"amount","content":"...","message":"..."}
//! ```

use crate::parser::{ConceptError, ConceptOutput, ParseResult};
use serde::Serialize;
use std::io::Write;
use thiserror::Error;

/// Error type for serialization operations
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One line of written output.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record<'a> {
    Output(&'a ConceptOutput),
    Error(&'a ConceptError),
}

/// Records of a result: every output, then every error when `with_errors`.
pub fn records(result: &ParseResult, with_errors: bool) -> Vec<Record<'_>> {
    let outputs = result.outputs().iter().map(Record::Output);
    if with_errors {
        outputs.chain(result.errors().iter().map(Record::Error)).collect()
    } else {
        outputs.collect()
    }
}

/// NDJSON (Newline Delimited JSON) writer
///
/// Writes one JSON object per line.
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single record as an NDJSON line
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), SerializationError> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    pub fn write_all<T: Serialize>(&mut self, records: &[T]) -> Result<(), SerializationError> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON array writer
///
/// Streams records into a single JSON array.
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    first: bool,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Create a new JSON array writer and write the opening bracket
    pub fn new(mut writer: W) -> Result<Self, SerializationError> {
        write!(writer, "[")?;
        Ok(Self {
            writer,
            first: true,
        })
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), SerializationError> {
        if !self.first {
            write!(self.writer, ",")?;
        }
        self.first = false;

        let json = serde_json::to_string(record)?;
        write!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Close the bracket and flush
    pub fn finish(mut self) -> Result<(), SerializationError> {
        write!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Write a parse result as NDJSON records.
pub fn write_ndjson<W: Write>(
    writer: W,
    result: &ParseResult,
    with_errors: bool,
) -> Result<(), SerializationError> {
    let mut writer = NdjsonWriter::new(writer);
    writer.write_all(&records(result, with_errors))?;
    writer.flush()
}

/// Write a parse result as one JSON array of records.
pub fn write_json_array<W: Write>(
    writer: W,
    result: &ParseResult,
    with_errors: bool,
) -> Result<(), SerializationError> {
    let mut writer = JsonArrayWriter::new(writer)?;
    for record in records(result, with_errors) {
        writer.write(&record)?;
    }
    writer.finish()
}
