//! Plain-text document source.
//!
//! Turns document text into numbered (page, line, text) triples. Pages are
//! separated by form feeds, as produced by most PDF-to-text tools.

use crate::error::AcquisitionError;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Page separator.
pub const PAGE_BREAK: char = '\x0c';

/// One line of a document, numbered from 1 within its page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLine {
    pub page: u32,
    pub line: u32,
    pub text: String,
}

impl DocumentLine {
    pub fn new(page: u32, line: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            line,
            text: text.into(),
        }
    }
}

/// Split text into pages and lines.
///
/// A trailing empty page (text ending in a form feed) is dropped; every other
/// page, the last one included, is returned. Pages and lines past `u32::MAX`
/// are not numbered and are left out.
pub fn lines_from_text(text: &str) -> Vec<DocumentLine> {
    let mut pages: Vec<&str> = text.split(PAGE_BREAK).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }

    let mut lines = Vec::new();
    for (page_index, page) in pages.into_iter().enumerate() {
        let Some(page_number) = position(page_index) else {
            tracing::warn!(limit = u32::MAX, "Page limit reached, ignoring the rest of the document");
            break;
        };
        for (line_index, content) in page.lines().enumerate() {
            let Some(line_number) = position(line_index) else {
                tracing::warn!(
                    page = page_number,
                    limit = u32::MAX,
                    "Line limit reached, ignoring the rest of the page"
                );
                break;
            };
            lines.push(DocumentLine::new(page_number, line_number, content));
        }
    }
    lines
}

/// 1-based number of a 0-based index, `None` past `u32::MAX`.
fn position(index: usize) -> Option<u32> {
    u32::try_from(index).ok()?.checked_add(1)
}

/// Read a UTF-8 text document and split it into lines.
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Vec<DocumentLine>, AcquisitionError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AcquisitionError::NotFound(path.to_path_buf()));
    }

    let text = fs::read_to_string(path).map_err(|source| AcquisitionError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let lines = lines_from_text(&text);
    tracing::debug!(path = %path.display(), lines = lines.len(), "Read document");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_single_page() {
        let lines = lines_from_text("first\nsecond\r\nthird");

        assert_eq!(
            lines,
            vec![
                DocumentLine::new(1, 1, "first"),
                DocumentLine::new(1, 2, "second"),
                DocumentLine::new(1, 3, "third"),
            ]
        );
    }

    #[test]
    fn test_pages_restart_line_numbers() {
        let lines = lines_from_text("a\nb\n\x0cc\nd\n");

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], DocumentLine::new(2, 1, "c"));
        assert_eq!(lines[3], DocumentLine::new(2, 2, "d"));
    }

    #[test]
    fn test_last_page_is_kept() {
        let lines = lines_from_text("a\x0cb\x0clast");
        assert_eq!(lines.last(), Some(&DocumentLine::new(3, 1, "last")));

        let lines = lines_from_text("a\x0c");
        assert_eq!(lines, vec![DocumentLine::new(1, 1, "a")]);
    }

    #[test]
    fn test_numbering_limit() {
        assert_eq!(position(0), Some(1));
        assert_eq!(position(u32::MAX as usize - 1), Some(u32::MAX));
        assert_eq!(position(u32::MAX as usize), None);
        assert_eq!(position(usize::MAX), None);
    }

    #[test]
    fn test_read_document() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "one\ntwo\x0cthree").unwrap();

        let lines = read_document(file.path()).unwrap();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].page, 2);
    }

    #[test]
    fn test_read_missing_document() {
        let result = read_document("/definitely/not/here.txt");
        assert!(matches!(result, Err(AcquisitionError::NotFound(_))));
    }
}
