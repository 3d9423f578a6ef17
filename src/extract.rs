//! Document text extraction for protocol files.
//!
//! Protocol documents arrive as PDF, DOCX, or legacy DOC files. Each format
//! has its own extractor, selected by file extension at this boundary, so the
//! parsing core only ever sees plain text.

use log::debug;
use std::path::Path;

/// Errors raised while turning a document into plain text.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported document format '{0}' (supported: .pdf, .doc, .docx)")]
    UnsupportedFormat(String),
    #[error("failed to read document {path}: {reason}")]
    Read { path: String, reason: String },
}

impl ExtractError {
    fn read(path: &Path, reason: impl std::fmt::Display) -> Self {
        ExtractError::Read { path: path.display().to_string(), reason: reason.to_string() }
    }
}

/// A format-specific plain-text extractor.
pub trait TextExtractor: std::fmt::Debug {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// PDF text extraction via `pdf-extract` (pure Rust, no external tooling).
#[derive(Debug)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let text = pdf_extract::extract_text(path).map_err(|e| ExtractError::read(path, e))?;
        debug!("Extracted {} chars from PDF {}", text.len(), path.display());
        Ok(text)
    }
}

/// DOCX text extraction via `docx-lite`.
#[derive(Debug)]
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let text = docx_lite::extract_text(path).map_err(|e| ExtractError::read(path, e))?;
        debug!("Extracted {} chars from DOCX {}", text.len(), path.display());
        Ok(text)
    }
}

/// Legacy DOC handling. Some DOC files are readable through the DOCX path;
/// when that fails the error advises converting the document.
#[derive(Debug)]
pub struct DocExtractor;

impl TextExtractor for DocExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        DocxExtractor.extract(path).map_err(|_| {
            ExtractError::read(path, "could not read legacy DOC file; convert it to .docx and retry")
        })
    }
}

/// Pick an extractor for the given document path by extension.
pub fn extractor_for(path: &Path) -> Result<Box<dyn TextExtractor>, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => Ok(Box::new(PdfExtractor)),
        "docx" => Ok(Box::new(DocxExtractor)),
        "doc" => Ok(Box::new(DocExtractor)),
        _ => Err(ExtractError::UnsupportedFormat(if ext.is_empty() {
            path.display().to_string()
        } else {
            format!(".{ext}")
        })),
    }
}

/// Extract the plain text of a protocol document.
///
/// An empty result is not an error; a document with no recognizable text
/// simply yields no day entries downstream.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let extractor = extractor_for(path)?;
    if !path.exists() {
        return Err(ExtractError::read(path, "no such file"));
    }
    extractor.extract(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = extract_text(Path::new("/tmp/protocol.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ref ext) if ext == ".txt"));
    }

    #[test]
    fn missing_extension_is_unsupported() {
        let err = extractor_for(Path::new("/tmp/protocol")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = extract_text(Path::new("/nonexistent/protocol.pdf")).unwrap_err();
        assert!(matches!(err, ExtractError::Read { .. }));
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn extension_dispatch_is_case_insensitive() {
        assert!(extractor_for(Path::new("/tmp/protocol.PDF")).is_ok());
        assert!(extractor_for(Path::new("/tmp/protocol.Docx")).is_ok());
    }

    #[test]
    fn corrupt_docx_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let err = extract_text(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Read { .. }));
    }
}
