//! Text and metadata extraction for uploaded documents.
//!
//! Uploads arrive as file paths; this module returns the full plain text
//! plus a [`DocumentMetadata`]. PDF text comes from `pdf-extract`, PDF
//! metadata (Info dictionary, page count) from `lopdf`. Plain-text files
//! (`.txt`, `.md`) pass through unchanged.
//!
//! Metadata extraction is best-effort: a PDF with an unreadable Info
//! dictionary still extracts, with default metadata. Unreadable text is an
//! [`ExtractError`] and the upload fails; extraction is never retried.

use std::path::Path;

use crate::models::DocumentMetadata;

/// Extraction failure.
#[derive(Debug)]
pub enum ExtractError {
    /// The file could not be read or its contents could not be decoded.
    Unreadable(String),
    /// The file extension maps to no known extractor.
    Unsupported(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Unreadable(e) => write!(f, "could not extract text: {}", e),
            ExtractError::Unsupported(ext) => write!(f, "unsupported file type: {}", ext),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract full text and metadata from a document file.
pub fn extract(path: &Path) -> Result<(String, DocumentMetadata), ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => extract_pdf(path),
        "txt" | "md" | "text" => extract_plain(path),
        other => Err(ExtractError::Unsupported(other.to_string())),
    }
}

fn extract_plain(path: &Path) -> Result<(String, DocumentMetadata), ExtractError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| ExtractError::Unreadable(e.to_string()))?;
    let mut metadata = DocumentMetadata::default();
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        metadata.title = stem.to_string();
    }
    Ok((text, metadata))
}

fn extract_pdf(path: &Path) -> Result<(String, DocumentMetadata), ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Unreadable(e.to_string()))?;
    let text = pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| ExtractError::Unreadable(e.to_string()))?;

    let metadata = match pdf_metadata(&bytes) {
        Some(m) => m,
        None => {
            tracing::warn!(path = %path.display(), "PDF metadata unreadable, using defaults");
            DocumentMetadata::default()
        }
    };

    Ok((text, metadata))
}

/// Read the Info dictionary and page count. Returns `None` when the PDF
/// structure itself cannot be parsed; individual missing fields keep their
/// defaults.
fn pdf_metadata(bytes: &[u8]) -> Option<DocumentMetadata> {
    let doc = lopdf::Document::load_mem(bytes).ok()?;

    let mut metadata = DocumentMetadata {
        page_count: doc.get_pages().len(),
        ..Default::default()
    };

    let info = match doc.trailer.get(b"Info") {
        Ok(lopdf::Object::Reference(id)) => {
            doc.get_object(*id).ok().and_then(|o| o.as_dict().ok())
        }
        Ok(lopdf::Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };

    if let Some(info) = info {
        if let Some(v) = info_string(info, b"Title") {
            metadata.title = v;
        }
        if let Some(v) = info_string(info, b"Author") {
            metadata.author = v;
        }
        if let Some(v) = info_string(info, b"Subject") {
            metadata.subject = v;
        }
        if let Some(v) = info_string(info, b"Creator") {
            metadata.creator = v;
        }
        if let Some(v) = info_string(info, b"Producer") {
            metadata.producer = v;
        }
        if let Some(v) = info_string(info, b"CreationDate") {
            metadata.creation_date = v;
        }
        if let Some(v) = info_string(info, b"ModDate") {
            metadata.modification_date = v;
        }
    }

    Some(metadata)
}

fn info_string(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key) {
        Ok(lopdf::Object::String(bytes, _)) => {
            let s = decode_pdf_string(bytes);
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        _ => None,
    }
}

/// PDF text strings are either PDFDocEncoding (treated as latin-ish UTF-8
/// here) or UTF-16BE with a BOM.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = extract(Path::new("slides.pptx")).unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(_)));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = extract(Path::new("/nonexistent/file.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Unreadable(_)));
    }

    #[test]
    fn plain_text_passes_through_with_stem_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Plain text body.").unwrap();

        let (text, metadata) = extract(&path).unwrap();
        assert_eq!(text, "Plain text body.");
        assert_eq!(metadata.title, "notes");
        assert_eq!(metadata.page_count, 0);
    }

    #[test]
    fn invalid_pdf_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, "not a pdf at all").unwrap();

        let err = extract(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Unreadable(_)));
    }

    #[test]
    fn utf16_pdf_strings_decode() {
        let encoded: Vec<u8> = [0xFEu8, 0xFF]
            .into_iter()
            .chain("Qé".encode_utf16().flat_map(|u| u.to_be_bytes()))
            .collect();
        assert_eq!(decode_pdf_string(&encoded), "Qé");
    }
}
