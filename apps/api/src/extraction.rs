//! Résumé text extraction from uploaded files.

use crate::scoring::{ScoringError, ScoringResult};

/// Collapses every whitespace run into a single space and trims the ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// PDFs go through `pdf-extract`; anything else must be UTF-8 text.
pub fn extract_resume_text(filename: &str, bytes: &[u8]) -> ScoringResult<String> {
    let raw = if filename.to_lowercase().ends_with(".pdf") {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ScoringError::MalformedInput(format!("unreadable PDF '{filename}': {e}")))?
    } else {
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            ScoringError::MalformedInput(format!("'{filename}' is not valid UTF-8 text"))
        })?
    };
    Ok(clean_text(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(
            clean_text("  John Doe\n\nSoftware\tEngineer \r\n "),
            "John Doe Software Engineer"
        );
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_plain_text_upload() {
        let text = extract_resume_text("resume.txt", b"Python\n  developer").unwrap();
        assert_eq!(text, "Python developer");
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let err = extract_resume_text("resume.txt", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ScoringError::MalformedInput(_)));
    }

    #[test]
    fn test_garbage_pdf_is_malformed() {
        let err = extract_resume_text("resume.PDF", b"not a pdf").unwrap_err();
        assert!(matches!(err, ScoringError::MalformedInput(_)));
    }
}
