use std::collections::BTreeMap;
use std::path::Path;

use reqwest::Client;

use quiz_core::model::{QuestionBank, QuestionDraft};

use crate::error::BankLoadError;

/// The bank document: subject name to its ordered question entries.
type BankDocument = BTreeMap<String, Vec<QuestionDraft>>;

/// Loads and validates the question bank resource.
///
/// The bank is fetched once at startup; a load failure means the quiz
/// cannot start and is surfaced to the caller as-is.
#[derive(Clone, Default)]
pub struct BankLoader {
    client: Client,
}

impl BankLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Fetch and validate the bank document from a URL.
    ///
    /// # Errors
    ///
    /// Returns `BankLoadError` when the request fails, the server answers
    /// with a non-success status, the document does not parse, or an entry
    /// fails validation.
    pub async fn fetch(&self, url: &str) -> Result<QuestionBank, BankLoadError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            tracing::warn!(%url, status = %response.status(), "question bank fetch failed");
            return Err(BankLoadError::HttpStatus(response.status()));
        }

        let bytes = response.bytes().await?;
        Self::parse(&bytes)
    }

    /// Read and validate the bank document from a file.
    ///
    /// # Errors
    ///
    /// Returns `BankLoadError` when the file cannot be read, does not
    /// parse, or an entry fails validation.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<QuestionBank, BankLoadError> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Parse and validate a bank document.
    ///
    /// # Errors
    ///
    /// Returns `BankLoadError::Parse` for a malformed document and
    /// `BankLoadError::Invalid` for an entry that fails validation.
    pub fn parse(bytes: &[u8]) -> Result<QuestionBank, BankLoadError> {
        let document: BankDocument = serde_json::from_slice(bytes)?;
        Ok(QuestionBank::from_drafts(document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
    {
        "Math": [
            {"question": "2 + 2?", "choices": ["3", "4"], "answer": "4"},
            {"question": "3 + 3?", "choices": ["6", "7"], "answer": "6"}
        ],
        "Geography": [
            {"question": "Capital of France?", "choices": ["Paris", "Lyon"], "answer": "Paris"}
        ]
    }
    "#;

    #[test]
    fn parses_a_valid_document() {
        let bank = BankLoader::parse(DOC.as_bytes()).unwrap();
        assert_eq!(bank.subject_count(), 2);
        assert_eq!(bank.questions_for("Math").unwrap().len(), 2);
        assert_eq!(
            bank.questions_for("Geography").unwrap()[0].answer(),
            "Paris"
        );
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = BankLoader::parse(b"{ not json").unwrap_err();
        assert!(matches!(err, BankLoadError::Parse(_)));
    }

    #[test]
    fn invalid_entry_is_rejected_at_load_time() {
        let doc = r#"{"Math": [{"question": "Q", "choices": ["a", "b"], "answer": "c"}]}"#;
        let err = BankLoader::parse(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, BankLoadError::Invalid(_)));
    }

    #[test]
    fn missing_answer_field_is_a_parse_error() {
        let doc = r#"{"Math": [{"question": "Q", "choices": ["a", "b"]}]}"#;
        let err = BankLoader::parse(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, BankLoadError::Parse(_)));
    }
}
