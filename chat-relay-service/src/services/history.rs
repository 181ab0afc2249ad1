//! Startup loading of the persisted transcript.
//!
//! The file is read once and never written back. Every failure is
//! recoverable: the service starts with an empty conversation.

use crate::models::{ChatTurn, TranscriptEntry};
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read transcript: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse transcript: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Outcome of loading the transcript file.
#[derive(Debug)]
pub enum HistoryLoad {
    /// The file parsed; entries are in file order.
    Loaded(Vec<TranscriptEntry>),
    /// No file at the path: a fresh conversation.
    Missing,
    /// The file exists but could not be used.
    Invalid(HistoryError),
}

impl HistoryLoad {
    pub fn entries(&self) -> &[TranscriptEntry] {
        match self {
            HistoryLoad::Loaded(entries) => entries,
            HistoryLoad::Missing | HistoryLoad::Invalid(_) => &[],
        }
    }

    /// Seed turns for the conversation session.
    pub fn into_turns(self) -> Vec<ChatTurn> {
        match self {
            HistoryLoad::Loaded(entries) => entries.into_iter().map(ChatTurn::from).collect(),
            HistoryLoad::Missing | HistoryLoad::Invalid(_) => Vec::new(),
        }
    }
}

/// Parse transcript JSON: an array of `{role, message}` objects.
pub fn parse_transcript(data: &str) -> Result<Vec<TranscriptEntry>, HistoryError> {
    Ok(serde_json::from_str(data)?)
}

/// Load the transcript at `path`, logging which of the three outcomes occurred.
pub async fn load_history(path: &Path) -> HistoryLoad {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(
                path = %path.display(),
                "No chat history file found. Starting fresh."
            );
            return HistoryLoad::Missing;
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to read chat history file"
            );
            return HistoryLoad::Invalid(e.into());
        }
    };

    match parse_transcript(&data) {
        Ok(entries) => {
            tracing::info!(
                path = %path.display(),
                entries = entries.len(),
                "Chat history loaded successfully"
            );
            HistoryLoad::Loaded(entries)
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to parse chat history JSON"
            );
            HistoryLoad::Invalid(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn transcript_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn loads_entries_in_file_order() {
        let file = transcript_file(
            r#"[{"role":"user","message":"Hi"},{"role":"model","message":"Hello!"}]"#,
        );

        let load = load_history(file.path()).await;

        assert!(matches!(load, HistoryLoad::Loaded(_)));
        let turns = load.into_turns();
        assert_eq!(turns, vec![ChatTurn::user("Hi"), ChatTurn::model("Hello!")]);
    }

    #[tokio::test]
    async fn missing_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();

        let load = load_history(&dir.path().join("chat_history.json")).await;

        assert!(matches!(load, HistoryLoad::Missing));
        assert!(load.into_turns().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_and_empty() {
        let file = transcript_file(r#"[{"role":"user","message":"Hi"#);

        let load = load_history(file.path()).await;

        assert!(matches!(load, HistoryLoad::Invalid(HistoryError::Parse(_))));
        assert!(load.entries().is_empty());
    }

    #[tokio::test]
    async fn wrong_shape_is_invalid() {
        let file = transcript_file(r#"{"role":"user","message":"Hi"}"#);

        let load = load_history(file.path()).await;

        assert!(matches!(load, HistoryLoad::Invalid(HistoryError::Parse(_))));
    }

    #[tokio::test]
    async fn directory_path_is_invalid_not_fatal() {
        let dir = tempfile::tempdir().unwrap();

        let load = load_history(dir.path()).await;

        assert!(matches!(load, HistoryLoad::Invalid(HistoryError::Read(_))));
        assert!(load.into_turns().is_empty());
    }

    #[test]
    fn empty_array_is_a_valid_empty_transcript() {
        assert!(parse_transcript("[]").unwrap().is_empty());
    }

    #[test]
    fn non_string_message_is_rejected() {
        assert!(parse_transcript(r#"[{"role":"user","message":42}]"#).is_err());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let entries =
            parse_transcript(r#"[{"role":"model","message":"Hey","timestamp":"2024-11-14"}]"#)
                .unwrap();
        assert_eq!(entries[0].role, Role::Model);
        assert_eq!(entries[0].message, "Hey");
    }
}
