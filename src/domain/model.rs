use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Note types this tool knows how to fill in.
pub const SUPPORTED_MODELS: &[&str] = &["Basic", "Basic (and reversed card)"];

/// A stored submission target: one Anki deck plus the formatting guidance
/// that helps an assistant pick it and phrase content for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckPreset {
    pub deck_id: i64,
    pub deck_name: String,
    pub purpose: String,
    pub model_name: String,
    pub front_guide: String,
    pub back_guide: String,
    pub front_example: String,
    pub back_example: String,
}

/// One submission attempt. Lives for a single workflow run only.
#[derive(Debug, Clone)]
pub struct CardSubmission {
    pub deck_id: i64,
    pub front: String,
    pub back: String,
    /// Comma separated labels, split and trimmed during normalization.
    pub tags: Option<String>,
}

/// An existing note that plausibly matches the submitted front content.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCandidate {
    pub note_id: i64,
    pub fields: HashMap<String, String>,
}

/// Full detail of one note as reported by the peer.
#[derive(Debug, Clone)]
pub struct NoteInfo {
    pub note_id: i64,
    pub model_name: String,
    pub fields: HashMap<String, String>,
    pub tags: Vec<String>,
}

/// Terminal result of one submission workflow run.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Created(i64),
    Updated(i64),
    Rejected(String),
    Cancelled,
}

impl SubmissionOutcome {
    /// 每個終止狀態對應一條給使用者的訊息
    pub fn message(&self) -> String {
        match self {
            SubmissionOutcome::Created(note_id) => {
                format!("Created note {} in Anki", note_id)
            }
            SubmissionOutcome::Updated(note_id) => {
                format!("Updated existing note {}", note_id)
            }
            SubmissionOutcome::Rejected(reason) => format!("Submission rejected: {}", reason),
            SubmissionOutcome::Cancelled => {
                "Submission cancelled; nothing was written to Anki".to_string()
            }
        }
    }
}

/// The structured confirmation prompt shown to a human before committing.
#[derive(Debug, Clone)]
pub struct CardPreview {
    pub deck_name: String,
    pub model_name: String,
    /// Field name/value pairs in presentation order.
    pub fields: Vec<(String, String)>,
    pub tags: Vec<String>,
    pub duplicates: Vec<DuplicateCandidate>,
}

impl CardPreview {
    /// 轉成人類可讀的確認文字
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Deck: {}", self.deck_name));
        lines.push(format!("Note type: {}", self.model_name));
        for (name, value) in &self.fields {
            lines.push(format!("{}: {}", name, value));
        }
        if !self.tags.is_empty() {
            lines.push(format!("Tags: {}", self.tags.join(", ")));
        }
        if !self.duplicates.is_empty() {
            lines.push(format!("Possible duplicates ({}):", self.duplicates.len()));
            for candidate in &self.duplicates {
                let mut parts: Vec<String> = candidate
                    .fields
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                parts.sort();
                lines.push(format!("  note {}: {}", candidate.note_id, parts.join(", ")));
            }
        }
        lines.join("\n")
    }
}

/// Human decision resolving the confirmation suspend point. A plain yes/no
/// is not enough: a found duplicate needs a create-vs-update choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    CreateNew,
    UpdateExisting(i64),
    Cancel,
}
