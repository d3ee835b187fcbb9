use crate::attribution::WordAttributionTracker;
use crate::error::AppError;
use crate::model::{AnnotatedWord, PresencePayload, Source, SourcePercentages, WordRecord};

/// The text being written, its attribution and the chosen deadline.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DraftState {
    content: String,
    deadline: String,
    content_source: SourcePercentages,
    tracker: WordAttributionTracker,
}

impl DraftState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn deadline(&self) -> &str {
        &self.deadline
    }

    pub fn content_source(&self) -> SourcePercentages {
        self.content_source
    }

    pub fn word_history(&self) -> &[WordRecord] {
        self.tracker.history()
    }

    pub fn annotated_words(&self) -> Vec<AnnotatedWord> {
        self.tracker.annotate(&self.content)
    }

    /// Replaces the content and re-attributes every word.
    pub fn apply_edit(&mut self, raw_text: &str, source: Source, timestamp: i64) {
        self.content = raw_text.to_string();
        self.content_source = self.tracker.record_edit(&self.content, source, timestamp);
    }

    /// Content with `generated` appended after a single space.
    pub fn with_appended(&self, generated: &str) -> String {
        if self.content.is_empty() {
            generated.to_string()
        } else {
            format!("{} {}", self.content, generated)
        }
    }

    pub fn set_deadline(&mut self, raw: &str) {
        self.deadline = raw.trim().to_string();
    }

    pub fn presence(&self) -> PresencePayload {
        PresencePayload {
            content: self.content.clone(),
            content_source: self.content_source,
        }
    }

    /// Checks that a commit may go ahead. Missing content is reported before
    /// a missing deadline.
    pub fn validate_commit(&self) -> Result<(), AppError> {
        if self.content.trim().is_empty() {
            return Err(AppError::missing_content());
        }
        if self.deadline.is_empty() {
            return Err(AppError::missing_deadline());
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.content.clear();
        self.deadline.clear();
        self.content_source = SourcePercentages::default();
        self.tracker.reset();
    }
}
