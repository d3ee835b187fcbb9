use crate::error::AppError;

pub const MOCK_AI_TEXT: &str = "This is simulated AI generated content for demonstration.";

/// Produces text to append to the draft as AI output.
pub trait ContentGenerator {
    fn generate(&self, current_content: &str) -> Result<String, AppError>;
}

/// Always returns [`MOCK_AI_TEXT`].
pub struct MockGenerator;

impl ContentGenerator for MockGenerator {
    fn generate(&self, _current_content: &str) -> Result<String, AppError> {
        Ok(MOCK_AI_TEXT.to_string())
    }
}
