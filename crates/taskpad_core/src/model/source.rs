use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a word: the mock generator or a person typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Ai,
    Human,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Human => "human",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    pub word: String,
    pub source: Source,
    /// Unix epoch milliseconds of the edit that produced this record.
    pub timestamp: i64,
}

/// Share of words per source, each rounded on its own.
///
/// The two values are not forced to add up to 100: eight words split one to
/// seven report `13` and `88`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePercentages {
    pub ai_generated: u8,
    pub human_edited: u8,
}

impl SourcePercentages {
    pub fn from_counts(ai_words: usize, human_words: usize) -> Self {
        let total = ai_words + human_words;
        if total == 0 {
            return Self::default();
        }

        Self {
            ai_generated: rounded_percent(ai_words, total),
            human_edited: rounded_percent(human_words, total),
        }
    }
}

impl fmt::Display for SourcePercentages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}% AI / {}% Human",
            self.ai_generated, self.human_edited
        )
    }
}

fn rounded_percent(count: usize, total: usize) -> u8 {
    // f64::round rounds half away from zero
    let percent = (count as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedWord {
    pub word: String,
    pub source: Source,
}
