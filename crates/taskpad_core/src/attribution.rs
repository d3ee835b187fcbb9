//! Word-level source attribution.
//!
//! Each edit rebuilds the whole history from the current document. A token
//! keeps the source of the first earlier record with the same text, and a
//! token never seen before takes the source declared for the edit. History
//! for words that left the document is dropped on the next edit.

use crate::model::{AnnotatedWord, Source, SourcePercentages, WordRecord};

/// Splits a document into whitespace separated tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WordAttributionTracker {
    history: Vec<WordRecord>,
}

impl WordAttributionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[WordRecord] {
        &self.history
    }

    /// Source of the first history record whose word equals `word`.
    pub fn recorded_source(&self, word: &str) -> Option<Source> {
        self.history
            .iter()
            .find(|record| record.word == word)
            .map(|record| record.source)
    }

    /// Resolves every token of `text` against the current history without
    /// changing it.
    pub fn resolve<'a>(&self, text: &'a str, declared: Source) -> Vec<(&'a str, Source)> {
        tokenize(text)
            .map(|word| (word, self.recorded_source(word).unwrap_or(declared)))
            .collect()
    }

    /// Applies an edit: resolves `text`, replaces the history with the
    /// resolved words and returns the new split.
    pub fn record_edit(
        &mut self,
        text: &str,
        declared: Source,
        timestamp: i64,
    ) -> SourcePercentages {
        let resolved = self.resolve(text, declared);

        let ai_words = resolved
            .iter()
            .filter(|(_, source)| *source == Source::Ai)
            .count();
        let human_words = resolved.len() - ai_words;

        self.history = resolved
            .into_iter()
            .map(|(word, source)| WordRecord {
                word: word.to_string(),
                source,
                timestamp,
            })
            .collect();

        SourcePercentages::from_counts(ai_words, human_words)
    }

    /// Per-word view for rendering. Words without a record show as human.
    pub fn annotate(&self, text: &str) -> Vec<AnnotatedWord> {
        tokenize(text)
            .map(|word| AnnotatedWord {
                word: word.to_string(),
                source: self.recorded_source(word).unwrap_or(Source::Human),
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{WordAttributionTracker, tokenize};
    use crate::model::{Source, SourcePercentages};
    use proptest::prelude::*;

    fn sources(tracker: &WordAttributionTracker) -> Vec<(&str, Source)> {
        tracker
            .history()
            .iter()
            .map(|record| (record.word.as_str(), record.source))
            .collect()
    }

    #[test]
    fn tokenize_splits_on_whitespace_runs() {
        let words: Vec<&str> = tokenize("  Buy\tmilk,\n\n now ").collect();
        assert_eq!(words, vec!["Buy", "milk,", "now"]);
    }

    #[test]
    fn empty_document_has_no_words() {
        let mut tracker = WordAttributionTracker::new();
        let split = tracker.record_edit("   \n ", Source::Human, 1);

        assert_eq!(split, SourcePercentages::default());
        assert!(tracker.history().is_empty());
    }

    #[test]
    fn new_words_take_declared_source() {
        let mut tracker = WordAttributionTracker::new();
        let split = tracker.record_edit("Buy milk", Source::Human, 1);

        assert_eq!(split.human_edited, 100);
        assert_eq!(split.ai_generated, 0);
        assert_eq!(sources(&tracker), vec![("Buy", Source::Human), ("milk", Source::Human)]);
    }

    #[test]
    fn recorded_words_keep_their_source() {
        let mut tracker = WordAttributionTracker::new();
        tracker.record_edit("Buy milk", Source::Human, 1);
        let split = tracker.record_edit("Buy milk now please", Source::Ai, 2);

        assert_eq!(split.ai_generated, 50);
        assert_eq!(split.human_edited, 50);
        assert_eq!(
            sources(&tracker),
            vec![
                ("Buy", Source::Human),
                ("milk", Source::Human),
                ("now", Source::Ai),
                ("please", Source::Ai),
            ]
        );
    }

    #[test]
    fn ai_edit_over_unrecorded_words_marks_everything_ai() {
        let mut tracker = WordAttributionTracker::new();
        let split = tracker.record_edit(
            "Buy milk This is simulated AI generated content for demonstration.",
            Source::Ai,
            1,
        );

        assert_eq!(split.ai_generated, 100);
        assert_eq!(split.human_edited, 0);
        assert!(tracker.history().iter().all(|record| record.source == Source::Ai));
    }

    #[test]
    fn first_matching_record_wins_for_duplicates() {
        let mut tracker = WordAttributionTracker::new();
        tracker.record_edit("the", Source::Ai, 1);
        tracker.record_edit("the the", Source::Human, 2);

        assert_eq!(sources(&tracker), vec![("the", Source::Ai), ("the", Source::Ai)]);
    }

    #[test]
    fn punctuation_is_part_of_the_token() {
        let mut tracker = WordAttributionTracker::new();
        tracker.record_edit("done", Source::Ai, 1);
        tracker.record_edit("done.", Source::Human, 2);

        assert_eq!(sources(&tracker), vec![("done.", Source::Human)]);
    }

    #[test]
    fn history_is_rebuilt_on_every_edit() {
        let mut tracker = WordAttributionTracker::new();
        tracker.record_edit("task", Source::Ai, 1);
        tracker.record_edit("tasks", Source::Human, 2);
        assert_eq!(sources(&tracker), vec![("tasks", Source::Human)]);

        // "task" left the document, so its ai record is gone
        tracker.record_edit("task", Source::Human, 3);
        assert_eq!(sources(&tracker), vec![("task", Source::Human)]);
        assert!(tracker.history().iter().all(|record| record.timestamp == 3));
    }

    #[test]
    fn annotate_defaults_unknown_words_to_human() {
        let mut tracker = WordAttributionTracker::new();
        tracker.record_edit("generated", Source::Ai, 1);

        let words = tracker.annotate("generated typed");
        assert_eq!(words[0].source, Source::Ai);
        assert_eq!(words[1].source, Source::Human);
    }

    #[test]
    fn reset_clears_history() {
        let mut tracker = WordAttributionTracker::new();
        tracker.record_edit("a b c", Source::Ai, 1);
        tracker.reset();
        assert!(tracker.history().is_empty());
        assert_eq!(tracker.recorded_source("a"), None);
    }

    proptest! {
        #[test]
        fn percentages_stay_in_range(
            first in "[a-c ]{0,40}",
            second in "[a-d \t]{0,40}",
            ai_first in any::<bool>(),
        ) {
            let declared = if ai_first { Source::Ai } else { Source::Human };
            let mut tracker = WordAttributionTracker::new();
            let before = tracker.record_edit(&first, declared, 1);
            let after = tracker.record_edit(&second, Source::Human, 2);

            for split in [before, after] {
                prop_assert!(split.ai_generated <= 100);
                prop_assert!(split.human_edited <= 100);
            }
            prop_assert_eq!(tracker.history().len(), tokenize(&second).count());
        }
    }
}
