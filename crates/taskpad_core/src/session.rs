use crate::clock::{now_millis, now_rfc3339};
use crate::deadline::normalize_deadline;
use crate::draft::DraftState;
use crate::error::AppError;
use crate::generate::ContentGenerator;
use crate::model::{AnnotatedWord, Source, Task, TaskId};
use crate::presence::PresenceBridge;
use crate::task_list::TaskList;

/// One person's editing session: their draft, their committed tasks and
/// their connection to the room.
pub struct EditorSession {
    draft: DraftState,
    tasks: TaskList,
    presence: Box<dyn PresenceBridge>,
    generator: Box<dyn ContentGenerator>,
}

impl EditorSession {
    /// Starts a session and announces the empty initial draft to the room.
    pub fn new(presence: Box<dyn PresenceBridge>, generator: Box<dyn ContentGenerator>) -> Self {
        let session = Self {
            draft: DraftState::new(),
            tasks: TaskList::new(),
            presence,
            generator,
        };
        session.broadcast();
        session
    }

    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn annotated_words(&self) -> Vec<AnnotatedWord> {
        self.draft.annotated_words()
    }

    pub fn others_count(&self) -> usize {
        self.presence.others_count()
    }

    /// Replaces the draft text with `raw_text`, attributing new words to
    /// `source`, and shares the result.
    pub fn handle_content_change(&mut self, raw_text: &str, source: Source) {
        self.draft.apply_edit(raw_text, source, now_millis());
        tracing::debug!(
            source = %source,
            words = self.draft.word_history().len(),
            split = %self.draft.content_source(),
            "draft edited"
        );
        self.broadcast();
    }

    /// Appends generated text and re-attributes the draft as an AI edit.
    pub fn generate_ai_content(&mut self) -> Result<(), AppError> {
        let generated = self.generator.generate(self.draft.content())?;
        let content = self.draft.with_appended(&generated);
        self.handle_content_change(&content, Source::Ai);
        Ok(())
    }

    pub fn set_deadline(&mut self, raw: &str) {
        self.draft.set_deadline(raw);
    }

    /// Turns the draft into a task and clears the draft. Nothing changes
    /// when content or deadline is missing or the deadline does not parse.
    pub fn commit(&mut self) -> Result<Task, AppError> {
        self.draft.validate_commit()?;
        let deadline = normalize_deadline(self.draft.deadline())?;
        let created_at = now_rfc3339()?;

        let task = self
            .tasks
            .push(
                self.draft.content().to_string(),
                self.draft.content_source(),
                deadline,
                created_at,
            )
            .clone();
        self.draft.reset();
        tracing::info!(
            task_id = %task.id,
            split = %task.content_source,
            deadline = %task.deadline,
            "task committed"
        );

        self.broadcast();
        Ok(task)
    }

    /// Flips completion on `id`; `None` when no such task exists.
    pub fn toggle_completion(&mut self, id: TaskId) -> Option<Task> {
        match self.tasks.toggle_completion(id) {
            Some(task) => {
                tracing::debug!(task_id = %task.id, completed = task.completed, "task toggled");
                Some(task.clone())
            }
            None => {
                tracing::debug!(task_id = %id, "toggle ignored for unknown task");
                None
            }
        }
    }

    /// Leaves the room. The session is consumed.
    pub fn close(self) {
        if let Err(err) = self.presence.leave() {
            tracing::warn!(error = %err, "failed to leave presence room");
        }
    }

    fn broadcast(&self) {
        if let Err(err) = self.presence.broadcast_presence(&self.draft.presence()) {
            tracing::warn!(error = %err, "presence broadcast failed");
        }
    }
}
