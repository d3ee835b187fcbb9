use crate::model::{SourcePercentages, Task, TaskId};

/// Committed tasks in commit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Default for TaskList {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new pending task and returns it. Ids increase strictly.
    pub fn push(
        &mut self,
        content: String,
        content_source: SourcePercentages,
        deadline: String,
        created_at: String,
    ) -> &Task {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let index = self.tasks.len();
        self.tasks.push(Task {
            id,
            content,
            content_source,
            deadline,
            created_at,
            completed: false,
        });
        &self.tasks[index]
    }

    /// Flips `completed` on the task with `id`. Unknown ids leave the list
    /// untouched and return `None`.
    pub fn toggle_completion(&mut self, id: TaskId) -> Option<&Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.completed = !task.completed;
        Some(&*task)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.completed).count()
    }

    pub fn pending_count(&self) -> usize {
        self.len() - self.completed_count()
    }
}
