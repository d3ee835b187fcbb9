use crate::error::AppError;
use crate::model::SourcePercentages;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ID_PREFIX: &str = "task-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ID_PREFIX}{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = AppError;

    /// Accepts `task-3` as well as the bare number `3`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("id is required"));
        }

        let digits = trimmed.strip_prefix(ID_PREFIX).unwrap_or(trimmed);
        digits
            .parse::<u64>()
            .map(TaskId)
            .map_err(|_| AppError::invalid_input(format!("invalid task id '{trimmed}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub content: String,
    pub content_source: SourcePercentages,
    /// Local datetime, `YYYY-MM-DDTHH:MM` with optional seconds.
    pub deadline: String,
    pub created_at: String,
    pub completed: bool,
}
