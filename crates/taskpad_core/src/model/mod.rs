mod presence;
mod source;
mod task;

pub use presence::PresencePayload;
pub use source::{AnnotatedWord, Source, SourcePercentages, WordRecord};
pub use task::{Task, TaskId};
