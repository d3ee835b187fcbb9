//! Presence bridges: how a session tells the room about its draft and learns
//! how many others are connected.

use crate::error::AppError;
use crate::model::PresencePayload;

mod file;
mod memory;

pub use file::FilePresence;
pub use memory::{MemoryPresence, MemoryRoom};

pub trait PresenceBridge {
    /// Shares the local draft. Best effort: callers log failures and carry on.
    fn broadcast_presence(&self, payload: &PresencePayload) -> Result<(), AppError>;

    /// Number of other participants currently in the room.
    fn others_count(&self) -> usize;

    fn leave(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Presence for a session with nobody else around.
pub struct NoopPresence;

impl PresenceBridge for NoopPresence {
    fn broadcast_presence(&self, _payload: &PresencePayload) -> Result<(), AppError> {
        Ok(())
    }

    fn others_count(&self) -> usize {
        0
    }
}

pub fn new_participant_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
