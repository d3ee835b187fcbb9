use crate::error::AppError;
use crate::model::PresencePayload;
use crate::presence::{PresenceBridge, new_participant_id};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A room shared by sessions living in the same process.
#[derive(Debug, Clone, Default)]
pub struct MemoryRoom {
    participants: Arc<Mutex<HashMap<String, PresencePayload>>>,
}

impl MemoryRoom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a participant with empty initial presence.
    pub fn join(&self) -> Result<MemoryPresence, AppError> {
        let participant_id = new_participant_id();
        self.lock()?
            .insert(participant_id.clone(), PresencePayload::default());
        tracing::debug!(participant_id = %participant_id, "joined memory room");

        Ok(MemoryPresence {
            room: self.clone(),
            participant_id,
        })
    }

    pub fn participant_count(&self) -> usize {
        self.lock().map(|participants| participants.len()).unwrap_or(0)
    }

    /// Everyone's presence except `participant_id`.
    pub fn others(&self, participant_id: &str) -> Vec<PresencePayload> {
        match self.lock() {
            Ok(participants) => participants
                .iter()
                .filter(|(id, _)| id.as_str() != participant_id)
                .map(|(_, payload)| payload.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, PresencePayload>>, AppError> {
        self.participants
            .lock()
            .map_err(|_| AppError::io("presence room lock poisoned"))
    }
}

/// One participant's handle on a [`MemoryRoom`].
#[derive(Debug)]
pub struct MemoryPresence {
    room: MemoryRoom,
    participant_id: String,
}

impl MemoryPresence {
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn others(&self) -> Vec<PresencePayload> {
        self.room.others(&self.participant_id)
    }
}

impl PresenceBridge for MemoryPresence {
    fn broadcast_presence(&self, payload: &PresencePayload) -> Result<(), AppError> {
        let mut participants = self.room.lock()?;
        match participants.get_mut(&self.participant_id) {
            Some(entry) => {
                *entry = payload.clone();
                Ok(())
            }
            None => Err(AppError::invalid_input("participant has left the room")),
        }
    }

    fn others_count(&self) -> usize {
        match self.room.lock() {
            Ok(participants) => participants
                .keys()
                .filter(|id| id.as_str() != self.participant_id)
                .count(),
            Err(_) => 0,
        }
    }

    fn leave(&self) -> Result<(), AppError> {
        self.room.lock()?.remove(&self.participant_id);
        tracing::debug!(participant_id = %self.participant_id, "left memory room");
        Ok(())
    }
}
