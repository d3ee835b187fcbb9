use crate::clock::now_millis;
use crate::error::AppError;
use crate::model::PresencePayload;
use crate::presence::{PresenceBridge, new_participant_id};
use crate::storage::presence_store::{self, PresenceRecord};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const HEARTBEATS_PER_TTL: u32 = 3;
const MIN_HEARTBEAT: Duration = Duration::from_millis(10);

/// Presence shared through a room directory, one JSON record per
/// participant. Records older than the TTL count as disconnected, so a
/// background heartbeat keeps this participant's record fresh until
/// `leave` or drop.
#[derive(Debug)]
pub struct FilePresence {
    room_dir: PathBuf,
    own: Arc<OwnRecord>,
    ttl: Duration,
    heartbeat: Mutex<Option<Heartbeat>>,
}

/// This participant's record. The lock also serializes writers.
#[derive(Debug)]
struct OwnRecord {
    path: PathBuf,
    participant_id: String,
    name: Option<String>,
    payload: Mutex<PresencePayload>,
}

impl OwnRecord {
    fn write(&self) -> Result<(), AppError> {
        let payload = self
            .payload
            .lock()
            .map_err(|_| AppError::io("presence state lock poisoned"))?;
        self.save(&payload)
    }

    fn replace(&self, next: &PresencePayload) -> Result<(), AppError> {
        let mut payload = self
            .payload
            .lock()
            .map_err(|_| AppError::io("presence state lock poisoned"))?;
        *payload = next.clone();
        self.save(&payload)
    }

    fn save(&self, payload: &PresencePayload) -> Result<(), AppError> {
        let record = PresenceRecord {
            participant_id: self.participant_id.clone(),
            name: self.name.clone(),
            presence: payload.clone(),
            updated_at_ms: now_millis(),
        };
        presence_store::save_record(&self.path, &record)
    }
}

#[derive(Debug)]
struct Heartbeat {
    stop: mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

impl Heartbeat {
    fn start(own: Arc<OwnRecord>, interval: Duration) -> Result<Self, AppError> {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("taskpad-presence".to_string())
            .spawn(move || {
                while let Err(RecvTimeoutError::Timeout) = stopped.recv_timeout(interval) {
                    if let Err(err) = own.write() {
                        tracing::warn!(error = %err, "presence heartbeat failed");
                    }
                }
            })
            .map_err(|err| AppError::io(err.to_string()))?;

        Ok(Self { stop, handle })
    }

    fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            tracing::warn!("presence heartbeat thread panicked");
        }
    }
}

impl FilePresence {
    /// Joins `room` under `root`, writing the empty initial presence and
    /// starting the heartbeat.
    pub fn join(
        root: &Path,
        room: &str,
        name: Option<String>,
        ttl: Duration,
    ) -> Result<Self, AppError> {
        let room_dir = presence_store::room_dir(root, room)?;
        let participant_id = new_participant_id();
        let own = Arc::new(OwnRecord {
            path: presence_store::record_path(&room_dir, &participant_id),
            participant_id,
            name,
            payload: Mutex::new(PresencePayload::default()),
        });
        own.write()?;

        let interval = (ttl / HEARTBEATS_PER_TTL).max(MIN_HEARTBEAT);
        let heartbeat = match Heartbeat::start(Arc::clone(&own), interval) {
            Ok(heartbeat) => heartbeat,
            Err(err) => {
                let _ = presence_store::remove_record(&own.path);
                return Err(err);
            }
        };
        tracing::info!(
            room = %room,
            participant_id = %own.participant_id,
            heartbeat_ms = interval.as_millis() as u64,
            "joined presence room"
        );

        Ok(Self {
            room_dir,
            own,
            ttl,
            heartbeat: Mutex::new(Some(heartbeat)),
        })
    }

    pub fn participant_id(&self) -> &str {
        &self.own.participant_id
    }

    pub fn room_dir(&self) -> &Path {
        &self.room_dir
    }

    /// Live records of everyone else in the room.
    pub fn others(&self) -> Result<Vec<PresenceRecord>, AppError> {
        let now = now_millis();
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let records = presence_store::load_room(&self.room_dir)?;

        Ok(records
            .into_iter()
            .filter(|record| record.participant_id != self.own.participant_id)
            .filter(|record| now.saturating_sub(record.updated_at_ms) <= ttl_ms)
            .collect())
    }

    fn stop_heartbeat(&self) -> Result<(), AppError> {
        let heartbeat = self
            .heartbeat
            .lock()
            .map_err(|_| AppError::io("presence heartbeat lock poisoned"))?
            .take();
        if let Some(heartbeat) = heartbeat {
            heartbeat.stop();
        }
        Ok(())
    }
}

impl PresenceBridge for FilePresence {
    fn broadcast_presence(&self, payload: &PresencePayload) -> Result<(), AppError> {
        self.own.replace(payload)
    }

    fn others_count(&self) -> usize {
        match self.others() {
            Ok(others) => others.len(),
            Err(err) => {
                tracing::warn!(error = %err, "could not read presence room");
                0
            }
        }
    }

    fn leave(&self) -> Result<(), AppError> {
        self.stop_heartbeat()?;
        presence_store::remove_record(&self.own.path)?;
        tracing::info!(participant_id = %self.own.participant_id, "left presence room");
        Ok(())
    }
}

impl Drop for FilePresence {
    fn drop(&mut self) {
        if let Ok(slot) = self.heartbeat.get_mut()
            && let Some(heartbeat) = slot.take()
        {
            heartbeat.stop();
        }
    }
}
