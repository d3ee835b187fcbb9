use crate::error::AppError;
use crate::model::PresencePayload;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
const PRESENCE_DIR_ENV_VAR: &str = "TASKPAD_PRESENCE_DIR";
const RECORD_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

#[derive(Debug, Serialize, Deserialize)]
struct StoredPresence {
    schema_version: u32,
    #[serde(flatten)]
    record: PresenceRecord,
}

/// One participant's entry in a room directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub participant_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub presence: PresencePayload,
    pub updated_at_ms: i64,
}

/// Root directory holding one sub-directory per room.
pub fn presence_root(configured: Option<&str>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(PRESENCE_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = configured
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("taskpad").join("rooms"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskpad")
            .join("rooms"))
    }
}

pub fn room_dir(root: &Path, room: &str) -> Result<PathBuf, AppError> {
    let trimmed = room.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if !valid {
        return Err(AppError::invalid_input(
            "room names may only contain letters, digits, '-' and '_'",
        ));
    }
    Ok(root.join(trimmed))
}

pub fn record_path(room_dir: &Path, participant_id: &str) -> PathBuf {
    room_dir.join(format!("{participant_id}.{RECORD_EXTENSION}"))
}

pub fn load_record(path: &Path) -> Result<PresenceRecord, AppError> {
    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let stored: StoredPresence =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if stored.schema_version != SCHEMA_VERSION {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    Ok(stored.record)
}

/// Every readable record in the room. Files that fail to load are skipped.
pub fn load_room(room_dir: &Path) -> Result<Vec<PresenceRecord>, AppError> {
    if !room_dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(room_dir).map_err(|err| AppError::io(err.to_string()))?;
    let mut records = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| AppError::io(err.to_string()))?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
            continue;
        }

        match load_record(&path) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "skipping presence record");
            }
        }
    }

    Ok(records)
}

/// Writes `record` to a hidden temp file next to `path`, then renames it
/// into place so readers never see a partial record.
pub fn save_record(path: &Path, record: &PresenceRecord) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let stored = StoredPresence {
        schema_version: SCHEMA_VERSION,
        record: record.clone(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;

    let temp_path = temp_record_path(path);
    let written = write_private(&temp_path, content.as_bytes())
        .and_then(|()| std::fs::rename(&temp_path, path));
    if let Err(err) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(AppError::io(err.to_string()));
    }

    Ok(())
}

fn temp_record_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.{TEMP_EXTENSION}"))
}

fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

pub fn remove_record(path: &Path) -> Result<(), AppError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(AppError::io(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        PresenceRecord, SCHEMA_VERSION, load_record, load_room, record_path, remove_record,
        room_dir, save_record,
    };
    use crate::model::{PresencePayload, SourcePercentages};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskpad-{nanos}-{name}"))
    }

    fn record(id: &str) -> PresenceRecord {
        PresenceRecord {
            participant_id: id.to_string(),
            name: Some("ada".to_string()),
            presence: PresencePayload {
                content: "draft".to_string(),
                content_source: SourcePercentages::from_counts(0, 1),
            },
            updated_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn save_and_load_record() {
        let dir = temp_dir("record");
        let path = record_path(&dir, "p1");
        save_record(&path, &record("p1")).unwrap();

        let loaded = load_record(&path).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded, record("p1"));
        assert_eq!(raw["schema_version"], SCHEMA_VERSION);
        assert_eq!(raw["presence"]["contentSource"]["humanEdited"], 100);
    }

    #[test]
    fn save_record_replaces_in_place_without_leftovers() {
        let dir = temp_dir("replace");
        let path = record_path(&dir, "p1");
        save_record(&path, &record("p1")).unwrap();

        let mut updated = record("p1");
        updated.updated_at_ms += 5_000;
        save_record(&path, &updated).unwrap();

        let loaded = load_record(&path).unwrap();
        let entries: Vec<PathBuf> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            fs::metadata(&path).unwrap().permissions().mode() & 0o777
        };
        fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded, updated);
        assert_eq!(entries, vec![path]);
        #[cfg(unix)]
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn load_room_skips_malformed_and_foreign_files() {
        let dir = temp_dir("room");
        save_record(&record_path(&dir, "p1"), &record("p1")).unwrap();
        fs::write(dir.join("broken.json"), "{ nope").unwrap();
        fs::write(dir.join("notes.txt"), "hello").unwrap();

        let records = load_room(&dir).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].participant_id, "p1");
    }

    #[test]
    fn load_room_missing_dir_is_empty() {
        assert!(load_room(&temp_dir("absent")).unwrap().is_empty());
    }

    #[test]
    fn rejects_other_schema_versions() {
        let dir = temp_dir("schema");
        fs::create_dir_all(&dir).unwrap();
        let path = record_path(&dir, "p1");
        let mut raw = serde_json::to_value(record("p1")).unwrap();
        raw["schema_version"] = serde_json::json!(SCHEMA_VERSION + 1);
        fs::write(&path, raw.to_string()).unwrap();

        let err = load_record(&path).unwrap_err();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn remove_record_tolerates_missing_file() {
        let dir = temp_dir("remove");
        assert!(remove_record(&record_path(&dir, "ghost")).is_ok());
    }

    #[test]
    fn room_dir_rejects_path_tricks() {
        let root = temp_dir("names");
        assert!(room_dir(&root, "my-room").is_ok());
        assert_eq!(room_dir(&root, "../etc").unwrap_err().code(), "invalid_input");
        assert_eq!(room_dir(&root, " ").unwrap_err().code(), "invalid_input");
    }
}
