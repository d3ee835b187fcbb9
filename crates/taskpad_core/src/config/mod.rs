use crate::error::AppError;
use crate::model::Source;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKPAD_CONFIG_PATH";
pub const DEFAULT_ROOM: &str = "my-room";
pub const DEFAULT_PRESENCE_TTL_SECS: u64 = 30;

/// ANSI colours for AI and human words. Empty strings mean plain output.
#[derive(Debug, Clone)]
pub struct Palette {
    pub ai: &'static str,
    pub human: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn paint(&self, source: Source, text: &str) -> String {
        let colour = match source {
            Source::Ai => self.ai,
            Source::Human => self.human,
        };
        if colour.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", colour, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match canonical_theme_name_option(theme) {
        Some(ref name) if name == "noir" => Palette {
            ai: "\x1b[38;5;208m",
            human: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
        Some(ref name) if name == "solarized" => Palette {
            ai: "\x1b[38;5;33m",
            human: "\x1b[38;5;64m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            ai: "",
            human: "",
            reset: "",
        },
    }
}

fn canonical_theme_name_option(theme: Option<&str>) -> Option<String> {
    theme.and_then(|value| canonical_theme_name(value))
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        return Some("default".into());
    }

    match trimmed {
        "vanilla" | "light" => Some("default".to_string()),
        "dark" | "dark_mode" | "darkmode" => Some("noir".to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    /// Display name shared with the room.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub presence_dir: Option<String>,
    #[serde(default)]
    pub presence_ttl_secs: Option<u64>,
}

impl Config {
    pub fn room_or_default(&self) -> &str {
        self.room
            .as_deref()
            .map(str::trim)
            .filter(|room| !room.is_empty())
            .unwrap_or(DEFAULT_ROOM)
    }

    pub fn presence_ttl(&self) -> Duration {
        Duration::from_secs(
            self.presence_ttl_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_PRESENCE_TTL_SECS),
        )
    }

    /// Expands `line` when its first word is a configured alias.
    pub fn expand_alias(&self, line: &str) -> String {
        let trimmed = line.trim_start();
        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, Some(rest)),
            None => (trimmed, None),
        };

        match self.aliases.get(head) {
            Some(expansion) => match rest {
                Some(rest) => format!("{expansion} {rest}"),
                None => expansion.clone(),
            },
            None => line.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub aliases: HashMap<String, String>,
    pub name: Option<String>,
    pub room: Option<String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskpad")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskpad")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    Ok(normalize_config_theme(config))
}

fn normalize_config_theme(mut config: Config) -> Config {
    config.theme = normalize_theme_value(config.theme);
    config
}

fn normalize_theme_value(value: Option<String>) -> Option<String> {
    value.and_then(|name| canonical_theme_name(&name))
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_ref() {
        if let Some(normalized) = canonical_theme_name(theme) {
            merged.theme = Some(normalized);
        }
    }

    if let Some(name) = overrides.name.as_ref()
        && !name.trim().is_empty()
    {
        merged.name = Some(name.trim().to_string());
    }

    if let Some(room) = overrides.room.as_ref()
        && !room.trim().is_empty()
    {
        merged.room = Some(room.trim().to_string());
    }

    for (alias, value) in overrides.aliases.iter() {
        merged.aliases.insert(alias.clone(), value.clone());
    }

    merged
}
