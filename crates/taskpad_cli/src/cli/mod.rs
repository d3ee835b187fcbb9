use clap::{Parser, Subcommand};

/// Draft tasks together and see how much of each draft was AI generated.
///
/// Reads one command per line from stdin. Type `help` for the command list.
#[derive(Parser, Debug)]
#[command(name = "taskpad", author, version)]
pub struct Cli {
    /// Output JSON
    #[arg(long)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE")]
    pub config_override: Vec<String>,

    /// Room to join
    #[arg(long)]
    pub room: Option<String>,

    /// Name shown to other participants
    #[arg(long)]
    pub name: Option<String>,

    /// Do not share presence with anyone
    #[arg(long)]
    pub offline: bool,
}

/// A single line typed into the session.
#[derive(Parser, Debug)]
#[command(name = "taskpad", no_binary_name = true, disable_version_flag = true)]
pub struct SessionLine {
    #[command(subcommand)]
    pub command: SessionCommand,

    /// Output JSON for this command
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Replace the whole draft with new text
    ///
    /// Example: set Buy milk and eggs
    Set {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Type more text at the end of the draft
    ///
    /// Example: type before noon
    Type {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Erase the draft
    Clear,
    /// Append simulated AI content to the draft
    Generate,
    /// Set the draft deadline
    ///
    /// Example: deadline 2025-12-25T10:00
    /// Example: deadline 2025-12-25 10:00
    /// Example: deadline 2025-12-25 (Defaults to midnight)
    Deadline {
        #[arg(required_unless_present = "clear", trailing_var_arg = true)]
        datetime: Vec<String>,
        #[arg(long, conflicts_with = "datetime")]
        clear: bool,
    },
    /// Turn the draft into a task
    Commit,
    /// Check or uncheck a task
    ///
    /// Example: toggle task-1
    Toggle { id: String },
    /// Show the draft with word attribution
    Show,
    /// List committed tasks
    List,
    /// Show how many other people are online
    Others,
}

pub fn join_text(words: &[String]) -> String {
    words.join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Name,
    Room,
    Alias(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "name" => ConfigOverrideTarget::Name,
        "room" => ConfigOverrideTarget::Room,
        "aliases" | "alias" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "aliases override requires an alias name".to_string())?;
            return Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias_name.to_string()),
                value,
            });
        }
        other => return Err(format!("unknown config field '{other}'")),
    };

    if remainder.is_some() {
        return Err(format!("{canonical_field} override cannot have subfields"));
    }

    Ok(ParsedConfigOverride { target, value })
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
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
        None
    } else {
        Some(trimmed.to_string())
    }
}
