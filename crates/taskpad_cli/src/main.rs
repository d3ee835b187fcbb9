use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskpad_cli::cli::{
    Cli, ConfigOverrideTarget, SessionCommand, SessionLine, join_text, parse_config_override,
};
use taskpad_core::config::{self, Config, ConfigOverrides, Palette, palette_for_theme};
use taskpad_core::deadline::{deadline_passed, display_deadline};
use taskpad_core::error::AppError;
use taskpad_core::generate::MockGenerator;
use taskpad_core::model::{Source, Task, TaskId};
use taskpad_core::presence::{FilePresence, NoopPresence, PresenceBridge};
use taskpad_core::session::EditorSession;
use taskpad_core::storage::presence_store;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "TASKPAD_LOG";

struct App {
    session: EditorSession,
    palette: Palette,
    json: bool,
}

#[derive(Tabled)]
struct TaskRow {
    id: String,
    done: &'static str,
    deadline: String,
    source: String,
    content: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        eprintln!("WARNING: {}", err);
    }

    let mut overrides = ConfigOverrides {
        name: cli.name.clone(),
        room: cli.room.clone(),
        ..ConfigOverrides::default()
    };

    for raw in &cli.config_override {
        let parsed = parse_config_override(raw).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Name => overrides.name = Some(parsed.value),
            ConfigOverrideTarget::Room => overrides.room = Some(parsed.value),
            ConfigOverrideTarget::Alias(alias) => {
                overrides.aliases.insert(alias, parsed.value);
            }
        }
    }

    Ok(config::merge_overrides(&loaded.config, &overrides))
}

fn connect_presence(cli: &Cli, config: &Config) -> Box<dyn PresenceBridge> {
    if cli.offline {
        return Box::new(NoopPresence);
    }

    let joined = presence_store::presence_root(config.presence_dir.as_deref()).and_then(|root| {
        FilePresence::join(
            &root,
            config.room_or_default(),
            config.name.clone(),
            config.presence_ttl(),
        )
    });

    match joined {
        Ok(presence) => Box::new(presence),
        Err(err) => {
            tracing::warn!(error = %err, "presence unavailable, continuing offline");
            Box::new(NoopPresence)
        }
    }
}

fn status_label(task: &Task) -> &'static str {
    if task.completed { "[x]" } else { "[ ]" }
}

fn print_draft_summary(app: &App) {
    let draft = app.session.draft();
    if app.json {
        println!("{}", serde_json::to_string(&draft.presence()).unwrap_or_default());
    } else {
        println!(
            "Draft: {} ({} words)",
            draft.content_source(),
            draft.word_history().len()
        );
    }
}

fn print_draft(app: &App) {
    let draft = app.session.draft();
    let words = app.session.annotated_words();

    if app.json {
        let json = serde_json::json!({
            "content": draft.content(),
            "deadline": draft.deadline(),
            "contentSource": draft.content_source(),
            "words": words,
        });
        println!("{}", json);
        return;
    }

    let colourless = app.palette.ai.is_empty();
    let rendered: Vec<String> = words
        .iter()
        .map(|annotated| match annotated.source {
            Source::Ai if colourless => format!("[{}]", annotated.word),
            source => app.palette.paint(source, &annotated.word),
        })
        .collect();

    println!("Content: {}", draft.content_source());
    if rendered.is_empty() {
        println!("(empty draft)");
    } else {
        println!("{}", rendered.join(" "));
        if colourless {
            println!("([word] = AI)");
        }
    }
    let deadline = if draft.deadline().is_empty() {
        "-"
    } else {
        draft.deadline()
    };
    println!("Deadline: {}", deadline);
}

fn task_json(task: &Task) -> Result<serde_json::Value, AppError> {
    let mut json = serde_json::to_value(task)?;
    json["id"] = serde_json::Value::String(task.id.to_string());
    json["overdue"] = serde_json::Value::Bool(!task.completed && deadline_passed(&task.deadline)?);
    Ok(json)
}

fn print_tasks(app: &App) -> Result<(), AppError> {
    let tasks = app.session.tasks();

    if app.json {
        let mut payload = Vec::with_capacity(tasks.len());
        for task in tasks.iter() {
            payload.push(task_json(task)?);
        }
        println!("{}", serde_json::Value::Array(payload));
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks yet.");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(tasks.len());
    for task in tasks.iter() {
        let mut deadline = display_deadline(&task.deadline)?;
        if !task.completed && deadline_passed(&task.deadline)? {
            deadline.push_str(" (overdue)");
        }
        rows.push(TaskRow {
            id: task.id.to_string(),
            done: status_label(task),
            deadline,
            source: task.content_source.to_string(),
            content: task.content.clone(),
        });
    }

    println!("{}", Table::new(rows).with(Style::psql()));
    println!(
        "{} task(s), {} pending, {} completed",
        tasks.len(),
        tasks.pending_count(),
        tasks.completed_count()
    );
    Ok(())
}

fn print_others(app: &App) {
    let count = app.session.others_count();
    if app.json {
        println!("{}", serde_json::json!({ "others": count }));
    } else {
        println!("{} other user(s) online", count);
    }
}

fn run_command(app: &mut App, command: SessionCommand) -> Result<(), AppError> {
    match command {
        SessionCommand::Set { text } => {
            app.session
                .handle_content_change(&join_text(&text), Source::Human);
            print_draft_summary(app);
        }
        SessionCommand::Type { text } => {
            let typed = join_text(&text);
            let content = app.session.draft().with_appended(&typed);
            app.session.handle_content_change(&content, Source::Human);
            print_draft_summary(app);
        }
        SessionCommand::Clear => {
            app.session.handle_content_change("", Source::Human);
            print_draft_summary(app);
        }
        SessionCommand::Generate => {
            app.session.generate_ai_content()?;
            print_draft_summary(app);
        }
        SessionCommand::Deadline { datetime, clear } => {
            let value = if clear {
                String::new()
            } else {
                join_text(&datetime)
            };
            app.session.set_deadline(&value);
            let deadline = app.session.draft().deadline();
            if app.json {
                println!("{}", serde_json::json!({ "deadline": deadline }));
            } else if deadline.is_empty() {
                println!("Deadline cleared");
            } else {
                println!("Deadline set: {}", deadline);
            }
        }
        SessionCommand::Commit => {
            let task = app.session.commit()?;
            if app.json {
                println!("{}", task_json(&task)?);
            } else {
                println!(
                    "Added task: {} ({}) due {}",
                    task.id,
                    task.content_source,
                    display_deadline(&task.deadline)?
                );
            }
        }
        SessionCommand::Toggle { id } => {
            let id: TaskId = id.parse()?;
            let task = app
                .session
                .toggle_completion(id)
                .ok_or_else(|| AppError::invalid_input("task not found"))?;
            if app.json {
                println!("{}", task_json(&task)?);
            } else if task.completed {
                println!("Completed task: {}", task.id);
            } else {
                println!("Reopened task: {}", task.id);
            }
        }
        SessionCommand::Show => print_draft(app),
        SessionCommand::List => print_tasks(app)?,
        SessionCommand::Others => print_others(app),
    }

    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = SessionLine::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_interactive(app: &mut App, config: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let expanded = config.expand_alias(line);
        let args = match split_command_line(&expanded) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let parsed = match SessionLine::try_parse_from(args) {
            Ok(parsed) => parsed,
            Err(err) if err.kind() == ErrorKind::DisplayHelp => {
                println!("{}", err);
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        let json = app.json;
        app.json = json || parsed.json;
        let result = run_command(app, parsed.command);
        app.json = json;

        if let Err(err) = result {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = resolve_config(&cli)?;
    let presence = connect_presence(&cli, &config);
    let session = EditorSession::new(presence, Box::new(MockGenerator));
    let mut app = App {
        session,
        palette: palette_for_theme(config.theme.as_deref()),
        json: cli.json,
    };

    if !app.json {
        let room = if cli.offline {
            "offline".to_string()
        } else {
            format!("room {}", config.room_or_default())
        };
        println!(
            "taskpad ({}), {} other user(s) online. Type `help` for commands.",
            room,
            app.session.others_count()
        );
    }

    let result = run_interactive(&mut app, &config);
    app.session.close();
    result
}

fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit();
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
