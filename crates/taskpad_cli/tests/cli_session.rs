use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskpad-{nanos}-{file_name}"))
}

fn run_session(args: &[&str], presence_dir: &Path, input: &str) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_taskpad");
    let config_path = temp_path("missing-config.json");

    let mut child = Command::new(exe)
        .args(args)
        .env("TASKPAD_CONFIG_PATH", &config_path)
        .env("TASKPAD_PRESENCE_DIR", presence_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    child.wait_with_output().expect("failed to read session output")
}

fn last_json_line(stdout: &str) -> serde_json::Value {
    let line = stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .expect("no output");
    serde_json::from_str(line).expect("json output")
}

#[test]
fn generate_reports_split_after_human_text() {
    let dir = temp_path("generate");
    let output = run_session(&["--offline"], &dir, "set Buy milk\ngenerate\nexit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Draft: 0% AI / 100% Human (2 words)"));
    assert!(stdout.contains("Draft: 80% AI / 20% Human (10 words)"));
}

#[test]
fn show_marks_ai_words() {
    let dir = temp_path("show");
    let output = run_session(&["--offline"], &dir, "set Buy milk\ngenerate\nshow\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Buy milk [This] [is] [simulated]"));
    assert!(stdout.contains("Deadline: -"));
}

#[test]
fn commit_adds_task_and_resets_draft() {
    let dir = temp_path("commit");
    let output = run_session(
        &["--offline"],
        &dir,
        "type Buy milk\ndeadline 2999-12-25 10:00\ncommit\nshow\nlist\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added task: task-1 (0% AI / 100% Human) due 2999-12-25 10:00"));
    assert!(stdout.contains("(empty draft)"));
    assert!(stdout.contains("1 task(s), 1 pending, 0 completed"));
}

#[test]
fn commit_reports_missing_fields() {
    let dir = temp_path("commit-missing");
    let output = run_session(
        &["--offline"],
        &dir,
        "commit\nset only content\ncommit\nlist\n",
    );

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stderr.contains("ERROR: missing_content"));
    assert!(stderr.contains("ERROR: missing_deadline"));
    assert!(stdout.contains("No tasks yet."));
}

#[test]
fn toggle_flips_completion() {
    let dir = temp_path("toggle");
    let output = run_session(
        &["--offline"],
        &dir,
        "set a\ndeadline 2999-01-01\ncommit\ntoggle task-1\ntoggle 1\ntoggle 1\ntoggle task-9\nlist\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stdout.matches("Completed task: task-1").count(), 2);
    assert_eq!(stdout.matches("Reopened task: task-1").count(), 1);
    assert!(stderr.contains("ERROR: invalid_input - task not found"));
    assert!(stdout.contains("1 task(s), 0 pending, 1 completed"));
}

#[test]
fn json_list_contains_task_snapshot() {
    let dir = temp_path("json");
    let output = run_session(
        &["--offline", "--json"],
        &dir,
        "generate\ndeadline 2000-01-01T08:00\ncommit\nlist\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let list = last_json_line(&stdout);
    let tasks = list.as_array().expect("task array");

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], "task-1");
    assert_eq!(tasks[0]["deadline"], "2000-01-01T08:00");
    assert_eq!(tasks[0]["content_source"]["aiGenerated"], 100);
    assert_eq!(tasks[0]["content_source"]["humanEdited"], 0);
    assert_eq!(tasks[0]["completed"], false);
    assert_eq!(tasks[0]["overdue"], true);
}

#[test]
fn alias_override_expands_commands() {
    let dir = temp_path("alias");
    let output = run_session(
        &["--offline", "--config-override", "aliases.g=generate"],
        &dir,
        "g\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Draft: 100% AI / 0% Human (8 words)"));
}

#[test]
fn others_counts_live_participants_in_room() {
    let dir = temp_path("presence");
    let room_dir = dir.join("standup");
    std::fs::create_dir_all(&room_dir).unwrap();
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    let peer = serde_json::json!({
        "schema_version": 1,
        "participant_id": "peer",
        "name": "grace",
        "presence": {
            "content": "",
            "contentSource": { "aiGenerated": 0, "humanEdited": 0 }
        },
        "updated_at_ms": now_ms
    });
    std::fs::write(room_dir.join("peer.json"), peer.to_string()).unwrap();

    let output = run_session(&["--room", "standup"], &dir, "others\nset hello\n");
    let remaining: Vec<PathBuf> = std::fs::read_dir(&room_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 other user(s) online"));
    // the session removes its own record on exit
    assert_eq!(remaining, vec![room_dir.join("peer.json")]);
}
