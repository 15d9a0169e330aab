//! End-to-end tests for the hook commands `session-log` and `self-improve`.

mod common;

use std::fs;

use common::{assert_success, stdout, Harness};
use serde_json::json;

const TRANSCRIPT: &str = concat!(
    r#"{"type":"user","message":{"role":"user","content":"Wire up the deploy script"}}"#,
    "\n",
    r#"{"type":"assistant","message":{"role":"assistant","content":[{"type":"text","text":"```bash\n$ ./scripts/deploy.sh --dry-run\n```\nDo you want a staging step as well?"}]}}"#,
    "\n",
);

#[test]
fn given_two_event_transcript_when_session_log_runs_then_markdown_lands_in_repo() {
    // GIVEN a transcript and a SessionEnd payload
    let h = Harness::new();
    let transcript = h.fx.tempdir.path().join("transcript.jsonl");
    fs::write(&transcript, TRANSCRIPT).unwrap();
    let payload = json!({
        "session_id": "sess-1",
        "cwd": h.fx.repo,
        "transcript_path": transcript,
    });

    // WHEN the hook command runs
    let output = h.run_with_stdin(
        &["session-log", "--hook-source", "agent-playbook"],
        &payload.to_string(),
    );

    // THEN one session log is written under <repo>/sessions
    assert_success(&output, "session-log");
    assert!(stdout(&output).contains("Session log written:"));
    let logs: Vec<_> = fs::read_dir(h.fx.repo.join("sessions"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(logs.len(), 1);
    let name = logs[0].file_name().to_string_lossy().into_owned();
    assert!(name.ends_with("-wire-up-the-deploy-script.md"), "{name}");

    let body = fs::read_to_string(logs[0].path()).unwrap();
    assert!(body.contains("Commands detected: 1"));
    assert!(body.contains("`./scripts/deploy.sh --dry-run`"));
    assert!(body.contains("- Do you want a staging step as well?"));
    assert!(body.contains("Session ID: sess-1"));
}

#[test]
fn given_explicit_session_dir_when_session_log_runs_then_flag_wins() {
    let h = Harness::new();
    let out_dir = h.fx.tempdir.path().join("logs");

    let output = h.run_with_stdin(
        &["session-log", "--session-dir", out_dir.to_str().unwrap()],
        "",
    );

    assert_success(&output, "session-log with empty payload");
    assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 1);
}

#[test]
fn given_git_commit_payload_when_self_improve_runs_then_commit_trigger_is_written() {
    // GIVEN a PostToolUse payload for a successful commit
    let h = Harness::new();
    let payload = json!({
        "session_id": "sess-2",
        "cwd": h.fx.repo,
        "hook_event_name": "PostToolUse",
        "tool_name": "Bash",
        "tool_input": { "command": "git commit -m \"Add deploy script\"" },
        "tool_response": { "stdout": "[main 1a2b3c4] Add deploy script\n 1 file changed, 12 insertions(+)" },
    });

    // WHEN the hook command runs
    let output = h.run_with_stdin(
        &["self-improve", "--hook-source", "agent-playbook"],
        &payload.to_string(),
    );

    // THEN an episode and a commit-created trigger are written to the memory tree
    assert_success(&output, "self-improve");
    assert!(stdout(&output).contains("commit-created"));

    let memory = h.fx.target_dir("claude").join("memory");
    let years: Vec<_> = fs::read_dir(memory.join("episodic"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(years.len(), 1);
    assert_eq!(fs::read_dir(years[0].path()).unwrap().count(), 1);

    let session: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(memory.join("working/current_session.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(session["session_id"], "sess-2");
    assert_eq!(session["tool_name"], "Bash");

    let trigger: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(memory.join("working/pending_trigger.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(trigger["event"], "commit-created");
    assert_eq!(trigger["follow_up"], json!(["create-pr"]));
}

#[test]
fn given_read_only_tool_when_self_improve_runs_then_no_trigger_is_written() {
    let h = Harness::new();
    let payload = json!({
        "session_id": "sess-3",
        "tool_name": "Read",
        "tool_input": { "file_path": "README.md" },
    });

    let output = h.run_with_stdin(&["self-improve"], &payload.to_string());

    assert_success(&output, "self-improve");
    let working = h.fx.target_dir("claude").join("memory/working");
    assert!(working.join("current_session.json").is_file());
    assert!(!working.join("pending_trigger.json").exists());
}
