//! End-to-end tests for `agent-playbook skills ...`.

mod common;

use std::env;
use std::fs;
use std::process::Command;

use anyhow::{Context, Result};
use common::{assert_exit_code, assert_success, stderr, stdout, Harness};
use scopeguard::guard;

#[test]
fn given_three_targets_when_listing_all_as_json_then_every_skill_is_reported() {
    // GIVEN one skill in each global target root
    let h = Harness::new();
    h.fx.create_installed_skill("claude", "alpha").unwrap();
    h.fx.create_installed_skill("codex", "bravo").unwrap();
    h.fx.create_installed_skill("gemini", "charlie").unwrap();

    // WHEN listing every global target as JSON
    let output = h.run(&[
        "skills", "list", "--scope", "global", "--target", "all", "--format", "json",
    ]);

    // THEN all three names are present
    assert_success(&output, "skills list");
    let records: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let names: Vec<&str> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
    assert!(records
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["managed"] == serde_json::json!(false)));
}

#[test]
fn given_skill_path_when_added_as_copy_then_state_records_it() {
    // GIVEN a skill directory outside any target
    let h = Harness::new();
    let delta = h.fx.create_catalog_skill("delta", "Delta skill").unwrap();

    // WHEN it is added by path in copy mode
    let output = h.run(&[
        "skills",
        "add",
        delta.to_str().unwrap(),
        "--scope",
        "global",
        "--target",
        "claude",
        "--copy",
        "--overwrite",
    ]);

    // THEN the copy exists and the state holds exactly one matching entry
    assert_success(&output, "skills add");
    let installed = h.fx.skills_dir("claude").join("delta");
    assert!(installed.join("SKILL.md").is_file());
    assert!(!fs::symlink_metadata(&installed).unwrap().file_type().is_symlink());

    let state = h.state();
    let skills = state["skills"].as_array().unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0]["name"], "delta");
    assert_eq!(skills[0]["scope"], "global");
    assert_eq!(skills[0]["target"], "claude");
    assert_eq!(skills[0]["mode"], "copy");
    assert_eq!(skills[0]["disabled"], false);

    // AND list shows it as managed
    let listed = h.run(&["skills", "list", "--target", "claude", "--format", "json"]);
    let records: serde_json::Value = serde_json::from_str(&stdout(&listed)).unwrap();
    assert_eq!(records[0]["managed"], true);
}

#[test]
fn given_installed_skill_when_disabled_then_enabled_then_active_path_returns() {
    // GIVEN a hand-installed skill
    let h = Harness::new();
    h.fx.create_installed_skill("claude", "echo").unwrap();
    let skills = h.fx.skills_dir("claude");

    // WHEN it is disabled
    let output = h.run(&[
        "skills", "disable", "echo", "--scope", "global", "--target", "claude", "--overwrite",
    ]);

    // THEN it moves under .disabled
    assert_success(&output, "skills disable");
    assert!(skills.join(".disabled/echo/SKILL.md").is_file());
    assert!(!skills.join("echo").exists());

    // WHEN it is enabled again
    let output = h.run(&[
        "skills", "enable", "echo", "--scope", "global", "--target", "claude", "--overwrite",
    ]);

    // THEN the active path is restored and the disabled copy is gone
    assert_success(&output, "skills enable");
    assert!(skills.join("echo/SKILL.md").is_file());
    assert!(!skills.join(".disabled/echo").exists());
}

#[test]
fn given_unknown_scope_when_listing_then_warns_and_uses_default() {
    let h = Harness::new();
    h.fx.create_installed_skill("codex", "alpha").unwrap();

    let output = h.run(&["skills", "list", "--scope", "galaxy"]);

    assert_success(&output, "skills list with unknown scope");
    assert!(stderr(&output).contains("unknown scope 'galaxy'"));
    assert!(stdout(&output).contains("alpha"));
}

#[test]
fn given_same_name_in_two_targets_when_removing_without_filters_then_fails_as_ambiguous() {
    let h = Harness::new();
    h.fx.create_installed_skill("claude", "twin").unwrap();
    h.fx.create_installed_skill("codex", "twin").unwrap();

    let output = h.run(&["skills", "remove", "twin", "--force"]);

    assert_exit_code(&output, 1, "ambiguous remove should exit 1");
    assert!(stderr(&output).contains("several locations"));
    assert!(h.fx.skills_dir("claude").join("twin").exists());
    assert!(h.fx.skills_dir("codex").join("twin").exists());
}

#[test]
fn given_unknown_skill_when_adding_then_fails_with_available_names() {
    let h = Harness::new();

    let output = h.run(&["skills", "add", "nope", "--target", "claude"]);

    assert_exit_code(&output, 1, "adding an unknown skill should exit 1");
    assert!(stderr(&output).contains("skill-router"));
}

#[test]
fn given_unmanaged_skill_when_running_doctor_then_exit_code_is_one() {
    // GIVEN a clean home
    let h = Harness::new();
    let clean = h.run(&["skills", "doctor"]);
    assert_success(&clean, "doctor on a clean home");
    assert!(stdout(&clean).contains("No issues found."));

    // WHEN a skill appears that agent-playbook does not manage
    h.fx.create_installed_skill("gemini", "stray").unwrap();
    let output = h.run(&["skills", "doctor"]);

    // THEN doctor reports it and fails
    assert_exit_code(&output, 1, "doctor with issues should exit 1");
    assert!(stdout(&output).contains("[unmanaged]"));
}

#[test]
fn given_managed_skill_when_syncing_twice_then_second_run_is_in_sync() {
    let h = Harness::new();
    h.fx.create_catalog_skill("foxtrot", "F").unwrap();
    assert_success(
        &h.run(&["skills", "add", "foxtrot", "--target", "codex", "--copy"]),
        "skills add",
    );
    fs::rename(
        h.fx.skills_dir("codex").join("foxtrot"),
        {
            let disabled = h.fx.skills_dir("codex").join(".disabled");
            fs::create_dir_all(&disabled).unwrap();
            disabled.join("foxtrot")
        },
    )
    .unwrap();

    let first = h.run(&["skills", "sync"]);
    let second = h.run(&["skills", "sync"]);

    assert_success(&first, "first sync");
    assert!(stdout(&first).contains("marked foxtrot (global/codex) disabled"));
    assert_success(&second, "second sync");
    assert!(stdout(&second).contains("State already in sync."));
    assert_eq!(h.state()["skills"][0]["disabled"], true);
}

#[test]
fn given_export_when_importing_into_fresh_state_then_skills_are_reinstalled() {
    let h = Harness::new();
    h.fx.create_catalog_skill("golf", "G").unwrap();
    assert_success(
        &h.run(&["skills", "add", "golf", "--target", "claude", "--copy"]),
        "skills add",
    );
    let export = h.fx.tempdir.path().join("export.json");
    let exported = h.run(&["skills", "export", "--output", export.to_str().unwrap()]);
    assert_success(&exported, "skills export");
    assert!(stdout(&exported).contains("Exported 1 entries"));

    fs::remove_dir_all(h.fx.skills_dir("claude").join("golf")).unwrap();
    fs::remove_file(h.fx.state_path()).unwrap();

    let imported = h.run(&["skills", "import", export.to_str().unwrap()]);

    assert_success(&imported, "skills import");
    assert!(h.fx.skills_dir("claude").join("golf/SKILL.md").is_file());
    assert_eq!(h.state()["skills"][0]["name"], "golf");
}

#[test]
fn given_dry_run_when_adding_then_nothing_is_written() {
    let h = Harness::new();
    h.fx.create_catalog_skill("hotel", "H").unwrap();

    let output = h.run(&["skills", "add", "hotel", "--target", "claude", "--copy", "--dry-run"]);

    assert_success(&output, "dry-run add");
    assert!(stdout(&output).contains("[dry-run] copied hotel"));
    assert!(!h.fx.skills_dir("claude").join("hotel").exists());
    assert!(!h.fx.state_path().exists());
}

#[test]
fn given_home_without_overrides_when_adding_then_default_claude_dir_is_used() -> Result<()> {
    // GIVEN HOME points at a temp dir and no directory overrides are set
    let _lock = playbook_test_utils::env_guard();
    let original_home = env::var("HOME").ok();
    let tmp = tempfile::tempdir()?;

    // Restore HOME when test exits (even on panic)
    let _home_guard = guard(original_home, |original_home| match original_home {
        Some(home) => env::set_var("HOME", home),
        None => env::remove_var("HOME"),
    });
    env::set_var("HOME", tmp.path());

    let catalog = tmp.path().join("catalog/skills");
    playbook_test_utils::write_skill(&catalog, "skill-router", "# router")?;
    playbook_test_utils::write_skill(&catalog, "india", "# india")?;

    // WHEN the user runs `agent-playbook skills add india --target claude --copy`
    let output = Command::new(env!("CARGO_BIN_EXE_agent-playbook"))
        .current_dir(tmp.path())
        .env("AGENT_PLAYBOOK_SKILLS_DIR", &catalog)
        .env_remove("AGENT_PLAYBOOK_CLAUDE_DIR")
        .env_remove("AGENT_PLAYBOOK_CODEX_DIR")
        .env_remove("AGENT_PLAYBOOK_GEMINI_DIR")
        .env_remove("AGENT_PLAYBOOK_STATE")
        .args(["skills", "add", "india", "--target", "claude", "--copy"])
        .output()
        .context("Failed to execute skills add")?;
    assert_success(&output, "skills add");

    // THEN the skill and the state land under ~/.claude
    assert!(tmp.path().join(".claude/skills/india/SKILL.md").exists());
    assert!(tmp
        .path()
        .join(".claude/agent-playbook/state.json")
        .exists());
    Ok(())
}

#[test]
fn given_blocked_codex_dir_when_adding_to_both_then_claude_install_is_kept_and_exit_is_one() {
    // GIVEN the codex skills directory is a plain file
    let h = Harness::new();
    h.fx.create_catalog_skill("juliet", "J").unwrap();
    let codex_skills = h.fx.skills_dir("codex");
    fs::remove_dir_all(&codex_skills).unwrap();
    fs::write(&codex_skills, "").unwrap();

    // WHEN adding to claude and codex
    let output = h.run(&["skills", "add", "juliet", "--target", "both", "--copy"]);

    // THEN the failure is reported and the claude install is recorded
    assert_exit_code(&output, 1, "partial add should exit 1");
    assert!(stdout(&output).contains("copied juliet (global/claude)"));
    assert!(stdout(&output).contains("failed juliet (global/codex)"));
    assert!(stderr(&output).contains("1 item(s) failed"));
    let state = h.state();
    let skills = state["skills"].as_array().unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0]["target"], "claude");
}
