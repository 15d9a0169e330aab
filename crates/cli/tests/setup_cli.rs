//! End-to-end tests for `init`, `status`, `doctor`, `repair`, and `uninstall`.

mod common;

use std::fs;

use common::{assert_exit_code, assert_success, stderr, stdout, Harness};

const MARKER: &str = "--hook-source agent-playbook";

#[test]
fn given_catalog_when_init_status_uninstall_then_setup_round_trips() {
    // GIVEN a catalog with two skills and an existing Codex config
    let h = Harness::new();
    h.fx.create_catalog_skill("alpha", "Alpha").unwrap();
    let codex_config = h.fx.target_dir("codex").join("config.toml");
    fs::write(&codex_config, "model = \"o3\"\n").unwrap();

    // WHEN init installs into claude and codex by copy
    let init = h.run(&["init", "--copy"]);

    // THEN every catalog skill lands in both targets and the hooks are registered
    assert_success(&init, "init");
    for target in ["claude", "codex"] {
        assert!(h.fx.skills_dir(target).join("alpha/SKILL.md").is_file());
        assert!(h.fx.skills_dir(target).join("skill-router/SKILL.md").is_file());
    }
    assert!(!h.fx.skills_dir("gemini").join("alpha").exists());
    assert_eq!(h.state()["skills"].as_array().unwrap().len(), 4);

    let settings_path = h.fx.target_dir("claude").join("settings.json");
    let settings: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&settings_path).unwrap()).unwrap();
    let session_end = settings["hooks"]["SessionEnd"][0]["hooks"][0]["command"]
        .as_str()
        .unwrap();
    assert!(session_end.contains("session-log") && session_end.contains(MARKER));
    assert!(settings["agentPlaybook"]["version"].is_string());

    let config = fs::read_to_string(&codex_config).unwrap();
    assert!(config.starts_with("model = \"o3\"\n"));
    assert!(config.contains("[agent_playbook]"));

    // AND a second init changes nothing
    let again = h.run(&["init", "--copy"]);
    assert_success(&again, "second init");
    assert!(stdout(&again).contains("Claude hooks: up to date"));
    assert!(stdout(&again).contains("Codex config: up to date"));

    // WHEN status is requested
    let status = h.run(&["status"]);
    assert_success(&status, "status");
    let text = stdout(&status);
    assert!(text.contains("Hooks installed: yes"));
    assert!(text.contains("Codex block present: yes"));
    assert!(text.contains("  claude: 2 active, 0 disabled"));
    assert!(text.contains("Managed entries: 4"));

    // WHEN uninstall runs
    let uninstall = h.run(&["uninstall"]);

    // THEN managed skills, hooks, and the Codex block are gone; user config stays
    assert_success(&uninstall, "uninstall");
    assert!(!h.fx.skills_dir("claude").join("alpha").exists());
    assert!(!h.fx.skills_dir("codex").join("skill-router").exists());
    assert!(h.state()["skills"].as_array().unwrap().is_empty());
    assert!(!fs::read_to_string(&settings_path).unwrap().contains(MARKER));
    assert_eq!(fs::read_to_string(&codex_config).unwrap(), "model = \"o3\"\n");
}

#[test]
fn given_no_hooks_flag_when_init_then_settings_are_untouched() {
    let h = Harness::new();

    let output = h.run(&["init", "--copy", "--no-hooks", "--target", "claude"]);

    assert_success(&output, "init --no-hooks");
    assert!(stdout(&output).contains("Hooks: skipped"));
    assert!(!h.fx.target_dir("claude").join("settings.json").exists());
    assert!(!h.fx.target_dir("codex").join("config.toml").exists());
}

#[test]
fn given_invalid_settings_when_init_then_file_is_kept_with_warning() {
    let h = Harness::new();
    let settings_path = h.fx.target_dir("claude").join("settings.json");
    fs::write(&settings_path, "{ broken").unwrap();

    let output = h.run(&["init", "--copy", "--target", "claude"]);

    assert_success(&output, "init with invalid settings");
    assert!(stderr(&output).contains("left untouched"));
    assert_eq!(fs::read_to_string(&settings_path).unwrap(), "{ broken");
}

#[test]
fn given_project_flag_when_init_then_installs_under_repo() {
    let h = Harness::new();

    let output = h.run(&["init", "--project", "--copy", "--target", "gemini", "--dry-run"]);

    assert_success(&output, "project init dry-run");
    assert!(stdout(&output).contains("Dry run: no changes written."));
    assert!(!h.fx.repo.join(".gemini").exists());

    let output = h.run(&["init", "--project", "--copy", "--target", "gemini"]);
    assert_success(&output, "project init");
    assert!(h
        .fx
        .repo
        .join(".gemini/skills/skill-router/SKILL.md")
        .is_file());
}

#[test]
fn given_fresh_home_when_doctor_runs_then_missing_setup_fails_the_check() {
    let h = Harness::new();

    let output = h.run(&["doctor"]);

    assert_exit_code(&output, 1, "doctor before init should exit 1");
    assert!(stdout(&output).contains("Hooks installed: no"));
    let err = stderr(&output);
    assert!(err.contains("Issues detected:"));
    assert!(err.contains("- hooks not installed"));
    assert!(err.contains("- Codex config missing agent_playbook block"));
    assert!(err.contains("- no managed skills in global scope (run init)"));
}

#[test]
fn given_initialized_home_when_doctor_runs_then_it_passes() {
    let h = Harness::new();
    assert_success(&h.run(&["init", "--copy"]), "init");

    let output = h.run(&["doctor"]);

    assert_success(&output, "doctor after init");
    assert!(stdout(&output).contains("No critical issues detected."));
}

#[test]
fn given_unparseable_settings_when_doctor_runs_then_it_is_reported() {
    let h = Harness::new();
    assert_success(&h.run(&["init", "--copy"]), "init");
    let settings_path = h.fx.target_dir("claude").join("settings.json");
    fs::write(&settings_path, "{ broken").unwrap();

    let output = h.run(&["doctor"]);

    assert_exit_code(&output, 1, "doctor with broken settings");
    assert!(stderr(&output).contains(&format!("- unable to parse {}", settings_path.display())));
}

#[test]
fn given_partial_damage_when_repair_runs_then_only_missing_pieces_return() {
    // GIVEN an initialized home that lost a skill and its hooks, with one skill disabled
    let h = Harness::new();
    h.fx.create_catalog_skill("alpha", "Alpha").unwrap();
    assert_success(&h.run(&["init", "--copy"]), "init");
    fs::remove_dir_all(h.fx.skills_dir("claude").join("alpha")).unwrap();
    fs::write(h.fx.target_dir("claude").join("settings.json"), "{}\n").unwrap();
    assert_success(
        &h.run(&["skills", "disable", "skill-router", "--scope", "global", "--target", "codex"]),
        "disable",
    );
    assert_exit_code(&h.run(&["doctor"]), 1, "doctor after damage");

    // WHEN repairing, first as a dry run
    let dry = h.run(&["repair", "--copy", "--dry-run"]);
    assert_success(&dry, "repair --dry-run");
    assert!(stdout(&dry).contains("[dry-run] copied alpha (global/claude)"));
    assert!(!h.fx.skills_dir("claude").join("alpha").exists());

    let output = h.run(&["repair", "--copy"]);

    // THEN the lost skill and hooks come back, the rest is left alone
    assert_success(&output, "repair");
    let text = stdout(&output);
    assert!(text.contains("copied alpha (global/claude)"));
    assert!(text.contains("Claude hooks: updated"));
    assert!(text.contains("Codex config: already has the agent_playbook block"));
    assert!(text.contains("Repair complete: 1 skill(s) installed."));
    assert!(h.fx.skills_dir("claude").join("alpha/SKILL.md").is_file());
    assert!(!h.fx.skills_dir("codex").join("skill-router").exists());
    assert!(h
        .fx
        .skills_dir("codex")
        .join(".disabled/skill-router/SKILL.md")
        .is_file());

    assert_success(&h.run(&["doctor"]), "doctor after repair");
}
