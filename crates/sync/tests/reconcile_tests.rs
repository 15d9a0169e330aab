//! Doctor, sync, upgrade, and export/import against a temp home.
//!
//! Each test builds its own fixture; nothing here touches the process
//! environment.

use std::fs;

use playbook_state::{InstallMode, Scope, Selection, Settings, StateEntry, StateStore, Target};
use playbook_sync::{
    ActionKind, IssueKind, OverwriteGate, SkillManager, SkipReason, StateChange,
};
use playbook_test_utils::{skill_manifest, TestFixture};

struct Ctx {
    fx: TestFixture,
    settings: Settings,
}

impl Ctx {
    fn new() -> Self {
        let fx = TestFixture::new().unwrap();
        let settings = Settings::for_home(&fx.home, &fx.repo, Some(&fx.repo))
            .with_skills_source(Some(fx.catalog.clone()));
        Self { fx, settings }
    }

    fn manager(&self) -> SkillManager<'_> {
        SkillManager::open(&self.settings, false).unwrap()
    }

    fn copy_into(&self, manager: &mut SkillManager<'_>, name: &str, target: Target) {
        self.fx.create_catalog_skill(name, "catalog skill").unwrap();
        manager
            .add(
                name,
                &Selection::new(vec![Scope::Global], vec![target]),
                InstallMode::Copy,
                &mut OverwriteGate::deny_all(),
            )
            .unwrap();
    }
}

#[test]
fn doctor_fix_is_idempotent() {
    // GIVEN a managed copy that was deleted behind our back
    let ctx = Ctx::new();
    let mut manager = ctx.manager();
    ctx.copy_into(&mut manager, "alpha", Target::Claude);
    ctx.copy_into(&mut manager, "bravo", Target::Codex);
    fs::remove_dir_all(ctx.fx.skills_dir("claude").join("alpha")).unwrap();

    // WHEN diagnosing without fixing
    let report = manager.doctor(&Selection::all(), false).unwrap();
    // THEN the missing managed entry is the only issue
    assert_eq!(report.count(IssueKind::ManagedEntry), 1);
    assert_eq!(report.issues.len(), 1);
    assert!(report.fixes.is_empty());

    // WHEN fixing
    let fixed = manager.doctor(&Selection::all(), true).unwrap();
    assert_eq!(fixed.fixes.len(), 1);
    assert_eq!(fixed.fixes[0].kind, ActionKind::Reinstalled);
    assert!(ctx.fx.skills_dir("claude").join("alpha/SKILL.md").is_file());

    // THEN a second fix pass has nothing to do
    let again = manager.doctor(&Selection::all(), true).unwrap();
    assert!(again.fixes.is_empty());
    assert!(again.is_healthy());
}

#[cfg(unix)]
#[test]
fn doctor_reports_broken_duplicate_and_unmanaged() {
    let ctx = Ctx::new();
    std::os::unix::fs::symlink(
        ctx.fx.tempdir.path().join("nowhere"),
        ctx.fx.skills_dir("codex").join("dangling"),
    )
    .unwrap();
    ctx.fx.create_installed_skill("claude", "dup").unwrap();
    playbook_test_utils::write_skill(
        &ctx.fx.repo.join(".claude/skills"),
        "dup",
        &skill_manifest("dup", "project copy"),
    )
    .unwrap();
    let mut manager = ctx.manager();

    let report = manager.doctor(&Selection::all(), false).unwrap();

    assert_eq!(report.count(IssueKind::Broken), 1);
    assert_eq!(report.count(IssueKind::Duplicate), 1);
    assert_eq!(report.count(IssueKind::Unmanaged), 3);
    assert!(!report.is_healthy());
}

#[test]
fn doctor_fix_prefers_healthy_active_copy_of_disabled_entry() {
    let ctx = Ctx::new();
    let mut manager = ctx.manager();
    ctx.copy_into(&mut manager, "alpha", Target::Gemini);
    manager
        .disable("alpha", &Selection::all(), &mut OverwriteGate::deny_all())
        .unwrap();
    playbook_test_utils::write_skill(
        &ctx.fx.skills_dir("gemini"),
        "alpha",
        &skill_manifest("alpha", "restored by hand"),
    )
    .unwrap();

    let report = manager.doctor(&Selection::all(), true).unwrap();

    assert_eq!(report.fixes.len(), 1);
    assert_eq!(report.fixes[0].kind, ActionKind::Enabled);
    assert!(!ctx.fx.skills_dir("gemini").join(".disabled/alpha").exists());
    let entry = manager
        .state()
        .find("alpha", Scope::Global, Target::Gemini)
        .unwrap();
    assert!(!entry.disabled);
}

#[test]
fn sync_follows_filesystem_and_settles() {
    let ctx = Ctx::new();
    {
        let mut manager = ctx.manager();
        ctx.copy_into(&mut manager, "alpha", Target::Claude);
    }
    let skills = ctx.fx.skills_dir("claude");
    fs::create_dir_all(skills.join(".disabled")).unwrap();
    fs::rename(skills.join("alpha"), skills.join(".disabled/alpha")).unwrap();

    let mut store = StateStore::load(ctx.fx.state_path()).unwrap();
    let mut orphan = StateEntry::new(
        "ghost",
        Scope::Global,
        Target::Claude,
        ctx.fx.catalog.join("ghost"),
        InstallMode::Link,
    );
    orphan.target = "cursor".to_string();
    store.document_mut().skills.push(orphan);
    store.save().unwrap();

    let mut manager = ctx.manager();
    let report = manager.sync().unwrap();

    assert_eq!(report.changes.len(), 2);
    assert!(report.changes.iter().any(|c| matches!(
        c,
        StateChange::MarkedDisabled { name, .. } if name == "alpha"
    )));
    assert!(report.changes.iter().any(|c| matches!(
        c,
        StateChange::Dropped { name, .. } if name == "ghost"
    )));
    assert!(manager.state().find("alpha", Scope::Global, Target::Claude).unwrap().disabled);

    let second = manager.sync().unwrap();
    assert!(!second.is_changed());
}

#[test]
fn sync_dry_run_leaves_state_file_alone() {
    let ctx = Ctx::new();
    {
        let mut manager = ctx.manager();
        ctx.copy_into(&mut manager, "alpha", Target::Codex);
    }
    let before = fs::read_to_string(ctx.fx.state_path()).unwrap();
    fs::remove_dir_all(ctx.fx.skills_dir("codex").join("alpha")).unwrap();
    let skills = ctx.fx.skills_dir("codex");
    playbook_test_utils::write_skill(
        &skills.join(".disabled"),
        "alpha",
        &skill_manifest("alpha", "moved"),
    )
    .unwrap();

    let mut manager = SkillManager::open(&ctx.settings, true).unwrap();
    let report = manager.sync().unwrap();

    assert!(report.dry_run);
    assert!(report.is_changed());
    assert_eq!(fs::read_to_string(ctx.fx.state_path()).unwrap(), before);
}

#[test]
fn upgrade_reinstalls_enabled_entries_from_catalog() {
    let ctx = Ctx::new();
    let mut manager = ctx.manager();
    ctx.copy_into(&mut manager, "alpha", Target::Claude);
    ctx.copy_into(&mut manager, "bravo", Target::Claude);
    manager
        .disable("bravo", &Selection::all(), &mut OverwriteGate::deny_all())
        .unwrap();
    fs::write(
        ctx.fx.catalog.join("alpha/SKILL.md"),
        skill_manifest("alpha", "second edition"),
    )
    .unwrap();

    let report = manager.upgrade(None).unwrap();

    assert_eq!(report.count(ActionKind::Reinstalled), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::Disabled);
    let installed =
        fs::read_to_string(ctx.fx.skills_dir("claude").join("alpha/SKILL.md")).unwrap();
    assert!(installed.contains("second edition"));
}

#[test]
fn upgrade_skips_entries_without_source() {
    let ctx = Ctx::new();
    let mut manager = ctx.manager();
    ctx.copy_into(&mut manager, "alpha", Target::Codex);
    fs::remove_dir_all(ctx.fx.catalog.join("alpha")).unwrap();

    let report = manager.upgrade(None).unwrap();

    assert!(report.actions.is_empty());
    assert!(matches!(
        report.skipped[0].reason,
        SkipReason::SourceNotFound { .. }
    ));
    assert!(ctx.fx.skills_dir("codex").join("alpha/SKILL.md").is_file());
}

#[test]
fn import_replaces_state_and_restores_installs() {
    // GIVEN an export taken with one enabled and one disabled skill
    let ctx = Ctx::new();
    let export = ctx.fx.tempdir.path().join("backup/state.json");
    {
        let mut manager = ctx.manager();
        ctx.copy_into(&mut manager, "alpha", Target::Claude);
        ctx.copy_into(&mut manager, "bravo", Target::Codex);
        manager
            .disable("bravo", &Selection::all(), &mut OverwriteGate::deny_all())
            .unwrap();
        assert_eq!(manager.export(&export).unwrap(), 2);
        // and a later install that the export does not know about
        ctx.copy_into(&mut manager, "charlie", Target::Gemini);
    }
    fs::remove_dir_all(ctx.fx.skills_dir("claude").join("alpha")).unwrap();

    // WHEN importing
    let mut manager = ctx.manager();
    let report = manager
        .import(&export, None, &mut OverwriteGate::deny_all())
        .unwrap();

    // THEN the enabled skill is reinstalled and the disabled one only recorded
    assert_eq!(report.count(ActionKind::Copied), 1);
    assert_eq!(report.count(ActionKind::Recorded), 1);
    assert!(ctx.fx.skills_dir("claude").join("alpha/SKILL.md").is_file());
    let state = manager.state();
    assert_eq!(state.skills.len(), 2);
    assert!(state.find("bravo", Scope::Global, Target::Codex).unwrap().disabled);
    // THEN charlie stays on disk but is no longer managed
    assert!(state.find("charlie", Scope::Global, Target::Gemini).is_none());
    assert!(ctx.fx.skills_dir("gemini").join("charlie").exists());
}

#[test]
fn corrupt_state_loads_empty_with_warning() {
    let ctx = Ctx::new();
    fs::create_dir_all(ctx.fx.state_path().parent().unwrap()).unwrap();
    fs::write(ctx.fx.state_path(), "{ not json").unwrap();

    let mut manager = ctx.manager();

    assert!(manager.state().skills.is_empty());
    let warning = manager.take_warning().unwrap();
    assert!(warning.contains("state"));
    assert!(manager.take_warning().is_none());
}
