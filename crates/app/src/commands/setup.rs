use super::{finish, load_settings, open_manager, print_lines, warn};
use crate::cli::{InitArgs, RepairArgs, ScopeArgs, UninstallArgs};
use crate::setup::{
    install_claude_hooks, install_codex_block, remove_claude_hooks, uninstall_codex_block,
    HookCommands, PatchOutcome,
};
use crate::status::StatusReport;
use anyhow::{Context, Result};
use playbook_discovery::list_skills;
use playbook_state::{InstallMode, Scope, Selection, Settings, Target};
use playbook_sync::{ActionKind, OperationReport, OverwriteGate, SkillError, SkillManager};
use std::collections::HashSet;
use std::path::Path;
use std::process::ExitCode;

type Outcome = std::result::Result<ExitCode, SkillError>;

fn scope_of(args: &ScopeArgs) -> Scope {
    if args.project {
        Scope::Project
    } else {
        Scope::Global
    }
}

fn merge(into: &mut OperationReport, from: OperationReport) {
    into.actions.extend(from.actions);
    into.skipped.extend(from.skipped);
    into.overwritten.extend(from.overwritten);
    into.warnings.extend(from.warnings);
    into.failed.extend(from.failed);
}

/// Exit status for a finished setup command: 1 when any item failed.
fn exit_for(report: &OperationReport) -> ExitCode {
    if report.has_failures() {
        eprintln!("Error: {} item(s) failed.", report.failed.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn report_patch(label: &str, path: &Path, outcome: &PatchOutcome, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    match outcome {
        PatchOutcome::Updated => println!("{prefix}{label}: updated {}", path.display()),
        PatchOutcome::Unchanged => println!("{label}: up to date ({})", path.display()),
        PatchOutcome::Missing => println!("{label}: {} not found", path.display()),
        PatchOutcome::Invalid(reason) => warn(&format!("{label}: left untouched, {reason}")),
    }
}

/// Registers the Claude lifecycle hooks for `scope`, when it has a location.
fn register_hooks(
    settings: &Settings,
    scope: Scope,
    session_dir: Option<&Path>,
    dry_run: bool,
) -> std::result::Result<(), SkillError> {
    let Some(location) = settings.location(scope, Target::Claude) else {
        return Ok(());
    };
    let exe = std::env::current_exe().context("failed to locate the agent-playbook executable")?;
    let commands = HookCommands::new(&exe, session_dir);
    let path = location.settings_path();
    let outcome = install_claude_hooks(&path, &commands, &exe, dry_run)?;
    report_patch("Claude hooks", &path, &outcome, dry_run);
    Ok(())
}

fn register_codex(settings: &Settings, scope: Scope, dry_run: bool) -> std::result::Result<(), SkillError> {
    let Some(location) = settings.location(scope, Target::Codex) else {
        return Ok(());
    };
    let path = location.settings_path();
    let outcome = install_codex_block(&path, dry_run)?;
    report_patch("Codex config", &path, &outcome, dry_run);
    Ok(())
}

pub(crate) fn handle_init_command(args: InitArgs) -> Result<ExitCode> {
    finish(init(args))
}

pub(crate) fn handle_status_command(args: ScopeArgs) -> Result<ExitCode> {
    finish(status(&args))
}

pub(crate) fn handle_doctor_command(args: ScopeArgs) -> Result<ExitCode> {
    finish(doctor(&args))
}

pub(crate) fn handle_repair_command(args: RepairArgs) -> Result<ExitCode> {
    finish(repair(args))
}

pub(crate) fn handle_uninstall_command(args: UninstallArgs) -> Result<ExitCode> {
    finish(uninstall(&args))
}

fn init(args: InitArgs) -> Outcome {
    let settings = load_settings(args.scope.repo.repo.as_deref())?;
    let scope = scope_of(&args.scope);
    let default = Selection::new(vec![scope], vec![Target::Claude, Target::Codex]);
    let (selection, warnings) = Selection::from_flags(None, args.target.as_deref(), &default);
    for warning in &warnings {
        warn(warning);
    }

    let source = settings
        .skills_source
        .clone()
        .ok_or(SkillError::NoSkillsSource)?;
    let skills = list_skills(&source)?;
    let mode = if args.copy {
        InstallMode::Copy
    } else {
        InstallMode::Link
    };

    tracing::info!(
        target: "agent_playbook::init",
        source = %source.display(),
        skills = skills.len(),
        scope = %scope,
        dry_run = args.dry_run,
        "installing catalog"
    );

    let mut manager = open_manager(&settings, args.dry_run)?;
    let mut gate = OverwriteGate::new(args.overwrite);
    let mut report = OperationReport::new(args.dry_run);
    for skill in &skills {
        merge(
            &mut report,
            manager.add(&skill.name, &selection, mode, &mut gate)?,
        );
    }
    print_lines(&report.lines(), "Skills already installed.");
    for warning in &report.warnings {
        warn(warning);
    }

    if args.no_hooks {
        println!("Hooks: skipped (--no-hooks)");
    } else if selection.targets.contains(&Target::Claude) {
        register_hooks(&settings, scope, args.session_dir.as_deref(), args.dry_run)?;
    }
    if selection.targets.contains(&Target::Codex) {
        register_codex(&settings, scope, args.dry_run)?;
    }

    println!(
        "Init complete: {} skill(s) from {}",
        skills.len(),
        source.display()
    );
    if args.dry_run {
        println!("Dry run: no changes written.");
    }
    Ok(exit_for(&report))
}

fn collect_status(manager: &SkillManager<'_>, scope: Scope) -> StatusReport {
    let records = manager.scan(&Selection::new(vec![scope], Target::ALL.to_vec()));
    StatusReport::collect(manager.settings(), scope, &records, manager.state())
}

fn status(args: &ScopeArgs) -> Outcome {
    let settings = load_settings(args.repo.repo.as_deref())?;
    let manager = open_manager(&settings, true)?;
    let report = collect_status(&manager, scope_of(args));
    print_lines(&report.lines(), "");
    Ok(ExitCode::SUCCESS)
}

fn doctor(args: &ScopeArgs) -> Outcome {
    let settings = load_settings(args.repo.repo.as_deref())?;
    let manager = open_manager(&settings, true)?;
    let report = collect_status(&manager, scope_of(args));
    print_lines(&report.lines(), "");

    let issues = report.issues();
    if issues.is_empty() {
        println!("No critical issues detected.");
        return Ok(ExitCode::SUCCESS);
    }
    eprintln!("Issues detected:");
    for issue in &issues {
        eprintln!("- {issue}");
    }
    Ok(ExitCode::FAILURE)
}

/// Installs catalog skills absent from every target (active or disabled),
/// then registers hooks and the Codex block only where they are missing.
fn repair(args: RepairArgs) -> Outcome {
    let settings = load_settings(args.scope.repo.repo.as_deref())?;
    let scope = scope_of(&args.scope);
    let default = Selection::new(vec![scope], vec![Target::Claude, Target::Codex]);
    let (selection, warnings) = Selection::from_flags(None, args.target.as_deref(), &default);
    for warning in &warnings {
        warn(warning);
    }
    let targets: Vec<Target> = selection
        .targets
        .iter()
        .copied()
        .filter(|&t| settings.location(scope, t).is_some())
        .collect();
    if targets.is_empty() {
        return Err(SkillError::NoLocation);
    }
    let mode = if args.copy {
        InstallMode::Copy
    } else {
        InstallMode::Link
    };

    let mut manager = open_manager(&settings, args.dry_run)?;
    let status = collect_status(&manager, scope);
    let present: HashSet<(Target, String)> = manager
        .scan(&Selection::new(vec![scope], targets.clone()))
        .into_iter()
        .map(|r| (r.target, r.name))
        .collect();

    let mut report = OperationReport::new(args.dry_run);
    match &settings.skills_source {
        None => warn("skills source not found; skipping skill installation"),
        Some(source) => {
            let mut gate = OverwriteGate::new(args.overwrite);
            for skill in list_skills(source)? {
                for &target in &targets {
                    if present.contains(&(target, skill.name.clone())) {
                        continue;
                    }
                    let only = Selection::new(vec![scope], vec![target]);
                    merge(&mut report, manager.add(&skill.name, &only, mode, &mut gate)?);
                }
            }
        }
    }
    print_lines(&report.lines(), "Skills: nothing missing.");
    for warning in &report.warnings {
        warn(warning);
    }

    if targets.contains(&Target::Claude) {
        if status.hooks_installed {
            println!("Claude hooks: already installed");
        } else {
            register_hooks(&settings, scope, args.session_dir.as_deref(), args.dry_run)?;
        }
    }
    if targets.contains(&Target::Codex) {
        if status.codex_block {
            println!("Codex config: already has the agent_playbook block");
        } else {
            register_codex(&settings, scope, args.dry_run)?;
        }
    }

    let installed = report.count(ActionKind::Linked) + report.count(ActionKind::Copied);
    println!("Repair complete: {installed} skill(s) installed.");
    if args.dry_run {
        println!("Dry run: no changes written.");
    }
    Ok(exit_for(&report))
}

fn uninstall(args: &UninstallArgs) -> Outcome {
    let settings = load_settings(args.scope.repo.repo.as_deref())?;
    let scope = scope_of(&args.scope);
    let mut manager = open_manager(&settings, args.dry_run)?;

    let mut keys: Vec<(String, Target)> = manager
        .state()
        .skills
        .iter()
        .filter(|e| e.scope() == Some(scope))
        .filter_map(|e| Some((e.name.clone(), e.target()?)))
        .collect();
    keys.sort();
    keys.dedup();

    let mut report = OperationReport::new(args.dry_run);
    for (name, target) in keys {
        let selection = Selection::new(vec![scope], vec![target]);
        match manager.remove(&name, &selection, false) {
            Ok(removed) => merge(&mut report, removed),
            Err(e) if e.is_user_error() => warn(&format!("{name} ({scope}/{target}): {e}")),
            Err(e) => return Err(e),
        }
    }
    print_lines(&report.lines(), "No managed skills to remove.");
    for warning in &report.warnings {
        warn(warning);
    }

    if let Some(location) = settings.location(scope, Target::Claude) {
        let path = location.settings_path();
        let outcome = remove_claude_hooks(&path, args.dry_run)?;
        report_patch("Claude hooks", &path, &outcome, args.dry_run);
    }
    if let Some(location) = settings.location(scope, Target::Codex) {
        let path = location.settings_path();
        let outcome = uninstall_codex_block(&path, args.dry_run)?;
        report_patch("Codex config", &path, &outcome, args.dry_run);
    }

    println!("Uninstall complete.");
    Ok(exit_for(&report))
}
