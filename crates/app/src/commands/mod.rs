//! Command handlers, one module per command family.

pub(crate) mod hooks;
pub(crate) mod setup;
pub(crate) mod skills;

use crate::cli::FilterArgs;
use anyhow::Result;
use playbook_discovery::locate_skills_source;
use playbook_state::{Selection, Settings};
use playbook_sync::{SkillError, SkillManager};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Resolves settings, locating the skills source when the environment does not name one.
///
/// The search starts at the project root (or working directory), then at the
/// directory above the running executable's own directory.
pub(crate) fn load_settings(repo: Option<&Path>) -> Result<Settings> {
    let settings = Settings::resolve(repo)?;
    if settings.skills_source.is_some() {
        return Ok(settings);
    }
    let mut starts: Vec<PathBuf> = vec![settings
        .project_root
        .clone()
        .unwrap_or_else(|| settings.cwd.clone())];
    if let Some(install_root) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(Path::parent).map(Path::to_path_buf))
    {
        starts.push(install_root);
    }
    let source = locate_skills_source(&starts);
    Ok(settings.with_skills_source(source))
}

pub(crate) fn warn(message: &str) {
    tracing::warn!(target: "agent_playbook::cli", "{message}");
    eprintln!("Warning: {message}");
}

/// Applies `--scope`/`--target` over `default`, printing a warning for each unknown value.
pub(crate) fn select(filter: &FilterArgs, default: &Selection) -> Selection {
    let (selection, warnings) =
        Selection::from_flags(filter.scope.as_deref(), filter.target.as_deref(), default);
    for warning in &warnings {
        warn(warning);
    }
    selection
}

/// Opens the manager and surfaces a corrupt-state warning, if any.
pub(crate) fn open_manager(settings: &Settings, dry_run: bool) -> Result<SkillManager<'_>> {
    let mut manager = SkillManager::open(settings, dry_run)?;
    if let Some(warning) = manager.take_warning() {
        warn(&warning);
    }
    Ok(manager)
}

pub(crate) fn print_lines(lines: &[String], empty: &str) {
    if lines.is_empty() {
        println!("{empty}");
    }
    for line in lines {
        println!("{line}");
    }
}

/// Maps resolution failures to exit status 1; everything else propagates.
pub(crate) fn finish(result: std::result::Result<ExitCode, SkillError>) -> Result<ExitCode> {
    match result {
        Ok(code) => Ok(code),
        Err(SkillError::Other(e)) => Err(e),
        Err(e) => {
            tracing::debug!(target: "agent_playbook::cli", error = %e, "command failed");
            eprintln!("Error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
