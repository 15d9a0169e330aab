use super::{finish, load_settings, open_manager, print_lines, select, warn};
use crate::cli::{FilterArgs, OutputFormat, SkillsCommand};
use anyhow::Result;
use playbook_state::{InstallMode, Scope, Selection, Target};
use playbook_sync::{OperationReport, OverwriteGate, SkillError, SkillInfo};
use std::process::ExitCode;

type Outcome = std::result::Result<ExitCode, SkillError>;

pub(crate) fn handle_skills_command(command: SkillsCommand) -> Result<ExitCode> {
    finish(dispatch(command))
}

fn dispatch(command: SkillsCommand) -> Outcome {
    match command {
        SkillsCommand::List { filter, format } => list(&filter, format),
        SkillsCommand::Info {
            name,
            filter,
            format,
        } => info(&name, &filter, format),
        SkillsCommand::Add {
            skill,
            filter,
            copy,
            link: _,
            overwrite,
            dry_run,
        } => {
            let settings = load_settings(filter.repo.repo.as_deref())?;
            let default = Selection::new(vec![Scope::Global], Target::ALL.to_vec());
            let selection = select(&filter, &default);
            let mode = if copy { InstallMode::Copy } else { InstallMode::Link };
            let mut manager = open_manager(&settings, dry_run)?;
            let report = manager.add(&skill, &selection, mode, &mut OverwriteGate::new(overwrite))?;
            Ok(print_report(&report, "Nothing to do."))
        }
        SkillsCommand::Remove {
            name,
            filter,
            force,
            dry_run,
        } => {
            let settings = load_settings(filter.repo.repo.as_deref())?;
            let selection = select(&filter, &Selection::all());
            let mut manager = open_manager(&settings, dry_run)?;
            let report = manager.remove(&name, &selection, force)?;
            Ok(print_report(&report, "Nothing removed."))
        }
        SkillsCommand::Disable {
            name,
            filter,
            overwrite,
            dry_run,
        } => {
            let settings = load_settings(filter.repo.repo.as_deref())?;
            let selection = select(&filter, &Selection::all());
            let mut manager = open_manager(&settings, dry_run)?;
            let report = manager.disable(&name, &selection, &mut OverwriteGate::new(overwrite))?;
            Ok(print_report(&report, "Nothing to disable."))
        }
        SkillsCommand::Enable {
            name,
            filter,
            overwrite,
            dry_run,
        } => {
            let settings = load_settings(filter.repo.repo.as_deref())?;
            let selection = select(&filter, &Selection::all());
            let mut manager = open_manager(&settings, dry_run)?;
            let report = manager.enable(&name, &selection, &mut OverwriteGate::new(overwrite))?;
            Ok(print_report(&report, "Nothing to enable."))
        }
        SkillsCommand::Doctor {
            filter,
            fix,
            dry_run,
        } => doctor(&filter, fix, dry_run),
        SkillsCommand::Sync { repo, dry_run } => {
            let settings = load_settings(repo.repo.as_deref())?;
            let mut manager = open_manager(&settings, dry_run)?;
            let report = manager.sync()?;
            if !report.is_changed() {
                println!("State already in sync.");
            }
            let prefix = dry_run_prefix(report.dry_run);
            for change in &report.changes {
                println!("{prefix}{}", change.describe());
            }
            Ok(ExitCode::SUCCESS)
        }
        SkillsCommand::Upgrade {
            repo,
            source,
            dry_run,
        } => {
            let settings = load_settings(repo.repo.as_deref())?;
            let mut manager = open_manager(&settings, dry_run)?;
            let report = manager.upgrade(source.as_deref())?;
            Ok(print_report(&report, "Nothing to upgrade."))
        }
        SkillsCommand::Export { repo, output } => {
            let settings = load_settings(repo.repo.as_deref())?;
            let manager = open_manager(&settings, false)?;
            let count = manager.export(&output)?;
            println!("Exported {count} entries to {}", output.display());
            Ok(ExitCode::SUCCESS)
        }
        SkillsCommand::Import {
            file,
            repo,
            source,
            overwrite,
            dry_run,
        } => {
            let settings = load_settings(repo.repo.as_deref())?;
            let mut manager = open_manager(&settings, dry_run)?;
            let report = manager.import(&file, source.as_deref(), &mut OverwriteGate::new(overwrite))?;
            Ok(print_report(&report, "Nothing imported."))
        }
    }
}

fn dry_run_prefix(dry_run: bool) -> &'static str {
    if dry_run {
        "[dry-run] "
    } else {
        ""
    }
}

/// Prints the report; any per-item failure makes the exit status 1.
fn print_report(report: &OperationReport, empty: &str) -> ExitCode {
    print_lines(&report.lines(), empty);
    for warning in &report.warnings {
        warn(warning);
    }
    if report.has_failures() {
        eprintln!("Error: {} item(s) failed.", report.failed.len());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn to_json(value: &impl serde::Serialize) -> std::result::Result<String, SkillError> {
    serde_json::to_string_pretty(value).map_err(|e| SkillError::Other(e.into()))
}

fn list(filter: &FilterArgs, format: OutputFormat) -> Outcome {
    let settings = load_settings(filter.repo.repo.as_deref())?;
    let selection = select(filter, &Selection::all());
    let manager = open_manager(&settings, false)?;
    let records = manager.scan(&selection);

    match format {
        OutputFormat::Json => println!("{}", to_json(&records)?),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No skills installed.");
            }
            for record in &records {
                let mut line = format!(
                    "{:<28} {:<15} {:<5} {:<18} {}",
                    record.name,
                    record.label(),
                    record.install_mode.as_str(),
                    record.display_status(),
                    if record.managed { "managed" } else { "unmanaged" }
                );
                if record.duplicate {
                    line.push_str(" (duplicate)");
                }
                println!("{line}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn info(name: &str, filter: &FilterArgs, format: OutputFormat) -> Outcome {
    let settings = load_settings(filter.repo.repo.as_deref())?;
    let selection = select(filter, &Selection::all());
    let manager = open_manager(&settings, false)?;
    let info = manager.info(name, &selection)?;

    match format {
        OutputFormat::Json => println!("{}", to_json(&info)?),
        OutputFormat::Text => print_lines(&info_lines(&info), ""),
    }
    Ok(ExitCode::SUCCESS)
}

fn info_lines(info: &SkillInfo) -> Vec<String> {
    let mut lines = vec![format!("Name: {}", info.name)];
    match &info.catalog {
        Some(def) => {
            lines.push(format!(
                "Description: {}",
                def.description().unwrap_or("(none)")
            ));
            lines.push(format!("Catalog source: {}", def.source_path.display()));
        }
        None => lines.push("Catalog source: (not in catalog)".to_string()),
    }

    lines.push("Installations:".to_string());
    if info.installs.is_empty() {
        lines.push("  (none)".to_string());
    }
    for record in &info.installs {
        lines.push(format!(
            "  {} {} ({}, {}, {})",
            record.label(),
            record.path.display(),
            record.install_mode.as_str(),
            record.display_status(),
            if record.managed { "managed" } else { "unmanaged" }
        ));
    }

    lines.push("State entries:".to_string());
    if info.entries.is_empty() {
        lines.push("  (none)".to_string());
    }
    for entry in &info.entries {
        lines.push(format!(
            "  {}/{} {} source={} disabled={} installed_at={}",
            entry.scope,
            entry.target,
            entry.mode,
            entry.source.display(),
            entry.disabled,
            entry.installed_at
        ));
    }
    lines
}

fn doctor(filter: &FilterArgs, fix: bool, dry_run: bool) -> Outcome {
    let settings = load_settings(filter.repo.repo.as_deref())?;
    let selection = select(filter, &Selection::all());
    let mut manager = open_manager(&settings, dry_run)?;
    let report = manager.doctor(&selection, fix)?;

    let prefix = dry_run_prefix(report.dry_run);
    for issue in &report.issues {
        println!("[{}] {}", issue.kind.as_str(), issue.message);
    }
    for action in &report.fixes {
        println!("{prefix}fixed: {}", action.describe());
    }
    for skipped in &report.fix_skipped {
        println!("{prefix}{}", skipped.describe());
    }
    for failed in &report.fix_failed {
        println!("{prefix}{}", failed.describe());
    }

    if report.is_healthy() {
        println!("No issues found.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} issue(s) found.", report.issues.len());
        Ok(ExitCode::FAILURE)
    }
}
