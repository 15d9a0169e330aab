//! Handlers invoked by the assistant's lifecycle hooks.

use crate::cli::{SelfImproveArgs, SessionLogArgs};
use crate::VERSION;
use anyhow::{Context, Result};
use playbook_hooks::{parse_hook_input, EpisodicLogger, HookInput, SessionLogRequest, SessionLogger};
use playbook_state::Settings;
use std::io::{IsTerminal, Read};
use std::process::ExitCode;
use time::OffsetDateTime;

/// Hook payload from stdin; empty when stdin is a terminal.
fn read_payload() -> Result<HookInput> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(HookInput::default());
    }
    let mut raw = String::new();
    stdin
        .lock()
        .read_to_string(&mut raw)
        .context("failed to read hook payload from stdin")?;
    Ok(parse_hook_input(&raw))
}

pub(crate) fn handle_session_log_command(args: SessionLogArgs) -> Result<ExitCode> {
    let input = read_payload()?;
    let settings = Settings::resolve(None)?;
    let cwd = match args.cwd.or_else(|| input.cwd.clone()) {
        Some(cwd) => cwd,
        None => settings.cwd.clone(),
    };
    let request = SessionLogRequest {
        transcript_path: args.transcript_path.or_else(|| input.transcript_path.clone()),
        cwd,
        session_id: input.session_id().to_string(),
        session_dir: args.session_dir,
    };

    let logger = SessionLogger::new(settings.global_sessions_dir()).with_version(VERSION);
    let path = logger.write(&request, OffsetDateTime::now_utc())?;
    println!("Session log written: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn handle_self_improve_command(_args: SelfImproveArgs) -> Result<ExitCode> {
    let input = read_payload()?;
    let settings = Settings::resolve(None)?;
    let cwd = input.cwd.clone().unwrap_or_else(|| settings.cwd.clone());

    let logger = EpisodicLogger::new(settings.memory_dir());
    let outcome = logger.record(&input, &cwd, OffsetDateTime::now_utc())?;
    if let Some(trigger) = &outcome.trigger {
        println!(
            "Completion detected: {} (follow up with {})",
            trigger.event.as_str(),
            trigger.follow_up.join(", ")
        );
    }
    Ok(ExitCode::SUCCESS)
}
