use crate::cli::{Cli, Commands};
use crate::commands::{hooks, setup, skills};
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

/// The main entry point for the `agent-playbook` binary.
pub fn run() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    dispatch(Cli::parse())
}

/// Runs one parsed command line.
pub fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Init(args) => setup::handle_init_command(args),
        Commands::Status(args) => setup::handle_status_command(args),
        Commands::Doctor(args) => setup::handle_doctor_command(args),
        Commands::Repair(args) => setup::handle_repair_command(args),
        Commands::Uninstall(args) => setup::handle_uninstall_command(args),
        Commands::Skills(command) => skills::handle_skills_command(command),
        Commands::SessionLog(args) => hooks::handle_session_log_command(args),
        Commands::SelfImprove(args) => hooks::handle_self_improve_command(args),
    }
}
