//! Command-line front end for agent-playbook.
//!
//! Parses arguments with clap, resolves [`playbook_state::Settings`] once per
//! invocation, and hands off to the skill engine in `playbook-sync` or the hook
//! commands in `playbook-hooks`. Setup helpers that patch Claude's
//! `settings.json` and Codex's `config.toml` live in [`setup`].

#![deny(unsafe_code)]

mod app;
pub mod cli;
mod commands;
pub mod setup;
pub mod status;

pub use app::{dispatch, run};

/// Version recorded in hook settings, the Codex block, and session logs.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
