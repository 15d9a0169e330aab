//! Command-line entry point for `agent-playbook`.
//!
//! All behavior lives in the `playbook-app` crate; this binary only hands
//! control to it and reports its exit status.

use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    playbook_app::run()
}
