//! Shared harness for driving the `agent-playbook` binary in a temp home.

#![allow(dead_code)]

use std::io::Write;
use std::process::{Command, Output, Stdio};

use playbook_test_utils::{TestFixture, DIR_OVERRIDES};

pub struct Harness {
    pub fx: TestFixture,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            fx: TestFixture::new().expect("fixture"),
        }
    }

    /// Command rooted in the fixture repo with every directory override pointing into the temp home.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_agent-playbook"));
        cmd.current_dir(&self.fx.repo)
            .env("HOME", &self.fx.home)
            .env("AGENT_PLAYBOOK_SKILLS_DIR", &self.fx.catalog)
            .env_remove("AGENT_PLAYBOOK_STATE")
            .env_remove("RUST_LOG");
        for (key, dir) in DIR_OVERRIDES {
            cmd.env(key, self.fx.home.join(dir));
        }
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("failed to execute agent-playbook")
    }

    /// Runs with `stdin` piped in, as a hook would.
    pub fn run_with_stdin(&self, args: &[&str], stdin: &str) -> Output {
        let mut child = self
            .command()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn agent-playbook");
        child
            .stdin
            .take()
            .expect("stdin")
            .write_all(stdin.as_bytes())
            .expect("write stdin");
        child.wait_with_output().expect("wait for agent-playbook")
    }

    pub fn state(&self) -> serde_json::Value {
        let raw = std::fs::read_to_string(self.fx.state_path()).expect("state file");
        serde_json::from_str(&raw).expect("state json")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} should succeed\n\
         Status: {:?}\n\
         STDOUT:\n{}\n\
         STDERR:\n{}",
        output.status,
        stdout(output),
        stderr(output)
    );
}

pub fn assert_exit_code(output: &Output, code: i32, what: &str) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "{what}\n\
         STDOUT:\n{}\n\
         STDERR:\n{}",
        stdout(output),
        stderr(output)
    );
}
