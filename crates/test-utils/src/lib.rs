//! Shared test utilities for agent-playbook crates.
//!
//! This crate provides common test fixtures and utilities used across
//! multiple crates in the workspace.

use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Environment variables that redirect the global target directories.
pub const DIR_OVERRIDES: [(&str, &str); 3] = [
    ("AGENT_PLAYBOOK_CLAUDE_DIR", ".claude"),
    ("AGENT_PLAYBOOK_CODEX_DIR", ".codex"),
    ("AGENT_PLAYBOOK_GEMINI_DIR", ".gemini"),
];

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = playbook_test_utils::set_env_var("MY_VAR", Some("value"));
/// // MY_VAR is set to "value"
/// // When _guard drops, MY_VAR is restored to its original value
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// Manifest text with a name and description header.
pub fn skill_manifest(name: &str, description: &str) -> String {
    format!("---\nname: {name}\ndescription: {description}\n---\n# {name}\n")
}

/// Writes `<dir>/<name>/SKILL.md` and returns the skill directory.
pub fn write_skill(dir: &Path, name: &str, content: &str) -> std::io::Result<PathBuf> {
    let skill_dir = dir.join(name);
    std::fs::create_dir_all(&skill_dir)?;
    std::fs::write(skill_dir.join("SKILL.md"), content)?;
    Ok(skill_dir)
}

/// Temp home with the three target directories, a skills catalog, and a repo.
///
/// The tempdir is automatically cleaned up when this struct is dropped.
pub struct TestFixture {
    pub tempdir: tempfile::TempDir,
    /// `$HOME` in the temp environment.
    pub home: PathBuf,
    /// Skills catalog (`.../catalog/skills`) containing the `skill-router` marker.
    pub catalog: PathBuf,
    /// A git repository root (has a `.git` directory).
    pub repo: PathBuf,
}

impl TestFixture {
    /// Creates:
    /// - `$HOME/.claude/skills/`, `$HOME/.codex/skills/`, `$HOME/.gemini/skills/`
    /// - `catalog/skills/skill-router/SKILL.md`
    /// - `repo/.git/`
    ///
    /// Does NOT touch the environment; callers pass these paths explicitly.
    pub fn new() -> std::io::Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let home = tempdir.path().join("home");
        for (_, dir) in DIR_OVERRIDES {
            std::fs::create_dir_all(home.join(dir).join("skills"))?;
        }
        let catalog = tempdir.path().join("catalog/skills");
        write_skill(
            &catalog,
            "skill-router",
            &skill_manifest("skill-router", "Routes tasks to skills"),
        )?;
        let repo = tempdir.path().join("repo");
        std::fs::create_dir_all(repo.join(".git"))?;

        Ok(Self {
            tempdir,
            home,
            catalog,
            repo,
        })
    }

    /// Global configuration directory for `target` (`claude`, `codex`, `gemini`).
    pub fn target_dir(&self, target: &str) -> PathBuf {
        self.home.join(format!(".{target}"))
    }

    /// Global skills directory for `target`.
    pub fn skills_dir(&self, target: &str) -> PathBuf {
        self.target_dir(target).join("skills")
    }

    /// Path of the state document under the default layout.
    pub fn state_path(&self) -> PathBuf {
        self.target_dir("claude").join("agent-playbook/state.json")
    }

    /// Create a skill in the catalog. Returns the path to the skill directory.
    pub fn create_catalog_skill(&self, name: &str, description: &str) -> std::io::Result<PathBuf> {
        write_skill(&self.catalog, name, &skill_manifest(name, description))
    }

    /// Create a skill directly in a target's global skills directory.
    pub fn create_installed_skill(&self, target: &str, name: &str) -> std::io::Result<PathBuf> {
        write_skill(
            &self.skills_dir(target),
            name,
            &skill_manifest(name, "installed by hand"),
        )
    }
}
