//! Settings resolved once at the process boundary and passed to every operation.

use crate::env;
use crate::layout::{Location, Scope, Selection, Target};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Global configuration roots for each target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDirs {
    pub claude: PathBuf,
    pub codex: PathBuf,
    pub gemini: PathBuf,
}

impl TargetDirs {
    /// Standard layout below `root` (`<root>/.claude`, `<root>/.codex`, `<root>/.gemini`).
    pub fn under(root: &Path) -> Self {
        Self {
            claude: root.join(Target::Claude.dir_name()),
            codex: root.join(Target::Codex.dir_name()),
            gemini: root.join(Target::Gemini.dir_name()),
        }
    }

    pub fn get(&self, target: Target) -> &Path {
        match target {
            Target::Claude => &self.claude,
            Target::Codex => &self.codex,
            Target::Gemini => &self.gemini,
        }
    }
}

/// Everything an operation needs to know about the environment it runs in.
#[derive(Debug, Clone)]
pub struct Settings {
    pub home: PathBuf,
    pub cwd: PathBuf,
    /// Detected or explicit project root; project scope is unavailable without one.
    pub project_root: Option<PathBuf>,
    pub global_dirs: TargetDirs,
    pub state_path: PathBuf,
    /// Canonical skills directory, when one could be located.
    pub skills_source: Option<PathBuf>,
}

impl Settings {
    /// Resolves settings from the process environment.
    ///
    /// `repo` is an explicit project root; otherwise the working directory's
    /// enclosing git repository is used when there is one.
    pub fn resolve(repo: Option<&Path>) -> Result<Self> {
        let home = env::home_dir()?;
        let cwd = std::env::current_dir().context("failed to read working directory")?;
        let project_root = match repo {
            Some(path) => Some(absolutize(&cwd, path)),
            None => find_repo_root(&cwd),
        };

        let defaults = TargetDirs::under(&home);
        let global_dirs = TargetDirs {
            claude: env::target_dir_from_env(Target::Claude).unwrap_or(defaults.claude),
            codex: env::target_dir_from_env(Target::Codex).unwrap_or(defaults.codex),
            gemini: env::target_dir_from_env(Target::Gemini).unwrap_or(defaults.gemini),
        };
        let state_path = env::state_path_from_env()
            .unwrap_or_else(|| default_state_path(&global_dirs.claude));

        tracing::debug!(
            target: "agent_playbook::settings",
            home = %home.display(),
            project_root = ?project_root,
            state = %state_path.display(),
            "resolved settings"
        );

        Ok(Self {
            home,
            cwd,
            project_root,
            global_dirs,
            state_path,
            skills_source: env::skills_dir_from_env(),
        })
    }

    /// Settings rooted at an explicit home directory, ignoring the environment.
    pub fn for_home(home: &Path, cwd: &Path, project_root: Option<&Path>) -> Self {
        let global_dirs = TargetDirs::under(home);
        Self {
            home: home.to_path_buf(),
            cwd: cwd.to_path_buf(),
            project_root: project_root.map(Path::to_path_buf),
            state_path: default_state_path(&global_dirs.claude),
            global_dirs,
            skills_source: None,
        }
    }

    pub fn with_skills_source(mut self, source: Option<PathBuf>) -> Self {
        self.skills_source = source;
        self
    }

    /// Resolves a (scope, target) pair; `None` for project scope without a project root.
    pub fn location(&self, scope: Scope, target: Target) -> Option<Location> {
        let base = match scope {
            Scope::Global => self.global_dirs.get(target).to_path_buf(),
            Scope::Project => self.project_root.as_ref()?.join(target.dir_name()),
        };
        Some(Location::new(scope, target, base))
    }

    /// Resolvable locations within `selection`.
    pub fn locations(&self, selection: &Selection) -> Vec<Location> {
        selection
            .pairs()
            .into_iter()
            .filter_map(|(scope, target)| self.location(scope, target))
            .collect()
    }

    /// Global Claude configuration directory.
    pub fn claude_dir(&self) -> &Path {
        &self.global_dirs.claude
    }

    /// Root of the episodic memory tree.
    pub fn memory_dir(&self) -> PathBuf {
        self.global_dirs.claude.join("memory")
    }

    /// Default session log directory when no repository is detected.
    pub fn global_sessions_dir(&self) -> PathBuf {
        self.global_dirs.claude.join("sessions")
    }
}

fn default_state_path(claude_dir: &Path) -> PathBuf {
    claude_dir.join("agent-playbook").join("state.json")
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Walks up from `start` looking for a directory containing `.git`.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}
