//! Scope and target vocabulary plus the concrete on-disk locations they map to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the directory holding installed skills under a target base directory.
pub const SKILLS_DIR: &str = "skills";
/// Name of the directory holding disabled skills under the skills directory.
pub const DISABLED_DIR: &str = ".disabled";

/// Where a skill is installed: repo-local or user-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Project,
    Global,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Project, Scope::Global];

    /// Returns the name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Project => "project",
            Scope::Global => "global",
        }
    }

    /// Parses a single scope name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "project" => Some(Scope::Project),
            "global" => Some(Scope::Global),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The assistant ecosystem a skill is installed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Claude,
    Codex,
    Gemini,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Claude, Target::Codex, Target::Gemini];

    /// Returns the name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Claude => "claude",
            Target::Codex => "codex",
            Target::Gemini => "gemini",
        }
    }

    /// Directory name of this target's configuration root (`.claude`, ...).
    pub fn dir_name(&self) -> &'static str {
        match self {
            Target::Claude => ".claude",
            Target::Codex => ".codex",
            Target::Gemini => ".gemini",
        }
    }

    /// File name of this target's settings file.
    pub fn settings_file(&self) -> &'static str {
        match self {
            Target::Claude | Target::Gemini => "settings.json",
            Target::Codex => "config.toml",
        }
    }

    /// Parses a single target name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Some(Target::Claude),
            "codex" => Some(Target::Codex),
            "gemini" => Some(Target::Gemini),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved (scope, target) pair and the configuration root it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub scope: Scope,
    pub target: Target,
    pub base_dir: PathBuf,
}

impl Location {
    pub fn new(scope: Scope, target: Target, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            scope,
            target,
            base_dir: base_dir.into(),
        }
    }

    /// Directory holding active skills.
    pub fn skills_dir(&self) -> PathBuf {
        self.base_dir.join(SKILLS_DIR)
    }

    /// Directory holding disabled skills.
    pub fn disabled_dir(&self) -> PathBuf {
        self.skills_dir().join(DISABLED_DIR)
    }

    /// Path of `name` in the active or the disabled directory.
    pub fn skill_path(&self, name: &str, disabled: bool) -> PathBuf {
        if disabled {
            self.disabled_dir().join(name)
        } else {
            self.skills_dir().join(name)
        }
    }

    /// Path of this target's settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.base_dir.join(self.target.settings_file())
    }

    /// Short `scope/target` label used in reports.
    pub fn label(&self) -> String {
        format!("{}/{}", self.scope, self.target)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// The scopes and targets a command operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub scopes: Vec<Scope>,
    pub targets: Vec<Target>,
    /// True when the user narrowed the selection with `--scope` or `--target`.
    pub explicit: bool,
}

impl Selection {
    /// Every scope and every target.
    pub fn all() -> Self {
        Self::new(Scope::ALL.to_vec(), Target::ALL.to_vec())
    }

    pub fn new(scopes: Vec<Scope>, targets: Vec<Target>) -> Self {
        Self {
            scopes,
            targets,
            explicit: false,
        }
    }

    /// Builds a selection from raw `--scope`/`--target` values.
    ///
    /// Unknown values fall back to the corresponding half of `default` and
    /// produce a warning string for the caller to surface.
    pub fn from_flags(
        scope: Option<&str>,
        target: Option<&str>,
        default: &Selection,
    ) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut explicit = false;

        let scopes = match scope {
            Some(raw) => match parse_scope_list(raw) {
                Some(scopes) => {
                    explicit = true;
                    scopes
                }
                None => {
                    warnings.push(format!(
                        "unknown scope '{raw}', using {}",
                        join_names(default.scopes.iter().map(Scope::as_str))
                    ));
                    default.scopes.clone()
                }
            },
            None => default.scopes.clone(),
        };

        let targets = match target {
            Some(raw) => match parse_target_list(raw) {
                Some(targets) => {
                    explicit = true;
                    targets
                }
                None => {
                    warnings.push(format!(
                        "unknown target '{raw}', using {}",
                        join_names(default.targets.iter().map(Target::as_str))
                    ));
                    default.targets.clone()
                }
            },
            None => default.targets.clone(),
        };

        (
            Self {
                scopes,
                targets,
                explicit,
            },
            warnings,
        )
    }

    pub fn contains(&self, scope: Scope, target: Target) -> bool {
        self.scopes.contains(&scope) && self.targets.contains(&target)
    }

    /// All (scope, target) pairs in a stable order.
    pub fn pairs(&self) -> Vec<(Scope, Target)> {
        let mut pairs = Vec::new();
        for scope in Scope::ALL {
            if !self.scopes.contains(&scope) {
                continue;
            }
            for target in Target::ALL {
                if self.targets.contains(&target) {
                    pairs.push((scope, target));
                }
            }
        }
        pairs
    }
}

/// Parses `project`, `global`, `both`, `all`, or a comma list of scopes.
pub fn parse_scope_list(value: &str) -> Option<Vec<Scope>> {
    match value.trim().to_lowercase().as_str() {
        "both" | "all" => Some(Scope::ALL.to_vec()),
        other => parse_list(other, Scope::parse),
    }
}

/// Parses `claude`, `codex`, `gemini`, `both` (claude and codex), `all`, or a comma list.
pub fn parse_target_list(value: &str) -> Option<Vec<Target>> {
    match value.trim().to_lowercase().as_str() {
        "both" => Some(vec![Target::Claude, Target::Codex]),
        "all" => Some(Target::ALL.to_vec()),
        other => parse_list(other, Target::parse),
    }
}

fn parse_list<T: PartialEq>(value: &str, parse: fn(&str) -> Option<T>) -> Option<Vec<T>> {
    let mut out = Vec::new();
    for part in value.split(',').filter(|p| !p.trim().is_empty()) {
        let item = parse(part)?;
        if !out.contains(&item) {
            out.push(item);
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(",")
}
