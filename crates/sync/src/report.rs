//! Reporting types for what an operation did and what it skipped.

use playbook_state::{Location, Scope, Target};
use serde::Serialize;
use std::path::PathBuf;

/// What happened to one skill at one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Linked,
    Copied,
    Removed,
    Disabled,
    Enabled,
    Reinstalled,
    /// State entry dropped without a filesystem counterpart.
    PurgedState,
    /// Disabled entry recorded without installing it.
    Recorded,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Linked => "linked",
            ActionKind::Copied => "copied",
            ActionKind::Removed => "removed",
            ActionKind::Disabled => "disabled",
            ActionKind::Enabled => "enabled",
            ActionKind::Reinstalled => "reinstalled",
            ActionKind::PurgedState => "purged state entry",
            ActionKind::Recorded => "recorded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub name: String,
    pub scope: Scope,
    pub target: Target,
    pub path: PathBuf,
    /// Set when a symlink could not be created and the skill was copied instead.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl Action {
    pub fn new(kind: ActionKind, name: &str, location: &Location, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            name: name.to_string(),
            scope: location.scope,
            target: location.target,
            path: path.into(),
            fallback: false,
        }
    }

    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn describe(&self) -> String {
        let mut line = format!(
            "{} {} ({}/{}) -> {}",
            self.kind.as_str(),
            self.name,
            self.scope,
            self.target,
            self.path.display()
        );
        if self.fallback {
            line.push_str(" [symlink failed, copied]");
        }
        line
    }
}

/// Reasons why an item was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SkipReason {
    /// Destination exists and the overwrite gate declined.
    Exists { path: PathBuf },
    /// Destination already links to the requested source.
    AlreadyLinked,
    /// Installed but not tracked in state; needs `--force`.
    Unmanaged,
    AlreadyDisabled,
    AlreadyEnabled,
    /// Neither the catalog nor the recorded source holds a valid skill.
    SourceNotFound { source: PathBuf },
    /// The source directory is the destination itself.
    SourceIsDestination { path: PathBuf },
    /// Scope/target cannot be resolved (unknown value or no project root).
    LocationUnavailable,
    /// Entry is disabled and was left alone.
    Disabled,
}

impl SkipReason {
    /// Returns a human-readable description of the skip reason.
    pub fn description(&self) -> String {
        match self {
            Self::Exists { path } => format!("exists at {} (use --overwrite)", path.display()),
            Self::AlreadyLinked => "already linked".to_string(),
            Self::Unmanaged => "not managed by agent-playbook (use --force)".to_string(),
            Self::AlreadyDisabled => "already disabled".to_string(),
            Self::AlreadyEnabled => "already enabled".to_string(),
            Self::SourceNotFound { source } => {
                format!("source not found: {}", source.display())
            }
            Self::SourceIsDestination { path } => {
                format!("source is the destination: {}", path.display())
            }
            Self::LocationUnavailable => "location unavailable".to_string(),
            Self::Disabled => "disabled".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub name: String,
    /// `scope/target` label; raw strings for entries that do not resolve.
    pub location: String,
    pub reason: SkipReason,
}

impl Skipped {
    pub fn describe(&self) -> String {
        format!(
            "skipped {} ({}): {}",
            self.name,
            self.location,
            self.reason.description()
        )
    }
}

/// An item whose filesystem change failed; later items still ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failed {
    pub name: String,
    pub location: String,
    pub error: String,
}

impl Failed {
    pub fn describe(&self) -> String {
        format!("failed {} ({}): {}", self.name, self.location, self.error)
    }
}

/// Outcome of a mutating skill operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationReport {
    pub dry_run: bool,
    pub actions: Vec<Action>,
    pub skipped: Vec<Skipped>,
    /// Existing entries deleted after the overwrite gate agreed.
    pub overwritten: Vec<PathBuf>,
    pub warnings: Vec<String>,
    pub failed: Vec<Failed>,
}

impl OperationReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub fn skip(&mut self, name: &str, location: impl Into<String>, reason: SkipReason) {
        self.skipped.push(Skipped {
            name: name.to_string(),
            location: location.into(),
            reason,
        });
    }

    /// Records a per-item failure. The error chain is kept on one line.
    pub fn fail(&mut self, name: &str, location: impl Into<String>, error: &dyn std::fmt::Display) {
        let error = format!("{error:#}");
        tracing::warn!(target: "agent_playbook::report", skill = %name, %error, "item failed");
        self.failed.push(Failed {
            name: name.to_string(),
            location: location.into(),
            error,
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }

    /// Lines suitable for printing, one per overwrite, action, skip, and failure.
    pub fn lines(&self) -> Vec<String> {
        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        let mut out = Vec::new();
        for path in &self.overwritten {
            out.push(format!("{prefix}overwrote {}", path.display()));
        }
        for action in &self.actions {
            out.push(format!("{prefix}{}", action.describe()));
        }
        for skipped in &self.skipped {
            out.push(format!("{prefix}{}", skipped.describe()));
        }
        for failed in &self.failed {
            out.push(format!("{prefix}{}", failed.describe()));
        }
        out
    }
}

/// Category of a doctor finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    Broken,
    MissingSkillFile,
    Duplicate,
    Unmanaged,
    ManagedEntry,
    LocationUnavailable,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Broken => "broken",
            IssueKind::MissingSkillFile => "missing-skill-file",
            IssueKind::Duplicate => "duplicate",
            IssueKind::Unmanaged => "unmanaged",
            IssueKind::ManagedEntry => "managed-entry",
            IssueKind::LocationUnavailable => "location-unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DoctorReport {
    pub dry_run: bool,
    pub issues: Vec<Issue>,
    pub fixes: Vec<Action>,
    /// Fixes that could not be applied, e.g. because the source is gone.
    pub fix_skipped: Vec<Skipped>,
    /// Fixes whose filesystem change failed.
    pub fix_failed: Vec<Failed>,
}

impl DoctorReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub fn issue(&mut self, kind: IssueKind, message: impl Into<String>) {
        self.issues.push(Issue {
            kind,
            message: message.into(),
        });
    }

    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

/// A change `sync` made to the state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StateChange {
    Dropped { name: String, scope: String, target: String },
    MarkedDisabled { name: String, scope: String, target: String },
    MarkedEnabled { name: String, scope: String, target: String },
}

impl StateChange {
    pub fn describe(&self) -> String {
        match self {
            Self::Dropped {
                name,
                scope,
                target,
            } => format!("dropped {name} ({scope}/{target}): location no longer resolvable"),
            Self::MarkedDisabled {
                name,
                scope,
                target,
            } => format!("marked {name} ({scope}/{target}) disabled: only the disabled copy exists"),
            Self::MarkedEnabled {
                name,
                scope,
                target,
            } => format!("marked {name} ({scope}/{target}) enabled: only the active copy exists"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub changes: Vec<StateChange>,
}

impl SyncReport {
    pub fn is_changed(&self) -> bool {
        !self.changes.is_empty()
    }
}
