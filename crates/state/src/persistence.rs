//! The persisted manifest of managed skills.

use crate::layout::{Scope, Target};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const STATE_VERSION: u32 = 1;

/// How a skill is materialized at its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    Link,
    Copy,
}

impl InstallMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallMode::Link => "link",
            InstallMode::Copy => "copy",
        }
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A managed installation, keyed by `(name, scope, target)`.
///
/// Scope and target are kept as raw strings so documents written by other
/// versions still load; entries whose values no longer parse are dropped by
/// `sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub name: String,
    pub scope: String,
    pub target: String,
    pub source: PathBuf,
    pub mode: InstallMode,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub installed_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl StateEntry {
    pub fn new(
        name: impl Into<String>,
        scope: Scope,
        target: Target,
        source: impl Into<PathBuf>,
        mode: InstallMode,
    ) -> Self {
        let now = now_rfc3339();
        Self {
            name: name.into(),
            scope: scope.as_str().to_string(),
            target: target.as_str().to_string(),
            source: source.into(),
            mode,
            disabled: false,
            installed_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn scope(&self) -> Option<Scope> {
        Scope::parse(&self.scope)
    }

    pub fn target(&self) -> Option<Target> {
        Target::parse(&self.target)
    }

    /// Parsed `(scope, target)`, or `None` when either value is unknown.
    pub fn pair(&self) -> Option<(Scope, Target)> {
        Some((self.scope()?, self.target()?))
    }

    pub fn is_key(&self, name: &str, scope: Scope, target: Target) -> bool {
        self.name == name && self.pair() == Some((scope, target))
    }

    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    pub version: u32,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub skills: Vec<StateEntry>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: now_rfc3339(),
            skills: Vec::new(),
        }
    }
}

impl StateDocument {
    pub fn find(&self, name: &str, scope: Scope, target: Target) -> Option<&StateEntry> {
        self.skills.iter().find(|e| e.is_key(name, scope, target))
    }

    pub fn find_mut(&mut self, name: &str, scope: Scope, target: Target) -> Option<&mut StateEntry> {
        self.skills.iter_mut().find(|e| e.is_key(name, scope, target))
    }

    pub fn contains(&self, name: &str, scope: Scope, target: Target) -> bool {
        self.find(name, scope, target).is_some()
    }

    /// Inserts or replaces the entry with the same key, keeping the original
    /// `installed_at`. Returns the replaced entry.
    pub fn upsert(&mut self, mut entry: StateEntry) -> Option<StateEntry> {
        let key = entry.pair();
        let existing = self
            .skills
            .iter()
            .position(|e| e.name == entry.name && e.pair() == key && key.is_some());
        match existing {
            Some(idx) => {
                if !self.skills[idx].installed_at.is_empty() {
                    entry.installed_at = self.skills[idx].installed_at.clone();
                }
                Some(std::mem::replace(&mut self.skills[idx], entry))
            }
            None => {
                self.skills.push(entry);
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str, scope: Scope, target: Target) -> Option<StateEntry> {
        let idx = self
            .skills
            .iter()
            .position(|e| e.is_key(name, scope, target))?;
        Some(self.skills.remove(idx))
    }
}

/// Loads and saves the state document at a fixed path.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    doc: StateDocument,
    warning: Option<String>,
}

impl StateStore {
    /// Loads the document at `path`.
    ///
    /// A missing file yields an empty document. An unparseable file is
    /// discarded and replaced by an empty document; the reason is kept as a
    /// warning retrievable with [`StateStore::take_warning`].
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut warning = None;
        let doc = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read state file: {}", path.display()))?;
            match serde_json::from_str::<StateDocument>(&text) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(
                        target: "agent_playbook::state",
                        path = %path.display(),
                        error = %e,
                        "state file is corrupt; starting from an empty document"
                    );
                    warning = Some(format!(
                        "state file {} is corrupt ({e}); discarding and recreating",
                        path.display()
                    ));
                    StateDocument::default()
                }
            }
        } else {
            StateDocument::default()
        };
        Ok(Self { path, doc, warning })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &StateDocument {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut StateDocument {
        &mut self.doc
    }

    /// Replaces the whole document.
    pub fn replace(&mut self, doc: StateDocument) {
        self.doc = doc;
    }

    /// Returns the load-time warning once.
    pub fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }

    /// Writes the document, stamping `updated_at`.
    pub fn save(&mut self) -> Result<()> {
        self.doc.updated_at = now_rfc3339();
        self.doc.skills.sort_by(|a, b| {
            (&a.name, &a.scope, &a.target).cmp(&(&b.name, &b.scope, &b.target))
        });
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create state directory: {}", parent.display())
            })?;
        }
        let data =
            serde_json::to_string_pretty(&self.doc).context("failed to serialize state document")?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, format!("{data}\n"))
            .with_context(|| format!("failed to write temp file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("failed to rename temp file to: {}", self.path.display()))?;
        tracing::debug!(
            target: "agent_playbook::state",
            path = %self.path.display(),
            entries = self.doc.skills.len(),
            "saved state"
        );
        Ok(())
    }
}

/// Reads a state document strictly; used for imports where a bad file is an error.
pub fn read_document(path: &Path) -> Result<StateDocument> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read state file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse state file: {}", path.display()))
}

/// Current UTC time in RFC 3339.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
