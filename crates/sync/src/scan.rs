//! Read-only enumeration of installed skills across locations.

use crate::fsops::{entry_kind, EntryKind};
use playbook_discovery::MANIFEST_FILE;
use playbook_state::{Location, Scope, Selection, Settings, StateDocument, Target};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Health of an installed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillStatus {
    Ok,
    /// Symlink whose target is gone.
    Broken,
    /// Nothing there, or something that is not a directory.
    Missing,
    /// Directory (or link to one) without `SKILL.md`.
    MissingSkillFile,
}

impl SkillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillStatus::Ok => "ok",
            SkillStatus::Broken => "broken",
            SkillStatus::Missing => "missing",
            SkillStatus::MissingSkillFile => "missing-skill-file",
        }
    }
}

/// Install mode as observed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservedMode {
    Link,
    Copy,
    Unknown,
}

impl ObservedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservedMode::Link => "link",
            ObservedMode::Copy => "copy",
            ObservedMode::Unknown => "unknown",
        }
    }
}

/// What a single path holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub status: SkillStatus,
    pub mode: ObservedMode,
    /// Real path of a healthy link.
    pub resolved: Option<PathBuf>,
}

pub fn inspect_path(path: &Path) -> Inspection {
    match entry_kind(path) {
        EntryKind::Missing | EntryKind::File => Inspection {
            status: SkillStatus::Missing,
            mode: ObservedMode::Unknown,
            resolved: None,
        },
        EntryKind::Dir => Inspection {
            status: manifest_status(path),
            mode: ObservedMode::Copy,
            resolved: None,
        },
        EntryKind::Symlink => match fs::metadata(path) {
            Err(_) => Inspection {
                status: SkillStatus::Broken,
                mode: ObservedMode::Link,
                resolved: None,
            },
            Ok(meta) if !meta.is_dir() => Inspection {
                status: SkillStatus::Missing,
                mode: ObservedMode::Link,
                resolved: None,
            },
            Ok(_) => Inspection {
                status: manifest_status(path),
                mode: ObservedMode::Link,
                resolved: fs::canonicalize(path).ok(),
            },
        },
    }
}

fn manifest_status(dir: &Path) -> SkillStatus {
    if dir.join(MANIFEST_FILE).is_file() {
        SkillStatus::Ok
    } else {
        SkillStatus::MissingSkillFile
    }
}

/// One directory or symlink found under a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledSkillRecord {
    pub name: String,
    pub scope: Scope,
    pub target: Target,
    pub path: PathBuf,
    pub install_mode: ObservedMode,
    pub resolved_source: Option<PathBuf>,
    pub disabled: bool,
    pub status: SkillStatus,
    pub managed: bool,
    pub duplicate: bool,
}

impl InstalledSkillRecord {
    /// Status shown to users: healthy disabled entries read as `disabled`.
    pub fn display_status(&self) -> &'static str {
        if self.disabled && self.status == SkillStatus::Ok {
            "disabled"
        } else {
            self.status.as_str()
        }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.scope, self.target)
    }
}

/// Enumerates installed skills in every resolvable location of `selection`.
pub fn scan(
    settings: &Settings,
    selection: &Selection,
    state: &StateDocument,
) -> Vec<InstalledSkillRecord> {
    let mut records = Vec::new();
    for location in settings.locations(selection) {
        scan_dir(&location, &location.skills_dir(), false, state, &mut records);
        scan_dir(&location, &location.disabled_dir(), true, state, &mut records);
    }
    mark_duplicates(&mut records);
    records.sort_by(|a, b| {
        (a.scope, a.target, &a.name, a.disabled).cmp(&(b.scope, b.target, &b.name, b.disabled))
    });
    records
}

fn scan_dir(
    location: &Location,
    dir: &Path,
    disabled: bool,
    state: &StateDocument,
    out: &mut Vec<InstalledSkillRecord>,
) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        let inspection = inspect_path(&path);
        out.push(InstalledSkillRecord {
            managed: state.contains(&name, location.scope, location.target),
            name,
            scope: location.scope,
            target: location.target,
            path,
            install_mode: inspection.mode,
            resolved_source: inspection.resolved,
            disabled,
            status: inspection.status,
            duplicate: false,
        });
    }
}

/// Flags records whose (target, name) appears in more than one scope.
fn mark_duplicates(records: &mut [InstalledSkillRecord]) {
    let mut scopes: BTreeMap<(Target, String), BTreeSet<Scope>> = BTreeMap::new();
    for record in records.iter() {
        scopes
            .entry((record.target, record.name.clone()))
            .or_default()
            .insert(record.scope);
    }
    for record in records.iter_mut() {
        record.duplicate = scopes
            .get(&(record.target, record.name.clone()))
            .is_some_and(|s| s.len() > 1);
    }
}
