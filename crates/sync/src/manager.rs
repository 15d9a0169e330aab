use crate::error::SkillError;
use crate::fsops::FsOps;
use crate::scan::{scan, InstalledSkillRecord};
use anyhow::Context;
use playbook_discovery::{find_skill, load_skill, SkillDefinition};
use playbook_state::{Location, Scope, Selection, Settings, StateDocument, StateStore, Target};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Owns the state document for one invocation and applies skill operations.
///
/// Operations read the filesystem fresh, mutate through [`FsOps`] (which
/// honours dry-run), and persist the state once at the end.
pub struct SkillManager<'a> {
    pub(crate) settings: &'a Settings,
    pub(crate) store: StateStore,
    pub(crate) fs: FsOps,
}

impl<'a> SkillManager<'a> {
    pub fn open(settings: &'a Settings, dry_run: bool) -> crate::Result<Self> {
        let store = StateStore::load(&settings.state_path)?;
        Ok(Self {
            settings,
            store,
            fs: FsOps::new(dry_run),
        })
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    pub fn state(&self) -> &StateDocument {
        self.store.document()
    }

    pub fn is_dry_run(&self) -> bool {
        self.fs.is_dry_run()
    }

    /// Warning produced while loading a corrupt state file, returned once.
    pub fn take_warning(&mut self) -> Option<String> {
        self.store.take_warning()
    }

    /// Installed skills within `selection`.
    pub fn scan(&self, selection: &Selection) -> Vec<InstalledSkillRecord> {
        scan(self.settings, selection, self.store.document())
    }

    pub(crate) fn persist(&mut self) -> Result<(), SkillError> {
        if self.is_dry_run() {
            tracing::debug!(target: "agent_playbook::state", "dry-run: state not written");
            return Ok(());
        }
        self.store.save()?;
        Ok(())
    }

    /// Resolvable locations of `selection`, or `NoLocation` when none are.
    pub(crate) fn locations(&self, selection: &Selection) -> Result<Vec<Location>, SkillError> {
        let locations = self.settings.locations(selection);
        if locations.is_empty() {
            return Err(SkillError::NoLocation);
        }
        Ok(locations)
    }

    pub(crate) fn entry_location(&self, scope: &str, target: &str) -> Option<Location> {
        let scope = Scope::parse(scope)?;
        let target = Target::parse(target)?;
        self.settings.location(scope, target)
    }

    /// Resolves a bare catalog name or a path to a skill definition.
    pub(crate) fn resolve_source(&self, identifier: &str) -> Result<SkillDefinition, SkillError> {
        if looks_like_path(identifier) {
            let path = expand_path(identifier, &self.settings.home, &self.settings.cwd);
            return Ok(load_skill(&path)?);
        }
        let root = self
            .settings
            .skills_source
            .as_deref()
            .ok_or(SkillError::NoSkillsSource)?;
        Ok(find_skill(root, identifier)?)
    }

    /// Valid source for `name`: `<root>/<name>` first, then `recorded`.
    pub(crate) fn pick_source(root: Option<&Path>, name: &str, recorded: &Path) -> Option<PathBuf> {
        root.map(|r| r.join(name))
            .filter(|p| playbook_discovery::is_skill_dir(p))
            .or_else(|| Some(recorded.to_path_buf()).filter(|p| playbook_discovery::is_skill_dir(p)))
            .map(|p| std::fs::canonicalize(&p).unwrap_or(p))
    }
}

/// Fails with `Ambiguous` when `records` span several locations and the user
/// gave neither `--scope` nor `--target`.
pub(crate) fn ensure_unambiguous(
    name: &str,
    records: &[InstalledSkillRecord],
    selection: &Selection,
) -> Result<(), SkillError> {
    let pairs: BTreeSet<(Scope, Target)> = records.iter().map(|r| (r.scope, r.target)).collect();
    if pairs.len() > 1 && !selection.explicit {
        return Err(SkillError::Ambiguous {
            name: name.to_string(),
            candidates: records
                .iter()
                .map(|r| format!("{} ({})", r.label(), r.path.display()))
                .collect(),
        });
    }
    Ok(())
}

fn looks_like_path(identifier: &str) -> bool {
    identifier.contains('/')
        || identifier.contains(std::path::MAIN_SEPARATOR)
        || identifier.starts_with('.')
        || identifier.starts_with('~')
}

fn expand_path(identifier: &str, home: &Path, cwd: &Path) -> PathBuf {
    let path = match identifier.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None if identifier == "~" => home.to_path_buf(),
        None => PathBuf::from(identifier),
    };
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

pub(crate) fn write_json(path: &Path, value: &impl serde::Serialize) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(value).context("failed to serialize state")?;
    std::fs::write(path, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", path.display()))
}
