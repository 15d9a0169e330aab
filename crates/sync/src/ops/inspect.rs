use crate::error::SkillError;
use crate::manager::SkillManager;
use crate::scan::InstalledSkillRecord;
use playbook_discovery::{find_skill, SkillDefinition};
use playbook_state::{Selection, StateEntry};
use serde::Serialize;

/// Everything known about one skill name.
#[derive(Debug, Clone, Serialize)]
pub struct SkillInfo {
    pub name: String,
    /// Catalog definition, when the skills source has this skill.
    pub catalog: Option<SkillDefinition>,
    pub installs: Vec<InstalledSkillRecord>,
    pub entries: Vec<StateEntry>,
}

impl SkillManager<'_> {
    /// Collects catalog, filesystem, and state details for `name`.
    pub fn info(&self, name: &str, selection: &Selection) -> Result<SkillInfo, SkillError> {
        let catalog = self
            .settings
            .skills_source
            .as_deref()
            .and_then(|root| find_skill(root, name).ok());
        let installs: Vec<_> = self
            .scan(selection)
            .into_iter()
            .filter(|r| r.name == name)
            .collect();
        let entries: Vec<_> = self
            .state()
            .skills
            .iter()
            .filter(|e| e.name == name)
            .filter(|e| e.pair().map_or(true, |(s, t)| selection.contains(s, t)))
            .cloned()
            .collect();

        if catalog.is_none() && installs.is_empty() && entries.is_empty() {
            return Err(SkillError::NotInstalled {
                name: name.to_string(),
            });
        }
        Ok(SkillInfo {
            name: name.to_string(),
            catalog,
            installs,
            entries,
        })
    }
}
