use crate::error::SkillError;
use crate::fsops::{entry_exists, same_location};
use crate::manager::SkillManager;
use crate::report::{Action, ActionKind, OperationReport, SkipReason};
use playbook_state::{InstallMode, Location};
use std::path::Path;

impl SkillManager<'_> {
    /// Reinstalls every enabled managed skill from `source_root` (or the located
    /// catalog), falling back to each entry's recorded source.
    pub fn upgrade(&mut self, source_root: Option<&Path>) -> Result<OperationReport, SkillError> {
        let root = source_root
            .map(Path::to_path_buf)
            .or_else(|| self.settings.skills_source.clone());
        let mut report = OperationReport::new(self.is_dry_run());
        let entries = self.state().skills.clone();

        for entry in entries {
            let label = format!("{}/{}", entry.scope, entry.target);
            if entry.disabled {
                report.skip(&entry.name, label, SkipReason::Disabled);
                continue;
            }
            let Some(location) = self.entry_location(&entry.scope, &entry.target) else {
                report.skip(&entry.name, label, SkipReason::LocationUnavailable);
                continue;
            };
            let Some(source) = Self::pick_source(root.as_deref(), &entry.name, &entry.source) else {
                report.skip(
                    &entry.name,
                    label,
                    SkipReason::SourceNotFound {
                        source: entry.source.clone(),
                    },
                );
                continue;
            };

            let dest = location.skill_path(&entry.name, false);
            if same_location(&dest, &source) && !crate::fsops::links_to(&dest, &source) {
                report.skip(
                    &entry.name,
                    label,
                    SkipReason::SourceIsDestination { path: dest },
                );
                continue;
            }
            if let Err(e) = self.reinstall(&entry.name, &source, &location, entry.mode, &mut report) {
                report.fail(&entry.name, label, &e);
            }
        }

        self.persist()?;
        Ok(report)
    }

    fn reinstall(
        &mut self,
        name: &str,
        source: &Path,
        location: &Location,
        mode: InstallMode,
        report: &mut OperationReport,
    ) -> Result<(), SkillError> {
        let dest = location.skill_path(name, false);
        self.fs.ensure_dir(&location.skills_dir())?;
        if entry_exists(&dest) {
            self.fs.remove_entry(&dest)?;
        }
        let installed = self.fs.install(source, &dest, mode)?;
        if let Some(stored) = self
            .store
            .document_mut()
            .find_mut(name, location.scope, location.target)
        {
            stored.source = source.to_path_buf();
            stored.mode = installed.mode;
            stored.touch();
        }
        tracing::info!(
            target: "agent_playbook::upgrade",
            skill = %name,
            source = %source.display(),
            dest = %dest.display(),
            "reinstalled skill"
        );
        report.actions.push(
            Action::new(ActionKind::Reinstalled, name, location, dest)
                .with_fallback(installed.fallback),
        );
        Ok(())
    }
}
