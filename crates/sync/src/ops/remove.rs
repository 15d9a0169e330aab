use crate::error::SkillError;
use crate::manager::{ensure_unambiguous, SkillManager};
use crate::report::{Action, ActionKind, OperationReport, SkipReason};
use playbook_state::Selection;

impl SkillManager<'_> {
    /// Removes installations of `name` within `selection`.
    ///
    /// Unmanaged installations are skipped unless `force` is set. When nothing
    /// is installed but stale state entries exist, only those entries go.
    pub fn remove(
        &mut self,
        name: &str,
        selection: &Selection,
        force: bool,
    ) -> Result<OperationReport, SkillError> {
        let matches: Vec<_> = self
            .scan(selection)
            .into_iter()
            .filter(|r| r.name == name)
            .collect();
        let mut report = OperationReport::new(self.is_dry_run());

        if matches.is_empty() {
            let stale: Vec<_> = self
                .state()
                .skills
                .iter()
                .filter(|e| e.name == name)
                .filter_map(|e| e.pair())
                .filter(|(scope, target)| selection.contains(*scope, *target))
                .collect();
            if stale.is_empty() {
                return Err(SkillError::NotInstalled {
                    name: name.to_string(),
                });
            }
            for (scope, target) in stale {
                self.store.document_mut().remove(name, scope, target);
                if let Some(location) = self.settings.location(scope, target) {
                    let path = location.skills_dir().join(name);
                    report
                        .actions
                        .push(Action::new(ActionKind::PurgedState, name, &location, path));
                }
            }
            self.persist()?;
            return Ok(report);
        }

        ensure_unambiguous(name, &matches, selection)?;

        for record in &matches {
            if !record.managed && !force {
                report.skip(name, record.label(), SkipReason::Unmanaged);
                continue;
            }
            if let Err(e) = self.fs.remove_entry(&record.path) {
                report.fail(name, record.label(), &e);
                continue;
            }
            self.store
                .document_mut()
                .remove(name, record.scope, record.target);
            if let Some(location) = self.settings.location(record.scope, record.target) {
                report.actions.push(Action::new(
                    ActionKind::Removed,
                    name,
                    &location,
                    &record.path,
                ));
            }
            tracing::info!(
                target: "agent_playbook::remove",
                skill = %name,
                path = %record.path.display(),
                managed = record.managed,
                "removed skill"
            );
        }
        self.persist()?;
        Ok(report)
    }
}
