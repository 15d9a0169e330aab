use crate::error::SkillError;
use crate::fsops::entry_exists;
use crate::manager::SkillManager;
use crate::report::{StateChange, SyncReport};

impl SkillManager<'_> {
    /// Brings the state document in line with the filesystem without touching it.
    ///
    /// Entries whose location no longer resolves are dropped; the `disabled`
    /// flag follows whichever copy exists when only one does.
    pub fn sync(&mut self) -> Result<SyncReport, SkillError> {
        let mut report = SyncReport {
            dry_run: self.is_dry_run(),
            changes: Vec::new(),
        };
        let entries = std::mem::take(&mut self.store.document_mut().skills);
        let mut kept = Vec::with_capacity(entries.len());

        for mut entry in entries {
            let Some(location) = self.entry_location(&entry.scope, &entry.target) else {
                report.changes.push(StateChange::Dropped {
                    name: entry.name.clone(),
                    scope: entry.scope.clone(),
                    target: entry.target.clone(),
                });
                continue;
            };
            let active = entry_exists(&location.skill_path(&entry.name, false));
            let disabled = entry_exists(&location.skill_path(&entry.name, true));

            if !entry.disabled && !active && disabled {
                entry.disabled = true;
                entry.touch();
                report.changes.push(StateChange::MarkedDisabled {
                    name: entry.name.clone(),
                    scope: entry.scope.clone(),
                    target: entry.target.clone(),
                });
            } else if entry.disabled && active && !disabled {
                entry.disabled = false;
                entry.touch();
                report.changes.push(StateChange::MarkedEnabled {
                    name: entry.name.clone(),
                    scope: entry.scope.clone(),
                    target: entry.target.clone(),
                });
            }
            kept.push(entry);
        }

        self.store.document_mut().skills = kept;
        self.persist()?;
        tracing::info!(
            target: "agent_playbook::sync",
            changes = report.changes.len(),
            "state reconciled"
        );
        Ok(report)
    }
}
