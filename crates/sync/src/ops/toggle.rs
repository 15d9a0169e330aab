use crate::error::SkillError;
use crate::fsops::entry_exists;
use crate::gate::OverwriteGate;
use crate::manager::{ensure_unambiguous, SkillManager};
use crate::report::{Action, ActionKind, OperationReport, SkipReason};
use crate::scan::InstalledSkillRecord;
use playbook_state::{Location, Selection};

impl SkillManager<'_> {
    /// Moves active installations of `name` into the disabled directory.
    pub fn disable(
        &mut self,
        name: &str,
        selection: &Selection,
        gate: &mut OverwriteGate,
    ) -> Result<OperationReport, SkillError> {
        self.toggle(name, selection, gate, true)
    }

    /// Moves disabled installations of `name` back into the skills directory.
    pub fn enable(
        &mut self,
        name: &str,
        selection: &Selection,
        gate: &mut OverwriteGate,
    ) -> Result<OperationReport, SkillError> {
        self.toggle(name, selection, gate, false)
    }

    fn toggle(
        &mut self,
        name: &str,
        selection: &Selection,
        gate: &mut OverwriteGate,
        disable: bool,
    ) -> Result<OperationReport, SkillError> {
        let matches: Vec<_> = self
            .scan(selection)
            .into_iter()
            .filter(|r| r.name == name)
            .collect();
        if matches.is_empty() {
            return Err(SkillError::NotInstalled {
                name: name.to_string(),
            });
        }

        // Records already in the requested state are reported, not moved.
        let (candidates, settled): (Vec<InstalledSkillRecord>, Vec<InstalledSkillRecord>) =
            matches.into_iter().partition(|r| r.disabled != disable);
        let mut report = OperationReport::new(self.is_dry_run());
        for record in &settled {
            let covered = candidates
                .iter()
                .any(|c| c.scope == record.scope && c.target == record.target);
            if !covered {
                let reason = if disable {
                    SkipReason::AlreadyDisabled
                } else {
                    SkipReason::AlreadyEnabled
                };
                report.skip(name, record.label(), reason);
            }
        }

        ensure_unambiguous(name, &candidates, selection)?;

        for record in &candidates {
            let Some(location) = self.settings.location(record.scope, record.target) else {
                continue;
            };
            if let Err(e) = self.move_record(name, record, &location, disable, gate, &mut report) {
                report.fail(name, record.label(), &e);
            }
        }

        self.persist()?;
        Ok(report)
    }

    fn move_record(
        &mut self,
        name: &str,
        record: &InstalledSkillRecord,
        location: &Location,
        disable: bool,
        gate: &mut OverwriteGate,
        report: &mut OperationReport,
    ) -> Result<(), SkillError> {
        let dest = location.skill_path(name, disable);
        if entry_exists(&dest) {
            if !gate.confirm(&dest)? {
                report.skip(name, record.label(), SkipReason::Exists { path: dest });
                return Ok(());
            }
            self.fs.remove_entry(&dest)?;
            report.overwritten.push(dest.clone());
        }
        if let Some(parent) = dest.parent() {
            self.fs.ensure_dir(parent)?;
        }
        self.fs.move_entry(&record.path, &dest)?;

        if let Some(entry) = self
            .store
            .document_mut()
            .find_mut(name, record.scope, record.target)
        {
            entry.disabled = disable;
            entry.touch();
        }

        let kind = if disable {
            ActionKind::Disabled
        } else {
            ActionKind::Enabled
        };
        tracing::info!(
            target: "agent_playbook::toggle",
            skill = %name,
            from = %record.path.display(),
            to = %dest.display(),
            managed = record.managed,
            "{}",
            kind.as_str()
        );
        report.actions.push(Action::new(kind, name, location, dest));
        Ok(())
    }
}
