use crate::error::SkillError;
use crate::fsops::entry_exists;
use crate::manager::SkillManager;
use crate::report::{Action, ActionKind, DoctorReport, Failed, IssueKind, SkipReason, Skipped};
use crate::scan::{inspect_path, SkillStatus};
use playbook_discovery::is_skill_dir;
use playbook_state::{Location, Scope, Selection, StateEntry};
use std::collections::{BTreeSet, HashSet};

impl SkillManager<'_> {
    /// Diagnoses installations and state entries within `selection`; with
    /// `fix`, repairs managed entries from their recorded source.
    pub fn doctor(&mut self, selection: &Selection, fix: bool) -> Result<DoctorReport, SkillError> {
        let records = self.scan(selection);
        let mut report = DoctorReport::new(self.is_dry_run());

        let mut reported_duplicates = HashSet::new();
        for record in &records {
            let label = format!("{}/{}", record.label(), record.name);
            match record.status {
                SkillStatus::Broken => report.issue(
                    IssueKind::Broken,
                    format!("{label}: broken link ({})", record.path.display()),
                ),
                SkillStatus::MissingSkillFile => report.issue(
                    IssueKind::MissingSkillFile,
                    format!("{label}: missing SKILL.md ({})", record.path.display()),
                ),
                SkillStatus::Ok | SkillStatus::Missing => {}
            }
            if record.duplicate && reported_duplicates.insert((record.target, record.name.clone())) {
                let scopes: BTreeSet<Scope> = records
                    .iter()
                    .filter(|r| r.target == record.target && r.name == record.name)
                    .map(|r| r.scope)
                    .collect();
                let scopes: Vec<_> = scopes.iter().map(Scope::as_str).collect();
                report.issue(
                    IssueKind::Duplicate,
                    format!(
                        "{}/{}: installed in several scopes ({})",
                        record.target,
                        record.name,
                        scopes.join(", ")
                    ),
                );
            }
            if !record.managed {
                report.issue(
                    IssueKind::Unmanaged,
                    format!("{label}: not managed by agent-playbook ({})", record.path.display()),
                );
            }
        }

        for entry in &self.state().skills {
            let Some((scope, target)) = entry.pair() else {
                report.issue(
                    IssueKind::LocationUnavailable,
                    format!(
                        "managed entry {}/{}/{}: unknown scope or target",
                        entry.scope, entry.target, entry.name
                    ),
                );
                continue;
            };
            if !selection.contains(scope, target) {
                continue;
            }
            let Some(location) = self.settings.location(scope, target) else {
                report.issue(
                    IssueKind::LocationUnavailable,
                    format!(
                        "managed entry {scope}/{target}/{}: location unavailable (no project root)",
                        entry.name
                    ),
                );
                continue;
            };
            let expected = location.skill_path(&entry.name, entry.disabled);
            let status = inspect_path(&expected).status;
            if status != SkillStatus::Ok {
                report.issue(
                    IssueKind::ManagedEntry,
                    format!(
                        "managed entry {}/{}: {} ({})",
                        location.label(),
                        entry.name,
                        status.as_str(),
                        expected.display()
                    ),
                );
            }
        }

        if fix {
            self.apply_fixes(selection, &mut report)?;
        }

        tracing::info!(
            target: "agent_playbook::doctor",
            issues = report.issues.len(),
            fixes = report.fixes.len(),
            "doctor finished"
        );
        Ok(report)
    }

    fn apply_fixes(&mut self, selection: &Selection, report: &mut DoctorReport) -> Result<(), SkillError> {
        let entries: Vec<(StateEntry, Location)> = self
            .state()
            .skills
            .iter()
            .filter_map(|e| {
                let (scope, target) = e.pair()?;
                if !selection.contains(scope, target) {
                    return None;
                }
                Some((e.clone(), self.settings.location(scope, target)?))
            })
            .collect();

        let mut changed = false;
        for (entry, location) in entries {
            match self.fix_entry(&entry, &location, report) {
                Ok(fixed) => changed |= fixed,
                Err(e) => report.fix_failed.push(Failed {
                    name: entry.name.clone(),
                    location: location.label(),
                    error: format!("{e:#}"),
                }),
            }
        }

        if changed {
            self.persist()?;
        }
        Ok(())
    }

    /// Applies the fix for one entry, if it needs one. Returns whether anything changed.
    fn fix_entry(
        &mut self,
        entry: &StateEntry,
        location: &Location,
        report: &mut DoctorReport,
    ) -> Result<bool, SkillError> {
        let active = location.skill_path(&entry.name, false);
        let disabled = location.skill_path(&entry.name, true);
        let active_ok = inspect_path(&active).status == SkillStatus::Ok;

        if entry.disabled {
            if active_ok {
                if entry_exists(&disabled) {
                    self.fs.remove_entry(&disabled)?;
                }
                if let Some(stored) =
                    self.store
                        .document_mut()
                        .find_mut(&entry.name, location.scope, location.target)
                {
                    stored.disabled = false;
                    stored.touch();
                }
                report
                    .fixes
                    .push(Action::new(ActionKind::Enabled, &entry.name, location, &active));
                return Ok(true);
            }
            if inspect_path(&disabled).status != SkillStatus::Ok {
                return self.reinstall_entry(entry, location, true, report);
            }
            return Ok(false);
        }
        if !active_ok {
            return self.reinstall_entry(entry, location, false, report);
        }
        Ok(false)
    }

    fn reinstall_entry(
        &mut self,
        entry: &StateEntry,
        location: &Location,
        disabled: bool,
        report: &mut DoctorReport,
    ) -> Result<bool, SkillError> {
        if !is_skill_dir(&entry.source) {
            report.fix_skipped.push(Skipped {
                name: entry.name.clone(),
                location: location.label(),
                reason: SkipReason::SourceNotFound {
                    source: entry.source.clone(),
                },
            });
            return Ok(false);
        }
        let dest = location.skill_path(&entry.name, disabled);
        if entry_exists(&dest) {
            self.fs.remove_entry(&dest)?;
        }
        if let Some(parent) = dest.parent() {
            self.fs.ensure_dir(parent)?;
        }
        let installed = self.fs.install(&entry.source, &dest, entry.mode)?;
        if let Some(stored) =
            self.store
                .document_mut()
                .find_mut(&entry.name, location.scope, location.target)
        {
            stored.mode = installed.mode;
            stored.touch();
        }
        report.fixes.push(
            Action::new(ActionKind::Reinstalled, &entry.name, location, dest)
                .with_fallback(installed.fallback),
        );
        Ok(true)
    }
}
