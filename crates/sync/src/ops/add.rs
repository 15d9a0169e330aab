use crate::error::SkillError;
use crate::fsops::{entry_exists, links_to, same_location};
use crate::gate::OverwriteGate;
use crate::manager::SkillManager;
use crate::report::{Action, ActionKind, OperationReport, SkipReason};
use playbook_state::{InstallMode, Location, Selection, StateEntry};
use std::path::Path;

impl SkillManager<'_> {
    /// Installs a skill, given by catalog name or path, into every location of `selection`.
    pub fn add(
        &mut self,
        identifier: &str,
        selection: &Selection,
        mode: InstallMode,
        gate: &mut OverwriteGate,
    ) -> Result<OperationReport, SkillError> {
        let skill = self.resolve_source(identifier)?;
        let locations = self.locations(selection)?;
        let mut report = OperationReport::new(self.is_dry_run());

        tracing::info!(
            target: "agent_playbook::add",
            skill = %skill.name,
            source = %skill.source_path.display(),
            mode = %mode,
            locations = locations.len(),
            "adding skill"
        );

        // A failing location is reported and the rest still run; state keeps
        // whatever was installed.
        for location in &locations {
            if let Err(e) =
                self.install_skill(&skill.name, &skill.source_path, location, mode, gate, &mut report)
            {
                report.fail(&skill.name, location.label(), &e);
            }
        }
        self.persist()?;
        Ok(report)
    }

    /// Installs `source` as `name` at `location`, consulting the gate when the
    /// destination is occupied, and records the state entry.
    ///
    /// Returns whether the skill is now installed from `source`.
    pub(crate) fn install_skill(
        &mut self,
        name: &str,
        source: &Path,
        location: &Location,
        mode: InstallMode,
        gate: &mut OverwriteGate,
        report: &mut OperationReport,
    ) -> Result<bool, SkillError> {
        let skills_dir = location.skills_dir();
        self.fs.ensure_dir(&skills_dir)?;
        let dest = skills_dir.join(name);

        if entry_exists(&dest) {
            let linked = links_to(&dest, source);
            if mode == InstallMode::Link && linked {
                report.skip(name, location.label(), SkipReason::AlreadyLinked);
                self.record_install(name, source, location, InstallMode::Link);
                return Ok(true);
            }
            if !linked && same_location(&dest, source) {
                report.skip(
                    name,
                    location.label(),
                    SkipReason::SourceIsDestination { path: dest },
                );
                return Ok(false);
            }
            if !gate.confirm(&dest)? {
                report.skip(name, location.label(), SkipReason::Exists { path: dest });
                return Ok(false);
            }
            self.fs.remove_entry(&dest)?;
            report.overwritten.push(dest.clone());
        }

        let installed = self.fs.install(source, &dest, mode)?;
        let kind = match installed.mode {
            InstallMode::Link => ActionKind::Linked,
            InstallMode::Copy => ActionKind::Copied,
        };
        if installed.fallback {
            report.warnings.push(format!(
                "symlink failed for {}; copied instead",
                dest.display()
            ));
        }
        report
            .actions
            .push(Action::new(kind, name, location, &dest).with_fallback(installed.fallback));
        self.record_install(name, source, location, installed.mode);
        Ok(true)
    }

    fn record_install(&mut self, name: &str, source: &Path, location: &Location, mode: InstallMode) {
        self.store.document_mut().upsert(StateEntry::new(
            name,
            location.scope,
            location.target,
            source,
            mode,
        ));
    }
}
