use crate::error::SkillError;
use crate::gate::OverwriteGate;
use crate::manager::{write_json, SkillManager};
use crate::report::{Action, ActionKind, OperationReport, SkipReason};
use playbook_state::{read_document, StateDocument};
use std::path::Path;

impl SkillManager<'_> {
    /// Writes the current state document to `output`. Returns the entry count.
    pub fn export(&self, output: &Path) -> Result<usize, SkillError> {
        write_json(output, self.state())?;
        tracing::info!(
            target: "agent_playbook::export",
            path = %output.display(),
            entries = self.state().skills.len(),
            "exported state"
        );
        Ok(self.state().skills.len())
    }

    /// Restores skills from an exported state document.
    ///
    /// The local document is replaced, not merged: installations managed
    /// before the import but absent from the file become unmanaged.
    pub fn import(
        &mut self,
        input: &Path,
        source_root: Option<&Path>,
        gate: &mut OverwriteGate,
    ) -> Result<OperationReport, SkillError> {
        let incoming = read_document(input)?;
        let root = source_root
            .map(Path::to_path_buf)
            .or_else(|| self.settings.skills_source.clone());
        let mut report = OperationReport::new(self.is_dry_run());

        self.store.replace(StateDocument::default());

        for entry in incoming.skills {
            let label = format!("{}/{}", entry.scope, entry.target);
            let Some(location) = self.entry_location(&entry.scope, &entry.target) else {
                report.skip(&entry.name, label, SkipReason::LocationUnavailable);
                continue;
            };
            if entry.disabled {
                let path = location.skill_path(&entry.name, true);
                report
                    .actions
                    .push(Action::new(ActionKind::Recorded, &entry.name, &location, path));
                self.store.document_mut().upsert(entry);
                continue;
            }
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
            let installed =
                match self.install_skill(&entry.name, &source, &location, entry.mode, gate, &mut report) {
                    Ok(installed) => installed,
                    Err(e) => {
                        report.fail(&entry.name, label, &e);
                        continue;
                    }
                };
            if installed && !entry.installed_at.is_empty() {
                if let Some(stored) =
                    self.store
                        .document_mut()
                        .find_mut(&entry.name, location.scope, location.target)
                {
                    stored.installed_at = entry.installed_at.clone();
                }
            }
        }

        self.persist()?;
        tracing::info!(
            target: "agent_playbook::import",
            path = %input.display(),
            installed = report.actions.len(),
            skipped = report.skipped.len(),
            "imported state"
        );
        Ok(report)
    }
}
