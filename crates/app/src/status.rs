//! Installation status for one scope.

use crate::setup::{claude_settings_readable, has_claude_hooks, has_codex_block};
use playbook_state::{Scope, Settings, StateDocument, Target};
use playbook_sync::InstalledSkillRecord;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Installed skill counts for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetCount {
    pub target: Target,
    pub active: usize,
    pub disabled: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub scope: Scope,
    pub skills_source: Option<PathBuf>,
    pub claude_settings: Option<PathBuf>,
    pub claude_settings_readable: bool,
    pub hooks_installed: bool,
    pub codex_config: Option<PathBuf>,
    pub codex_block: bool,
    pub counts: Vec<TargetCount>,
    pub managed_entries: usize,
}

impl StatusReport {
    /// Builds the report from `records` (a scan of `scope`) and the state document.
    pub fn collect(
        settings: &Settings,
        scope: Scope,
        records: &[InstalledSkillRecord],
        state: &StateDocument,
    ) -> Self {
        let claude_settings = settings
            .location(scope, Target::Claude)
            .map(|l| l.settings_path());
        let codex_config = settings
            .location(scope, Target::Codex)
            .map(|l| l.settings_path());
        let claude_settings_readable = claude_settings
            .as_deref()
            .is_none_or(claude_settings_readable);
        let hooks_installed = claude_settings.as_deref().is_some_and(has_claude_hooks);
        let codex_block = codex_config
            .as_deref()
            .and_then(|p| fs::read_to_string(p).ok())
            .is_some_and(|content| has_codex_block(&content));

        let counts = Target::ALL
            .iter()
            .map(|&target| {
                let of_target = records
                    .iter()
                    .filter(|r| r.scope == scope && r.target == target);
                let (disabled, active): (Vec<_>, Vec<_>) = of_target.partition(|r| r.disabled);
                TargetCount {
                    target,
                    active: active.len(),
                    disabled: disabled.len(),
                }
            })
            .collect();
        let managed_entries = state
            .skills
            .iter()
            .filter(|e| e.scope() == Some(scope))
            .count();

        Self {
            scope,
            skills_source: settings.skills_source.clone(),
            claude_settings,
            claude_settings_readable,
            hooks_installed,
            codex_config,
            codex_block,
            counts,
            managed_entries,
        }
    }

    /// Setup problems worth a non-zero exit from `doctor`.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.skills_source.is_none() {
            issues.push(
                "skills source not found (use --repo or set AGENT_PLAYBOOK_SKILLS_DIR)".to_string(),
            );
        }
        let Some(settings) = &self.claude_settings else {
            issues.push(format!(
                "no project root for {} scope (use --repo)",
                self.scope
            ));
            return issues;
        };
        if !self.claude_settings_readable {
            issues.push(format!("unable to parse {}", settings.display()));
        }
        if self.managed_entries == 0 {
            issues.push(format!("no managed skills in {} scope (run init)", self.scope));
        }
        if !self.hooks_installed {
            issues.push("hooks not installed".to_string());
        }
        if !self.codex_block {
            issues.push("Codex config missing agent_playbook block".to_string());
        }
        issues
    }

    pub fn lines(&self) -> Vec<String> {
        fn path_or(path: &Option<PathBuf>, missing: &str) -> String {
            path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| missing.to_string())
        }
        let yes_no = |b: bool| if b { "yes" } else { "no" };

        let mut lines = vec![
            format!("Scope: {}", self.scope),
            format!("Skills source: {}", path_or(&self.skills_source, "(not found)")),
            format!(
                "Claude settings: {}",
                path_or(&self.claude_settings, "(no project root)")
            ),
            format!("Hooks installed: {}", yes_no(self.hooks_installed)),
            format!(
                "Codex config: {}",
                path_or(&self.codex_config, "(no project root)")
            ),
            format!("Codex block present: {}", yes_no(self.codex_block)),
            "Installed skills:".to_string(),
        ];
        for count in &self.counts {
            lines.push(format!(
                "  {}: {} active, {} disabled",
                count.target, count.active, count.disabled
            ));
        }
        lines.push(format!("Managed entries: {}", self.managed_entries));
        lines
    }
}
