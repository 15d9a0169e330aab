//! Skill installation and state reconciliation.
//!
//! Installs skills by symlink or copy into Claude, Codex, and Gemini skill
//! directories at project or global scope, and keeps the persisted state
//! document consistent with what is actually on disk.
//!
//! # Examples
//!
//! ```
//! use playbook_state::{InstallMode, Scope, Selection, Settings, Target};
//! use playbook_sync::{OverwriteGate, SkillManager};
//! use tempfile::tempdir;
//!
//! let home = tempdir().unwrap();
//! let skill = home.path().join("catalog/alpha");
//! std::fs::create_dir_all(&skill).unwrap();
//! std::fs::write(skill.join("SKILL.md"), "# Alpha").unwrap();
//!
//! let settings = Settings::for_home(home.path(), home.path(), None);
//! let mut manager = SkillManager::open(&settings, false).unwrap();
//! let selection = Selection::new(vec![Scope::Global], vec![Target::Claude]);
//! let report = manager
//!     .add(
//!         skill.to_str().unwrap(),
//!         &selection,
//!         InstallMode::Copy,
//!         &mut OverwriteGate::deny_all(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(report.actions.len(), 1);
//! assert!(home.path().join(".claude/skills/alpha/SKILL.md").exists());
//! ```

#![deny(unsafe_code)]

/// Error type for sync plumbing.
pub type Error = anyhow::Error;
/// Result type for sync plumbing.
pub type Result<T> = std::result::Result<T, Error>;

pub mod error;
pub mod fsops;
pub mod gate;
pub mod manager;
pub mod ops;
pub mod report;
pub mod scan;

pub use error::SkillError;
pub use gate::{ConfirmPrompt, OverwriteGate, TerminalPrompt};
pub use manager::SkillManager;
pub use ops::SkillInfo;
pub use report::{
    Action, ActionKind, DoctorReport, Failed, Issue, IssueKind, OperationReport, SkipReason, Skipped,
    StateChange, SyncReport,
};
pub use scan::{inspect_path, InstalledSkillRecord, ObservedMode, SkillStatus};
