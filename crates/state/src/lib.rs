//! Manages agent-playbook settings and persisted state.
//!
//! This crate provides utilities for:
//! - Reading environment variables at the process boundary.
//! - Resolving (scope, target) pairs to concrete skill directories.
//! - Loading and saving the skill state document.

pub mod env;
pub mod layout;
pub mod persistence;
pub mod settings;

pub use env::home_dir;
pub use layout::{Location, Scope, Selection, Target};
pub use persistence::{
    now_rfc3339, read_document, InstallMode, StateDocument, StateEntry, StateStore, STATE_VERSION,
};
pub use settings::{find_repo_root, Settings, TargetDirs};
