use crate::layout::Target;
use anyhow::Result;
use std::path::PathBuf;

/// Overrides the global Claude configuration directory.
pub const CLAUDE_DIR_ENV: &str = "AGENT_PLAYBOOK_CLAUDE_DIR";
/// Overrides the global Codex configuration directory.
pub const CODEX_DIR_ENV: &str = "AGENT_PLAYBOOK_CODEX_DIR";
/// Overrides the global Gemini configuration directory.
pub const GEMINI_DIR_ENV: &str = "AGENT_PLAYBOOK_GEMINI_DIR";
/// Overrides the location of the state document.
pub const STATE_PATH_ENV: &str = "AGENT_PLAYBOOK_STATE";
/// Points at the skills source directory, bypassing the marker search.
pub const SKILLS_DIR_ENV: &str = "AGENT_PLAYBOOK_SKILLS_DIR";

/// Returns the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))
}

/// Name of the environment variable overriding the global directory of `target`.
pub fn target_dir_var(target: Target) -> &'static str {
    match target {
        Target::Claude => CLAUDE_DIR_ENV,
        Target::Codex => CODEX_DIR_ENV,
        Target::Gemini => GEMINI_DIR_ENV,
    }
}

/// Returns the global directory override for `target`, if set and non-empty.
pub fn target_dir_from_env(target: Target) -> Option<PathBuf> {
    path_from_env(target_dir_var(target))
}

/// Returns the state document path from `AGENT_PLAYBOOK_STATE`.
pub fn state_path_from_env() -> Option<PathBuf> {
    path_from_env(STATE_PATH_ENV)
}

/// Returns the skills source directory from `AGENT_PLAYBOOK_SKILLS_DIR`.
pub fn skills_dir_from_env() -> Option<PathBuf> {
    path_from_env(SKILLS_DIR_ENV)
}

fn path_from_env(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_test_utils::{env_guard, set_env_var};

    #[test]
    fn empty_override_is_ignored() {
        let _g = env_guard();
        let _codex = set_env_var(CODEX_DIR_ENV, Some("   "));
        assert!(target_dir_from_env(Target::Codex).is_none());
    }

    #[test]
    fn override_is_returned_per_target() {
        let _g = env_guard();
        let _claude = set_env_var(CLAUDE_DIR_ENV, Some("/tmp/claude-home"));
        let _gemini = set_env_var(GEMINI_DIR_ENV, None);
        assert_eq!(
            target_dir_from_env(Target::Claude),
            Some(PathBuf::from("/tmp/claude-home"))
        );
        assert!(target_dir_from_env(Target::Gemini).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn home_dir_prefers_home_variable() {
        let _g = env_guard();
        let tmp = tempfile::tempdir().unwrap();
        let _home = set_env_var("HOME", Some(tmp.path().to_str().unwrap()));
        assert_eq!(home_dir().unwrap(), tmp.path());
    }
}
