//! The overwrite decision shared by every destructive step of one invocation.

use anyhow::Result;
use inquire::{Confirm, InquireError};
use std::io::IsTerminal;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Asks the user a yes/no question.
#[cfg_attr(test, automock)]
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// Prompts on the terminal, defaulting to "no".
pub struct TerminalPrompt;

impl ConfirmPrompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> Result<bool> {
        match Confirm::new(message).with_default(false).prompt() {
            Ok(answer) => Ok(answer),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Decides whether existing entries may be replaced.
///
/// `--overwrite` always allows. Without a terminal on both stdin and stdout the
/// answer is always no. Otherwise the user is asked once and the answer is
/// reused for the rest of the invocation.
pub struct OverwriteGate {
    overwrite: bool,
    interactive: bool,
    decision: Option<bool>,
    prompt: Box<dyn ConfirmPrompt>,
}

impl OverwriteGate {
    /// Gate for the current process, detecting interactivity from stdin/stdout.
    pub fn new(overwrite: bool) -> Self {
        let interactive = std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
        Self::with_prompt(overwrite, interactive, Box::new(TerminalPrompt))
    }

    pub fn with_prompt(overwrite: bool, interactive: bool, prompt: Box<dyn ConfirmPrompt>) -> Self {
        Self {
            overwrite,
            interactive,
            decision: None,
            prompt,
        }
    }

    /// Gate that always allows overwriting.
    pub fn allow_all() -> Self {
        Self::with_prompt(true, false, Box::new(TerminalPrompt))
    }

    /// Gate that never allows overwriting.
    pub fn deny_all() -> Self {
        Self::with_prompt(false, false, Box::new(TerminalPrompt))
    }

    /// Returns whether the entry at `existing` may be replaced.
    pub fn confirm(&mut self, existing: &Path) -> Result<bool> {
        if self.overwrite {
            return Ok(true);
        }
        if !self.interactive {
            tracing::debug!(
                target: "agent_playbook::gate",
                path = %existing.display(),
                "non-interactive; not overwriting"
            );
            return Ok(false);
        }
        if let Some(decision) = self.decision {
            return Ok(decision);
        }
        let answer = self.prompt.confirm(&format!(
            "Existing skill found at {}. Overwrite all existing skills?",
            existing.display()
        ))?;
        self.decision = Some(answer);
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_flag_never_prompts() {
        let mut prompt = MockConfirmPrompt::new();
        prompt.expect_confirm().never();
        let mut gate = OverwriteGate::with_prompt(true, true, Box::new(prompt));
        assert!(gate.confirm(Path::new("/x")).unwrap());
    }

    #[test]
    fn non_interactive_declines_without_prompting() {
        let mut prompt = MockConfirmPrompt::new();
        prompt.expect_confirm().never();
        let mut gate = OverwriteGate::with_prompt(false, false, Box::new(prompt));
        assert!(!gate.confirm(Path::new("/x")).unwrap());
    }

    #[test]
    fn interactive_answer_is_cached() {
        let mut prompt = MockConfirmPrompt::new();
        prompt
            .expect_confirm()
            .withf(|msg: &str| msg.contains("/skills/alpha"))
            .times(1)
            .returning(|_| Ok(true));
        let mut gate = OverwriteGate::with_prompt(false, true, Box::new(prompt));

        assert!(gate.confirm(Path::new("/h/skills/alpha")).unwrap());
        assert!(gate.confirm(Path::new("/h/skills/bravo")).unwrap());
    }

    #[test]
    fn declined_answer_is_cached_too() {
        let mut prompt = MockConfirmPrompt::new();
        prompt.expect_confirm().times(1).returning(|_| Ok(false));
        let mut gate = OverwriteGate::with_prompt(false, true, Box::new(prompt));

        assert!(!gate.confirm(Path::new("/a")).unwrap());
        assert!(!gate.confirm(Path::new("/b")).unwrap());
    }
}
