//! Episodic memory: one JSON record per hook call, plus completion triggers.
//!
//! Layout under the memory root:
//!
//! ```text
//! memory/
//!   episodic/<year>/<episode id>.json
//!   working/current_session.json
//!   working/pending_trigger.json
//! ```

use crate::input::HookInput;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const EPISODIC_DIR: &str = "episodic";
const WORKING_DIR: &str = "working";
const CURRENT_SESSION_FILE: &str = "current_session.json";
const PENDING_TRIGGER_FILE: &str = "pending_trigger.json";
const DEFAULT_HOOK_EVENT: &str = "PostToolUse";

const SHELL_TOOLS: &[&str] = &["Bash"];
const WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit"];

static TEST_RUNNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(cargo (?:test|nextest)|npm (?:run )?test|pnpm (?:run )?test|yarn test|bun test|pytest|go test|jest|vitest|mocha|rspec)\b",
    )
    .expect("valid regex")
});
static TESTS_PASSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+ (?:passed|passing)\b|test result: ok|\bPASS\b|^ok\s")
        .expect("valid regex")
});
static TESTS_FAILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[1-9]\d* (?:failed|failing|errors?)\b|test result: FAILED|\bFAIL\b")
        .expect("valid regex")
});
static COMMIT_FAILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)nothing to commit|no changes added to commit|^error:|^fatal:|hook failed")
        .expect("valid regex")
});

/// A recognizable point where a follow-on skill is worth suggesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionEvent {
    CommitCreated,
    PullRequestOpened,
    TestsPassed,
    PrdWritten,
    PlanWritten,
    SkillUpdated,
}

impl CompletionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommitCreated => "commit-created",
            Self::PullRequestOpened => "pull-request-opened",
            Self::TestsPassed => "tests-passed",
            Self::PrdWritten => "prd-written",
            Self::PlanWritten => "plan-written",
            Self::SkillUpdated => "skill-updated",
        }
    }
}

impl std::fmt::Display for CompletionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool names, a predicate over the call, and the skills to chain next.
pub struct CompletionRule {
    pub event: CompletionEvent,
    pub tools: &'static [&'static str],
    pub matches: fn(&HookInput) -> bool,
    pub follow_up: &'static [&'static str],
}

impl std::fmt::Debug for CompletionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionRule")
            .field("event", &self.event)
            .field("tools", &self.tools)
            .field("follow_up", &self.follow_up)
            .finish()
    }
}

/// Checked in order; the first matching rule wins.
pub static COMPLETION_RULES: &[CompletionRule] = &[
    CompletionRule {
        event: CompletionEvent::CommitCreated,
        tools: SHELL_TOOLS,
        matches: commit_created,
        follow_up: &["create-pr"],
    },
    CompletionRule {
        event: CompletionEvent::PullRequestOpened,
        tools: SHELL_TOOLS,
        matches: pull_request_opened,
        follow_up: &["session-logger"],
    },
    CompletionRule {
        event: CompletionEvent::TestsPassed,
        tools: SHELL_TOOLS,
        matches: tests_passed,
        follow_up: &["commit-helper"],
    },
    CompletionRule {
        event: CompletionEvent::PrdWritten,
        tools: WRITE_TOOLS,
        matches: prd_written,
        follow_up: &["prd-implementation-precheck"],
    },
    CompletionRule {
        event: CompletionEvent::PlanWritten,
        tools: WRITE_TOOLS,
        matches: plan_written,
        follow_up: &["workflow-orchestrator"],
    },
    CompletionRule {
        event: CompletionEvent::SkillUpdated,
        tools: WRITE_TOOLS,
        matches: skill_updated,
        follow_up: &["self-improving-agent"],
    },
];

fn command(input: &HookInput) -> &str {
    input.input_str("command").unwrap_or_default()
}

fn edited_file_name(input: &HookInput) -> Option<String> {
    let path = ["file_path", "path", "notebook_path"]
        .iter()
        .find_map(|k| input.input_str(k))?;
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}

fn commit_created(input: &HookInput) -> bool {
    if !command(input).contains("git commit") {
        return false;
    }
    let output = input.response_text();
    !output
        .lines()
        .any(|line| COMMIT_FAILED.is_match(line.trim_start()))
}

fn pull_request_opened(input: &HookInput) -> bool {
    command(input).contains("gh pr create") && input.response_text().contains("/pull/")
}

fn tests_passed(input: &HookInput) -> bool {
    if !TEST_RUNNER.is_match(command(input)) {
        return false;
    }
    let output = input.response_text();
    output.lines().any(|l| TESTS_PASSED.is_match(l)) && !output.lines().any(|l| TESTS_FAILED.is_match(l))
}

fn prd_written(input: &HookInput) -> bool {
    edited_file_name(input)
        .map(|n| n.to_lowercase())
        .is_some_and(|n| n.ends_with(".md") && n.contains("prd"))
}

fn plan_written(input: &HookInput) -> bool {
    edited_file_name(input).is_some_and(|n| n == "task_plan.md")
}

fn skill_updated(input: &HookInput) -> bool {
    edited_file_name(input).is_some_and(|n| n == "SKILL.md")
}

/// First rule matching the tool call in `input`.
pub fn detect_completion(input: &HookInput) -> Option<&'static CompletionRule> {
    let tool = input.tool_name();
    COMPLETION_RULES
        .iter()
        .find(|rule| rule.tools.contains(&tool) && (rule.matches)(input))
}

/// One hook invocation as stored in the episodic tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeRecord {
    pub id: String,
    pub timestamp: String,
    pub session_id: String,
    pub cwd: PathBuf,
    pub transcript_path: String,
    pub agent_playbook_version: String,
    pub hook_event: String,
    pub tool_name: String,
    pub tool_input: Value,
}

/// Contents of `pending_trigger.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingTrigger {
    pub event: CompletionEvent,
    pub detected_at: String,
    pub session_id: String,
    pub episode_id: String,
    pub tool_name: String,
    pub follow_up: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EpisodeOutcome {
    pub episode: EpisodeRecord,
    pub episode_path: PathBuf,
    pub trigger: Option<PendingTrigger>,
    pub trigger_path: Option<PathBuf>,
}

/// Writes episodes under a memory root (normally `~/.claude/memory`).
#[derive(Debug, Clone)]
pub struct EpisodicLogger {
    root: PathBuf,
    version: String,
}

impl EpisodicLogger {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            version: crate::VERSION.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn working_dir(&self) -> PathBuf {
        self.root.join(WORKING_DIR)
    }

    /// Records the hook call and, on a recognized completion, the pending trigger.
    pub fn record(&self, input: &HookInput, cwd: &Path, now: OffsetDateTime) -> Result<EpisodeOutcome> {
        let timestamp = now.format(&Rfc3339).context("failed to format timestamp")?;
        let episode = EpisodeRecord {
            id: format!("ep-{timestamp}").replace([':', '.'], "-"),
            timestamp: timestamp.clone(),
            session_id: input.session_id().to_string(),
            cwd: cwd.to_path_buf(),
            transcript_path: input
                .transcript_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            agent_playbook_version: self.version.clone(),
            hook_event: input
                .hook_event_name
                .clone()
                .unwrap_or_else(|| DEFAULT_HOOK_EVENT.to_string()),
            tool_name: input.tool_name().to_string(),
            tool_input: input
                .tool_input
                .clone()
                .unwrap_or_else(|| Value::String(String::new())),
        };

        let episode_dir = self
            .root
            .join(EPISODIC_DIR)
            .join(now.year().to_string());
        let episode_path = episode_dir.join(format!("{}.json", episode.id));
        write_pretty(&episode_path, &episode)?;
        write_pretty(&self.working_dir().join(CURRENT_SESSION_FILE), &episode)?;

        let mut outcome = EpisodeOutcome {
            episode,
            episode_path,
            trigger: None,
            trigger_path: None,
        };

        if let Some(rule) = detect_completion(input) {
            let trigger = PendingTrigger {
                event: rule.event,
                detected_at: timestamp,
                session_id: outcome.episode.session_id.clone(),
                episode_id: outcome.episode.id.clone(),
                tool_name: outcome.episode.tool_name.clone(),
                follow_up: rule.follow_up.iter().map(|s| s.to_string()).collect(),
            };
            let path = self.working_dir().join(PENDING_TRIGGER_FILE);
            write_pretty(&path, &trigger)?;
            tracing::info!(
                target: "agent_playbook::self_improve",
                event = %rule.event,
                path = %path.display(),
                "completion detected"
            );
            outcome.trigger = Some(trigger);
            outcome.trigger_path = Some(path);
        }

        tracing::debug!(
            target: "agent_playbook::self_improve",
            path = %outcome.episode_path.display(),
            tool = %outcome.episode.tool_name,
            "episode recorded"
        );
        Ok(outcome)
    }
}

fn write_pretty(path: &Path, value: &impl Serialize) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(value).context("failed to serialize episode")?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
}
