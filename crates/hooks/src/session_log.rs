//! Markdown session logs written at the end of an assistant session.

use crate::transcript::{collect_insights, read_transcript, TranscriptInsights};
use anyhow::{Context, Result};
use playbook_state::find_repo_root;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

const SESSIONS_DIR: &str = "sessions";
const TOPIC_LEN: usize = 40;
const TITLE_LEN: usize = 60;
const LINE_LEN: usize = 120;

/// One `session-log` invocation, after merging the hook payload and flags.
#[derive(Debug, Clone)]
pub struct SessionLogRequest {
    pub transcript_path: Option<PathBuf>,
    pub cwd: PathBuf,
    pub session_id: String,
    /// Explicit output directory; otherwise `<repo>/sessions` or the global default.
    pub session_dir: Option<PathBuf>,
}

/// Writes session logs, falling back to `fallback_dir` outside a repository.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    fallback_dir: PathBuf,
    version: String,
}

impl SessionLogger {
    pub fn new(fallback_dir: impl Into<PathBuf>) -> Self {
        Self {
            fallback_dir: fallback_dir.into(),
            version: crate::VERSION.to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Directory the log for `request` goes to.
    pub fn session_dir(&self, request: &SessionLogRequest) -> PathBuf {
        if let Some(dir) = &request.session_dir {
            return dir.clone();
        }
        match find_repo_root(&request.cwd) {
            Some(root) => root.join(SESSIONS_DIR),
            None => self.fallback_dir.clone(),
        }
    }

    /// Summarizes the transcript and writes `<dir>/<date>-<topic>.md`.
    pub fn write(&self, request: &SessionLogRequest, now: OffsetDateTime) -> Result<PathBuf> {
        let dir = self.session_dir(request);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create session directory: {}", dir.display()))?;

        let events = request
            .transcript_path
            .as_deref()
            .map(read_transcript)
            .unwrap_or_default();
        let insights = collect_insights(&events);
        let date = format_date(now);
        let topic = build_topic(insights.last_user_prompt.as_deref(), &request.cwd);
        let path = unique_path(&dir.join(format!("{date}-{topic}.md")));

        let body = self.render(&insights, request, &date);
        fs::write(&path, body)
            .with_context(|| format!("failed to write session log: {}", path.display()))?;

        tracing::info!(
            target: "agent_playbook::session_log",
            path = %path.display(),
            commands = insights.commands.len(),
            files = insights.files.len(),
            "session log written"
        );
        Ok(path)
    }

    fn render(&self, insights: &TranscriptInsights, request: &SessionLogRequest, date: &str) -> String {
        let context = find_repo_root(&request.cwd).unwrap_or_else(|| request.cwd.clone());
        let prompt = insights.last_user_prompt.as_deref().map(one_line);
        let title = prompt
            .as_deref()
            .map(|p| trim_to(p, TITLE_LEN))
            .unwrap_or_else(|| "Session".to_string());

        let mut lines = vec![
            format!("# Session: {title}"),
            String::new(),
            format!("**Date**: {date}"),
            "**Duration**: unknown".to_string(),
            format!("**Context**: {}", context.display()),
            format!("**Agent Playbook Version**: {}", self.version),
            String::new(),
            "## Summary".to_string(),
            "Auto-generated session log.".to_string(),
            format!(
                "- Messages: {} user, {} assistant",
                insights.user_messages, insights.assistant_messages
            ),
            format!("- Commands detected: {}", insights.commands.len()),
            format!("- Files referenced: {}", insights.files.len()),
            match &prompt {
                Some(p) => format!("- Last user prompt: {}", trim_to(p, LINE_LEN)),
                None => "- Last user prompt: (not available)".to_string(),
            },
            String::new(),
            "## Key Decisions".to_string(),
            "1. (auto) No structured decisions extracted".to_string(),
            String::new(),
            "## Actions Taken".to_string(),
        ];
        lines.extend(bullets(&insights.commands, "- [ ] (auto) No commands captured", |c| {
            format!("- [x] `{}`", trim_to(c, LINE_LEN))
        }));
        lines.extend([
            String::new(),
            "## Technical Notes".to_string(),
            format!("Session ID: {}", request.session_id),
            format!("Working directory: {}", request.cwd.display()),
            String::new(),
            "## Open Questions / Follow-ups".to_string(),
        ]);
        lines.extend(bullets(&insights.questions, "- (auto) None captured", |q| {
            format!("- {q}")
        }));
        lines.extend([String::new(), "## Related Files".to_string()]);
        lines.extend(bullets(&insights.files, "- (auto) None captured", |f| {
            format!("- `{f}`")
        }));
        lines.push(String::new());
        lines.join("\n")
    }
}

fn bullets(items: &[String], empty: &str, render: impl Fn(&str) -> String) -> Vec<String> {
    if items.is_empty() {
        return vec![empty.to_string()];
    }
    items.iter().map(|i| render(i)).collect()
}

fn format_date(now: OffsetDateTime) -> String {
    let date = now.date();
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Lowercase ASCII alphanumerics separated by single dashes.
pub fn slugify(value: &str) -> String {
    let mut slug = String::new();
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn build_topic(prompt: Option<&str>, cwd: &Path) -> String {
    let topic = match prompt {
        Some(p) => slugify(p).chars().take(TOPIC_LEN).collect(),
        None => cwd
            .file_name()
            .map(|n| slugify(&n.to_string_lossy()))
            .unwrap_or_default(),
    };
    if topic.is_empty() {
        "session".to_string()
    } else {
        topic
    }
}

/// Shortens to `len` characters, ending in `...` when cut.
pub fn trim_to(value: &str, len: usize) -> String {
    if value.chars().count() <= len {
        return value.to_string();
    }
    let kept: String = value.chars().take(len.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn one_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `path`, or the first free `<stem>-N<ext>` next to it.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    (1..)
        .map(|n| parent.join(format!("{stem}-{n}{ext}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
