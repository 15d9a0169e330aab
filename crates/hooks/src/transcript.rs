//! Mining a JSONL conversation transcript for commands, files, and questions.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

const MAX_COMMANDS: usize = 12;
const MAX_FILES: usize = 12;
const MAX_QUESTIONS: usize = 8;
const MAX_QUESTION_LEN: usize = 200;

static PARAM_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<parameter name="command">(.*?)</parameter>"#).expect("valid regex")
});
static SHELL_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:bash|sh|zsh|shell)?\n(.*?)```").expect("valid regex")
});
static PROMPT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\$\s?").expect("valid regex"));
static BULLET_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[*-]\s*").expect("valid regex"));
static FILE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b[\w./~\-]+?\.(?:md|mdx|json|jsonl|js|ts|tsx|jsx|py|sh|toml|yaml|yml|txt|lock)\b",
    )
    .expect("valid regex")
});

/// What a transcript says about a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranscriptInsights {
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub commands: Vec<String>,
    pub files: Vec<String>,
    pub questions: Vec<String>,
    pub last_user_prompt: Option<String>,
}

/// Reads transcript events; a missing file yields none and bad lines are skipped.
pub fn read_transcript(path: &Path) -> Vec<Value> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(
                target: "agent_playbook::session_log",
                path = %path.display(),
                error = %e,
                "transcript not readable"
            );
            return Vec::new();
        }
    };
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

pub fn collect_insights(events: &[Value]) -> TranscriptInsights {
    let mut insights = TranscriptInsights::default();
    let mut commands = Vec::new();
    let mut files = Vec::new();
    let mut questions = Vec::new();

    for event in events {
        let text = event_text(event);
        if text.is_empty() {
            continue;
        }
        match event_role(event) {
            Some("user") => {
                insights.user_messages += 1;
                insights.last_user_prompt = Some(text.clone());
            }
            Some("assistant") => {
                insights.assistant_messages += 1;
                commands.extend(extract_commands(&text));
                questions.extend(extract_questions(&text));
            }
            _ => {}
        }
        files.extend(extract_file_paths(&text));
    }

    insights.commands = unique_capped(commands, MAX_COMMANDS);
    insights.files = unique_capped(files, MAX_FILES);
    insights.questions = unique_capped(questions, MAX_QUESTIONS);
    insights
}

fn event_role(event: &Value) -> Option<&str> {
    if let Some(role) = event.pointer("/message/role").and_then(Value::as_str) {
        return Some(role);
    }
    if let Some(role) = event.get("role").and_then(Value::as_str) {
        return Some(role);
    }
    event
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| *t == "user" || *t == "assistant")
}

fn event_text(event: &Value) -> String {
    if let Some(message) = event.get("message") {
        for key in ["content", "text"] {
            if let Some(value) = message.get(key).filter(|v| is_present(v)) {
                return extract_text(value);
            }
        }
    }
    for key in ["content", "text"] {
        if let Some(value) = event.get(key).filter(|v| is_present(v)) {
            return extract_text(value);
        }
    }
    String::new()
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Flattens string, array-of-blocks, or `{text}` content into plain text.
fn extract_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.as_str(),
                other => other.get("text").and_then(Value::as_str).unwrap_or_default(),
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
        other => other
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

fn extract_commands(text: &str) -> Vec<String> {
    PARAM_COMMAND
        .captures_iter(text)
        .chain(SHELL_FENCE.captures_iter(text))
        .filter_map(|c| c.get(1))
        .flat_map(|m| split_commands(m.as_str()))
        .collect()
}

fn split_commands(block: &str) -> Vec<String> {
    block
        .lines()
        .map(|line| PROMPT_PREFIX.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

fn extract_questions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.contains('?') && line.chars().count() <= MAX_QUESTION_LEN)
        .map(|line| BULLET_PREFIX.replace(line, "").into_owned())
        .collect()
}

fn extract_file_paths(text: &str) -> Vec<String> {
    FILE_PATH
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn unique_capped(items: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty() && seen.insert(item.clone()))
        .take(limit)
        .collect()
}
