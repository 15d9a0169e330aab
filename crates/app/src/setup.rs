//! Hook registration in Claude's `settings.json` and the marker block in
//! Codex's `config.toml`.
//!
//! Every edit is keyed by [`HOOK_MARKER`] (hook commands) or the
//! `[agent_playbook]` table header, so installing twice changes nothing and
//! uninstalling only touches what agent-playbook wrote.

use crate::VERSION;
use anyhow::{Context, Result};
use playbook_state::now_rfc3339;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Substring identifying hook commands installed by agent-playbook.
pub const HOOK_MARKER: &str = "--hook-source agent-playbook";
/// Key of the install record in Claude's settings.
pub const SETTINGS_KEY: &str = "agentPlaybook";
/// Table name of the marker block in Codex's config.
pub const CODEX_TABLE: &str = "agent_playbook";

const SESSION_END: &str = "SessionEnd";
const POST_TOOL_USE: &str = "PostToolUse";

/// Result of patching one configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The file was rewritten (or would be, in dry-run).
    Updated,
    Unchanged,
    /// There was no file to patch.
    Missing,
    /// The file could not be parsed and was left untouched.
    Invalid(String),
}

/// Commands registered for the two lifecycle hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCommands {
    pub session_end: String,
    pub post_tool_use: String,
}

impl HookCommands {
    pub fn new(exe: &Path, session_dir: Option<&Path>) -> Self {
        let exe = exe.display().to_string();
        let exe = if exe.contains(char::is_whitespace) {
            format!("\"{exe}\"")
        } else {
            exe
        };
        let mut session_end = format!("{exe} session-log {HOOK_MARKER}");
        if let Some(dir) = session_dir {
            session_end.push_str(&format!(" --session-dir \"{}\"", dir.display()));
        }
        Self {
            session_end,
            post_tool_use: format!("{exe} self-improve {HOOK_MARKER}"),
        }
    }
}

enum Loaded {
    Absent,
    Parsed(Value),
    Invalid(String),
}

fn load_json(path: &Path) -> Result<Loaded> {
    if !path.exists() {
        return Ok(Loaded::Absent);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Loaded::Parsed(Value::Object(Map::new())));
    }
    Ok(match serde_json::from_str::<Value>(&content) {
        Ok(value) if value.is_object() => Loaded::Parsed(value),
        Ok(_) => Loaded::Invalid(format!("{} is not a JSON object", path.display())),
        Err(e) => Loaded::Invalid(format!("{} is not valid JSON: {e}", path.display())),
    })
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}

/// Copies `path` to `<path>.bak` unless a backup already exists.
fn backup_once(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    let backup = PathBuf::from(name);
    if backup.exists() {
        return Ok(None);
    }
    fs::copy(path, &backup)
        .with_context(|| format!("failed to back up {}", path.display()))?;
    Ok(Some(backup))
}

fn is_marked(hook: &Value) -> bool {
    hook.get("command")
        .and_then(Value::as_str)
        .is_some_and(|c| c.contains(HOOK_MARKER))
}

fn group_commands(group: &Value) -> impl Iterator<Item = &str> {
    group
        .get("hooks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|h| h.get("command").and_then(Value::as_str))
}

/// Drops marked hook commands. Groups emptied by the removal go too.
fn strip_marked(groups: &mut Vec<Value>) -> bool {
    let mut changed = false;
    groups.retain_mut(|group| {
        let Some(list) = group.get_mut("hooks").and_then(Value::as_array_mut) else {
            return true;
        };
        let before = list.len();
        list.retain(|h| !is_marked(h));
        if list.len() == before {
            return true;
        }
        changed = true;
        !list.is_empty()
    });
    changed
}

/// Registers `command` under `event`, replacing stale agent-playbook commands.
fn ensure_hook(root: &mut Map<String, Value>, event: &str, matcher: Option<&str>, command: &str) {
    let hooks = root
        .entry("hooks")
        .or_insert_with(|| Value::Object(Map::new()));
    if !hooks.is_object() {
        *hooks = Value::Object(Map::new());
    }
    let Value::Object(hooks) = hooks else {
        return;
    };
    let groups = hooks
        .entry(event)
        .or_insert_with(|| Value::Array(Vec::new()));
    if !groups.is_array() {
        *groups = Value::Array(Vec::new());
    }
    let Value::Array(groups) = groups else {
        return;
    };

    if groups.iter().any(|g| group_commands(g).any(|c| c == command)) {
        return;
    }
    strip_marked(groups);

    let entry = json!({ "type": "command", "command": command });
    let position = groups
        .iter()
        .position(|g| g.is_object() && g.get("matcher").and_then(Value::as_str) == matcher);
    match position {
        Some(i) => match groups[i].get_mut("hooks").and_then(Value::as_array_mut) {
            Some(list) => list.push(entry),
            None => groups[i]["hooks"] = json!([entry]),
        },
        None => {
            let mut group = Map::new();
            if let Some(matcher) = matcher {
                group.insert("matcher".into(), json!(matcher));
            }
            group.insert("hooks".into(), json!([entry]));
            groups.push(Value::Object(group));
        }
    }
}

/// Registers the SessionEnd and PostToolUse hooks in a Claude `settings.json`.
///
/// The existing file is backed up once to `settings.json.bak` before the
/// first rewrite. A file that does not parse is left alone.
pub fn install_claude_hooks(
    path: &Path,
    commands: &HookCommands,
    exe: &Path,
    dry_run: bool,
) -> Result<PatchOutcome> {
    let original = match load_json(path)? {
        Loaded::Absent => Value::Object(Map::new()),
        Loaded::Parsed(value) => value,
        Loaded::Invalid(reason) => {
            tracing::warn!(target: "agent_playbook::setup", %reason, "skipping hook registration");
            return Ok(PatchOutcome::Invalid(reason));
        }
    };

    let mut settings = original.clone();
    let Value::Object(root) = &mut settings else {
        return Ok(PatchOutcome::Invalid(format!(
            "{} is not a JSON object",
            path.display()
        )));
    };
    ensure_hook(root, SESSION_END, None, &commands.session_end);
    ensure_hook(root, POST_TOOL_USE, Some("*"), &commands.post_tool_use);

    let installed_at = root
        .get(SETTINGS_KEY)
        .filter(|record| record.get("version").and_then(Value::as_str) == Some(VERSION))
        .and_then(|record| record.get("installedAt"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(now_rfc3339);
    root.insert(
        SETTINGS_KEY.to_string(),
        json!({
            "version": VERSION,
            "installedAt": installed_at,
            "cliPath": exe.display().to_string(),
        }),
    );

    if path.exists() && settings == original {
        return Ok(PatchOutcome::Unchanged);
    }
    if !dry_run {
        if let Some(backup) = backup_once(path)? {
            tracing::info!(target: "agent_playbook::setup", backup = %backup.display(), "backed up settings");
        }
        write_json(path, &settings)?;
    }
    tracing::info!(target: "agent_playbook::setup", path = %path.display(), dry_run, "registered hooks");
    Ok(PatchOutcome::Updated)
}

/// Removes agent-playbook hook commands and the install record.
pub fn remove_claude_hooks(path: &Path, dry_run: bool) -> Result<PatchOutcome> {
    let mut settings = match load_json(path)? {
        Loaded::Absent => return Ok(PatchOutcome::Missing),
        Loaded::Parsed(value) => value,
        Loaded::Invalid(reason) => return Ok(PatchOutcome::Invalid(reason)),
    };
    let Value::Object(root) = &mut settings else {
        return Ok(PatchOutcome::Unchanged);
    };

    let mut changed = root.remove(SETTINGS_KEY).is_some();
    let mut hooks_emptied = false;
    if let Some(Value::Object(hooks)) = root.get_mut("hooks") {
        let events: Vec<String> = hooks.keys().cloned().collect();
        let mut touched = false;
        for event in events {
            let Some(Value::Array(groups)) = hooks.get_mut(&event) else {
                continue;
            };
            if strip_marked(groups) {
                touched = true;
                if groups.is_empty() {
                    hooks.remove(&event);
                }
            }
        }
        hooks_emptied = touched && hooks.is_empty();
        changed |= touched;
    }
    if hooks_emptied {
        root.remove("hooks");
    }

    if !changed {
        return Ok(PatchOutcome::Unchanged);
    }
    if !dry_run {
        write_json(path, &settings)?;
    }
    tracing::info!(target: "agent_playbook::setup", path = %path.display(), dry_run, "removed hooks");
    Ok(PatchOutcome::Updated)
}

/// False when the settings file exists but cannot be read as a JSON object.
pub fn claude_settings_readable(path: &Path) -> bool {
    !matches!(load_json(path), Err(_) | Ok(Loaded::Invalid(_)))
}

/// True when both lifecycle hooks carry [`HOOK_MARKER`].
pub fn has_claude_hooks(path: &Path) -> bool {
    let Ok(Loaded::Parsed(settings)) = load_json(path) else {
        return false;
    };
    let registered = |event: &str, subcommand: &str| {
        settings
            .get("hooks")
            .and_then(|hooks| hooks.get(event))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .any(|group| {
                group_commands(group).any(|c| c.contains(HOOK_MARKER) && c.contains(subcommand))
            })
    };
    registered(SESSION_END, "session-log") && registered(POST_TOOL_USE, "self-improve")
}

#[derive(Serialize)]
struct CodexConfig<'a> {
    agent_playbook: CodexMarker<'a>,
}

#[derive(Serialize)]
struct CodexMarker<'a> {
    version: &'a str,
    installed_at: &'a str,
}

/// Renders the `[agent_playbook]` table.
pub fn codex_block(version: &str, installed_at: &str) -> Result<String> {
    toml::to_string(&CodexConfig {
        agent_playbook: CodexMarker {
            version,
            installed_at,
        },
    })
    .context("failed to render codex config block")
}

fn is_codex_header(line: &str) -> bool {
    let line = line.trim();
    line == "[agent_playbook]" || line.starts_with("[agent_playbook.")
}

/// True when `content` has an `[agent_playbook]` table.
///
/// Falls back to a header scan when the file is not valid TOML.
pub fn has_codex_block(content: &str) -> bool {
    match content.parse::<toml::Table>() {
        Ok(table) => table.contains_key(CODEX_TABLE),
        Err(_) => content.lines().any(is_codex_header),
    }
}

fn codex_block_version(content: &str) -> Option<String> {
    let table = content.parse::<toml::Table>().ok()?;
    table
        .get(CODEX_TABLE)?
        .get("version")?
        .as_str()
        .map(str::to_string)
}

/// Drops the `[agent_playbook]` table (header through the next table header).
pub fn remove_codex_block(content: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut skipping = false;
    for line in content.lines() {
        if line.trim_start().starts_with('[') {
            skipping = is_codex_header(line);
        }
        if !skipping {
            kept.push(line);
        }
    }
    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }
    if kept.is_empty() {
        String::new()
    } else {
        let mut out = kept.join("\n");
        out.push('\n');
        out
    }
}

/// Replaces any existing marker table with `block`, appended at the end.
pub fn upsert_codex_block(content: &str, block: &str) -> String {
    let mut out = remove_codex_block(content);
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(block);
    out
}

fn read_optional(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Upserts the marker table into a Codex `config.toml`.
pub fn install_codex_block(path: &Path, dry_run: bool) -> Result<PatchOutcome> {
    let content = read_optional(path)?;
    if codex_block_version(&content).as_deref() == Some(VERSION) {
        return Ok(PatchOutcome::Unchanged);
    }
    let updated = upsert_codex_block(&content, &codex_block(VERSION, &now_rfc3339())?);
    if !dry_run {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, updated).with_context(|| format!("failed to write {}", path.display()))?;
    }
    tracing::info!(target: "agent_playbook::setup", path = %path.display(), dry_run, "wrote codex block");
    Ok(PatchOutcome::Updated)
}

/// Removes the marker table; deletes the file when nothing else is left.
pub fn uninstall_codex_block(path: &Path, dry_run: bool) -> Result<PatchOutcome> {
    if !path.exists() {
        return Ok(PatchOutcome::Missing);
    }
    let content = read_optional(path)?;
    if !has_codex_block(&content) {
        return Ok(PatchOutcome::Unchanged);
    }
    let updated = remove_codex_block(&content);
    if !dry_run {
        if updated.trim().is_empty() {
            fs::remove_file(path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        } else {
            fs::write(path, updated)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }
    tracing::info!(target: "agent_playbook::setup", path = %path.display(), dry_run, "removed codex block");
    Ok(PatchOutcome::Updated)
}
