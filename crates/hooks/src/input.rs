//! Hook payload read from stdin.

use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

/// JSON object an assistant passes to a hook command.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HookInput {
    pub session_id: Option<String>,
    pub cwd: Option<PathBuf>,
    pub transcript_path: Option<PathBuf>,
    pub hook_event_name: Option<String>,
    pub tool_name: Option<String>,
    pub tool_input: Option<Value>,
    pub tool_response: Option<Value>,
}

impl HookInput {
    pub fn session_id(&self) -> &str {
        self.session_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
    }

    pub fn tool_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or_default()
    }

    /// String field of `tool_input`, if present.
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.tool_input.as_ref()?.get(key)?.as_str()
    }

    /// Text of the tool response; objects contribute their stdout, stderr,
    /// output, and content fields.
    pub fn response_text(&self) -> String {
        match &self.tool_response {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(map)) => ["stdout", "stderr", "output", "content"]
                .iter()
                .filter_map(|k| map.get(*k).and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            Some(other) => other.to_string(),
        }
    }
}

/// Parses a hook payload. Empty or malformed input yields an empty payload.
pub fn parse_hook_input(raw: &str) -> HookInput {
    if raw.trim().is_empty() {
        return HookInput::default();
    }
    match serde_json::from_str(raw) {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!(
                target: "agent_playbook::hooks",
                error = %e,
                "hook payload is not valid JSON; ignoring it"
            );
            HookInput::default()
        }
    }
}
