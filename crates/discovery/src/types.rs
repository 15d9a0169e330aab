use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Errors raised while resolving skills from the catalog or from a path.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// A bare name that is not present in the catalog.
    #[error("skill '{name}' not found. Available skills: {}", format_available(.available))]
    NotFound {
        /// Requested skill name.
        name: String,
        /// Names present in the catalog.
        available: Vec<String>,
    },
    /// A path that does not contain a skill manifest.
    #[error("not a skill directory (missing SKILL.md): {}", .path.display())]
    InvalidSkill {
        /// The offending path.
        path: PathBuf,
    },
    /// Reading the catalog failed.
    #[error("failed to read skills directory {}: {source}", .path.display())]
    Io {
        /// Directory being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

fn format_available(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

/// A skill directory found in the catalog or given by path.
#[derive(Debug, Clone, Serialize)]
pub struct SkillDefinition {
    /// Directory name; the skill's identity.
    pub name: String,
    /// Absolute path of the skill directory.
    pub source_path: PathBuf,
    /// Parsed front-matter of `SKILL.md`.
    pub frontmatter: SkillFrontmatter,
}

impl SkillDefinition {
    /// Description from the front-matter, if any.
    pub fn description(&self) -> Option<&str> {
        self.frontmatter.description.as_deref()
    }
}

/// A front-matter value: a scalar or a bracket-delimited list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
    /// Scalar value.
    Text(String),
    /// `[a, b, c]` style list.
    List(Vec<String>),
}

/// The `---` delimited header of a skill manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkillFrontmatter {
    /// Declared name, which may differ from the directory name.
    pub name: Option<String>,
    /// One-line description.
    pub description: Option<String>,
    /// Every other key.
    pub fields: BTreeMap<String, FrontmatterValue>,
}

/// Split content into front-matter text and body.
fn split_frontmatter(content: &str) -> (Option<String>, String) {
    let trimmed = content.trim_start();

    if !trimmed.starts_with("---") {
        return (None, content.to_string());
    }

    let after_open = &trimmed[3..];
    let after_open = after_open.trim_start_matches(['\r', '\n']);

    if let Some(end_pos) = after_open.find("\n---") {
        let header = &after_open[..end_pos];
        let rest = &after_open[end_pos + 4..];
        let rest = rest.trim_start_matches(['\r', '\n']);
        (Some(header.to_string()), rest.to_string())
    } else {
        (None, content.to_string())
    }
}

/// Parse a comma-separated string into trimmed, non-empty items.
fn parse_comma_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|item| item.trim().trim_matches(['"', '\'']).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parses the front-matter of a skill manifest.
///
/// YAML is tried first; headers that are not valid YAML fall back to plain
/// `key: value` lines with bracket-delimited lists. Content without a header
/// yields an empty front-matter.
pub fn parse_frontmatter(content: &str) -> SkillFrontmatter {
    let (header, _body) = split_frontmatter(content);
    let Some(header) = header else {
        return SkillFrontmatter::default();
    };

    let pairs = match serde_yaml::from_str::<BTreeMap<String, serde_yaml::Value>>(&header) {
        Ok(map) => map
            .into_iter()
            .filter_map(|(k, v)| yaml_to_value(v).map(|v| (k, v)))
            .collect(),
        Err(e) => {
            tracing::debug!(
                target: "agent_playbook::discovery",
                error = %e,
                "front-matter is not YAML; using line parser"
            );
            parse_lines(&header)
        }
    };

    let mut fm = SkillFrontmatter::default();
    for (key, value) in pairs {
        match (key.as_str(), value) {
            ("name", FrontmatterValue::Text(v)) => fm.name = Some(v),
            ("description", FrontmatterValue::Text(v)) => fm.description = Some(v),
            (_, value) => {
                fm.fields.insert(key, value);
            }
        }
    }
    fm
}

fn yaml_to_value(value: serde_yaml::Value) -> Option<FrontmatterValue> {
    match value {
        serde_yaml::Value::String(s) => Some(FrontmatterValue::Text(s)),
        serde_yaml::Value::Bool(b) => Some(FrontmatterValue::Text(b.to_string())),
        serde_yaml::Value::Number(n) => Some(FrontmatterValue::Text(n.to_string())),
        serde_yaml::Value::Sequence(items) => Some(FrontmatterValue::List(
            items
                .into_iter()
                .filter_map(|item| match yaml_to_value(item) {
                    Some(FrontmatterValue::Text(s)) => Some(s),
                    _ => None,
                })
                .collect(),
        )),
        _ => None,
    }
}

fn parse_lines(header: &str) -> Vec<(String, FrontmatterValue)> {
    header
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() || key.starts_with('#') {
                return None;
            }
            let value = value.trim();
            let parsed = match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
                Some(inner) => FrontmatterValue::List(parse_comma_list(inner)),
                None => FrontmatterValue::Text(value.trim_matches(['"', '\'']).to_string()),
            };
            Some((key.to_string(), parsed))
        })
        .collect()
}
