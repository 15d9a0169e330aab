use playbook_discovery::CatalogError;

/// Errors surfaced by skill operations.
///
/// Every variant except `Other` is a user-facing resolution failure: the
/// command prints it and exits with status 1.
#[derive(thiserror::Error, Debug)]
pub enum SkillError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(
        "unable to locate a skills directory (looked for skills/skill-router/SKILL.md); \
         pass a skill path, use --repo, or set AGENT_PLAYBOOK_SKILLS_DIR"
    )]
    NoSkillsSource,
    #[error("no installed skill named '{name}'")]
    NotInstalled { name: String },
    #[error(
        "skill '{name}' is installed in several locations: {}. Narrow it with --scope/--target",
        .candidates.join(", ")
    )]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
    #[error("no usable location for the requested scope/target (project scope needs a project root; use --repo)")]
    NoLocation,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SkillError {
    /// True for resolution failures that are the user's to fix.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, SkillError::Other(_))
    }
}
