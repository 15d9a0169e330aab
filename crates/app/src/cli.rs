use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Command-line interface for `agent-playbook`.
#[derive(Debug, Parser)]
#[command(
    name = "agent-playbook",
    version,
    about = "Install, manage, and sync SKILL.md skills across Claude, Codex, and Gemini"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Installs every catalog skill and registers the lifecycle hooks.
    Init(InitArgs),
    /// Shows skills source, settings files, hook registration, and skill counts.
    Status(ScopeArgs),
    /// Prints status and exits 1 when the setup needs attention.
    Doctor(ScopeArgs),
    /// Re-applies whatever init set up that is now missing.
    Repair(RepairArgs),
    /// Removes managed skills, hook registrations, and the Codex config block.
    Uninstall(UninstallArgs),
    /// Manages individual skills.
    #[command(subcommand)]
    Skills(SkillsCommand),
    /// Writes a markdown session log from a transcript (SessionEnd hook).
    SessionLog(SessionLogArgs),
    /// Records an episodic memory entry for a tool call (PostToolUse hook).
    SelfImprove(SelfImproveArgs),
}

/// Project root override shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct RepoArg {
    /// Project root (defaults to the enclosing git repository).
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,
}

/// `--scope`/`--target` filters plus the project root.
///
/// Values stay raw strings so unknown ones can degrade to the command's default
/// with a warning instead of a parse error.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[command(flatten)]
    pub repo: RepoArg,
    /// project, global, both, all, or a comma-separated list.
    #[arg(long, value_name = "SCOPE")]
    pub scope: Option<String>,
    /// claude, codex, gemini, both (claude+codex), all, or a comma-separated list.
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ScopeArgs {
    /// Use project scope instead of global.
    #[arg(long)]
    pub project: bool,
    #[command(flatten)]
    pub repo: RepoArg,
}

#[derive(Debug, Clone, Default, Args)]
pub struct InitArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
    /// Targets to install into (default: claude,codex).
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,
    /// Copy skills instead of symlinking them.
    #[arg(long)]
    pub copy: bool,
    /// Replace existing skills without asking.
    #[arg(long)]
    pub overwrite: bool,
    /// Skip hook registration.
    #[arg(long)]
    pub no_hooks: bool,
    /// Session log directory passed to the SessionEnd hook.
    #[arg(long, value_name = "DIR")]
    pub session_dir: Option<PathBuf>,
    /// Report what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RepairArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
    /// Targets to repair (default: claude,codex).
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,
    /// Copy missing skills instead of symlinking them.
    #[arg(long)]
    pub copy: bool,
    #[arg(long)]
    pub overwrite: bool,
    /// Session log directory for a re-registered SessionEnd hook.
    #[arg(long, value_name = "DIR")]
    pub session_dir: Option<PathBuf>,
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct UninstallArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Subcommand)]
pub enum SkillsCommand {
    /// Lists installed skills.
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Shows catalog, installation, and state details for one skill.
    Info {
        name: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Installs a skill by catalog name or path.
    Add {
        /// Catalog skill name, or a path to a skill directory.
        skill: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Copy the skill directory.
        #[arg(long, conflicts_with = "link")]
        copy: bool,
        /// Symlink the skill directory (default).
        #[arg(long)]
        link: bool,
        #[arg(long)]
        overwrite: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Removes an installed skill.
    Remove {
        name: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Also remove installations agent-playbook does not manage.
        #[arg(long)]
        force: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Moves a skill into the `.disabled` directory.
    Disable {
        name: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        overwrite: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Moves a disabled skill back into place.
    Enable {
        name: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        overwrite: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Reports broken, duplicate, unmanaged, and drifted installations.
    Doctor {
        #[command(flatten)]
        filter: FilterArgs,
        /// Repair managed entries from their recorded source.
        #[arg(long)]
        fix: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Updates the state document from what is on disk.
    Sync {
        #[command(flatten)]
        repo: RepoArg,
        #[arg(long)]
        dry_run: bool,
    },
    /// Reinstalls every enabled managed skill from the skills source.
    Upgrade {
        #[command(flatten)]
        repo: RepoArg,
        /// Skills source directory to install from.
        #[arg(long, value_name = "DIR")]
        source: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Writes the state document to a file.
    Export {
        #[command(flatten)]
        repo: RepoArg,
        #[arg(long, short, value_name = "FILE")]
        output: PathBuf,
    },
    /// Replaces the state document with an exported one and reinstalls from it.
    Import {
        file: PathBuf,
        #[command(flatten)]
        repo: RepoArg,
        #[arg(long, value_name = "DIR")]
        source: Option<PathBuf>,
        #[arg(long)]
        overwrite: bool,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct SessionLogArgs {
    /// Transcript JSONL file (overrides the hook payload).
    #[arg(long, value_name = "FILE")]
    pub transcript_path: Option<PathBuf>,
    /// Working directory of the session (overrides the hook payload).
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
    /// Output directory for session logs.
    #[arg(long, value_name = "DIR")]
    pub session_dir: Option<PathBuf>,
    /// Tag identifying the installer of the hook; ignored.
    #[arg(long, value_name = "SOURCE")]
    pub hook_source: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct SelfImproveArgs {
    /// Tag identifying the installer of the hook; ignored.
    #[arg(long, value_name = "SOURCE")]
    pub hook_source: Option<String>,
}
