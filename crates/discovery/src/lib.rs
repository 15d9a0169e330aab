//! Skill source catalog.
//!
//! This crate provides mechanisms for:
//! - Locating the canonical skills directory by walking up to a marker skill.
//! - Listing and validating skill definitions (directories holding `SKILL.md`).
//! - Parsing the front-matter block of a skill manifest.
//!
//! # Examples
//!
//! ```
//! use playbook_discovery::{list_skills, find_skill};
//! use tempfile::tempdir;
//!
//! let temp = tempdir().unwrap();
//! let skill_dir = temp.path().join("alpha");
//! std::fs::create_dir_all(&skill_dir).unwrap();
//! std::fs::write(skill_dir.join("SKILL.md"), "---\nname: alpha\n---\n# Alpha").unwrap();
//!
//! let skills = list_skills(temp.path()).unwrap();
//! assert_eq!(skills.len(), 1);
//! assert_eq!(find_skill(temp.path(), "alpha").unwrap().name, "alpha");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Error type for discovery operations.
pub type Error = anyhow::Error;
/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Catalog lookup and listing.
pub mod scanner;
/// Skill definitions and front-matter parsing.
pub mod types;

pub use scanner::{
    find_skill, find_skills_source, is_skill_dir, list_skills, load_skill, locate_skills_source,
    skill_names, MANIFEST_FILE, MARKER_SKILL,
};
pub use types::{parse_frontmatter, CatalogError, FrontmatterValue, SkillDefinition, SkillFrontmatter};
