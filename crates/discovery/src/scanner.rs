use crate::types::{parse_frontmatter, CatalogError, SkillDefinition};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of a skill manifest.
pub const MANIFEST_FILE: &str = "SKILL.md";
/// Skill whose presence identifies the canonical skills directory.
pub const MARKER_SKILL: &str = "skill-router";

/// True when `path` is a directory (or a link to one) containing `SKILL.md`.
pub fn is_skill_dir(path: &Path) -> bool {
    path.is_dir() && path.join(MANIFEST_FILE).is_file()
}

/// Walks upward from `start` looking for `skills/skill-router/SKILL.md`.
///
/// Returns the `skills` directory of the first ancestor that has it.
pub fn find_skills_source(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        let candidate = dir.join("skills");
        candidate
            .join(MARKER_SKILL)
            .join(MANIFEST_FILE)
            .is_file()
            .then_some(candidate)
    })
}

/// Tries each starting point in order and returns the first catalog found.
pub fn locate_skills_source<P: AsRef<Path>>(starts: &[P]) -> Option<PathBuf> {
    starts.iter().find_map(|start| {
        let found = find_skills_source(start.as_ref());
        tracing::debug!(
            target: "agent_playbook::discovery",
            start = %start.as_ref().display(),
            found = ?found,
            "searched for skills source"
        );
        found
    })
}

/// Loads the skill at `dir`, failing with `InvalidSkill` when it has no manifest.
pub fn load_skill(dir: &Path) -> Result<SkillDefinition, CatalogError> {
    if !is_skill_dir(dir) {
        return Err(CatalogError::InvalidSkill {
            path: dir.to_path_buf(),
        });
    }
    let source_path = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    let name = source_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CatalogError::InvalidSkill {
            path: dir.to_path_buf(),
        })?;
    let content = fs::read_to_string(source_path.join(MANIFEST_FILE)).map_err(|source| {
        CatalogError::Io {
            path: source_path.clone(),
            source,
        }
    })?;
    Ok(SkillDefinition {
        name,
        frontmatter: parse_frontmatter(&content),
        source_path,
    })
}

/// Lists every valid skill directly below `root`, sorted by name.
///
/// Dot-prefixed entries and directories without a manifest are ignored.
pub fn list_skills(root: &Path) -> Result<Vec<SkillDefinition>, CatalogError> {
    let entries = fs::read_dir(root).map_err(|source| CatalogError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    let mut skills = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if !is_skill_dir(&path) {
            continue;
        }
        match load_skill(&path) {
            Ok(skill) => skills.push(skill),
            Err(e) => tracing::warn!(
                target: "agent_playbook::discovery",
                path = %path.display(),
                error = %e,
                "skipping unreadable skill"
            ),
        }
    }
    skills.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(skills)
}

/// Names of the skills in the catalog at `root`.
pub fn skill_names(root: &Path) -> Vec<String> {
    list_skills(root)
        .map(|skills| skills.into_iter().map(|s| s.name).collect())
        .unwrap_or_default()
}

/// Looks up a skill by bare name in the catalog at `root`.
pub fn find_skill(root: &Path, name: &str) -> Result<SkillDefinition, CatalogError> {
    let candidate = root.join(name);
    if !name.is_empty() && !name.starts_with('.') && is_skill_dir(&candidate) {
        return load_skill(&candidate);
    }
    Err(CatalogError::NotFound {
        name: name.to_string(),
        available: skill_names(root),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_skill(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), format!("---\nname: {name}\n---\n")).unwrap();
        dir
    }

    #[test]
    fn finds_source_from_nested_directory() {
        let tmp = tempdir().unwrap();
        let skills = tmp.path().join("repo/skills");
        write_skill(&skills, MARKER_SKILL);
        let nested = tmp.path().join("repo/docs/deep");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_skills_source(&nested), Some(skills));
    }

    #[test]
    fn skills_dir_without_marker_is_not_a_source() {
        let tmp = tempdir().unwrap();
        write_skill(&tmp.path().join("skills"), "alpha");
        assert!(find_skills_source(tmp.path()).is_none());
        assert!(locate_skills_source(&[tmp.path()]).is_none());
    }

    #[test]
    fn list_skips_hidden_and_invalid_entries() {
        let tmp = tempdir().unwrap();
        write_skill(tmp.path(), "bravo");
        write_skill(tmp.path(), "alpha");
        write_skill(tmp.path(), ".hidden");
        fs::create_dir_all(tmp.path().join("empty")).unwrap();
        fs::write(tmp.path().join("README.md"), "x").unwrap();

        let names: Vec<_> = list_skills(tmp.path())
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["alpha", "bravo"]);
    }

    #[test]
    fn find_skill_reports_available_names() {
        let tmp = tempdir().unwrap();
        write_skill(tmp.path(), "alpha");

        let err = find_skill(tmp.path(), "zulu").unwrap_err();
        match err {
            CatalogError::NotFound { name, available } => {
                assert_eq!(name, "zulu");
                assert_eq!(available, vec!["alpha".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_skill_rejects_directory_without_manifest() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("plain");
        fs::create_dir_all(&dir).unwrap();
        assert!(matches!(
            load_skill(&dir),
            Err(CatalogError::InvalidSkill { .. })
        ));
    }
}
