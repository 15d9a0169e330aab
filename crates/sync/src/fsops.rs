//! Filesystem primitives used by skill operations.
//!
//! Every mutating call goes through [`FsOps`], which turns into a logged no-op
//! in dry-run mode. Read-only checks are free functions.

use anyhow::{Context, Result};
use playbook_state::InstallMode;
use std::fs;
use std::io;
use pathdiff::diff_paths;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What occupies a path, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Missing,
    Dir,
    Symlink,
    File,
}

pub fn entry_kind(path: &Path) -> EntryKind {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => EntryKind::Symlink,
        Ok(meta) if meta.is_dir() => EntryKind::Dir,
        Ok(_) => EntryKind::File,
        Err(_) => EntryKind::Missing,
    }
}

/// True when anything, including a dangling symlink, occupies `path`.
pub fn entry_exists(path: &Path) -> bool {
    entry_kind(path) != EntryKind::Missing
}

/// True when `path` is a symlink resolving to the same directory as `source`.
pub fn links_to(path: &Path, source: &Path) -> bool {
    if entry_kind(path) != EntryKind::Symlink {
        return false;
    }
    match (fs::canonicalize(path), fs::canonicalize(source)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// True when both paths resolve to the same existing location.
pub fn same_location(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// How an install request was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installed {
    pub mode: InstallMode,
    /// Link was requested but creating it failed, so the tree was copied.
    pub fallback: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsOps {
    dry_run: bool,
}

impl FsOps {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn ensure_dir(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            return Ok(());
        }
        if self.dry_run {
            tracing::debug!(target: "agent_playbook::fs", path = %path.display(), "dry-run: would create directory");
            return Ok(());
        }
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))
    }

    /// Materializes `source` at `dest` using `mode`.
    ///
    /// Link mode falls back to a recursive copy when the symlink cannot be
    /// created. In dry-run mode the requested mode is reported unchanged.
    pub fn install(&self, source: &Path, dest: &Path, mode: InstallMode) -> Result<Installed> {
        if self.dry_run {
            tracing::debug!(
                target: "agent_playbook::fs",
                source = %source.display(),
                dest = %dest.display(),
                mode = %mode,
                "dry-run: would install"
            );
            return Ok(Installed {
                mode,
                fallback: false,
            });
        }
        match mode {
            InstallMode::Copy => {
                copy_tree(source, dest)?;
                Ok(Installed {
                    mode: InstallMode::Copy,
                    fallback: false,
                })
            }
            InstallMode::Link => match create_symlink(source, dest) {
                Ok(()) => Ok(Installed {
                    mode: InstallMode::Link,
                    fallback: false,
                }),
                Err(e) => {
                    tracing::warn!(
                        target: "agent_playbook::fs",
                        source = %source.display(),
                        dest = %dest.display(),
                        error = %e,
                        "symlink failed; copying instead"
                    );
                    copy_tree(source, dest)?;
                    Ok(Installed {
                        mode: InstallMode::Copy,
                        fallback: true,
                    })
                }
            },
        }
    }

    /// Moves a file, directory, or symlink (the link itself, not its target).
    ///
    /// A relative link is recreated with its target rewritten against the new
    /// parent, so it keeps resolving to the same place.
    pub fn move_entry(&self, from: &Path, to: &Path) -> Result<()> {
        if self.dry_run {
            tracing::debug!(target: "agent_playbook::fs", from = %from.display(), to = %to.display(), "dry-run: would move");
            return Ok(());
        }
        if entry_kind(from) == EntryKind::Symlink {
            let target = relinked_target(from, to)?;
            create_symlink(&target, to)
                .with_context(|| format!("failed to create link: {}", to.display()))?;
            return self.remove_entry(from);
        }
        if let Err(e) = fs::rename(from, to) {
            tracing::debug!(
                target: "agent_playbook::fs",
                from = %from.display(),
                to = %to.display(),
                error = %e,
                "rename failed; moving by copy"
            );
            match entry_kind(from) {
                EntryKind::Dir => copy_tree(from, to)?,
                EntryKind::File | EntryKind::Symlink => {
                    fs::copy(from, to)
                        .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
                }
                EntryKind::Missing => {
                    return Err(e).with_context(|| format!("failed to move {}", from.display()))
                }
            }
            self.remove_entry(from)?;
        }
        Ok(())
    }

    /// Deletes whatever occupies `path`; symlinks are removed without touching their target.
    pub fn remove_entry(&self, path: &Path) -> Result<()> {
        let kind = entry_kind(path);
        if kind == EntryKind::Missing {
            return Ok(());
        }
        if self.dry_run {
            tracing::debug!(target: "agent_playbook::fs", path = %path.display(), "dry-run: would remove");
            return Ok(());
        }
        let result = match kind {
            EntryKind::Dir => fs::remove_dir_all(path),
            EntryKind::Symlink => fs::remove_file(path).or_else(|_| fs::remove_dir(path)),
            EntryKind::File => fs::remove_file(path),
            EntryKind::Missing => Ok(()),
        };
        result.with_context(|| format!("failed to remove: {}", path.display()))
    }
}

/// Link text for the symlink at `from` once it lives at `to`.
///
/// Absolute and dangling links keep their text.
fn relinked_target(from: &Path, to: &Path) -> Result<PathBuf> {
    let link = fs::read_link(from).with_context(|| format!("failed to read link: {}", from.display()))?;
    if link.is_absolute() {
        return Ok(link);
    }
    let (Ok(resolved), Some(parent)) = (fs::canonicalize(from), to.parent()) else {
        return Ok(link);
    };
    let parent = fs::canonicalize(parent)
        .with_context(|| format!("failed to resolve {}", parent.display()))?;
    Ok(diff_paths(&resolved, &parent).unwrap_or(resolved))
}

/// Recursively copies `src` into `dest`, following symlinks inside the tree.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.with_context(|| format!("failed to walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("unexpected path {}", entry.path().display()))?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create directory: {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn create_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

#[cfg(windows)]
fn create_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(source, dest)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_source: &Path, _dest: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}
