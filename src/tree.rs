//! Recursive directory helpers built on [`Runtime`] primitives.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Whether `path` is a directory that may be descended into. Symlinked
/// directories are not, so a link cycle cannot recurse forever.
fn is_walkable_dir<R: Runtime>(runtime: &R, path: &Path) -> bool {
    runtime.is_dir(path) && !runtime.is_symlink(path)
}

/// Copy `from` recursively into `to`, creating `to` if needed.
/// Symlinked files are copied by content; symlinked directories are skipped.
#[tracing::instrument(skip(runtime))]
pub fn copy_tree<R: Runtime>(runtime: &R, from: &Path, to: &Path) -> Result<()> {
    runtime.create_dir_all(to)?;
    for entry in runtime.read_dir(from)? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let dest = to.join(name);
        if runtime.is_dir(&entry) {
            if runtime.is_symlink(&entry) {
                warn!("Skipping symlinked directory {:?}", entry);
                continue;
            }
            copy_tree(runtime, &entry, &dest)?;
        } else {
            runtime
                .copy(&entry, &dest)
                .with_context(|| format!("Failed to copy {:?} into {:?}", entry, to))?;
        }
    }
    Ok(())
}

/// Top-down search from `root` for a directory called `name` that contains
/// `marker`. `root` is checked first, then its subdirectories in sorted
/// order; the first hit wins. Symlinked directories are not entered.
#[tracing::instrument(skip(runtime))]
pub fn find_dir_containing<R: Runtime>(
    runtime: &R,
    root: &Path,
    name: &str,
    marker: &str,
) -> Result<Option<PathBuf>> {
    if root.file_name().is_some_and(|n| n == name) && runtime.exists(&root.join(marker)) {
        debug!("Found {:?} containing {}", root, marker);
        return Ok(Some(root.to_path_buf()));
    }
    for entry in runtime.read_dir(root)? {
        if !is_walkable_dir(runtime, &entry) {
            continue;
        }
        if let Some(found) = find_dir_containing(runtime, &entry, name, marker)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
