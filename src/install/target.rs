use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::archive::is_wheel;
use crate::runtime::Runtime;

/// Files that mark a directory as something pip can build.
const BUILD_DESCRIPTORS: &[&str] = &["setup.py", "pyproject.toml"];

fn has_descriptor<R: Runtime>(runtime: &R, dir: &Path) -> bool {
    BUILD_DESCRIPTORS
        .iter()
        .any(|name| runtime.exists(&dir.join(name)))
}

/// Decide what to hand to pip for a freshly staged build directory.
///
/// - a lone wheel file is installed as is;
/// - a descriptor at the top level means the directory itself;
/// - otherwise one level down: the first subdirectory with a descriptor,
///   else the first subdirectory at all. Deeper levels are not searched.
#[tracing::instrument(skip(runtime))]
pub fn resolve_install_target<R: Runtime>(runtime: &R, build_dir: &Path) -> Result<PathBuf> {
    if has_descriptor(runtime, build_dir) {
        return Ok(build_dir.to_path_buf());
    }

    let entries = runtime.read_dir(build_dir)?;

    if let [only] = entries.as_slice()
        && is_wheel(only)
        && !runtime.is_dir(only)
    {
        debug!("Installing wheel {:?}", only);
        return Ok(only.clone());
    }

    let subdirs: Vec<PathBuf> = entries
        .into_iter()
        .filter(|entry| runtime.is_dir(entry))
        .collect();

    if let Some(dir) = subdirs.iter().find(|dir| has_descriptor(runtime, dir)) {
        debug!("Descending into {:?}", dir);
        return Ok(dir.clone());
    }

    match subdirs.into_iter().next() {
        Some(dir) => {
            debug!("No build descriptor found; falling back to {:?}", dir);
            Ok(dir)
        }
        None => Ok(build_dir.to_path_buf()),
    }
}
