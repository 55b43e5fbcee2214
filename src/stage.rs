//! Copying a located staged entry into a fresh working directory.

use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

use crate::archive::{ArchiveExtractor, Unpacker, is_wheel};
use crate::runtime::Runtime;
use crate::tree::copy_tree;

/// How wheels are treated when staging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelMode {
    /// Copy the wheel file as is; the installer consumes it directly
    Keep,
    /// Unpack the wheel like any zip archive
    Unpack,
}

/// Delete `dest` if present, recreate it and fill it from `source`.
///
/// Directories are copied recursively, recognised archives are unpacked
/// verbatim, anything else (including wheels under [`WheelMode::Keep`]) is
/// copied as a single file into `dest`.
#[tracing::instrument(skip(runtime, unpacker))]
pub fn stage_into<R: Runtime>(
    runtime: &R,
    unpacker: &Unpacker,
    source: &Path,
    dest: &Path,
    wheels: WheelMode,
) -> Result<()> {
    if runtime.exists(dest) {
        debug!("Removing stale directory {:?}", dest);
        runtime.remove_dir_all(dest)?;
    }
    runtime.create_dir_all(dest)?;

    if runtime.is_dir(source) {
        debug!("Copying directory {:?} to {:?}", source, dest);
        return copy_tree(runtime, source, dest);
    }

    let keep_as_file = wheels == WheelMode::Keep && is_wheel(source);
    if !keep_as_file && unpacker.can_handle(source) {
        return unpacker.extract(runtime, source, dest);
    }

    let file_name = source
        .file_name()
        .with_context(|| format!("Staged entry {:?} has no file name", source))?;
    runtime
        .copy(source, &dest.join(file_name))
        .with_context(|| format!("Failed to stage {:?}", source))?;
    Ok(())
}
