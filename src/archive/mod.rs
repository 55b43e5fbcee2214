//! Unpacking of staged source archives.
//!
//! Archives are unpacked verbatim: a single top-level directory inside the
//! archive is kept, so callers decide how far to descend.

mod tar_gz;
mod zip;

use crate::runtime::Runtime;
use anyhow::{Result, anyhow};
use std::path::{Component, Path, PathBuf};

pub use tar_gz::TarGzExtractor;
pub use zip::ZipExtractor;

/// Trait for format-specific archive extractors
pub trait ArchiveExtractor {
    /// Check if this extractor can handle the given archive format
    fn can_handle(&self, archive_path: &Path) -> bool;

    /// Extract the archive into `extract_to`, which must already exist
    fn extract<R: Runtime>(&self, runtime: &R, archive_path: &Path, extract_to: &Path)
    -> Result<()>;
}

/// Dispatches to the extractor matching the archive's file name.
#[derive(Default)]
pub struct Unpacker {
    tar_gz: TarGzExtractor,
    zip: ZipExtractor,
}

impl Unpacker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArchiveExtractor for Unpacker {
    fn can_handle(&self, archive_path: &Path) -> bool {
        self.tar_gz.can_handle(archive_path) || self.zip.can_handle(archive_path)
    }

    #[tracing::instrument(skip(self, runtime))]
    fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        if self.tar_gz.can_handle(archive_path) {
            return self.tar_gz.extract(runtime, archive_path, extract_to);
        }
        if self.zip.can_handle(archive_path) {
            return self.zip.extract(runtime, archive_path, extract_to);
        }
        Err(anyhow!(
            "Unsupported archive format: {}",
            archive_path.display()
        ))
    }
}

/// Whether the path names a binary wheel.
pub fn is_wheel(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("whl"))
}

/// Lowercased file name, for suffix checks like `.tar.gz`.
fn lower_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Reject absolute entry paths and `..` components so an archive cannot
/// write outside the extraction directory.
fn enclosed(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Resolve a symlink `target` relative to the directory of `entry_path`
/// (both relative to the extraction root). `None` if the link is absolute
/// or climbs out of the extraction root.
fn enclosed_link(entry_path: &Path, target: &Path) -> Option<PathBuf> {
    let mut resolved = entry_path.parent().map(Path::to_path_buf).unwrap_or_default();
    for component in target.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}
