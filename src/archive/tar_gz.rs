use crate::runtime::Runtime;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::{debug, warn};
use std::path::Path;
use tar::{Archive, EntryType};

use super::{ArchiveExtractor, enclosed, enclosed_link, lower_name};

/// Extractor for .tar.gz / .tgz source distributions
#[derive(Default)]
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = lower_name(archive_path);
        name.ends_with(".tar.gz") || name.ends_with(".tgz")
    }

    fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        debug!("Extracting tar.gz archive {:?} to {:?}", archive_path, extract_to);
        let file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
        let mut archive = Archive::new(GzDecoder::new(file));

        let entries = archive
            .entries()
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;

        for entry in entries {
            let mut entry = entry
                .with_context(|| format!("Failed to read entry in {:?}", archive_path))?;
            let raw_path = entry.path().context("Invalid entry path")?.into_owned();

            let Some(entry_path) = enclosed(&raw_path) else {
                debug!("Skipping entry with invalid path: {:?}", raw_path);
                continue;
            };
            if passes_through_symlink(runtime, extract_to, &entry_path) {
                warn!("Skipping entry {:?} below a symlinked directory", raw_path);
                continue;
            }
            let full_path = extract_to.join(&entry_path);

            let entry_type = entry.header().entry_type();
            match entry_type {
                EntryType::Directory => {
                    runtime.create_dir_all(&full_path)?;
                }
                EntryType::Regular | EntryType::Continuous => {
                    if let Some(parent) = full_path.parent() {
                        runtime.create_dir_all(parent)?;
                    }
                    let mut dest_file = runtime.create_file(&full_path)?;
                    std::io::copy(&mut entry, &mut dest_file)
                        .with_context(|| format!("Failed to extract file {:?}", full_path))?;

                    #[cfg(unix)]
                    if let Ok(mode) = entry.header().mode()
                        && let Err(e) = runtime.set_permissions(&full_path, mode)
                    {
                        debug!("Failed to set permissions on {:?}: {}", full_path, e);
                    }
                }
                EntryType::Symlink => {
                    let Some(target) = entry.link_name().context("Invalid symlink target")? else {
                        warn!("Skipping symlink {:?} without a target", raw_path);
                        continue;
                    };
                    if enclosed_link(&entry_path, &target).is_none() {
                        warn!(
                            "Skipping symlink {:?} pointing outside the archive: {:?}",
                            raw_path, target
                        );
                        continue;
                    }
                    if let Some(parent) = full_path.parent() {
                        runtime.create_dir_all(parent)?;
                    }
                    runtime.symlink(&target, &full_path)?;
                }
                EntryType::Link => {
                    let original = entry
                        .link_name()
                        .context("Invalid hard link target")?
                        .and_then(|target| enclosed(&target));
                    let Some(original) = original.map(|p| extract_to.join(p)) else {
                        warn!("Skipping hard link {:?} pointing outside the archive", raw_path);
                        continue;
                    };
                    if !runtime.exists(&original) {
                        warn!(
                            "Skipping hard link {:?}: {:?} was not extracted",
                            raw_path, original
                        );
                        continue;
                    }
                    if let Some(parent) = full_path.parent() {
                        runtime.create_dir_all(parent)?;
                    }
                    runtime.copy(&original, &full_path)?;
                }
                EntryType::XGlobalHeader | EntryType::XHeader => {
                    debug!("Skipping pax header {:?}", raw_path);
                }
                other => {
                    warn!("Skipping unsupported {:?} entry {:?}", other, raw_path);
                }
            }
        }

        Ok(())
    }
}

/// Whether any parent of `entry_path` under `root` is an extracted symlink.
/// Writing through one could land outside `root`.
fn passes_through_symlink<R: Runtime>(runtime: &R, root: &Path, entry_path: &Path) -> bool {
    entry_path
        .ancestors()
        .skip(1)
        .filter(|ancestor| !ancestor.as_os_str().is_empty())
        .any(|ancestor| runtime.is_symlink(&root.join(ancestor)))
}
