use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::debug;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

use super::{ArchiveExtractor, enclosed, lower_name};

/// Extractor for .zip archives and wheels (which are zip files)
#[derive(Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = lower_name(archive_path);
        name.ends_with(".zip") || name.ends_with(".whl")
    }

    fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        debug!("Extracting zip archive {:?} to {:?}", archive_path, extract_to);
        let mut reader = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        // ZipArchive needs Read + Seek; Runtime::open only gives Read
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;
        let cursor = std::io::Cursor::new(buffer);

        let mut archive = ZipArchive::new(cursor).context("Failed to parse ZIP archive")?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("Failed to read ZIP entry {}", i))?;

            let Some(entry_path) = enclosed(Path::new(entry.name())) else {
                debug!("Skipping entry with invalid path: {}", entry.name());
                continue;
            };

            let full_path = extract_to.join(&entry_path);

            if entry.is_dir() {
                runtime.create_dir_all(&full_path)?;
                continue;
            }

            if let Some(parent) = full_path.parent() {
                runtime.create_dir_all(parent)?;
            }
            let mut dest_file = runtime.create_file(&full_path)?;
            std::io::copy(&mut entry, &mut dest_file)
                .with_context(|| format!("Failed to extract file {:?}", full_path))?;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode()
                && let Err(e) = runtime.set_permissions(&full_path, mode)
            {
                debug!("Failed to set permissions on {:?}: {}", full_path, e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;
    use zip::CompressionMethod;
    use zip::ZipWriter;
    use zip::write::FileOptions;

    fn create_test_archive(path: &Path, files: &[(&str, &str)]) -> Result<()> {
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in files {
            zip.start_file(*name, options)?;
            zip.write_all(content.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    #[test]
    fn test_can_handle_zip_and_wheel() {
        let extractor = ZipExtractor;
        assert!(extractor.can_handle(Path::new("file.zip")));
        assert!(extractor.can_handle(Path::new("FILE.ZIP")));
        assert!(extractor.can_handle(Path::new("torch_geometric-2.5.3-py3-none-any.whl")));
        assert!(!extractor.can_handle(Path::new("file.tar.gz")));
        assert!(!extractor.can_handle(Path::new("file.tgz")));
    }

    #[test]
    fn test_extract_keeps_layout() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("pyg.zip");
        let extract_path = dir.path().join("extracted");
        fs::create_dir(&extract_path)?;

        create_test_archive(
            &archive_path,
            &[
                ("pkg/torch_geometric/__init__.py", "__version__ = '2.5'"),
                ("pkg/setup.py", "setup()"),
            ],
        )?;

        ZipExtractor.extract(&RealRuntime, &archive_path, &extract_path)?;

        assert_eq!(
            fs::read_to_string(extract_path.join("pkg/torch_geometric/__init__.py"))?,
            "__version__ = '2.5'"
        );
        assert!(extract_path.join("pkg/setup.py").exists());

        Ok(())
    }

    #[test]
    fn test_extract_archive_with_directory_entries() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("test.zip");
        let extract_path = dir.path().join("extracted");
        fs::create_dir(&extract_path)?;

        {
            let file = File::create(&archive_path)?;
            let mut zip = ZipWriter::new(file);
            let options: FileOptions<()> = FileOptions::default();
            zip.add_directory("empty_dir/", options)?;
            zip.start_file("full_dir/file.txt", options)?;
            zip.write_all(b"content")?;
            zip.finish()?;
        }

        ZipExtractor.extract(&RealRuntime, &archive_path, &extract_path)?;

        assert!(extract_path.join("empty_dir").is_dir());
        assert_eq!(
            fs::read_to_string(extract_path.join("full_dir/file.txt"))?,
            "content"
        );

        Ok(())
    }

    #[test]
    fn test_extract_corrupted_archive() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("broken.zip");
        fs::write(&archive_path, b"this is not a zip").unwrap();

        let result = ZipExtractor.extract(&RealRuntime, &archive_path, dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_nonexistent_archive() {
        let dir = tempdir().unwrap();
        let result = ZipExtractor.extract(
            &RealRuntime,
            &dir.path().join("missing.zip"),
            dir.path(),
        );
        assert!(result.is_err());
    }
}
