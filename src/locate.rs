//! Finding pre-staged package entries under the input root.

use anyhow::{Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

fn prefix_pattern(input_root: &Path, name: &str) -> String {
    let root = glob::Pattern::escape(&input_root.to_string_lossy());
    format!("{}/{}*", root.trim_end_matches('/'), glob::Pattern::escape(name))
}

/// Every entry under `input_root` whose name starts with `name`, in glob
/// order. The root itself is never returned.
#[tracing::instrument(skip(runtime))]
pub fn locate_all<R: Runtime>(runtime: &R, input_root: &Path, name: &str) -> Result<Vec<PathBuf>> {
    if name.is_empty() {
        bail!("Package name must not be empty");
    }
    let pattern = prefix_pattern(input_root, name);
    debug!("Looking for staged entries matching {}", pattern);
    let matches = runtime
        .glob(&pattern)?
        .into_iter()
        .filter(|p| p.as_path() != input_root)
        .collect();
    Ok(matches)
}

/// The first staged entry for `name`, or `None` when nothing is staged.
///
/// When several versions are staged the first in glob order wins; there is
/// no version comparison.
#[tracing::instrument(skip(runtime))]
pub fn find_package_path<R: Runtime>(
    runtime: &R,
    input_root: &Path,
    name: &str,
) -> Result<Option<PathBuf>> {
    let found = locate_all(runtime, input_root, name)?.into_iter().next();
    match &found {
        Some(path) => debug!("Located {} at {:?}", name, path),
        None => debug!("{} is not staged under {:?}", name, input_root),
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_package_path_first_match_wins() {
        let mut runtime = MockRuntime::new();
        let root = PathBuf::from("/kaggle/input");

        runtime
            .expect_glob()
            .with(eq("/kaggle/input/rdkit*"))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    PathBuf::from("/kaggle/input/rdkit-2023.9.1.whl"),
                    PathBuf::from("/kaggle/input/rdkit-2024.3.2.whl"),
                ])
            });

        let found = find_package_path(&runtime, &root, "rdkit").unwrap();
        assert_eq!(found, Some(PathBuf::from("/kaggle/input/rdkit-2023.9.1.whl")));
    }

    #[test]
    fn test_find_package_path_not_found() {
        let mut runtime = MockRuntime::new();
        runtime.expect_glob().returning(|_| Ok(vec![]));

        let found = find_package_path(&runtime, Path::new("/kaggle/input"), "torch_cluster")
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_find_package_path_excludes_root() {
        // A root named like the package, e.g. /data/rdkit with name "rdkit"
        let mut runtime = MockRuntime::new();
        runtime
            .expect_glob()
            .returning(|_| Ok(vec![PathBuf::from("/data/rdkit")]));

        let found = find_package_path(&runtime, Path::new("/data/rdkit"), "rdkit").unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_prefix_pattern_escapes_metacharacters() {
        assert_eq!(
            prefix_pattern(Path::new("/in/[weird]"), "pkg"),
            "/in/[[]weird[]]/pkg*"
        );
        assert_eq!(prefix_pattern(Path::new("/in/"), "a*b"), "/in/a[*]b*");
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let runtime = MockRuntime::new();
        assert!(find_package_path(&runtime, Path::new("/in"), "").is_err());
    }

    #[test]
    fn test_locate_all_on_disk() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("torch_scatter-2.1")).unwrap();
        fs::write(dir.path().join("torch_scatter-2.0.tar.gz"), "").unwrap();
        fs::write(dir.path().join("torch_sparse-0.6.tar.gz"), "").unwrap();

        let all = locate_all(&RealRuntime, dir.path(), "torch_scatter").unwrap();
        assert_eq!(
            all,
            vec![
                dir.path().join("torch_scatter-2.0.tar.gz"),
                dir.path().join("torch_scatter-2.1"),
            ]
        );
    }
}
