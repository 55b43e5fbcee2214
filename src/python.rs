//! Talking to the target Python interpreter.

use anyhow::{Context, Result};
use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::runtime::{Invocation, Runtime};

pub const PYTHONPATH: &str = "PYTHONPATH";

/// Build a `PYTHONPATH` value with `lib_dir` in front of `existing`.
pub fn prepend_python_path(lib_dir: &Path, existing: Option<&str>) -> Result<OsString> {
    let mut paths = vec![lib_dir.to_path_buf()];
    if let Some(existing) = existing.filter(|s| !s.is_empty()) {
        paths.extend(std::env::split_paths(existing));
    }
    std::env::join_paths(paths).context("Library directory cannot be placed on PYTHONPATH")
}

/// The interpreter packages are probed with and installed into.
#[derive(Debug, Clone)]
pub struct PythonEnv {
    program: String,
    lib_dir: PathBuf,
}

impl PythonEnv {
    pub fn new(program: impl Into<String>, lib_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            lib_dir: lib_dir.into(),
        }
    }

    fn invocation<R: Runtime>(&self, runtime: &R) -> Result<Invocation> {
        let existing = runtime.env_var(PYTHONPATH).ok();
        let python_path = prepend_python_path(&self.lib_dir, existing.as_deref())?;
        Ok(Invocation::new(self.program.clone()).env(PYTHONPATH, python_path))
    }

    /// Whether `module` imports, with the library directory on the path.
    /// An interpreter that cannot be started counts as "not importable".
    #[tracing::instrument(skip(self, runtime))]
    pub fn can_import<R: Runtime>(&self, runtime: &R, module: &str) -> bool {
        let invocation = match self.invocation(runtime) {
            Ok(inv) => inv.arg("-c").arg(format!("import {}", module)),
            Err(e) => {
                debug!("Cannot probe {}: {}", module, e);
                return false;
            }
        };
        match runtime.output(&invocation) {
            Ok(out) => out.success(),
            Err(e) => {
                debug!("Import probe for {} failed to run: {}", module, e);
                false
            }
        }
    }

    /// `python -m pip install` restricted to local artifacts, without
    /// dependency resolution or build isolation.
    pub fn offline_install<R: Runtime>(
        &self,
        runtime: &R,
        target: &Path,
        find_links: Option<&Path>,
    ) -> Result<Invocation> {
        let mut invocation = self.invocation(runtime)?.args([
            "-m",
            "pip",
            "install",
            "--no-index",
            "--no-deps",
            "--no-build-isolation",
        ]);
        if let Some(dir) = find_links {
            invocation = invocation
                .arg("--find-links")
                .arg(dir.to_string_lossy());
        }
        Ok(invocation.arg(target.to_string_lossy()))
    }
}
