//! Runtime abstraction for system operations.
//!
//! Everything that touches the filesystem, the environment or child
//! processes goes through [`Runtime`], so the installer and relocator can be
//! exercised against a mock in tests.
//!
//! # Structure
//!
//! - `env` - Environment variables
//! - `fs` - File system operations (read, copy, directory, symlink, glob)
//! - `process` - Child process invocation

mod env;
mod fs;
mod process;

use anyhow::Result;
use std::env as std_env;
use std::path::{Path, PathBuf};

pub use process::{Invocation, ProcessOutput};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn copy(&self, from: &Path, to: &Path) -> Result<u64>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// Whether `path` itself is a symlink, without following it.
    fn is_symlink(&self, path: &Path) -> bool;
    fn symlink(&self, original: &Path, link: &Path) -> Result<()>;

    /// List the entries of a directory, sorted by path.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    fn create_file(&self, path: &Path) -> Result<Box<dyn std::io::Write>>;
    fn open(&self, path: &Path) -> Result<Box<dyn std::io::Read>>;

    /// Set file permissions (mode) on Unix systems. No-op elsewhere.
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;

    /// Expand a glob pattern. Results come back in the glob crate's order,
    /// which is lexical per directory level.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>>;

    // Processes
    /// Run a program to completion with captured stdout and stderr.
    fn output(&self, invocation: &Invocation) -> Result<ProcessOutput>;

    /// Run a program with inherited stdio and return its exit code.
    /// `None` means the child was terminated by a signal.
    fn status(&self, invocation: &Invocation) -> Result<Option<i32>>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<u64> {
        self.copy_impl(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.is_symlink_impl(path)
    }

    fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        self.symlink_impl(original, link)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn create_file(&self, path: &Path) -> Result<Box<dyn std::io::Write>> {
        self.create_file_impl(path)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn std::io::Read>> {
        self.open_impl(path)
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()> {
        self.set_permissions_impl(path, mode)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        self.glob_impl(pattern)
    }

    fn output(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.output_impl(invocation)
    }

    fn status(&self, invocation: &Invocation) -> Result<Option<i32>> {
        self.status_impl(invocation)
    }
}
