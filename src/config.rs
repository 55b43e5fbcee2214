use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub const DEFAULT_INPUT_ROOT: &str = "/kaggle/input";
pub const DEFAULT_WORK_DIR: &str = "/kaggle/working";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_RELOCATE: &str = "torch_geometric";

/// Installed in this order; later entries may build against earlier ones.
pub const DEFAULT_PACKAGES: &[&str] = &[
    "rdkit",
    "torch_scatter",
    "torch_sparse",
    "torch_cluster",
    "torch_spline_conv",
];

/// Optional JSON plan file. Every field falls back to a built-in default.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    pub input_root: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub lib_dir: Option<PathBuf>,
    pub python: Option<String>,
    pub packages: Option<Vec<String>>,
    #[serde(default)]
    pub import_names: BTreeMap<String, String>,
    pub relocate: Option<String>,
    pub find_links: Option<bool>,
}

impl Plan {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse plan file {:?}", path))
    }
}

/// Values given on the command line or through `OPI_*` variables.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub input_root: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub lib_dir: Option<PathBuf>,
    pub python: Option<String>,
    pub plan: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_root: PathBuf,
    pub work_dir: PathBuf,
    pub lib_dir: PathBuf,
    pub python: String,
    pub packages: Vec<String>,
    pub import_names: BTreeMap<String, String>,
    pub relocate: String,
    pub find_links: bool,
}

impl Config {
    /// Layer overrides on top of the plan file on top of the defaults.
    pub fn resolve<R: Runtime>(runtime: &R, overrides: Overrides) -> Result<Self> {
        let plan = match &overrides.plan {
            Some(path) => Plan::load(runtime, path)?,
            None => Plan::default(),
        };
        debug!("Using plan {:?}", plan);
        Ok(Self::from_parts(plan, overrides))
    }

    fn from_parts(plan: Plan, overrides: Overrides) -> Self {
        let work_dir = overrides
            .work_dir
            .or(plan.work_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR));
        let lib_dir = overrides
            .lib_dir
            .or(plan.lib_dir)
            .unwrap_or_else(|| work_dir.join("lib"));

        Self {
            input_root: overrides
                .input_root
                .or(plan.input_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_ROOT)),
            lib_dir,
            work_dir,
            python: overrides
                .python
                .or(plan.python)
                .unwrap_or_else(|| DEFAULT_PYTHON.to_string()),
            packages: plan
                .packages
                .unwrap_or_else(|| DEFAULT_PACKAGES.iter().map(|s| s.to_string()).collect()),
            import_names: plan.import_names,
            relocate: plan
                .relocate
                .unwrap_or_else(|| DEFAULT_RELOCATE.to_string()),
            find_links: plan.find_links.unwrap_or(true),
        }
    }

    /// Per-package build workspace, recreated on every install.
    pub fn build_dir(&self, package: &str) -> PathBuf {
        self.work_dir.join("build").join(package)
    }

    /// Scratch directory the relocator unpacks into.
    pub fn scratch_dir(&self, package: &str) -> PathBuf {
        self.work_dir.join("extract").join(package)
    }

    /// Module name to probe for `package`: an explicit mapping, or the
    /// package name with dashes turned into underscores.
    pub fn import_name(&self, package: &str) -> String {
        self.import_names
            .get(package)
            .cloned()
            .unwrap_or_else(|| package.replace('-', "_"))
    }
}
