//! Offline installation of pre-staged packages, in list order.

use anyhow::{Result, bail};
use log::{debug, info};
use std::path::PathBuf;

use crate::archive::Unpacker;
use crate::config::Config;
use crate::locate::find_package_path;
use crate::python::PythonEnv;
use crate::runtime::Runtime;
use crate::stage::{WheelMode, stage_into};

mod target;

pub use target::resolve_install_target;

/// What happened to one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The package already imports; nothing was touched
    AlreadyInstalled,
    /// Nothing staged under the input root
    NotFound,
    /// pip installed from `target`
    Installed { target: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub name: String,
    pub outcome: InstallOutcome,
}

pub struct DependencyInstaller<'a, R: Runtime> {
    runtime: &'a R,
    config: &'a Config,
    python: PythonEnv,
    unpacker: Unpacker,
}

impl<'a, R: Runtime> DependencyInstaller<'a, R> {
    pub fn new(runtime: &'a R, config: &'a Config) -> Self {
        Self {
            runtime,
            config,
            python: PythonEnv::new(config.python.clone(), config.lib_dir.clone()),
            unpacker: Unpacker::new(),
        }
    }

    /// Install every package in order, handing each report to `on_report`
    /// as soon as that package is done. The first failed pip run aborts the
    /// whole run; packages after it are not attempted.
    #[tracing::instrument(skip(self, on_report))]
    pub fn install_all<F>(
        &self,
        packages: &[String],
        mut on_report: F,
    ) -> Result<Vec<PackageReport>>
    where
        F: FnMut(&PackageReport) -> Result<()>,
    {
        let mut reports = Vec::with_capacity(packages.len());
        for name in packages {
            let report = PackageReport {
                name: name.clone(),
                outcome: self.install(name)?,
            };
            on_report(&report)?;
            reports.push(report);
        }
        Ok(reports)
    }

    #[tracing::instrument(skip(self))]
    pub fn install(&self, name: &str) -> Result<InstallOutcome> {
        let module = self.config.import_name(name);
        if self.python.can_import(self.runtime, &module) {
            info!("{} is already importable, skipping", name);
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let Some(source) = find_package_path(self.runtime, &self.config.input_root, name)? else {
            info!("{} is not staged under {:?}", name, self.config.input_root);
            return Ok(InstallOutcome::NotFound);
        };

        let build_dir = self.config.build_dir(name);
        debug!("Staging {:?} into {:?}", source, build_dir);
        stage_into(
            self.runtime,
            &self.unpacker,
            &source,
            &build_dir,
            WheelMode::Keep,
        )?;

        let target = resolve_install_target(self.runtime, &build_dir)?;
        let find_links = self
            .config
            .find_links
            .then_some(self.config.input_root.as_path());
        let invocation = self
            .python
            .offline_install(self.runtime, &target, find_links)?;

        info!("Installing {} from {:?}", name, target);
        let output = self.runtime.output(&invocation)?;
        debug!("pip stdout for {}:\n{}", name, output.stdout);
        if !output.success() {
            bail!(
                "Installing {} from {:?} failed (exit status {}):\n{}",
                name,
                target,
                output
                    .code
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                output.stderr.trim_end()
            );
        }

        Ok(InstallOutcome::Installed { target })
    }
}
