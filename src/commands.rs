//! Subcommand bodies: run an operation and print one status line per item.

use anyhow::Result;
use std::io::Write;

use crate::config::Config;
use crate::install::{DependencyInstaller, InstallOutcome, PackageReport};
use crate::launcher;
use crate::locate::locate_all;
use crate::relocate::{LibraryRelocator, RelocateOutcome};
use crate::runtime::Runtime;

fn print_install_report<W: Write>(out: &mut W, report: &PackageReport) -> Result<()> {
    match &report.outcome {
        InstallOutcome::AlreadyInstalled => {
            writeln!(out, "{}: already installed", report.name)?
        }
        InstallOutcome::NotFound => writeln!(out, "{}: not staged, skipped", report.name)?,
        InstallOutcome::Installed { target } => {
            writeln!(out, "{}: installed from {}", report.name, target.display())?
        }
    }
    Ok(())
}

fn print_relocate_outcome<W: Write>(
    out: &mut W,
    library: &str,
    outcome: &RelocateOutcome,
) -> Result<()> {
    match outcome {
        RelocateOutcome::AlreadyPresent { path } => {
            writeln!(out, "{}: already present at {}", library, path.display())?
        }
        RelocateOutcome::NotFound => writeln!(out, "{}: not staged, skipped", library)?,
        RelocateOutcome::InnerDirNotFound => {
            writeln!(out, "{}: no package directory in staged archive", library)?
        }
        RelocateOutcome::Relocated { to, .. } => {
            writeln!(out, "{}: copied to {}", library, to.display())?
        }
    }
    Ok(())
}

/// Install `packages`, or the configured list when empty.
pub fn install<R: Runtime, W: Write>(
    runtime: &R,
    config: &Config,
    packages: &[String],
    out: &mut W,
) -> Result<()> {
    let packages = if packages.is_empty() {
        &config.packages[..]
    } else {
        packages
    };
    DependencyInstaller::new(runtime, config)
        .install_all(packages, |report| print_install_report(out, report))?;
    Ok(())
}

pub fn relocate<R: Runtime, W: Write>(
    runtime: &R,
    config: &Config,
    library: Option<&str>,
    out: &mut W,
) -> Result<()> {
    let library = library.unwrap_or(config.relocate.as_str());
    let outcome = LibraryRelocator::new(runtime, config).relocate(library)?;
    print_relocate_outcome(out, library, &outcome)
}

/// The once-per-process flow: dependencies first, then the relocated library.
pub fn setup<R: Runtime, W: Write>(runtime: &R, config: &Config, out: &mut W) -> Result<()> {
    install(runtime, config, &[], out)?;
    relocate(runtime, config, None, out)
}

pub fn locate<R: Runtime, W: Write>(
    runtime: &R,
    config: &Config,
    name: &str,
    out: &mut W,
) -> Result<()> {
    let matches = locate_all(runtime, &config.input_root, name)?;
    if matches.is_empty() {
        writeln!(out, "{}: not staged under {}", name, config.input_root.display())?;
        return Ok(());
    }
    for (i, path) in matches.iter().enumerate() {
        let marker = if i == 0 { "*" } else { " " };
        writeln!(out, "{} {}", marker, path.display())?;
    }
    Ok(())
}

pub fn env<R: Runtime, W: Write>(runtime: &R, config: &Config, out: &mut W) -> Result<()> {
    writeln!(out, "{}", launcher::export_line(runtime, config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, ProcessOutput};
    use crate::test_utils::{configure_mock_python, test_config};
    use std::path::PathBuf;

    #[test]
    fn test_locate_marks_first_match() {
        let mut runtime = MockRuntime::new();
        runtime.expect_glob().returning(|_| {
            Ok(vec![
                PathBuf::from("/kaggle/input/rdkit-2023.9.1"),
                PathBuf::from("/kaggle/input/rdkit-2024.3.2"),
            ])
        });

        let mut out = Vec::new();
        locate(&runtime, &test_config(), "rdkit", &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "* /kaggle/input/rdkit-2023.9.1\n  /kaggle/input/rdkit-2024.3.2\n"
        );
    }

    #[test]
    fn test_locate_nothing_staged() {
        let mut runtime = MockRuntime::new();
        runtime.expect_glob().returning(|_| Ok(vec![]));

        let mut out = Vec::new();
        locate(&runtime, &test_config(), "torch_cluster", &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "torch_cluster: not staged under /kaggle/input\n"
        );
    }

    #[test]
    fn test_install_defaults_to_configured_packages() {
        let mut runtime = MockRuntime::new();
        configure_mock_python(&mut runtime);
        let mut config = test_config();
        config.packages = vec!["rdkit".to_string(), "torch_scatter".to_string()];

        // Both already importable
        runtime.expect_output().times(2).returning(|_| {
            Ok(ProcessOutput {
                code: Some(0),
                ..Default::default()
            })
        });

        let mut out = Vec::new();
        install(&runtime, &config, &[], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "rdkit: already installed\ntorch_scatter: already installed\n"
        );
    }

    #[test]
    fn test_install_prints_finished_packages_before_a_failure() {
        let mut runtime = MockRuntime::new();
        configure_mock_python(&mut runtime);

        runtime
            .expect_output()
            .withf(|inv| inv.args == ["-c", "import rdkit"])
            .returning(|_| {
                Ok(ProcessOutput {
                    code: Some(0),
                    ..Default::default()
                })
            });
        runtime
            .expect_output()
            .withf(|inv| inv.args == ["-c", "import torch_sparse"])
            .returning(|_| {
                Ok(ProcessOutput {
                    code: Some(1),
                    ..Default::default()
                })
            });
        runtime
            .expect_glob()
            .returning(|_| Err(anyhow::anyhow!("input root unreadable")));

        let packages = vec!["rdkit".to_string(), "torch_sparse".to_string()];
        let mut out = Vec::new();
        let result = install(&runtime, &test_config(), &packages, &mut out);

        assert!(result.is_err());
        assert_eq!(String::from_utf8(out).unwrap(), "rdkit: already installed\n");
    }

    #[test]
    fn test_relocate_reports_present_library() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);

        let mut out = Vec::new();
        relocate(&runtime, &test_config(), None, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "torch_geometric: already present at /kaggle/working/lib/torch_geometric\n"
        );
    }
}
