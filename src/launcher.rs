//! Running an entry point with the library directory on `PYTHONPATH`.

use anyhow::{Result, bail};
use log::debug;
use std::ffi::OsString;

use crate::config::Config;
use crate::python::{PYTHONPATH, prepend_python_path};
use crate::runtime::{Invocation, Runtime};

/// The `PYTHONPATH` a launched program sees.
pub fn launch_python_path<R: Runtime>(runtime: &R, config: &Config) -> Result<OsString> {
    let existing = runtime.env_var(PYTHONPATH).ok();
    prepend_python_path(&config.lib_dir, existing.as_deref())
}

/// A line suitable for `eval "$(opi env)"`.
pub fn export_line<R: Runtime>(runtime: &R, config: &Config) -> Result<String> {
    let value = launch_python_path(runtime, config)?;
    Ok(format!(
        "export {}='{}'",
        PYTHONPATH,
        value.to_string_lossy().replace('\'', r"'\''")
    ))
}

/// Run `program` with `args` and return its exit code. A child killed by a
/// signal is reported as 1.
#[tracing::instrument(skip(runtime, config))]
pub fn run<R: Runtime>(
    runtime: &R,
    config: &Config,
    program: &str,
    args: &[String],
) -> Result<i32> {
    if program.is_empty() {
        bail!("No program given to run");
    }
    let invocation = Invocation::new(program)
        .args(args.iter().cloned())
        .env(PYTHONPATH, launch_python_path(runtime, config)?);
    debug!("Launching {}", invocation);
    Ok(runtime.status(&invocation)?.unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{configure_mock_python, test_config};
    use mockall::predicate::eq;

    #[test]
    fn test_run_prepends_lib_dir() {
        let mut runtime = MockRuntime::new();
        let config = test_config();
        runtime
            .expect_env_var()
            .with(eq(PYTHONPATH))
            .returning(|_| Ok("/opt/site".to_string()));
        runtime
            .expect_status()
            .withf(|inv| {
                inv.program == "python3"
                    && inv.args == ["train.py", "--epochs", "3"]
                    && inv.envs
                        == [(
                            PYTHONPATH.to_string(),
                            std::env::join_paths(["/kaggle/working/lib", "/opt/site"]).unwrap(),
                        )]
            })
            .times(1)
            .returning(|_| Ok(Some(0)));

        let args = vec!["train.py".to_string(), "--epochs".to_string(), "3".to_string()];
        let code = run(&runtime, &config, "python3", &args).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_run_forwards_exit_code() {
        let mut runtime = MockRuntime::new();
        let config = test_config();
        configure_mock_python(&mut runtime);
        runtime.expect_status().returning(|_| Ok(Some(7)));
        assert_eq!(run(&runtime, &config, "main_runner", &[]).unwrap(), 7);

        let mut runtime = MockRuntime::new();
        configure_mock_python(&mut runtime);
        runtime.expect_status().returning(|_| Ok(None));
        assert_eq!(run(&runtime, &config, "main_runner", &[]).unwrap(), 1);
    }

    #[test]
    fn test_run_requires_program() {
        let runtime = MockRuntime::new();
        assert!(run(&runtime, &test_config(), "", &[]).is_err());
    }

    #[test]
    fn test_export_line() {
        let mut runtime = MockRuntime::new();
        configure_mock_python(&mut runtime);
        let line = export_line(&runtime, &test_config()).unwrap();
        assert_eq!(line, "export PYTHONPATH='/kaggle/working/lib'");
    }
}
