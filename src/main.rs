use anyhow::Result;
use clap::Parser;
use opi::commands;
use opi::config::{Config, Overrides};
use opi::launcher;
use std::path::PathBuf;

/// opi - Offline Package Installer
///
/// Install pre-staged Python package archives without network access.
///
/// Examples:
///   opi setup                       # Install the default packages, then relocate torch_geometric
///   opi install rdkit torch_scatter # Install selected packages in order
///   opi run -- python train.py      # Run with the library directory on PYTHONPATH
#[derive(Parser, Debug)]
#[command(author, version = env!("OPI_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Read-only directory holding the staged archives
    #[arg(
        long = "input-root",
        env = "OPI_INPUT_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub input_root: Option<PathBuf>,

    /// Writable directory for build and extraction scratch space
    #[arg(long = "work-dir", env = "OPI_WORK_DIR", value_name = "PATH", global = true)]
    pub work_dir: Option<PathBuf>,

    /// Library directory placed on PYTHONPATH (defaults to <work-dir>/lib)
    #[arg(long = "lib-dir", env = "OPI_LIB_DIR", value_name = "PATH", global = true)]
    pub lib_dir: Option<PathBuf>,

    /// Python interpreter used for import probes and pip
    #[arg(long, env = "OPI_PYTHON", value_name = "PROGRAM", global = true)]
    pub python: Option<String>,

    /// JSON plan file with packages and paths
    #[arg(long, short = 'c', env = "OPI_CONFIG", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install staged packages offline, in the given order
    Install(InstallArgs),

    /// Copy a library's package directory into the library directory
    Relocate(RelocateArgs),

    /// Install the configured packages, then relocate the configured library
    Setup,

    /// Show which staged entries match a package name
    Locate(LocateArgs),

    /// Print a shell line exporting PYTHONPATH
    Env,

    /// Run a program with the library directory on PYTHONPATH
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Package names (defaults to the configured list)
    #[arg(value_name = "PACKAGE")]
    pub packages: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct RelocateArgs {
    /// Library to relocate (defaults to the configured one)
    #[arg(value_name = "LIBRARY")]
    pub library: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct LocateArgs {
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Program and its arguments
    #[arg(
        value_name = "COMMAND",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = opi::runtime::RealRuntime;

    let overrides = Overrides {
        input_root: cli.input_root,
        work_dir: cli.work_dir,
        lib_dir: cli.lib_dir,
        python: cli.python,
        plan: cli.config,
    };
    let config = Config::resolve(&runtime, overrides)?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Install(args) => {
            commands::install(&runtime, &config, &args.packages, &mut stdout)?
        }
        Commands::Relocate(args) => {
            commands::relocate(&runtime, &config, args.library.as_deref(), &mut stdout)?
        }
        Commands::Setup => commands::setup(&runtime, &config, &mut stdout)?,
        Commands::Locate(args) => commands::locate(&runtime, &config, &args.name, &mut stdout)?,
        Commands::Env => commands::env(&runtime, &config, &mut stdout)?,
        Commands::Run(args) => {
            drop(stdout);
            let (program, rest) = args
                .command
                .split_first()
                .ok_or_else(|| anyhow::anyhow!("No program given to run"))?;
            let code = launcher::run(&runtime, &config, program, rest)?;
            std::process::exit(code);
        }
    }
    Ok(())
}
