//! Relocation of a library whose regular install cannot be used: its
//! package directory is lifted out of the staged archive and copied
//! verbatim into the library directory on `PYTHONPATH`.

use anyhow::Result;
use log::{debug, info, warn};
use std::path::PathBuf;

use crate::archive::Unpacker;
use crate::config::Config;
use crate::locate::find_package_path;
use crate::runtime::Runtime;
use crate::stage::{WheelMode, stage_into};
use crate::tree::{copy_tree, find_dir_containing};

/// File that marks a directory as an importable package.
pub const INITIALIZER: &str = "__init__.py";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocateOutcome {
    /// `<lib_dir>/<library>` already exists; nothing was written
    AlreadyPresent { path: PathBuf },
    /// Nothing staged under the input root
    NotFound,
    /// The staged tree has no `<library>/__init__.py`
    InnerDirNotFound,
    Relocated { from: PathBuf, to: PathBuf },
}

pub struct LibraryRelocator<'a, R: Runtime> {
    runtime: &'a R,
    config: &'a Config,
    unpacker: Unpacker,
}

impl<'a, R: Runtime> LibraryRelocator<'a, R> {
    pub fn new(runtime: &'a R, config: &'a Config) -> Self {
        Self {
            runtime,
            config,
            unpacker: Unpacker::new(),
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn relocate(&self, library: &str) -> Result<RelocateOutcome> {
        let final_dir = self.config.lib_dir.join(library);
        if self.runtime.exists(&final_dir) {
            info!("{} already present at {:?}", library, final_dir);
            return Ok(RelocateOutcome::AlreadyPresent { path: final_dir });
        }

        let Some(source) = find_package_path(self.runtime, &self.config.input_root, library)?
        else {
            info!("{} is not staged under {:?}", library, self.config.input_root);
            return Ok(RelocateOutcome::NotFound);
        };

        let scratch = self.config.scratch_dir(library);
        stage_into(
            self.runtime,
            &self.unpacker,
            &source,
            &scratch,
            WheelMode::Unpack,
        )?;

        let found = find_dir_containing(self.runtime, &scratch, library, INITIALIZER)?;
        let outcome = match found {
            Some(inner) => {
                debug!("Copying {:?} to {:?}", inner, final_dir);
                self.runtime.create_dir_all(&self.config.lib_dir)?;
                copy_tree(self.runtime, &inner, &final_dir)?;
                RelocateOutcome::Relocated {
                    from: inner,
                    to: final_dir,
                }
            }
            None => {
                warn!(
                    "No {}/{} inside {:?}; {} was not relocated",
                    library, INITIALIZER, source, library
                );
                RelocateOutcome::InnerDirNotFound
            }
        };

        self.runtime.remove_dir_all(&scratch)?;
        Ok(outcome)
    }
}
