//! `.env` file discovery and loading
//!
//! Candidates are checked in order and the first readable one is applied.
//! Variables already present in the environment are never overwritten.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::config::global_config_dir;
use crate::domain::parse_env_content;
use crate::infrastructure::traits::{Environment, FileSystem};

pub const ENV_FILE_NAME: &str = ".env";

/// Directories searched for an env file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvLocations {
    /// `--env-file`, used as-is
    pub explicit: Option<PathBuf>,
    /// Nearest ancestor of the working directory containing `.git`
    pub project_root: Option<PathBuf>,
    /// Global configuration directory
    pub tool_root: Option<PathBuf>,
    /// Directory of the running executable
    pub exe_dir: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
}

impl EnvLocations {
    /// Locations for the current process.
    pub fn discover(explicit: Option<PathBuf>, fs: &dyn FileSystem) -> Self {
        let cwd = std::env::current_dir().ok();
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self {
            explicit,
            project_root: cwd.as_deref().and_then(|dir| find_project_root(dir, fs)),
            tool_root: global_config_dir(),
            exe_dir,
            cwd,
        }
    }

    /// Candidate files in priority order, without duplicates.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let dirs = [&self.project_root, &self.tool_root, &self.exe_dir, &self.cwd];
        self.explicit
            .iter()
            .cloned()
            .chain(dirs.into_iter().flatten().map(|dir| dir.join(ENV_FILE_NAME)))
            .unique()
            .collect()
    }
}

/// Walk up from `start` to the first directory containing `.git`.
pub fn find_project_root(start: &Path, fs: &dyn FileSystem) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| fs.exists(&dir.join(".git")))
        .map(Path::to_path_buf)
}

/// Which env file was applied, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSource {
    pub loaded: Option<PathBuf>,
    pub searched: Vec<PathBuf>,
}

/// Loads `.env` files into the process environment.
pub struct EnvFileService {
    fs: Arc<dyn FileSystem>,
    env: Arc<dyn Environment>,
}

impl EnvFileService {
    pub fn new(fs: Arc<dyn FileSystem>, env: Arc<dyn Environment>) -> Self {
        Self { fs, env }
    }

    /// Apply the first readable candidate. Unreadable files are skipped.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, candidates: &[PathBuf]) -> EnvSource {
        let mut source = EnvSource {
            loaded: None,
            searched: candidates.to_vec(),
        };

        for path in candidates {
            if !self.fs.is_file(path) {
                continue;
            }
            match self.fs.read_to_string(path) {
                Ok(content) => {
                    let applied = self.apply(&content);
                    debug!("loaded {} ({} new variables)", path.display(), applied);
                    source.loaded = Some(path.clone());
                    return source;
                }
                Err(e) => debug!("skipping {}: {}", path.display(), e),
            }
        }

        debug!("no env file found");
        source
    }

    /// Set each parsed pair that is not already in the environment.
    /// Returns the number of variables set.
    pub fn apply(&self, content: &str) -> usize {
        let mut applied = 0;
        for (key, value) in parse_env_content(content) {
            if self.env.var(&key).is_none() {
                self.env.set_var(&key, &value);
                applied += 1;
            }
        }
        applied
    }
}
