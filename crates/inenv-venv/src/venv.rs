//! The `VirtualEnv` model: one named environment under a base directory.
//!
//! Layout on disk once created:
//!
//! ```text
//! <base_dir>/inenv_<name>/
//!     bin/                         (Scripts/ on Windows)
//!     inenv_<name>_activate.sh     bootstrap script, also the `exists` marker
//!     inenv_cache.json
//! ```

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::Arc;

use chrono::Utc;
use inenv_core::config::VenvConfig;
use sha2::{Digest, Sha256};

use crate::cache::{self, CacheData, CacheValue, CREATED_AT_KEY, VENV_HASH_KEY};
use crate::creator::{EnvCreator, PythonVenvCreator};
use crate::error::{Result, VenvError};
use crate::info_log;
use crate::run::{self, RunOptions};

const DIR_PREFIX: &str = "inenv_";
const CACHE_FILE_NAME: &str = "inenv_cache.json";
const PYVENV_CFG: &str = "pyvenv.cfg";

#[cfg(windows)]
pub const BIN_DIR_NAME: &str = "Scripts";
#[cfg(not(windows))]
pub const BIN_DIR_NAME: &str = "bin";

/// Marker variable pointing at the active environment.
pub const VIRTUAL_ENV_VAR: &str = "VIRTUAL_ENV";
const PATH_VAR: &str = "PATH";
/// Removed from the child environment, as `activate` scripts do.
const CLEARED_VARS: &[&str] = &["PYTHONHOME"];

/// A named environment rooted under `base_dir`.
///
/// Construction does no I/O; every path is derived from `name` and
/// `base_dir`. Whether the environment exists is checked on disk at each call.
#[derive(Debug, Clone)]
pub struct VirtualEnv {
    name: String,
    base_dir: PathBuf,
    path: PathBuf,
    creator: Arc<dyn EnvCreator>,
}

impl VirtualEnv {
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let base_dir = base_dir.into();
        let path = base_dir.join(format!("{DIR_PREFIX}{name}"));
        Self {
            name,
            base_dir,
            path,
            creator: Arc::new(PythonVenvCreator::new()),
        }
    }

    /// Environment under the configured base dir (INENV_VENV_DIR, default `~/.inenv`),
    /// created with the configured interpreter.
    pub fn from_config(name: impl Into<String>) -> Self {
        let config = VenvConfig::from_env();
        Self::new(name, &config.venv_dir).with_creator(PythonVenvCreator::from_config(&config))
    }

    /// Replace the tool used by [`VirtualEnv::create`].
    pub fn with_creator(mut self, creator: impl EnvCreator + 'static) -> Self {
        self.creator = Arc::new(creator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.path.join(BIN_DIR_NAME)
    }

    pub fn execfile_name(&self) -> String {
        format!("{DIR_PREFIX}{}_activate.sh", self.name)
    }

    pub fn execfile_path(&self) -> PathBuf {
        self.path.join(self.execfile_name())
    }

    pub fn cache_file(&self) -> PathBuf {
        self.path.join(CACHE_FILE_NAME)
    }

    /// True iff the bootstrap script is on disk. Never cached.
    pub fn exists(&self) -> bool {
        self.execfile_path().is_file()
    }

    /// Bring the environment onto disk and record its fingerprint in the cache.
    ///
    /// On an environment that already exists the external tool is skipped and
    /// only the fingerprint is refreshed. If the tool fails, nothing is left
    /// behind that would make [`VirtualEnv::exists`] true.
    pub fn create(&self) -> Result<()> {
        if self.exists() {
            tracing::debug!(name = %self.name, "virtualenv already exists, refreshing fingerprint");
            return self.record_fingerprint();
        }

        let preexisting = self.path.exists();
        fs::create_dir_all(&self.base_dir)
            .map_err(|e| VenvError::io(format!("create {}", self.base_dir.display()), e))?;

        info_log!("Creating virtualenv '{}' at {}", self.name, self.path.display());
        if let Err(e) = self.build_on_disk() {
            if !preexisting {
                self.discard_partial();
            }
            return Err(e);
        }

        if let Err(e) = self.record_fingerprint() {
            let _ = fs::remove_file(self.execfile_path());
            return Err(e);
        }
        info_log!("Created virtualenv '{}'", self.name);
        Ok(())
    }

    fn build_on_disk(&self) -> Result<()> {
        self.creator.create(&self.name, &self.path)?;
        let bin_dir = self.bin_dir();
        if !bin_dir.is_dir() {
            return Err(VenvError::io(
                format!("creator for '{}' did not produce {}", self.name, bin_dir.display()),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        // Written last: its presence is what `exists` reports
        let execfile = self.execfile_path();
        fs::write(&execfile, self.bootstrap_script())
            .map_err(|e| VenvError::io(format!("write {}", execfile.display()), e))
    }

    fn discard_partial(&self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "failed to remove partial virtualenv: {}", e);
            }
        }
    }

    /// Merge `venv_hash` (and `created_at`, if absent) into the existing cache.
    fn record_fingerprint(&self) -> Result<()> {
        let mut data = match self.load_cache_file() {
            Ok(data) => data,
            Err(VenvError::CorruptCache { path, source }) => {
                tracing::warn!(path = %path.display(), "discarding unreadable cache: {}", source);
                CacheData::new()
            }
            Err(e) => return Err(e),
        };
        data.insert(VENV_HASH_KEY.to_string(), self.venv_hash()?.into());
        data.entry(CREATED_AT_KEY.to_string())
            .or_insert_with(|| CacheValue::String(Utc::now().to_rfc3339()));
        self.save_cache_file(&data)
    }

    fn bootstrap_script(&self) -> String {
        let path = shell_single_quote(&self.path.to_string_lossy());
        format!(
            "# inenv environment '{name}'. Source this file to activate it.\n\
             {VIRTUAL_ENV_VAR}={path}\n\
             export {VIRTUAL_ENV_VAR}\n\
             PATH=\"${VIRTUAL_ENV_VAR}/{BIN_DIR_NAME}:$PATH\"\n\
             export PATH\n\
             unset PYTHONHOME\n",
            name = self.name,
        )
    }

    /// SHA-256 fingerprint over the name, `pyvenv.cfg` and the sorted
    /// entries of `bin_dir`. Stable while the environment is unchanged.
    pub fn venv_hash(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update([0u8]);

        let cfg = self.path.join(PYVENV_CFG);
        match fs::read(&cfg) {
            Ok(bytes) => hasher.update(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(VenvError::io(format!("read {}", cfg.display()), e)),
        }
        hasher.update([0u8]);

        let bin_dir = self.bin_dir();
        let mut entries: Vec<OsString> = fs::read_dir(&bin_dir)
            .map_err(|e| VenvError::io(format!("read {}", bin_dir.display()), e))?
            .filter_map(|entry| entry.ok().map(|e| e.file_name()))
            .collect();
        entries.sort();
        for entry in entries {
            hasher.update(entry.to_string_lossy().as_bytes());
            hasher.update(b"\n");
        }
        Ok(hex::encode(hasher.finalize()))
    }

    /// Stored cache, or an empty mapping when the file does not exist.
    pub fn load_cache_file(&self) -> Result<CacheData> {
        cache::read(&self.cache_file())
    }

    /// Replace the cache with `data`. Keys not in `data` are dropped.
    ///
    /// Fails with [`VenvError::NotCreated`] before [`VirtualEnv::create`].
    pub fn save_cache_file(&self, data: &CacheData) -> Result<()> {
        if !self.exists() {
            return Err(VenvError::NotCreated {
                path: self.path.clone(),
            });
        }
        cache::write(&self.cache_file(), data)
    }

    /// Variables a child needs to run inside this environment: `VIRTUAL_ENV`
    /// and `PATH` with `bin_dir` in front of the ambient search path.
    pub fn activation_env(&self) -> Result<Vec<(OsString, OsString)>> {
        let ambient = std::env::var_os(PATH_VAR).unwrap_or_default();
        let search_path = std::env::join_paths(
            std::iter::once(self.bin_dir()).chain(std::env::split_paths(&ambient)),
        )
        .map_err(|e| {
            VenvError::io(
                format!("build {PATH_VAR} for {}", self.path.display()),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
            )
        })?;
        Ok(vec![
            (VIRTUAL_ENV_VAR.into(), self.path.clone().into_os_string()),
            (PATH_VAR.into(), search_path),
        ])
    }

    /// Spawn `command` inside the environment and return the child without
    /// waiting. If the environment has not been created the command runs with
    /// the ambient environment unchanged.
    pub fn run<S: AsRef<OsStr>>(&self, command: &[S], options: RunOptions) -> Result<Child> {
        if !self.exists() {
            tracing::debug!(name = %self.name, "virtualenv not created, running in ambient environment");
            return run::spawn(command, &[], &[], None, options);
        }
        let overrides = self.activation_env()?;
        let search_path = overrides
            .iter()
            .find(|(k, _)| k == PATH_VAR)
            .map(|(_, v)| v.as_os_str());
        run::spawn(command, &overrides, CLEARED_VARS, search_path, options)
    }
}

fn shell_single_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
