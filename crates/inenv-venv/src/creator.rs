//! Boundary to the external environment-creation tool.
//!
//! `VirtualEnv::create` hands off to an [`EnvCreator`]; the default is
//! [`PythonVenvCreator`], which shells out to `python -m venv`.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::Command;

use inenv_core::config::VenvConfig;

use crate::error::{Result, VenvError};

/// Interpreters probed on PATH when none is configured.
const PYTHON_CANDIDATES: &[&str] = &["python3", "python"];

/// Produces a self-contained interpreter environment at `path`.
///
/// Implementations must leave `path/bin` (or `Scripts` on Windows) in place on
/// success and return an error when the tool fails.
pub trait EnvCreator: Debug + Send + Sync {
    fn create(&self, name: &str, path: &Path) -> Result<()>;
}

/// Creates environments with the standard library `venv` module.
#[derive(Debug, Clone, Default)]
pub struct PythonVenvCreator {
    /// Interpreter override; `None` probes python3 then python on PATH
    python: Option<PathBuf>,
    with_pip: bool,
}

impl PythonVenvCreator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &VenvConfig) -> Self {
        Self {
            python: config.python.as_ref().map(PathBuf::from),
            with_pip: config.with_pip,
        }
    }

    pub fn with_python(mut self, python: impl Into<PathBuf>) -> Self {
        self.python = Some(python.into());
        self
    }

    pub fn with_pip(mut self, with_pip: bool) -> Self {
        self.with_pip = with_pip;
        self
    }

    /// Resolve the interpreter that will run `-m venv`.
    pub fn interpreter(&self) -> Result<PathBuf> {
        if let Some(ref python) = self.python {
            return which::which(python).map_err(|_| VenvError::InterpreterNotFound {
                tried: python.display().to_string(),
            });
        }
        PYTHON_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .ok_or_else(|| VenvError::InterpreterNotFound {
                tried: PYTHON_CANDIDATES.join(", "),
            })
    }
}

impl EnvCreator for PythonVenvCreator {
    fn create(&self, name: &str, path: &Path) -> Result<()> {
        let python = self.interpreter()?;
        let mut cmd = Command::new(&python);
        cmd.arg("-m").arg("venv");
        if !self.with_pip {
            cmd.arg("--without-pip");
        }
        cmd.arg(path);
        tracing::debug!(python = %python.display(), path = %path.display(), "running venv");

        let out = cmd.output().map_err(|source| VenvError::Spawn {
            program: python.display().to_string(),
            source,
        })?;
        if !out.status.success() {
            return Err(VenvError::CreateFailed {
                name: name.to_string(),
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
