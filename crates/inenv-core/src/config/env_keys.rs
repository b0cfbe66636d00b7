//! Environment variable keys and their aliases.
//!
//! Primary keys use the `INENV_*` prefix.

/// Virtual environment placement and creation
pub mod venv {
    /// Base directory under which named environments live
    pub const INENV_VENV_DIR: &str = "INENV_VENV_DIR";
    /// virtualenvwrapper's variable, honoured when INENV_VENV_DIR is unset
    pub const VENV_DIR_ALIASES: &[&str] = &["WORKON_HOME"];

    /// Interpreter used to run `-m venv` (defaults to python3/python on PATH)
    pub const INENV_PYTHON: &str = "INENV_PYTHON";

    /// Bootstrap pip into new environments
    pub const INENV_VENV_WITH_PIP: &str = "INENV_VENV_WITH_PIP";
}

/// Logging
pub mod observability {
    pub const INENV_QUIET: &str = "INENV_QUIET";
    pub const INENV_LOG_LEVEL: &str = "INENV_LOG_LEVEL";
    pub const INENV_LOG_JSON: &str = "INENV_LOG_JSON";
}
