//! Config structs grouped by concern, loaded from environment variables.

use super::env_keys::{observability as obv_keys, venv as venv_keys};
use super::loader::{env_bool, env_optional, env_or};
use std::path::PathBuf;

/// Where named environments live and how they are created
#[derive(Debug, Clone)]
pub struct VenvConfig {
    /// Base directory for named environments. Defaults to `~/.inenv`.
    pub venv_dir: PathBuf,
    /// Interpreter override for `-m venv`
    pub python: Option<String>,
    /// Bootstrap pip into new environments
    pub with_pip: bool,
}

impl VenvConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        let venv_dir = env_optional(venv_keys::INENV_VENV_DIR, venv_keys::VENV_DIR_ALIASES)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_venv_dir);
        Self {
            venv_dir,
            python: env_optional(venv_keys::INENV_PYTHON, &[]),
            with_pip: env_bool(venv_keys::INENV_VENV_WITH_PIP, &[], false),
        }
    }

    fn default_venv_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".inenv")
    }
}

/// Logging config: quiet, log_level, log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            super::loader::load_dotenv();
            Self {
                quiet: env_bool(obv_keys::INENV_QUIET, &[], false),
                log_level: env_or(obv_keys::INENV_LOG_LEVEL, &[], || "inenv=info".to_string()),
                log_json: env_bool(obv_keys::INENV_LOG_JSON, &[], false),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venv_config_defaults_under_home() {
        // Only meaningful when neither variable is set in the test environment
        if env_optional(venv_keys::INENV_VENV_DIR, venv_keys::VENV_DIR_ALIASES).is_some() {
            return;
        }
        let cfg = VenvConfig::from_env();
        assert!(cfg.venv_dir.ends_with(".inenv"));
    }

    #[test]
    fn test_observability_config_is_memoised() {
        let a = ObservabilityConfig::from_env() as *const ObservabilityConfig;
        let b = ObservabilityConfig::from_env() as *const ObservabilityConfig;
        assert_eq!(a, b);
    }
}
