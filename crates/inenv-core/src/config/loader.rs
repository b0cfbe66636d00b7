//! Environment variable loading.
//!
//! Keeps the fallback chains in one place so callers don't repeat `or_else`.

use std::env;
use std::path::Path;

/// Load `.env` from the current directory into the process environment.
/// Variables that are already set are left untouched. Runs once per process.
pub fn load_dotenv() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let dir = env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
        load_dotenv_from_dir(&dir);
    });
}

/// Load `<dir>/.env` without overriding existing variables.
pub fn load_dotenv_from_dir(dir: &Path) {
    let Ok(content) = std::fs::read_to_string(dir.join(".env")) else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        if env::var(&key).is_err() {
            env::set_var(key, value);
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some(eq_pos) = line.find('=') else {
            continue;
        };
        let key = line[..eq_pos].trim();
        let mut value = line[eq_pos + 1..].trim();
        // Strip inline comment (# not inside quotes)
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}

/// Read `primary`, then each alias in order; fall back to `default`.
/// Empty values count as unset.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env_optional(primary, aliases).unwrap_or_else(default)
}

/// Read `primary`, then each alias in order. Empty (after trim) is `None`.
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    std::iter::once(primary)
        .chain(aliases.iter().copied())
        .filter_map(|k| env::var(k).ok())
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// Parse a boolean variable: 0/false/no/off are false, anything else set is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    match env_optional(primary, aliases) {
        Some(s) => !matches!(s.to_lowercase().as_str(), "0" | "false" | "no" | "off"),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotenv_quotes_and_comments() {
        let pairs = parse_dotenv(
            "# comment\nINENV_A=1\nexport INENV_B=\"two words\"\nINENV_C=3 # trailing\n\nbogus\n",
        );
        assert_eq!(
            pairs,
            vec![
                ("INENV_A".to_string(), "1".to_string()),
                ("INENV_B".to_string(), "two words".to_string()),
                ("INENV_C".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_env_optional_alias_chain() {
        env::set_var("INENV_TEST_ALIAS_SECONDARY", "from-alias");
        env::set_var("INENV_TEST_ALIAS_PRIMARY", "  ");
        let v = env_optional("INENV_TEST_ALIAS_PRIMARY", &["INENV_TEST_ALIAS_SECONDARY"]);
        assert_eq!(v.as_deref(), Some("from-alias"));
        assert_eq!(env_optional("INENV_TEST_ALIAS_MISSING", &[]), None);
    }

    #[test]
    fn test_env_or_default() {
        let v = env_or("INENV_TEST_OR_MISSING", &[], || "fallback".to_string());
        assert_eq!(v, "fallback");
    }

    #[test]
    fn test_env_bool() {
        env::set_var("INENV_TEST_BOOL_OFF", "off");
        env::set_var("INENV_TEST_BOOL_ON", "yes");
        assert!(!env_bool("INENV_TEST_BOOL_OFF", &[], true));
        assert!(env_bool("INENV_TEST_BOOL_ON", &[], false));
        assert!(env_bool("INENV_TEST_BOOL_MISSING", &[], true));
    }

    #[test]
    fn test_load_dotenv_does_not_override() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(".env"),
            "INENV_TEST_DOTENV_NEW=new\nINENV_TEST_DOTENV_SET=from-file\n",
        )
        .unwrap();
        env::set_var("INENV_TEST_DOTENV_SET", "from-env");
        load_dotenv_from_dir(tmp.path());
        assert_eq!(env::var("INENV_TEST_DOTENV_NEW").unwrap(), "new");
        assert_eq!(env::var("INENV_TEST_DOTENV_SET").unwrap(), "from-env");
    }
}
