//! Key-value cache stored as JSON inside the environment directory.
//!
//! Values are a closed, serde-untagged union so arbitrary nesting of strings,
//! numbers, booleans, lists and maps round-trips through the file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, VenvError};

/// Cache mapping: string keys to arbitrary nested values.
pub type CacheData = BTreeMap<String, CacheValue>;

/// Key holding the environment fingerprint, written by `create()`.
pub const VENV_HASH_KEY: &str = "venv_hash";
/// Key holding the RFC 3339 creation timestamp, written by `create()`.
pub const CREATED_AT_KEY: &str = "created_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<CacheValue>),
    Map(CacheData),
}

impl CacheValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CacheValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for CacheValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for CacheValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for CacheValue {
    fn from(n: i32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<f64> for CacheValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl<T: Into<CacheValue>> From<Vec<T>> for CacheValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<CacheData> for CacheValue {
    fn from(map: CacheData) -> Self {
        Self::Map(map)
    }
}

/// Read the cache at `path`. A missing file is an empty mapping.
pub(crate) fn read(path: &Path) -> Result<CacheData> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CacheData::new()),
        Err(e) => return Err(VenvError::io(format!("read {}", path.display()), e)),
    };
    serde_json::from_str(&content).map_err(|source| VenvError::CorruptCache {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrite the cache at `path` with `data`.
pub(crate) fn write(path: &Path, data: &CacheData) -> Result<()> {
    let content = serde_json::to_string_pretty(data).map_err(|source| VenvError::CorruptCache {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(|e| VenvError::io(format!("write {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> CacheData {
        let mut inner = CacheData::new();
        inner.insert("data".into(), "types".into());
        let mut data = CacheData::new();
        data.insert("foo".into(), "bar".into());
        data.insert(
            "some".into(),
            CacheValue::List(vec!["crazy".into(), CacheValue::Integer(1), inner.into()]),
        );
        data
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let data = read(&tmp.path().join("nope.json")).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_nested_values_survive_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cache.json");
        write(&path, &nested()).unwrap();
        assert_eq!(read(&path).unwrap(), nested());
    }

    #[test]
    fn test_untagged_number_kinds() {
        let parsed: CacheData =
            serde_json::from_str(r#"{"i": 3, "f": 2.5, "b": true, "n": null}"#).unwrap();
        assert_eq!(parsed["i"], CacheValue::Integer(3));
        assert_eq!(parsed["f"], CacheValue::Float(2.5));
        assert_eq!(parsed["b"], CacheValue::Bool(true));
        assert_eq!(parsed["n"], CacheValue::Null);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read(&path).unwrap_err();
        assert!(matches!(err, VenvError::CorruptCache { .. }));
    }
}
