//! Flat `key=value` properties consumed by backend connectors.
//!
//! Format:
//! - one `key=value` pair per line, split at the first `=`
//! - lines starting with `#` are comments
//! - lines without `=` are ignored
//! - keys and values are trimmed; a later key overrides an earlier one

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::error::{BenchError, BenchResult};

/// Connection properties (`host`, `port`, `user`, `password`, `database`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: HashMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties from text.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            values.insert(key.trim().to_owned(), value.trim().to_owned());
        }
        Self { values }
    }

    /// Load properties from a file.
    pub fn from_file(path: impl AsRef<Path>) -> BenchResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| BenchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Set a property, returning `self` for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Property value or `default` when absent.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_owned()
    }

    /// Parse a property; absent or unparsable values yield `None`.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|value| value.parse().ok())
    }

    /// Parse a property, falling back to `default`.
    pub fn get_parsed_or<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get_parsed(key).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<HashMap<String, String>> for Properties {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_properties() {
        let props = Properties::parse(
            "# connection\nhost=db.local\nport = 5432\npassword=a=b\nnot a pair\n\nhost=override\n",
        );

        assert_eq!(props.len(), 3);
        assert_eq!(props.get("host"), Some("override"));
        assert_eq!(props.get("password"), Some("a=b"));
        assert_eq!(props.get_parsed::<u16>("port"), Some(5432));
        assert_eq!(props.get("not a pair"), None);
    }

    #[test]
    fn test_typed_accessors_fall_back() {
        let props = Properties::new().with("port", "not-a-number");

        assert_eq!(props.get_parsed::<u16>("port"), None);
        assert_eq!(props.get_parsed_or("port", 3306_u16), 3306);
        assert_eq!(props.get_parsed_or("timeout", 5_u64), 5);
        assert_eq!(props.get_or("host", "localhost"), "localhost");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.properties");
        std::fs::write(&path, "user=bench\r\ndatabase=tx\r\n").unwrap();

        let props = Properties::from_file(&path).unwrap();
        assert_eq!(props.get("user"), Some("bench"));
        assert_eq!(props.get("database"), Some("tx"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = Properties::from_file("/nonexistent/txbench.properties").unwrap_err();
        assert!(matches!(err, BenchError::Io { .. }));
    }
}
