//! Archival unit configuration.
//!
//! An [`AuConfig`] is the read-only set of variables (`base_url`, `volume`,
//! `year`, `journal_id`, ...) that URL templates are expanded against. It is
//! consulted only while compiling templates.

use crate::error::{QuireError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Variable bindings of one archival unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuConfig {
    values: BTreeMap<String, String>,
}

impl AuConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Bind a variable, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Iterate over bindings in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Apply `name=value` pairs on top of this configuration
    pub fn extend_from_pairs<I, S>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pair in pairs {
            let pair = pair.as_ref();
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| QuireError::ConfigError(format!("Expected name=value, got '{}'", pair)))?;

            let name = name.trim();
            if name.is_empty() {
                return Err(QuireError::ConfigError(format!("Missing variable name in '{}'", pair)));
            }
            self.set(name, value.trim());
        }

        Ok(())
    }

    /// Parse a JSON object of variable bindings.
    ///
    /// Strings are taken as-is; numbers and booleans are rendered to text so
    /// `{"volume": 8}` and `{"volume": "8"}` are equivalent.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut config = Self::new();

        for (name, value) in map {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(QuireError::ConfigError(format!(
                        "AU variable '{}' must be a string or number, got {}",
                        name, other
                    )));
                }
            };
            config.set(name, value);
        }

        Ok(config)
    }

    /// Read a JSON AU configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            QuireError::ConfigError(format!("Cannot open AU config {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json_str(&content)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AuConfig {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut config = Self::new();
        for (k, v) in iter {
            config.set(k, v);
        }
        config
    }
}
