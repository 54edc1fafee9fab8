use serde::Serialize;

/// Ordered multimap of raw key to values, as extracted from one source file.
///
/// Keys are case-insensitive and stored lowercase. Insertion order of keys
/// and of values under one key is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawMetadata {
    source_url: Option<String>,
    entries: Vec<(String, Vec<String>)>,
}

impl RawMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty record remembering which file it came from
    pub fn from_source(url: impl Into<String>) -> Self {
        Self { source_url: Some(url.into()), entries: Vec::new() }
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn set_source_url(&mut self, url: impl Into<String>) {
        self.source_url = Some(url.into());
    }

    /// Append a value; blank values are dropped
    pub fn put(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }

        let key = key.to_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// First value under the key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// All values under the key, in insertion order
    pub fn get_all(&self, key: &str) -> &[String] {
        let key = key.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        !self.get_all(key).is_empty()
    }

    /// Replace every value under the key
    pub fn replace(&mut self, key: &str, values: Vec<String>) {
        let key = key.to_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((key, values)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
