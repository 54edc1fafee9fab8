use crate::error::{QuireError, Result};
use crate::plugin::directives::PluginConfig;
use crate::plugin::parser::ConfigParser;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Loader for plugin definition files (`<id>.txt`)
#[derive(Debug, Clone)]
pub struct PluginLoader {
    /// Custom plugin directory path
    custom_dir: Option<PathBuf>,
    /// Standard plugin directory path
    standard_dir: Option<PathBuf>,
    /// Plugin definition cache
    cache: HashMap<String, PluginConfig>,
}

impl PluginLoader {
    /// Create a loader without search directories
    pub fn new() -> Self {
        Self { custom_dir: None, standard_dir: None, cache: HashMap::new() }
    }

    pub fn builder() -> PluginLoaderBuilder {
        PluginLoaderBuilder::new()
    }

    /// Load the plugin definition for an id.
    ///
    /// The standard definition is read first and the custom one merged over
    /// it. Files that fail to parse are skipped with a warning.
    pub fn load(&mut self, id: &str) -> Result<PluginConfig> {
        if let Some(config) = self.cache.get(id) {
            return Ok(config.clone());
        }

        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(QuireError::PluginConfigError(format!("Invalid plugin id: {}", id)));
        }

        let mut merged_config = PluginConfig::new();
        let mut found_configs = false;

        for file_path in self.find_plugin_files(id).iter().rev() {
            match ConfigParser::parse_file(file_path) {
                Ok(config) => {
                    debug!(plugin = id, path = %file_path.display(), "plugin definition loaded");
                    merged_config.merge(&config);
                    found_configs = true;
                }
                Err(e) => warn!(path = %file_path.display(), error = %e, "failed to parse plugin definition"),
            }
        }

        if !found_configs {
            return Err(QuireError::PluginConfigError(format!("No plugin definition found for '{}'", id)));
        }

        self.cache.insert(id.to_string(), merged_config.clone());
        Ok(merged_config)
    }

    /// Load a plugin definition from an explicit file, bypassing the cache
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<PluginConfig> {
        ConfigParser::parse_file(path)
    }

    /// Ids of every definition visible to this loader
    pub fn available(&self) -> Vec<String> {
        let mut ids: Vec<String> = [&self.custom_dir, &self.standard_dir]
            .into_iter()
            .flatten()
            .filter_map(|dir| fs::read_dir(dir).ok())
            .flatten()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.strip_suffix(".txt").map(str::to_string)
            })
            .collect();

        ids.sort();
        ids.dedup();
        ids
    }

    /// Find the definition files for an id in priority order
    fn find_plugin_files(&self, id: &str) -> Vec<PathBuf> {
        let file_name = format!("{}.txt", id);
        let mut plugin_files = Vec::new();

        for dir in [&self.custom_dir, &self.standard_dir].into_iter().flatten() {
            let file_path = dir.join(&file_name);
            if file_path.exists() && !plugin_files.contains(&file_path) {
                plugin_files.push(file_path);
            }
        }

        plugin_files
    }

    /// Clear the definition cache
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

/// Builder for PluginLoader
#[derive(Debug)]
pub struct PluginLoaderBuilder {
    custom_dir: Option<PathBuf>,
    standard_dir: Option<PathBuf>,
}

impl PluginLoaderBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self { custom_dir: None, standard_dir: None }
    }

    /// Set custom plugin directory
    pub fn custom_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.custom_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set standard plugin directory
    pub fn standard_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.standard_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the PluginLoader
    pub fn build(self) -> PluginLoader {
        PluginLoader { custom_dir: self.custom_dir, standard_dir: self.standard_dir, cache: HashMap::new() }
    }
}

impl Default for PluginLoaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for PluginLoader {
    fn default() -> Self {
        let mut builder = PluginLoaderBuilder::new();

        if let Some(custom_dir) = Self::default_custom_dir() {
            builder = builder.custom_dir(custom_dir);
        }

        if let Some(standard_dir) = Self::default_standard_dir() {
            builder = builder.standard_dir(standard_dir);
        }

        builder.build()
    }
}

impl PluginLoader {
    /// Get default custom plugin directory (~/.config/quire/plugins)
    fn default_custom_dir() -> Option<PathBuf> {
        let plugin_dir = dirs::config_dir()?.join("quire").join("plugins");
        if let Err(e) = fs::create_dir_all(&plugin_dir) {
            debug!(path = %plugin_dir.display(), error = %e, "cannot create plugin directory");
        }
        Some(plugin_dir)
    }

    /// Get default standard plugin directory (relative to the working directory)
    fn default_standard_dir() -> Option<PathBuf> {
        let std_dir = PathBuf::from("plugins");
        if std_dir.exists() { Some(std_dir) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_plugin_loader_builder() {
        let temp_dir = TempDir::new().unwrap();
        let custom_path = temp_dir.path().join("custom");
        let standard_path = temp_dir.path().join("standard");

        let loader = PluginLoader::builder()
            .custom_dir(&custom_path)
            .standard_dir(&standard_path)
            .build();

        assert_eq!(loader.custom_dir, Some(custom_path));
        assert_eq!(loader.standard_dir, Some(standard_path));
    }

    #[test]
    fn test_load_plugin() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("example.txt"), "name: Example\nschema: ris\n").unwrap();

        let mut loader = PluginLoader::builder().standard_dir(temp_dir.path()).build();
        let config = loader.load("example").unwrap();

        assert_eq!(config.name.as_deref(), Some("Example"));
        assert_eq!(config.schema.as_deref(), Some("ris"));
    }

    #[test]
    fn test_missing_and_invalid_ids() {
        let temp_dir = TempDir::new().unwrap();
        let mut loader = PluginLoader::builder().standard_dir(temp_dir.path()).build();

        assert!(loader.load("absent").is_err());
        assert!(loader.load("../etc/passwd").is_err());
        assert!(loader.load("").is_err());
    }

    #[test]
    fn test_plugin_caching() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("example.txt");
        fs::write(&path, "name: First\n").unwrap();

        let mut loader = PluginLoader::builder().custom_dir(temp_dir.path()).build();
        assert_eq!(loader.load("example").unwrap().name.as_deref(), Some("First"));

        fs::write(&path, "name: Second\n").unwrap();
        assert_eq!(loader.load("example").unwrap().name.as_deref(), Some("First"));
        assert_eq!(loader.cache.len(), 1);

        loader.clear_cache();
        assert_eq!(loader.load("example").unwrap().name.as_deref(), Some("Second"));
    }

    #[test]
    fn test_custom_overrides_standard() {
        let temp_dir = TempDir::new().unwrap();

        let custom_path = temp_dir.path().join("custom");
        fs::create_dir_all(&custom_path).unwrap();
        fs::write(custom_path.join("example.txt"), "schema: highwire\n").unwrap();

        let standard_path = temp_dir.path().join("standard");
        fs::create_dir_all(&standard_path).unwrap();
        fs::write(
            standard_path.join("example.txt"),
            "name: Example\nschema: ris\nfull_text_from: full_text_pdf\n",
        )
        .unwrap();

        let mut loader = PluginLoader::builder()
            .custom_dir(&custom_path)
            .standard_dir(&standard_path)
            .build();

        let config = loader.load("example").unwrap();
        assert_eq!(config.name.as_deref(), Some("Example"));
        assert_eq!(config.schema.as_deref(), Some("highwire"));
        assert_eq!(config.full_text_from.len(), 1);
        assert_eq!(loader.available(), vec!["example".to_string()]);
    }

    #[test]
    fn test_broken_custom_file_is_skipped() {
        let temp_dir = TempDir::new().unwrap();

        let custom_path = temp_dir.path().join("custom");
        fs::create_dir_all(&custom_path).unwrap();
        fs::write(custom_path.join("example.txt"), "not a directive\n").unwrap();

        let standard_path = temp_dir.path().join("standard");
        fs::create_dir_all(&standard_path).unwrap();
        fs::write(standard_path.join("example.txt"), "name: Example\n").unwrap();

        let mut loader = PluginLoader::builder()
            .custom_dir(&custom_path)
            .standard_dir(&standard_path)
            .build();

        assert_eq!(loader.load("example").unwrap().name.as_deref(), Some("Example"));
    }
}
