use crate::error::{QuireError, Result};
use crate::plugin::directives::{PluginConfig, parse_directive};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Plugin definition file parser
#[derive(Debug)]
pub struct ConfigParser;

impl ConfigParser {
    /// Parse a single plugin definition file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<PluginConfig> {
        let file = std::fs::File::open(&path).map_err(|e| {
            QuireError::PluginConfigError(format!("Cannot open file {}: {}", path.as_ref().display(), e))
        })?;

        let reader = BufReader::new(file);
        Self::parse_reader(reader)
    }

    /// Parse a plugin definition from a reader
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<PluginConfig> {
        let mut config = PluginConfig::new();

        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line =
                line.map_err(|e| QuireError::PluginConfigError(format!("Read error at line {}: {}", line_number, e)))?;
            Self::parse_line(&mut config, &line, line_number)?;
        }

        Ok(config)
    }

    /// Parse a plugin definition from a string
    pub fn parse_string(content: &str) -> Result<PluginConfig> {
        let mut config = PluginConfig::new();

        for (index, line) in content.lines().enumerate() {
            Self::parse_line(&mut config, line, index + 1)?;
        }

        Ok(config)
    }

    fn parse_line(config: &mut PluginConfig, line: &str, line_number: usize) -> Result<()> {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        parse_directive(line)
            .and_then(|directive| config.add_directive(directive))
            .map_err(|e| QuireError::PluginConfigError(format!("Parse error at line {}: {}", line_number, e)))
    }
}
