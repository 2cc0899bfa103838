use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Defaults applied by a [`crate::parser::Parser`] when the caller passes no
/// explicit version or URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Dialect for documents, task lists and bound declarations without a
    /// `version` statement
    pub default_document_version: String,
    /// Dialect for standalone expressions
    pub default_expression_version: String,
    /// URI reported in diagnostics when the caller passes an empty one
    pub buffer_uri: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_document_version: "draft-2".to_string(),
            default_expression_version: "1.0".to_string(),
            buffer_uri: "(buffer)".to_string(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<ParserConfig, String> {
    match fs::read_to_string(path) {
        Ok(contents) => toml::from_str::<ParserConfig>(&contents)
            .map_err(|e| format!("Failed to parse {} as TOML: {}", path.display(), e)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(ParserConfig::default()),
        Err(err) if err.kind() == io::ErrorKind::IsADirectory => Err(format!(
            "Expected {} to be a TOML file, but found a directory",
            path.display()
        )),
        Err(err) => Err(format!("Failed to read {}: {}", path.display(), err)),
    }
}

pub fn save_config(path: &Path, config: &ParserConfig) -> Result<(), String> {
    let serialized = toml::to_string(config)
        .map_err(|e| format!("Failed to serialize config to TOML: {}", e))?;
    fs::write(path, serialized)
        .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))
}
