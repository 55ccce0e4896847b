//! Pipeline configuration

use crate::error::Result;
use crate::render::{PlaceholderStyle, QuotePolicy, RenderOptions};
use crate::validate::ValidationMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings shared by the passes and the renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Placeholder rendering style
    pub placeholder_style: PlaceholderStyle,
    /// Identifier quoting
    pub quote_policy: QuotePolicy,
    pub quote_char: char,
    /// Newline before each clause in rendered SQL
    pub pretty_sql: bool,
    pub validation: ValidationMode,
    /// Identify rows by primary key only in DML synthesis
    pub require_pk: bool,
    /// Catalog file loaded at startup
    pub catalog_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placeholder_style: PlaceholderStyle::Spec,
            quote_policy: QuotePolicy::AsIs,
            quote_char: '"',
            pretty_sql: false,
            validation: ValidationMode::FailFast,
            require_pk: false,
            catalog_path: None,
        }
    }
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file; missing keys keep their defaults
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Set the placeholder style
    pub fn placeholder_style(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder_style = style;
        self
    }

    /// Set the quoting policy and quote character
    pub fn quoting(mut self, policy: QuotePolicy, quote_char: char) -> Self {
        self.quote_policy = policy;
        self.quote_char = quote_char;
        self
    }

    pub fn pretty_sql(mut self, pretty: bool) -> Self {
        self.pretty_sql = pretty;
        self
    }

    pub fn validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }

    pub fn require_pk(mut self, require_pk: bool) -> Self {
        self.require_pk = require_pk;
        self
    }

    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    /// Renderer options derived from this config
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::default()
            .placeholder_style(self.placeholder_style)
            .quote_policy(self.quote_policy)
            .quote_char(self.quote_char)
            .pretty(self.pretty_sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.placeholder_style, PlaceholderStyle::Spec);
        assert_eq!(config.quote_char, '"');
        assert!(!config.require_pk);
        assert_eq!(config.render_options(), RenderOptions::default());
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .placeholder_style(PlaceholderStyle::Dollar)
            .quoting(QuotePolicy::Always, '`')
            .pretty_sql(true)
            .require_pk(true);
        let options = config.render_options();
        assert_eq!(options.placeholder_style, PlaceholderStyle::Dollar);
        assert_eq!(options.quote_policy, QuotePolicy::Always);
        assert_eq!(options.quote_char, '`');
        assert!(options.pretty);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("arcsql.json");
        fs::write(&path, r#"{"placeholder_style":"colon","require_pk":true}"#).unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.placeholder_style, PlaceholderStyle::Colon);
        assert!(config.require_pk);
        assert_eq!(config.validation, ValidationMode::FailFast);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config::new()
            .validation(ValidationMode::CollectAll)
            .catalog_path("catalog.json");
        config.save_to_file(&path).unwrap();
        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }
}
