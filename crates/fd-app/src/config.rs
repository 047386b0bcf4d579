//! Application configuration
//!
//! Settings come from an optional JSON file. `FINDASH_API_URL` and
//! `FINDASH_API_TOKEN` override the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use fd_charts::ChartConfig;
use fd_data::sources::csv_source::CsvOptions;
use fd_data::FilterLogic;

pub const API_URL_VAR: &str = "FINDASH_API_URL";
pub const API_TOKEN_VAR: &str = "FINDASH_API_TOKEN";

const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Settings shared by all commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the backend data API
    pub api_base_url: String,

    /// Bearer token for the backend
    pub api_token: Option<String>,

    /// Chart used when a command gives no chart options
    pub default_chart: ChartConfig,

    /// How filter clauses combine unless a command overrides it
    pub logic: FilterLogic,

    /// Options for reading local CSV files
    pub csv: CsvOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            default_chart: ChartConfig::default(),
            logic: FilterLogic::And,
            csv: CsvOptions::default(),
        }
    }
}

impl AppConfig {
    /// Load settings from `path` (if given) and the environment
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Read a JSON config file; unknown fields are ignored, missing ones defaulted
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the settings as pretty JSON
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("failed to write config {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides, looking variables up with `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_VAR).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("{} overrides api_base_url", API_URL_VAR);
            self.api_base_url = url;
        }
        if let Some(token) = lookup(API_TOKEN_VAR).filter(|v| !v.trim().is_empty()) {
            self.api_token = Some(token);
        }
    }
}

/// Default config location: `findash.json` in the working directory
pub fn default_path() -> PathBuf {
    PathBuf::from("findash.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_charts::ChartType;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("findash.json");
        std::fs::write(&path, r#"{"logic": "OR", "default_chart": {"chart_type": "bar", "x_key": "year", "y_keys": ["revenue"]}}"#).unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.logic, FilterLogic::Or);
        assert_eq!(config.default_chart.chart_type, ChartType::Bar);
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut config = AppConfig {
            api_base_url: "https://file.example.com".to_string(),
            ..Default::default()
        };
        config.apply_overrides(|name| match name {
            API_URL_VAR => Some("https://env.example.com/api".to_string()),
            API_TOKEN_VAR => Some("secret".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://env.example.com/api");
        assert_eq!(config.api_token.as_deref(), Some("secret"));

        config.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.api_base_url, "https://env.example.com/api");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let config = AppConfig {
            api_token: Some("t".to_string()),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(AppConfig::from_file(Path::new("/nonexistent/findash.json")).is_err());
    }
}
