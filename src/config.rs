//! Application configuration.
//!
//! Loads settings from config.json at startup. Provides the API credential,
//! model selection, scoring parameters and report naming.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::scoring::DEFAULT_TOP_N;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Gemini API key; can also be entered in the GUI or passed with --api-key
    pub api_key: Option<String>,
    /// Model used to read the sheets
    pub model: String,
    /// Base URL of the generative language REST API
    pub api_base_url: String,
    /// Number of highest scores averaged per student
    pub top_n: usize,
    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,
    /// Images with a longer side than this are downscaled before upload (pixels)
    pub max_image_dimension: u32,
    /// Worksheet name in the exported workbook
    pub sheet_name: String,
    /// File name of the exported workbook
    pub output_file_name: String,
    /// Directory the workbook is written to; defaults to the download folder
    pub output_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            top_n: DEFAULT_TOP_N,
            request_timeout_secs: 120,
            max_image_dimension: 2048,
            sheet_name: "成績結算".to_string(),
            output_file_name: "學生成績結算表.xlsx".to_string(),
            output_dir: None,
        }
    }
}

impl AppConfig {
    /// Returns the configured API key if it is non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Returns the full path the workbook is written to.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(crate::paths::get_default_output_dir)
            .join(&self.output_file_name)
    }
}

/// Reads configuration from `path`, falling back to defaults when the file
/// is missing or unreadable.
pub fn load_config_from(path: &Path) -> AppConfig {
    crate::log(&format!("Looking for config at: {}", path.display()));

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    AppConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config_from(&crate::paths::get_config_path()));
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static AppConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json"));
        assert_eq!(config.top_n, 12);
        assert_eq!(config.sheet_name, "成績結算");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "top_n": 8, "api_key": "abc" }"#).unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.top_n, 8);
        assert_eq!(config.api_key(), Some("abc"));
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.max_image_dimension, 2048);
    }

    #[test]
    fn test_invalid_json_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.top_n, 12);
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let config = AppConfig {
            api_key: Some("   ".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_output_path_uses_configured_dir() {
        let config = AppConfig {
            output_dir: Some(PathBuf::from("/tmp/reports")),
            output_file_name: "grades.xlsx".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.output_path(), PathBuf::from("/tmp/reports/grades.xlsx"));
    }
}
