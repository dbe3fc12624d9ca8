//! Dispatcher configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file at
//! all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Main dispatcher configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DispatcherConfig {
    #[serde(default)]
    pub dispatcher: DispatcherSection,
    #[serde(default)]
    pub analysis: AnalysisSection,
}

/// Dispatcher section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatcherSection {
    /// Retained history entries per agent; older entries are evicted
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Default for DispatcherSection {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
        }
    }
}

fn default_history_capacity() -> usize {
    1000
}

/// Log analysis section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSection {
    /// Length of the keyword list reported by `analyze_patterns`
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,
    /// Maximum repeated messages reported by `analyze_patterns`
    #[serde(default = "default_top_repeated_messages")]
    pub top_repeated_messages: usize,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            top_keywords: default_top_keywords(),
            top_repeated_messages: default_top_repeated_messages(),
        }
    }
}

fn default_top_keywords() -> usize {
    10
}

fn default_top_repeated_messages() -> usize {
    5
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DispatcherConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DispatcherConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make an agent silently drop everything
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatcher.history_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "dispatcher.history_capacity must be greater than 0".to_string(),
            ));
        }
        if self.analysis.top_keywords == 0 {
            return Err(ConfigError::InvalidConfig(
                "analysis.top_keywords must be greater than 0".to_string(),
            ));
        }
        if self.analysis.top_repeated_messages == 0 {
            return Err(ConfigError::InvalidConfig(
                "analysis.top_repeated_messages must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a small configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[dispatcher]
history_capacity = 4

[analysis]
top_keywords = 3
top_repeated_messages = 2
"#;
        Self::from_toml_str(toml_content).expect("Test config should parse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let toml_content = r#"
[dispatcher]
history_capacity = 250

[analysis]
top_keywords = 20
top_repeated_messages = 8
"#;

        let config = DispatcherConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.dispatcher.history_capacity, 250);
        assert_eq!(config.analysis.top_keywords, 20);
        assert_eq!(config.analysis.top_repeated_messages, 8);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DispatcherConfig::from_toml_str("").unwrap();
        assert_eq!(config, DispatcherConfig::default());
        assert_eq!(config.dispatcher.history_capacity, 1000);
        assert_eq!(config.analysis.top_keywords, 10);
        assert_eq!(config.analysis.top_repeated_messages, 5);
    }

    #[test]
    fn test_partial_section_defaults() {
        let toml_content = r#"
[analysis]
top_keywords = 3
"#;

        let config = DispatcherConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.analysis.top_keywords, 3);
        assert_eq!(config.analysis.top_repeated_messages, 5);
        assert_eq!(config.dispatcher.history_capacity, 1000);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let toml_content = r#"
[dispatcher]
history_capacity = 0
"#;

        let result = DispatcherConfig::from_toml_str(toml_content);
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_analysis_limits_rejected() {
        let mut config = DispatcherConfig::default();
        config.analysis.top_repeated_messages = 0;
        assert!(config.validate().is_err());

        let mut config = DispatcherConfig::default();
        config.analysis.top_keywords = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_type() {
        let toml_content = r#"
[dispatcher]
history_capacity = "lots"
"#;

        let result = DispatcherConfig::from_toml_str(toml_content);
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_test_config_is_small() {
        let config = DispatcherConfig::test_config();
        assert_eq!(config.dispatcher.history_capacity, 4);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = DispatcherConfig::test_config();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed = DispatcherConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
