use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::annotation::Color;

/// Reporter configuration, loaded once at startup. Field names and defaults
/// follow the widget's embed configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub api_endpoint: String,
    pub api_key: String,
    pub api_secret: String,
    pub modal_title: String,
    pub description_label: String,
    pub description_placeholder: String,
    pub submit_text: String,
    pub cancel_text: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            modal_title: "Report a Bug".to_string(),
            description_label: "Describe the issue".to_string(),
            description_placeholder: "Please describe what went wrong...".to_string(),
            submit_text: "Submit Report".to_string(),
            cancel_text: "Cancel".to_string(),
        }
    }
}

impl WidgetConfig {
    fn file_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("com", "bugmark", "bugmark")?;
        Some(dirs.config_dir().join("config.json"))
    }

    fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Missing or malformed file falls back to defaults; an unreachable
    /// endpoint is only warned about, the annotation side keeps working.
    pub fn load() -> Self {
        let config: Self = Self::file_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .map(|raw| Self::parse(&raw))
            .unwrap_or_default();

        if config.api_endpoint.is_empty() {
            log::warn!("no API endpoint configured, submit will be rejected");
        }

        config
    }
}

/// Last-used editing preferences, persisted across runs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub last_color: Color,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_color: Color::Red,
        }
    }
}

impl Settings {
    fn file_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("com", "bugmark", "bugmark")?;
        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir).ok()?;
        Some(config_dir.join("settings.json"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Settings, WidgetConfig};
    use crate::annotation::Color;

    #[test]
    fn config_defaults_match_the_widget() {
        let config = WidgetConfig::default();
        assert_eq!(config.modal_title, "Report a Bug");
        assert_eq!(config.submit_text, "Submit Report");
        assert!(config.api_endpoint.is_empty());
    }

    #[test]
    fn partial_config_files_keep_defaults_for_the_rest() {
        let parsed: WidgetConfig =
            serde_json::from_str("{\"api_endpoint\":\"https://bugs.example/api\"}")
                .expect("config");
        assert_eq!(parsed.api_endpoint, "https://bugs.example/api");
        assert_eq!(parsed.cancel_text, "Cancel");
    }

    #[test]
    fn malformed_config_file_falls_back_to_defaults() {
        let config = WidgetConfig::parse("{not json");
        assert_eq!(config.modal_title, "Report a Bug");
        assert!(config.api_endpoint.is_empty());
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = Settings {
            last_color: Color::Green,
        };
        let raw = serde_json::to_string(&settings).expect("serialize");
        let parsed: Settings = serde_json::from_str(&raw).expect("parse");
        assert_eq!(parsed.last_color, Color::Green);
    }
}
