//! Configuration — the settings record the host persists, plus YAML loading
//! with env var overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str =
    "*{{wait_time}} have passed. Current time: {{time}}. Current date: {{date}}.*";

/// Template used at fire time when the configured one is empty.
pub const FALLBACK_TEMPLATE: &str = "*hasn't responded for {{wait_time}}*";

pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Arm follow-ups from incoming directives
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Drive the countdown display while armed
    #[serde(default = "default_true")]
    pub show_countdown: bool,

    /// Surface notices to the user (they are always logged)
    #[serde(default = "default_true", alias = "debugMode")]
    pub verbose_notifications: bool,

    /// Follow-up message pattern with `{{...}}` tokens
    #[serde(default = "default_template", alias = "customMessage")]
    pub message_template: String,

    /// strftime pattern for `{{time}}`
    #[serde(default = "default_time_format")]
    pub time_format: String,

    /// strftime pattern for `{{date}}`
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_true() -> bool {
    true
}
fn default_template() -> String {
    DEFAULT_TEMPLATE.into()
}
fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.into()
}
fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.into()
}

impl Config {
    /// Load config from a YAML file with env var overrides.
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        Self::from_yaml(&content)
    }

    /// Parse a YAML settings record. Missing fields take their defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content).context("Failed to parse followup config")?
        };

        if let Ok(v) = std::env::var("FOLLOWUP_ENABLED") {
            config.enabled = parse_flag(&v)
                .with_context(|| format!("FOLLOWUP_ENABLED must be a boolean, got '{}'", v))?;
        }
        if let Ok(template) = std::env::var("FOLLOWUP_TEMPLATE") {
            config.message_template = template;
        }

        Ok(config)
    }

    /// The template to render at fire time.
    pub fn effective_template(&self) -> &str {
        if self.message_template.is_empty() {
            FALLBACK_TEMPLATE
        } else {
            &self.message_template
        }
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            show_countdown: true,
            verbose_notifications: true,
            message_template: default_template(),
            time_format: default_time_format(),
            date_format: default_date_format(),
        }
    }
}
