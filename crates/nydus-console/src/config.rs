use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_DASHBOARD_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardConfig {
    /// Base URL of the dashboard (e.g., https://nydus.arvo.team)
    pub url: Option<String>,
}

impl ConsoleConfig {
    /// Load config from file and environment variables
    /// Environment variables take precedence over file config
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;

        if let Ok(url) = std::env::var("NYDUS_DASHBOARD_URL") {
            config.dashboard.url = Some(url);
        }

        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ConsoleConfig = toml::from_str(&content)?;
        Ok(config)
    }

    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".nydus/console.toml")
    }

    /// Dashboard URL without a trailing slash, with fallback to a local server
    pub fn dashboard_url(&self) -> String {
        self.dashboard
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_DASHBOARD_URL)
            .trim()
            .trim_end_matches('/')
            .to_string()
    }
}
