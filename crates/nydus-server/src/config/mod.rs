use config::{Config, ConfigError, Environment, File};
use gotcha::ConfigWrapper;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Restart relay tuning
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RelaySettings {
    /// Seconds the relay waits for the Bot API (connect or next chunk) before
    /// giving up. 0 disables the timeout.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl RelaySettings {
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_bot_api_url() -> String {
    "http://127.0.0.1:4000/api".to_string()
}

fn default_vps_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_zone_domain() -> String {
    "arvo.team".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Base URL of the Bot API, including the `/api` prefix
    #[serde(default = "default_bot_api_url")]
    pub bot_api_url: String,
    /// Address new subdomain A records point at
    #[serde(default = "default_vps_ip")]
    pub vps_ip: String,
    /// Cloudflare zone subdomains are created under
    #[serde(default = "default_zone_domain")]
    pub zone_domain: String,
    /// Fallback GitHub token when the `nydus_pat` cookie is not set
    #[serde(default)]
    pub github_pat: Option<String>,
    #[serde(default)]
    pub relay: RelaySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_api_url: default_bot_api_url(),
            vps_ip: default_vps_ip(),
            zone_domain: default_zone_domain(),
            github_pat: None,
            relay: RelaySettings::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<ConfigWrapper<Self>, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with defaults
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (not tracked by git)
            .add_source(File::with_name("config/local").required(false))
            // e.g. NYDUS_APPLICATION__BOT_API_URL, NYDUS_BASIC__PORT
            .add_source(
                Environment::with_prefix("NYDUS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize()
    }
}
