use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::backend::kick::{KickCredentials, KickError, Result};
use crate::backend::webhook::WebhookConfig;

/// Channels and queries used by the startup showcase run
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ShowcaseConfig {
    pub channel: String,
    pub monitor_channel: String,
    pub search_query: String,
    pub live_limit: u32,
    /// Repeat the stream check on this interval; off when unset
    pub monitor_interval_secs: Option<u64>,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            channel: "mirtur".to_string(),
            monitor_channel: "xqc".to_string(),
            search_query: "gaming".to_string(),
            live_limit: 5,
            monitor_interval_secs: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub kick: KickCredentials,
    pub webhook: WebhookConfig,
    pub showcase: ShowcaseConfig,
}

impl AppConfig {
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            KickError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            KickError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Override file values with whatever `lookup` yields for the `KICK_*` variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("KICK_CLIENT_ID") {
            self.kick.client_id = v;
        }
        if let Some(v) = lookup("KICK_CLIENT_SECRET") {
            self.kick.client_secret = v;
        }
        if let Some(v) = lookup("KICK_APP_ACCESS_TOKEN_ENDPOINT") {
            self.kick.token_url = v;
        }
        if let Some(v) = lookup("KICK_PUBLIC_API_BASE_URL") {
            self.kick.api_base_url = v;
        }
        if let Some(v) = lookup("KICK_WEBHOOK_ENABLED") {
            self.webhook.enabled = parse_var("KICK_WEBHOOK_ENABLED", &v)?;
        }
        if let Some(v) = lookup("KICK_WEBHOOK_PORT") {
            self.webhook.port = parse_var("KICK_WEBHOOK_PORT", &v)?;
        }
        if let Some(v) = lookup("KICK_BROADCASTER_USER_ID") {
            self.webhook.broadcaster_user_id = parse_var("KICK_BROADCASTER_USER_ID", &v)?;
        }
        if let Some(v) = lookup("KICK_WEBHOOK_URL") {
            self.webhook.webhook_url = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.kick.client_id.is_empty() || self.kick.client_secret.is_empty() {
            return Err(KickError::ConfigError(
                "KICK_CLIENT_ID and KICK_CLIENT_SECRET must be set".to_string(),
            ));
        }
        if self.webhook.enabled && self.webhook.broadcaster_user_id == 0 {
            return Err(KickError::ConfigError(
                "KICK_BROADCASTER_USER_ID must be set when the webhook server is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| KickError::ConfigError(format!("Invalid {} '{}': {}", name, value, e)))
}

fn config_path() -> PathBuf {
    let root = project_root::get_project_root()
        .or_else(|_| std::env::current_dir())
        .unwrap_or_default();
    root.join("config.toml")
}

/// Load `config.toml` (if present), then `.env` and process environment overrides
pub fn load_config() -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config_path = config_path();
    let mut config = if config_path.exists() {
        AppConfig::from_file(&config_path)?
    } else {
        log::debug!(
            "No config file at {}, using defaults and environment",
            config_path.display()
        );
        AppConfig::default()
    };

    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.kick.token_url, "https://id.kick.com/oauth/token");
        assert_eq!(config.kick.api_base_url, "https://api.kick.com/public/v1");
        assert_eq!(config.webhook.port, 3000);
        assert_eq!(config.webhook.events.len(), 5);
        assert!(!config.webhook.enabled);
        assert!(config.showcase.monitor_interval_secs.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [kick]
            client_id = "abc"
            client_secret = "shh"

            [webhook]
            enabled = true
            port = 8080
            broadcaster_user_id = 62748268
            events = [{ name = "channel.followed" }]

            [showcase]
            monitor_interval_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.kick.client_id, "abc");
        assert_eq!(config.kick.token_url, "https://id.kick.com/oauth/token");
        assert_eq!(config.webhook.port, 8080);
        assert_eq!(config.webhook.events.len(), 1);
        assert_eq!(config.webhook.events[0].version, 1);
        assert_eq!(config.showcase.channel, "mirtur");
        assert_eq!(config.showcase.monitor_interval_secs, Some(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup(&[
                ("KICK_CLIENT_ID", "env-id"),
                ("KICK_CLIENT_SECRET", "env-secret"),
                ("KICK_PUBLIC_API_BASE_URL", "http://localhost:9000"),
                ("KICK_WEBHOOK_ENABLED", "true"),
                ("KICK_WEBHOOK_PORT", "4000"),
                ("KICK_BROADCASTER_USER_ID", "99"),
            ]))
            .unwrap();

        assert_eq!(config.kick.client_id, "env-id");
        assert_eq!(config.kick.api_base_url, "http://localhost:9000");
        assert!(config.webhook.enabled);
        assert_eq!(config.webhook.port, 4000);
        assert_eq!(config.webhook.broadcaster_user_id, 99);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(lookup(&[("KICK_WEBHOOK_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, KickError::ConfigError(_)));
    }

    #[test]
    fn test_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.kick.client_id = "id".to_string();
        config.kick.client_secret = "secret".to_string();
        config.webhook.enabled = true;
        assert!(config.validate().is_err());

        config.webhook.broadcaster_user_id = 1;
        assert!(config.validate().is_ok());
    }
}
