// src/config.rs
//! Process configuration, read once at startup and handed to each component.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_UPLOADS_DIR: &str = "uploads";
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60 * 60;
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_VEO3_BASE_URL: &str = "https://api.kie.ai/api/v1";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;
pub const DEFAULT_VEO3_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Required environment variable {0} is missing")]
    Missing(&'static str),
    #[error("Environment variable {name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Polling policy for the video job orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoJobConfig {
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for VideoJobConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub google_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub veo3_api_key: String,
    pub veo3_base_url: String,
    pub veo3_request_timeout: Duration,
    pub uploads_dir: PathBuf,
    pub cleanup_interval: Duration,
    pub video_job: VideoJobConfig,
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let google_api_key = required("GOOGLE_API_KEY")?;
        let veo3_api_key = required("VEO3_API_KEY")?;
        let port = parse_number("PORT", required("PORT")?)?;

        let cleanup_secs = match get("CLEANUP_INTERVAL_SECS") {
            Some(raw) => parse_number("CLEANUP_INTERVAL_SECS", raw)?,
            None => DEFAULT_CLEANUP_INTERVAL_SECS,
        };
        let poll_secs = match get("VEO3_POLL_INTERVAL_SECS") {
            Some(raw) => parse_number("VEO3_POLL_INTERVAL_SECS", raw)?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };
        let max_poll_attempts: u32 = match get("VEO3_MAX_POLL_ATTEMPTS") {
            Some(raw) => parse_number("VEO3_MAX_POLL_ATTEMPTS", raw)?,
            None => DEFAULT_MAX_POLL_ATTEMPTS,
        };
        let veo3_timeout_secs = match get("VEO3_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_number("VEO3_REQUEST_TIMEOUT_SECS", raw)?,
            None => DEFAULT_VEO3_REQUEST_TIMEOUT_SECS,
        };
        if max_poll_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "VEO3_MAX_POLL_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            port,
            google_api_key,
            gemini_base_url: get("GEMINI_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            veo3_api_key,
            veo3_base_url: get("VEO3_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_VEO3_BASE_URL.to_string()),
            veo3_request_timeout: Duration::from_secs(veo3_timeout_secs),
            uploads_dir: PathBuf::from(
                get("UPLOADS_DIR").unwrap_or_else(|| DEFAULT_UPLOADS_DIR.to_string()),
            ),
            cleanup_interval: Duration::from_secs(cleanup_secs),
            video_job: VideoJobConfig {
                poll_interval: Duration::from_secs(poll_secs),
                max_poll_attempts,
            },
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_required_keys_with_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("VEO3_API_KEY", "v-key"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.google_api_key, "g-key");
        assert_eq!(config.veo3_api_key, "v-key");
        assert_eq!(config.uploads_dir, PathBuf::from("uploads"));
        assert_eq!(config.cleanup_interval, Duration::from_secs(3600));
        assert_eq!(config.video_job, VideoJobConfig::default());
        assert_eq!(config.video_job.poll_interval, Duration::from_secs(30));
        assert_eq!(config.video_job.max_poll_attempts, 60);
        assert_eq!(config.veo3_base_url, DEFAULT_VEO3_BASE_URL);
        assert_eq!(config.veo3_request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_missing_google_key_is_fatal() {
        let result = AppConfig::from_lookup(lookup(&[("VEO3_API_KEY", "v"), ("PORT", "1")]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let result = AppConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("VEO3_API_KEY", "   "),
            ("PORT", "1"),
        ]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("VEO3_API_KEY"));
    }

    #[test]
    fn test_invalid_port() {
        let result = AppConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("VEO3_API_KEY", "v"),
            ("PORT", "not-a-port"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: "PORT", .. })));
    }

    #[test]
    fn test_polling_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("VEO3_API_KEY", "v"),
            ("PORT", "3000"),
            ("VEO3_POLL_INTERVAL_SECS", "5"),
            ("VEO3_MAX_POLL_ATTEMPTS", "12"),
            ("UPLOADS_DIR", "/tmp/artifacts"),
        ]))
        .unwrap();

        assert_eq!(config.video_job.poll_interval, Duration::from_secs(5));
        assert_eq!(config.video_job.max_poll_attempts, 12);
        assert_eq!(config.uploads_dir, PathBuf::from("/tmp/artifacts"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = AppConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("VEO3_API_KEY", "v"),
            ("PORT", "3000"),
            ("VEO3_MAX_POLL_ATTEMPTS", "0"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "VEO3_MAX_POLL_ATTEMPTS", .. })
        ));
    }
}
