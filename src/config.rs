// ABOUTME: Deployment client configuration loaded from an optional TOML file
// ABOUTME: Holds the backend URL, form encoding, acceptance rule and poll timing

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// How the trigger request body is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormEncoding {
    #[default]
    Multipart,
    Urlencoded,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    pub base_url: String,
    pub encoding: FormEncoding,
    /// Refuse to submit without a credential.
    pub require_credential: bool,
    /// Treat any 2xx acknowledgement carrying a `status_url` as accepted,
    /// not only 202.
    pub accept_any_success: bool,
    pub poll_interval_ms: u64,
    pub max_wait_ms: u64,
    pub snippet_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            encoding: FormEncoding::Multipart,
            require_credential: false,
            accept_any_success: false,
            poll_interval_ms: 2_000,
            max_wait_ms: 600_000,
            snippet_interval_ms: 3_000,
            request_timeout_secs: 30,
        }
    }
}

impl DeployConfig {
    /// Load from `path` when given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_toml(&raw)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => Self::default(),
        };
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: DeployConfig = toml::from_str(raw).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("base_url '{}' is not a valid URL", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("base_url must use http or https, got '{}'", url.scheme());
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        if self.max_wait_ms == 0 {
            bail!("max_wait_ms must be greater than zero");
        }
        if self.snippet_interval_ms == 0 {
            bail!("snippet_interval_ms must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn snippet_interval(&self) -> Duration {
        Duration::from_millis(self.snippet_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DeployConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert_eq!(config.max_wait(), Duration::from_secs(600));
        assert_eq!(config.encoding, FormEncoding::Multipart);
        assert!(!config.accept_any_success);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DeployConfig::from_toml(
            r#"
            base_url = "https://deploy.example.com"
            encoding = "urlencoded"
            require_credential = true
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://deploy.example.com");
        assert_eq!(config.encoding, FormEncoding::Urlencoded);
        assert!(config.require_credential);
        assert_eq!(config.poll_interval_ms, 2_000);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = DeployConfig::from_toml("poll_interval_ms = 0").unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        assert!(DeployConfig::from_toml(r#"base_url = "ftp://example.com""#).is_err());
        assert!(DeployConfig::from_toml(r#"base_url = "not a url""#).is_err());
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(DeployConfig::from_toml("poll_every = 5").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_wait_ms = 5000").unwrap();
        let config = DeployConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_wait(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = DeployConfig::load(Some(Path::new("/nonexistent/deploy.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
