use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::auth::Credentials;
use crate::store::github::GitHubTarget;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port the HTTP server listens on
    pub port: u16,
    /// Secret exchanged for bearer credentials
    pub admin_password: Option<String>,
    /// Reject credentials older than this; unset means they never expire
    pub token_ttl_minutes: Option<i64>,
    /// Repository holding the document
    pub github: GitHubConfig,
    /// File the configuration was read from, if any
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

/// Location of the document in GitHub
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Access token with contents write permission
    pub token: Option<String>,
    /// Repository in `owner/name` form
    pub repo: Option<String>,
    pub branch: String,
    /// Path of the JSON document inside the repository
    pub path: String,
    pub api_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            admin_password: None,
            token_ttl_minutes: None,
            github: GitHubConfig::default(),
            config_file: None,
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            repo: None,
            branch: "main".to_string(),
            path: "restaurants.json".to_string(),
            api_url: "https://api.github.com".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_from(config_path, |key| std::env::var(key).ok())
    }

    /// Like [`load`](Self::load), reading variables through `env`.
    pub fn load_from(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| env("PICKER_CONFIG").map(PathBuf::from))
            .unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
            config.config_file = Some(path);
        }

        override_with(&env, "PICKER_PORT", &mut config.port)?;
        if let Some(value) = env("PICKER_TOKEN_TTL_MINUTES") {
            config.token_ttl_minutes = Some(parse_var("PICKER_TOKEN_TTL_MINUTES", &value)?);
        }
        if let Some(password) = env("ADMIN_PASSWORD") {
            config.admin_password = Some(password);
        }
        if let Some(token) = env("GITHUB_TOKEN") {
            config.github.token = Some(token);
        }
        if let Some(repo) = env("GITHUB_REPO") {
            config.github.repo = Some(repo);
        }
        override_with(&env, "GITHUB_BRANCH", &mut config.github.branch)?;
        override_with(&env, "GITHUB_PATH", &mut config.github.path)?;
        override_with(&env, "GITHUB_API_URL", &mut config.github.api_url)?;

        Ok(config)
    }

    /// Default config file path: <config dir>/restaurant-picker/config.yaml
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("restaurant-picker")
            .join("config.yaml")
    }

    /// Credential checker for the configured admin secret.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let secret = self
            .admin_password
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("admin_password (ADMIN_PASSWORD)"))?;

        let credentials = Credentials::new(secret);
        match self.token_ttl_minutes {
            Some(minutes) if minutes > 0 => {
                let ttl = chrono::Duration::try_minutes(minutes).ok_or_else(|| {
                    ConfigError::InvalidValue {
                        key: "token_ttl_minutes",
                        value: minutes.to_string(),
                    }
                })?;
                Ok(credentials.with_ttl(ttl))
            }
            _ => Ok(credentials),
        }
    }

    /// Resolved GitHub location, checking that every required piece is set.
    pub fn github_target(&self) -> Result<GitHubTarget, ConfigError> {
        let github = &self.github;

        let repo = github
            .repo
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("github.repo (GITHUB_REPO)"))?;
        let well_formed = matches!(
            repo.split_once('/'),
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/')
        );
        if !well_formed {
            return Err(ConfigError::InvalidValue {
                key: "github.repo",
                value: repo.to_string(),
            });
        }

        let token = github
            .token
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("github.token (GITHUB_TOKEN)"))?;

        if github.branch.is_empty() {
            return Err(ConfigError::Missing("github.branch (GITHUB_BRANCH)"));
        }
        if github.path.trim_matches('/').is_empty() {
            return Err(ConfigError::Missing("github.path (GITHUB_PATH)"));
        }
        if github.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "github.request_timeout_secs",
                value: "0".to_string(),
            });
        }

        Ok(GitHubTarget {
            api_url: github.api_url.clone(),
            repo: repo.to_string(),
            branch: github.branch.clone(),
            path: github.path.clone(),
            token: token.to_string(),
            timeout: Duration::from_secs(github.request_timeout_secs),
        })
    }
}

fn override_with<T: FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = env(key) {
        *target = parse_var(key, &value)?;
    }
    Ok(())
}

fn parse_var<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    ReadError(PathBuf, std::io::Error),
    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, serde_yaml::Error),
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}
