//! Configuration loading and management
//!
//! Settings are read from an optional `repulse.toml` in the working directory.
//! Credentials never live in that file: they come from `GH_TOKEN`, `OWNER` and
//! `REPO`, optionally seeded from a `.env` dotfile.
//!
//! All paths are relative to the working directory:
//! - Database: `data/github_traffic.db`
//! - Logs: `data/logs/repulse.log`

use crate::error::{Error, Result};
use crate::traffic::ResourceKind;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment keys holding the credentials, in the order they are checked
pub const CREDENTIAL_KEYS: [&str; 3] = ["GH_TOKEN", "OWNER", "REPO"];

/// API token plus the repository to track
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub owner: String,
    pub repo: String,
}

impl Credentials {
    /// Resolve credentials from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve credentials through an arbitrary key lookup.
    ///
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = Vec::with_capacity(CREDENTIAL_KEYS.len());

        for key in CREDENTIAL_KEYS {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => values.push(value),
                _ => {
                    return Err(Error::Config(format!(
                        "{key} is not set. Set {key} in .env or as an environment variable."
                    )))
                }
            }
        }

        let mut values = values.into_iter();
        Ok(Self {
            token: values.next().unwrap_or_default(),
            owner: values.next().unwrap_or_default(),
            repo: values.next().unwrap_or_default(),
        })
    }

    /// `owner/repo` for display
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish()
    }
}

/// Load a dotfile into the process environment.
///
/// Variables already present in the environment are left alone. Returns
/// `false` when the file does not exist or cannot be parsed.
pub fn load_dotenv(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Loaded dotfile");
            true
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "No dotfile loaded");
            false
        }
    }
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// GitHub API settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Local database location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Post-collection report command
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub API settings
#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    /// API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on release pages before giving up
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Resources to collect
    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceKind>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            max_pages: default_max_pages(),
            resources: default_resources(),
        }
    }
}

impl GitHubConfig {
    /// Configured resources in collection order, without duplicates
    pub fn ordered_resources(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| self.resources.contains(kind))
            .collect()
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_pages() -> u32 {
    1000
}

fn default_resources() -> Vec<ResourceKind> {
    ResourceKind::ALL.to_vec()
}

/// Database location
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the database and logs
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Database file name without extension
    #[serde(default = "default_database_name")]
    pub database_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_name: default_database_name(),
        }
    }
}

impl StorageConfig {
    /// `<data_dir>/<database_name>.db`
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.database_name))
    }

    /// `<data_dir>/logs`
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_database_name() -> String {
    "github_traffic".to_string()
}

/// External report generation, run after data is stored
#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_report_enabled")]
    pub enabled: bool,

    /// Program to spawn
    #[serde(default = "default_report_program")]
    pub program: String,

    /// Arguments passed to the program
    #[serde(default = "default_report_args")]
    pub args: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: default_report_enabled(),
            program: default_report_program(),
            args: default_report_args(),
        }
    }
}

fn default_report_enabled() -> bool {
    true
}

fn default_report_program() -> String {
    "python3".to_string()
}

fn default_report_args() -> Vec<String> {
    vec!["analytics/generate_graphs.py".to_string()]
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path, or defaults when it is absent
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    pub fn config_path() -> PathBuf {
        PathBuf::from("repulse.toml")
    }

    /// Reject settings the fetcher cannot work with
    pub fn validate(&self) -> Result<()> {
        let github = &self.github;

        if github.timeout_secs == 0 {
            return Err(Error::Config(
                "github.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if github.max_pages == 0 {
            return Err(Error::Config(
                "github.max_pages must be greater than 0".to_string(),
            ));
        }
        if github.resources.is_empty() {
            return Err(Error::Config(
                "github.resources must name at least one resource".to_string(),
            ));
        }
        if self.report.enabled && self.report.program.trim().is_empty() {
            return Err(Error::Config(
                "report.program is required when report is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.timeout_secs, 10);
        assert_eq!(config.github.resources, ResourceKind::ALL.to_vec());
        assert_eq!(
            config.storage.database_path(),
            PathBuf::from("data/github_traffic.db")
        );
        assert!(config.report.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[github]
api_url = "https://ghe.example.com/api/v3"
timeout_secs = 5
resources = ["stars", "clones"]

[storage]
data_dir = "/var/lib/repulse"
database_name = "traffic"

[report]
enabled = false

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.github.timeout_secs, 5);
        assert_eq!(config.github.max_pages, 1000);
        assert_eq!(
            config.github.ordered_resources(),
            vec![ResourceKind::Clones, ResourceKind::Stars]
        );
        assert_eq!(
            config.storage.database_path(),
            PathBuf::from("/var/lib/repulse/traffic.db")
        );
        assert!(!config.report.enabled);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_bad_github_settings() {
        let mut config = Config::default();
        config.github.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.github.max_pages = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.github.resources.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_resource_is_parse_error() {
        let toml = r#"
[github]
resources = ["forks"]
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_credentials_resolved() {
        let credentials = Credentials::from_lookup(lookup_from(&[
            ("GH_TOKEN", "ghp_test"),
            ("OWNER", "octocat"),
            ("REPO", "hello-world"),
        ]))
        .unwrap();

        assert_eq!(credentials.token, "ghp_test");
        assert_eq!(credentials.slug(), "octocat/hello-world");
    }

    #[test]
    fn test_each_missing_credential_is_config_error() {
        let full = [
            ("GH_TOKEN", "ghp_test"),
            ("OWNER", "octocat"),
            ("REPO", "hello-world"),
        ];

        for missing in CREDENTIAL_KEYS {
            let pairs: Vec<_> = full.iter().copied().filter(|(k, _)| *k != missing).collect();
            let err = Credentials::from_lookup(lookup_from(&pairs)).unwrap_err();
            match err {
                Error::Config(message) => assert!(
                    message.starts_with(missing),
                    "expected message about {missing}, got {message}"
                ),
                other => panic!("expected config error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_credential_counts_as_missing() {
        let result = Credentials::from_lookup(lookup_from(&[
            ("GH_TOKEN", "  "),
            ("OWNER", "octocat"),
            ("REPO", "hello-world"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let credentials = Credentials {
            token: "ghp_secret".to_string(),
            owner: "octocat".to_string(),
            repo: "hello-world".to_string(),
        };
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("octocat"));
    }

    #[test]
    fn test_load_dotenv_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!load_dotenv(&dir.path().join(".env")));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repulse.toml");
        std::fs::write(&path, "[github]\nmax_pages = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "[github]\nmax_pages = 50\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.github.max_pages, 50);
    }
}
