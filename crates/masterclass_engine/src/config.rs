use serde::Deserialize;
use tracing::{debug, info, instrument};

use masterclass_base::{FilePath, MasterclassResult, PalHandle, ResultExt};

use crate::controller::DEFAULT_MIN_QUERY_LENGTH;
use crate::source::IndexSource;

/// Environment variable that overrides `feedback.webhook_url`.
pub const WEBHOOK_URL_ENV: &str = "SLACK_WEBHOOK_URL";

/// Configuration loaded from `masterclass.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub search: SearchConfig,
    pub feedback: FeedbackConfig,
    pub server: ServerConfig,
}

/// Where the query index lives and how queries are triggered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Absolute URL, site-relative path or local file.
    pub source: String,
    /// Joined with site-relative sources.
    pub base_url: Option<String>,
    pub min_query_length: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            source: "/query-index.json".to_string(),
            base_url: None,
            min_query_length: DEFAULT_MIN_QUERY_LENGTH,
        }
    }
}

impl SearchConfig {
    pub fn index_source(&self) -> IndexSource {
        IndexSource::resolve(&self.source, self.base_url.as_deref())
    }
}

/// Chat webhook the feedback relay posts to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedbackConfig {
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Parse a TOML document.
    ///
    /// ```
    /// use masterclass_engine::Config;
    ///
    /// let config = Config::parse("[server]\nport = 9000\n").unwrap();
    /// assert_eq!(config.server.port, 9000);
    /// assert_eq!(config.search.source, "/query-index.json");
    /// ```
    pub fn parse(content: &str) -> MasterclassResult<Self> {
        toml::from_str(content).map_err(|e| masterclass_base::err!("Invalid configuration: {}", e))
    }

    /// Apply overrides from the environment, looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(webhook_url) = lookup(WEBHOOK_URL_ENV).filter(|url| !url.is_empty()) {
            debug!(variable = WEBHOOK_URL_ENV, "webhook URL taken from environment");
            self.feedback.webhook_url = Some(webhook_url);
        }
    }
}

/// Load the configuration file, falling back to defaults if it does not exist.
///
/// Environment overrides are applied afterwards.
#[instrument(skip(pal), fields(path = %path))]
pub fn load_config(pal: &PalHandle, path: &FilePath) -> MasterclassResult<Config> {
    let mut config = if pal.file_exists(path)? {
        let content = pal.read_file_to_string(path)?;
        Config::parse(&content).with_context(|| format!("Failed to load config {}", path))?
    } else {
        info!("no configuration file found, using defaults");
        Config::default()
    };
    config.apply_overrides(|name| std::env::var(name).ok());
    Ok(config)
}
