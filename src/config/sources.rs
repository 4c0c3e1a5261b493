// src/config/sources.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::extract::html::{
    PageSelectors, DEFAULT_DATE_SELECTOR, DEFAULT_PAGE_TIMEOUT_SECS, DEFAULT_TITLE_SELECTOR,
};

pub const ENV_CONFIG_PATH: &str = "TENDER_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/sources.toml";
pub const DEFAULT_JSON_PATH: &str = "config/sources.json";

const BAYERN_DASHBOARD_URL: &str = "https://www.auftraege.bayern.de/Dashboards/Dashboard_off?BL=09";
const BAYERN_KEYWORDS: &[&str] = &[
    "catering",
    "verpflegung",
    "lebensmittel",
    "kantin",
    "speise",
    "hotel",
    "essen",
];

fn default_state_path() -> PathBuf {
    PathBuf::from("matches.json")
}
fn default_page_timeout_secs() -> u64 {
    DEFAULT_PAGE_TIMEOUT_SECS
}
fn default_title_selector() -> String {
    DEFAULT_TITLE_SELECTOR.to_string()
}
fn default_date_selector() -> String {
    DEFAULT_DATE_SELECTOR.to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TENDER_CONFIG_PATH points to non-existent path {}", .0.display())]
    MissingEnvPath(PathBuf),
    #[error("reading config from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported config format in {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("config lists no sources")]
    NoSources,
    #[error("source #{index} has an empty url")]
    EmptyUrl { index: usize },
    #[error("source #{index} has a blank keyword (it would match every title)")]
    BlankKeyword { index: usize },
}

/// One monitored listing page and the keywords that make an entry relevant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub url: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Everything one run needs, built once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    /// Where to write the raw extracted items of the run (debug artifact).
    #[serde(default)]
    pub dump_path: Option<PathBuf>,
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,
    /// Start from an empty state instead of aborting when the state file is unreadable.
    #[serde(default)]
    pub reset_on_corrupt: bool,
    #[serde(default = "default_title_selector")]
    pub title_selector: String,
    #[serde(default = "default_date_selector")]
    pub date_selector: String,
    /// WebDriver endpoint (e.g. chromedriver on `http://localhost:9515`).
    /// When set, pages are rendered in a headless browser; otherwise fetched as static HTML.
    #[serde(default)]
    pub webdriver_url: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            dump_path: None,
            page_timeout_secs: default_page_timeout_secs(),
            reset_on_corrupt: false,
            title_selector: default_title_selector(),
            date_selector: default_date_selector(),
            webdriver_url: None,
            sources: vec![SourceConfig {
                url: BAYERN_DASHBOARD_URL.to_string(),
                keywords: BAYERN_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            }],
        }
    }
}

impl AppConfig {
    pub fn selectors(&self) -> anyhow::Result<PageSelectors> {
        PageSelectors::new(&self.title_selector, &self.date_selector)
    }

    /// Trim urls and reject empty configs. Keywords are kept exactly as written
    /// (matching is substring-based, so surrounding spaces are significant).
    fn validated(mut self) -> Result<Self, ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        for (index, src) in self.sources.iter_mut().enumerate() {
            src.url = src.url.trim().to_string();
            if src.url.is_empty() {
                return Err(ConfigError::EmptyUrl { index });
            }
            if src.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ConfigError::BlankKeyword { index });
            }
            if src.keywords.is_empty() {
                tracing::warn!(url = %src.url, "source has no keywords; it will never match");
            }
        }
        if let Some(url) = &self.webdriver_url {
            if url.trim().is_empty() {
                self.webdriver_url = None;
            }
        }
        Ok(self)
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })?
        .validated()
}

/// Load config using env var + fallbacks:
/// 1) $TENDER_CONFIG_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in Bavarian dashboard
pub fn load_config_default() -> Result<AppConfig, ConfigError> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(ConfigError::MissingEnvPath(pb));
        }
    }
    for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return load_config_from(&pb);
        }
    }
    AppConfig::default().validated()
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig, String> {
    match hint_ext {
        "toml" => toml::from_str(s).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(s).map_err(|e| e.to_string()),
        // Unknown extension: sniff, TOML first.
        _ => toml::from_str(s)
            .or_else(|_| serde_json::from_str(s))
            .map_err(|e| e.to_string()),
    }
}
