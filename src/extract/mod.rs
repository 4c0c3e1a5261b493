// src/extract/mod.rs
pub mod browser;
pub mod html;
pub mod types;

pub use browser::BrowserExtractor;
pub use html::{HtmlExtractor, PageSelectors};
pub use types::{Extractor, RawItem};

use anyhow::Result;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::config::AppConfig;

/// Headless browser when `webdriver_url` is configured, static HTML otherwise.
pub fn from_config(config: &AppConfig) -> Result<Box<dyn Extractor>> {
    let selectors = config.selectors()?;
    let extractor: Box<dyn Extractor> = match &config.webdriver_url {
        Some(url) => Box::new(BrowserExtractor::new(
            url.clone(),
            selectors,
            config.page_timeout_secs,
        )),
        None => Box::new(HtmlExtractor::new(selectors, config.page_timeout_secs)),
    };
    tracing::debug!(extractor = extractor.name(), "extractor selected");
    Ok(extractor)
}

/// Collapse runs of whitespace (incl. newlines and NBSP) into single spaces and trim.
pub fn normalize_text(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"[\s\u{00A0}]+").unwrap());
    re_ws.replace_all(s, " ").trim().to_string()
}
