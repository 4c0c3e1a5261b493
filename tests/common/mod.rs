// tests/common/mod.rs
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;

use tender_notifier::{AppConfig, Extractor, Match, Notifier, RawItem, SourceConfig};

pub const BAYERN: &str = "https://www.auftraege.bayern.de/Dashboards/Dashboard_off?BL=09";
pub const OTHER: &str = "https://vergabe.example.test/list";

/// Returns canned items per URL; URLs without an entry fail like a timed-out page.
#[derive(Default)]
pub struct StaticExtractor {
    pages: HashMap<String, Vec<RawItem>>,
    pub calls: Mutex<Vec<String>>,
}

impl StaticExtractor {
    pub fn with_page(mut self, url: &str, items: Vec<RawItem>) -> Self {
        self.pages.insert(url.to_string(), items);
        self
    }
}

#[async_trait]
impl Extractor for StaticExtractor {
    async fn extract(&self, url: &str) -> Result<Vec<RawItem>> {
        self.calls.lock().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("timed out waiting for listing elements"))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Records every call; optionally fails after recording.
#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<Vec<Match>>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, matches: &[Match]) -> Result<()> {
        self.calls.lock().push(matches.to_vec());
        if self.fail {
            return Err(anyhow!("smtp connection refused"));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn source(url: &str, keywords: &[&str]) -> SourceConfig {
    SourceConfig {
        url: url.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

pub fn config_in(dir: &Path, sources: Vec<SourceConfig>) -> AppConfig {
    AppConfig {
        state_path: dir.join("matches.json"),
        sources,
        ..AppConfig::default()
    }
}
