// src/extract/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One announcement as rendered on the listing page, before filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub date: String, // as shown on the page, e.g. "05.05.2025"
}

impl RawItem {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
        }
    }
}

/// Renders a listing page and returns its (title, date) pairs.
///
/// Implementations may fail; the run loop logs the error and treats the
/// source as having produced no items.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<Vec<RawItem>>;
    fn name(&self) -> &'static str;
}
