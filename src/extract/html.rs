// src/extract/html.rs
//! Listing-page extractor: fetches the portal page over HTTP and pairs the
//! announcement titles with their publication dates by position.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;

use super::normalize_text;
use super::types::{Extractor, RawItem};

pub const DEFAULT_TITLE_SELECTOR: &str = ".BekSummary";
pub const DEFAULT_DATE_SELECTOR: &str = ".dx-cell-focus-disabled";
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 30;

pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Compiled CSS selectors for the title and date cells of a listing.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    title_css: String,
    date_css: String,
    title: Selector,
    date: Selector,
}

impl PageSelectors {
    pub fn new(title_css: &str, date_css: &str) -> Result<Self> {
        let title = Selector::parse(title_css)
            .map_err(|e| anyhow!("invalid title selector {title_css:?}: {e}"))?;
        let date = Selector::parse(date_css)
            .map_err(|e| anyhow!("invalid date selector {date_css:?}: {e}"))?;
        Ok(Self {
            title_css: title_css.to_string(),
            date_css: date_css.to_string(),
            title,
            date,
        })
    }

    pub fn title_css(&self) -> &str {
        &self.title_css
    }

    pub fn date_css(&self) -> &str {
        &self.date_css
    }
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE_SELECTOR, DEFAULT_DATE_SELECTOR)
            .expect("built-in selectors are valid CSS")
    }
}

enum Mode {
    Fixture(String),
    Http { timeout: Duration },
}

pub struct HtmlExtractor {
    mode: Mode,
    selectors: PageSelectors,
}

impl HtmlExtractor {
    pub fn new(selectors: PageSelectors, timeout_secs: u64) -> Self {
        Self {
            mode: Mode::Http {
                timeout: Duration::from_secs(timeout_secs.max(1)),
            },
            selectors,
        }
    }

    /// Parse a static HTML document instead of fetching `url`.
    pub fn from_fixture(html: &str, selectors: PageSelectors) -> Self {
        Self {
            mode: Mode::Fixture(html.to_string()),
            selectors,
        }
    }

    pub fn parse_listing(&self, body: &str) -> Result<Vec<RawItem>> {
        parse_listing(body, &self.selectors)
    }
}

/// Pull (title, date) pairs out of a rendered document.
///
/// Titles and dates are zipped by position; trailing cells on the longer
/// side are dropped. Items whose title is blank are skipped.
pub fn parse_listing(body: &str, selectors: &PageSelectors) -> Result<Vec<RawItem>> {
    let doc = Html::parse_document(body);
    let titles: Vec<String> = doc
        .select(&selectors.title)
        .map(|el| normalize_text(&el.text().collect::<String>()))
        .collect();

    if titles.is_empty() {
        bail!(
            "expected elements never appeared: no `{}` on page",
            selectors.title_css()
        );
    }

    let dates: Vec<String> = doc
        .select(&selectors.date)
        .map(|el| normalize_text(&el.text().collect::<String>()))
        .collect();

    tracing::debug!(
        titles = titles.len(),
        dates = dates.len(),
        "listing elements found"
    );

    let mut out = Vec::with_capacity(titles.len().min(dates.len()));
    for (i, (title, date)) in titles.into_iter().zip(dates).enumerate() {
        if title.is_empty() {
            tracing::debug!(index = i + 1, "skipped element with empty title");
            continue;
        }
        tracing::debug!(index = i + 1, %title, %date, "extracted");
        out.push(RawItem { title, date });
    }
    Ok(out)
}

#[async_trait]
impl Extractor for HtmlExtractor {
    async fn extract(&self, url: &str) -> Result<Vec<RawItem>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_listing(s),
            Mode::Http { timeout } => {
                let body = {
                    let session = PageSession::acquire(url, *timeout)?;
                    session.fetch().await?
                };
                self.parse_listing(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "html"
    }
}

/// HTTP session scoped to a single extraction; released when dropped.
struct PageSession {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl PageSession {
    fn acquire(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("building http client")?;
        tracing::debug!(%url, "page session acquired");
        Ok(Self {
            client,
            url: url.to_string(),
            timeout,
        })
    }

    async fn fetch(&self) -> Result<String> {
        let resp = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow!(
                    "page did not load within {}s: {}",
                    self.timeout.as_secs(),
                    self.url
                )
            } else {
                anyhow::Error::new(e).context(format!("GET {}", self.url))
            }
        })?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("GET {} returned an error status", self.url))?;
        resp.text().await.context("reading page body")
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        tracing::debug!(url = %self.url, "page session released");
    }
}
