// src/extract/browser.rs
//! Listing-page extractor backed by a headless browser over WebDriver
//! (chromedriver, geckodriver). Needed for listings whose rows are built
//! client-side, such as the DevExtreme grid on the Bavarian dashboard.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::html::{parse_listing, PageSelectors, USER_AGENT};
use super::types::{Extractor, RawItem};

const COOKIE_ACCEPT_XPATH: &str = "//button[contains(text(), 'alle akzeptieren')]";

pub struct BrowserExtractor {
    webdriver_url: String,
    selectors: PageSelectors,
    timeout: Duration,
}

impl BrowserExtractor {
    pub fn new(webdriver_url: impl Into<String>, selectors: PageSelectors, timeout_secs: u64) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            selectors,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    /// Headless Chrome session capabilities.
    pub fn capabilities() -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless",
                    "--disable-gpu",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                    "--window-size=1920,1080",
                    "--disable-blink-features=AutomationControlled",
                    format!("--user-agent={USER_AGENT}"),
                ]
            }),
        );
        caps
    }

    async fn connect(&self) -> Result<Client> {
        let client = ClientBuilder::native()
            .capabilities(Self::capabilities())
            .connect(&self.webdriver_url)
            .await
            .with_context(|| format!("starting browser session at {}", self.webdriver_url))?;
        tracing::debug!(webdriver = %self.webdriver_url, "browser session acquired");
        Ok(client)
    }

    /// Load `url`, get the cookie banner out of the way and wait until the
    /// listing cells exist. Returns the rendered page source.
    async fn render(&self, client: &Client, url: &str) -> Result<String> {
        client.goto(url).await.with_context(|| format!("navigating to {url}"))?;

        self.dismiss_cookie_popup(client).await;

        for css in [self.selectors.title_css(), self.selectors.date_css()] {
            client
                .wait()
                .at_most(self.timeout)
                .for_element(Locator::Css(css))
                .await
                .map_err(|e| match e {
                    CmdError::WaitTimeout => anyhow!(
                        "expected elements never appeared: no `{css}` within {}s",
                        self.timeout.as_secs()
                    ),
                    other => anyhow::Error::new(other).context(format!("waiting for `{css}`")),
                })?;
        }

        client.source().await.context("reading rendered page source")
    }

    /// Best-effort: a missing banner or a failed click is only logged.
    async fn dismiss_cookie_popup(&self, client: &Client) {
        let button = client
            .wait()
            .at_most(self.timeout)
            .for_element(Locator::XPath(COOKIE_ACCEPT_XPATH))
            .await;
        match button {
            Ok(el) => match el.click().await {
                Ok(_) => tracing::debug!("cookie popup dismissed"),
                Err(e) => tracing::debug!(error = %e, "cookie popup click failed"),
            },
            Err(_) => tracing::debug!("no cookie popup found"),
        }
    }
}

#[async_trait]
impl Extractor for BrowserExtractor {
    async fn extract(&self, url: &str) -> Result<Vec<RawItem>> {
        let client = self.connect().await?;
        let rendered = self.render(&client, url).await;

        // Session ends here on every path, success or not.
        if let Err(e) = client.close().await {
            tracing::warn!(error = %e, "closing browser session");
        } else {
            tracing::debug!("browser session released");
        }

        parse_listing(&rendered?, &self.selectors)
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}
