//! Concurrent website scraper: fetches a fixed set of pages from a company
//! site, keeps the readable text, and mines contact details from it.

pub mod extract;

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use reqwest::StatusCode;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use sitebot_schema::{ContactInfo, ScrapedPage};

pub use extract::{extract_page_text, mine_contacts};

/// Sub-paths fetched in addition to the site root.
pub const SCRAPE_SUBPATHS: &[&str] = &["/about", "/services", "/contact", "/products"];

const MAX_IN_FLIGHT: usize = 5;
const FETCH_TIMEOUT: Duration = Duration::from_secs(6);
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Invoked once per completed fetch, in completion order, with
/// `(completed, total, url_just_completed)`.
pub type Progress<'a> = dyn Fn(usize, usize, &str) + Send + Sync + 'a;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to construct http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct SiteScraper {
    client: reqwest::Client,
}

impl SiteScraper {
    pub fn new() -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// The root URL (scheme prepended if missing) plus the fixed sub-paths.
    pub fn candidate_urls(base_url: &str) -> Vec<String> {
        let base = if base_url.starts_with("http") {
            base_url.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", base_url.trim_end_matches('/'))
        };

        let mut urls = vec![base.clone()];
        urls.extend(SCRAPE_SUBPATHS.iter().map(|path| format!("{base}{path}")));
        urls
    }

    /// Fetch one page and reduce it to readable text. Every failure mode
    /// (transport error, timeout, non-200, unreadable body, no qualifying
    /// lines) collapses to `None`.
    pub async fn scrape_page(&self, url: &str) -> Option<ScrapedPage> {
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(%url, %err, "page fetch failed");
                return None;
            }
        };

        if resp.status() != StatusCode::OK {
            debug!(%url, status = %resp.status(), "dropping non-200 response");
            return None;
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%url, %err, "failed to read response body");
                return None;
            }
        };

        extract_page_text(&body).map(|content| ScrapedPage {
            url: url.to_string(),
            content,
        })
    }

    /// Scrape the site: all candidate URLs with at most five requests in
    /// flight. Never fails — unreachable pages are simply absent from the
    /// result, and a fully unreachable site yields empty pages and empty
    /// contact info.
    pub async fn scrape_site(
        &self,
        base_url: &str,
        progress: Option<&Progress<'_>>,
    ) -> (Vec<ScrapedPage>, ContactInfo) {
        let urls = Self::candidate_urls(base_url);
        let total = urls.len();
        let limit = Arc::new(Semaphore::new(MAX_IN_FLIGHT));

        let mut in_flight: FuturesUnordered<_> = urls
            .into_iter()
            .map(|url| {
                let limit = Arc::clone(&limit);
                async move {
                    let _permit = match limit.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return (url, None),
                    };
                    let page = self.scrape_page(&url).await;
                    (url, page)
                }
            })
            .collect();

        let mut pages = Vec::new();
        let mut done = 0;
        while let Some((url, page)) = in_flight.next().await {
            done += 1;
            if let Some(callback) = progress {
                callback(done, total, &url);
            }
            if let Some(page) = page {
                pages.push(page);
            }
        }

        let all_text = pages
            .iter()
            .map(|page| page.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let contacts = mine_contacts(&all_text);

        info!(
            base_url,
            pages = pages.len(),
            emails = contacts.emails.len(),
            phones = contacts.phones.len(),
            "scrape finished"
        );
        (pages, contacts)
    }
}
