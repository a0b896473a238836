//! Granule discovery from the LAADS DAAC archive directory pages.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use aerosol_common::{AerosolError, ProcessingDay};

/// Collection 5200 holds the VIIRS Level 2 aerosol products.
pub const DEFAULT_ARCHIVE_URL: &str = "https://ladsweb.modaps.eosdis.nasa.gov/archive/allData/5200";

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// HTTP client for the archive's per-day directory listings.
pub struct ArchiveClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl ArchiveClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, initial_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = initial_delay;
        self
    }

    /// `{base}/{collection}/{year}/{doy}/`
    pub fn listing_url(&self, collection: &str, day: ProcessingDay) -> String {
        format!(
            "{}/{}/{}/{:03}/",
            self.base_url,
            collection,
            day.year(),
            day.day_of_year()
        )
    }

    /// Names of the `.nc` granules archived for `collection` on `day`.
    #[instrument(skip(self), fields(collection = %collection, day = %day))]
    pub async fn list_granules(&self, collection: &str, day: ProcessingDay) -> Result<Vec<String>> {
        let url = self.listing_url(collection, day);
        let html = self.fetch_listing(&url).await?;
        let files = parse_listing(&html);

        info!(count = files.len(), "Listed archive granules");
        Ok(files)
    }

    async fn fetch_listing(&self, url: &str) -> Result<String> {
        let mut delay = self.retry_delay;
        let mut retry = 0;

        loop {
            debug!(url = %url, "Fetching archive listing");

            let error = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    return response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read listing body from {}", url));
                }
                // A missing day or collection will not appear on retry.
                Ok(response) if response.status().is_client_error() => {
                    return Err(AerosolError::ArchiveError(format!(
                        "{} returned HTTP {}",
                        url,
                        response.status()
                    ))
                    .into());
                }
                Ok(response) => anyhow!("HTTP {}", response.status()),
                Err(e) => anyhow!(e),
            };

            if retry >= self.max_retries {
                return Err(AerosolError::ArchiveError(format!(
                    "{} failed after {} retries: {:#}",
                    url, retry, error
                ))
                .into());
            }

            retry += 1;
            warn!(
                error = %error,
                retry,
                max_retries = self.max_retries,
                delay_secs = delay.as_secs(),
                "Archive listing failed, retrying"
            );
            tokio::time::sleep(delay).await;
            delay = std::cmp::min(delay * 2, MAX_RETRY_DELAY);
        }
    }
}

/// Extract unique `.nc` basenames from an archive HTML page, sorted.
pub fn parse_listing(html: &str) -> Vec<String> {
    let mut files = BTreeSet::new();
    let mut rest = html;

    while let Some(start) = rest.find("href=\"") {
        rest = &rest[start + 6..];
        let Some(end) = rest.find('"') else {
            break;
        };
        let href = &rest[..end];
        rest = &rest[end + 1..];

        let href = href.split(['?', '#']).next().unwrap_or(href);
        if !href.ends_with(".nc") {
            continue;
        }
        if let Some(name) = href.rsplit('/').next() {
            if name.len() > 3 {
                files.insert(name.to_string());
            }
        }
    }

    files.into_iter().collect()
}
