use crate::error::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const BASE_URL: &str = "https://www.numbeo.com";

/// The upstream server can be very slow on ranking pages.
const REQUEST_TIMEOUT_SECS: u64 = 300;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Issues one GET per logical sub-request, strictly sequentially.
///
/// A non-2xx status is not an error here: the caller decides whether to
/// skip the sub-request or abort. Only transport failures propagate.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    base_url: String,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `Ok(Some(body))` for 2xx, `Ok(None)` for any other status,
    /// `Err` for connection/transport failures.
    pub async fn fetch(&self, url: &str) -> Result<Option<String>> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            debug!("{url} answered {}", response.status());
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }
}
