use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("textbook-export/", env!("CARGO_PKG_VERSION"));

/// Plain HTTP retrieval of subsection pages, independent of the rendering engine
#[derive(Clone)]
pub struct SubsectionFetcher {
    client: Client,
    timeout: Duration,
}

impl SubsectionFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self::with_client(client, timeout))
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Returns the page body. The in-flight request is dropped when the deadline passes.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("fetching {}", url);
        match tokio::time::timeout(self.timeout, self.fetch_inner(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }),
        }
    }

    async fn fetch_inner(&self, url: &str) -> Result<String, FetchError> {
        let request_failed = |source| FetchError::RequestFailed {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(request_failed)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(request_failed)
    }
}
