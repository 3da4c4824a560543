use crate::config::DEFAULT_ENDPOINT;
use crate::{FetchError, Metadata, MetadataExtractor, MetadataSource, PreviewError};
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// HTTP client for the metadata service.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    endpoint: Url,
    extractor: MetadataExtractor,
}

/// Configuration for [`Fetcher`].
///
/// # Examples
/// ```ignore
/// let fetcher = Fetcher::new_with_config(FetcherConfig {
///     endpoint: "http://localhost:8080/metadata".to_string(),
///     timeout: Duration::from_secs(5),
///     ..FetcherConfig::default()
/// })?;
/// ```
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub headers: Option<HeaderMap>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: concat!("link-preview-card/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(10),
            headers: None,
        }
    }
}

impl Fetcher {
    pub fn new() -> Result<Self, PreviewError> {
        debug!("Fetcher initialized with default configuration");
        Self::new_with_config(FetcherConfig::default())
    }

    pub fn new_with_config(config: FetcherConfig) -> Result<Self, PreviewError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            PreviewError::Config(format!("Invalid endpoint {}: {e}", config.endpoint))
        })?;

        let mut client_builder = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout);

        if let Some(headers) = config.headers {
            client_builder = client_builder.default_headers(headers);
        }

        let client = client_builder.build().map_err(|e| {
            error!(error = %e, "Failed to create HTTP client");
            PreviewError::Client(e)
        })?;

        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self {
            client,
            endpoint,
            extractor: MetadataExtractor::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: MetadataExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Endpoint URL with the link appended as the percent-encoded `q` parameter.
    pub fn request_url(&self, link: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", link);
        url
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn fetch_metadata(&self, link: &str) -> Result<Metadata, FetchError> {
        let request_url = self.request_url(link);
        debug!(url = %request_url, "Requesting link metadata");

        let response = self.client.get(request_url).send().await.map_err(|e| {
            error!(error = %e, link = %link, "Failed to send request");
            FetchError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, link = %link, "Metadata service rejected request");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            error!(error = %e, link = %link, "Failed to read response body");
            FetchError::Network(e.to_string())
        })?;

        let metadata = self.extractor.extract_from_body(&body)?;
        debug!(link = %link, ?metadata, "Successfully fetched metadata");
        Ok(metadata)
    }
}

#[async_trait]
impl MetadataSource for Fetcher {
    async fn fetch(&self, link: &str) -> Result<Metadata, FetchError> {
        self.fetch_metadata(link).await
    }
}
