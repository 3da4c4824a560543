use thiserror::Error;
use tracing::{debug, error, warn};

/// Why a pasted candidate is not a usable link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Link is empty")]
    Empty,

    #[error("Failed to parse URL: {0}")]
    Malformed(#[from] url::ParseError),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,
}

/// Failure of a single metadata request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Metadata service returned status {0}")]
    HttpStatus(u16),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Card driver has stopped")]
    DriverStopped,
}

impl ValidationError {
    pub fn log(&self) {
        match self {
            ValidationError::Empty => debug!("Empty link, card hidden"),
            ValidationError::Malformed(e) => {
                debug!(error = %e, "URL parsing failed");
            }
            ValidationError::UnsupportedScheme(scheme) => {
                debug!(scheme = %scheme, "URL scheme not allowed");
            }
            ValidationError::MissingHost => debug!("URL has no host"),
        }
    }
}

impl FetchError {
    pub fn log(&self) {
        match self {
            FetchError::HttpStatus(status) => {
                warn!(status = *status, "Metadata service returned non-success status");
            }
            FetchError::Network(e) => {
                error!(error = %e, "Metadata fetch failed");
            }
        }
    }
}

impl PreviewError {
    pub fn log(&self) {
        match self {
            PreviewError::Fetch(e) => e.log(),
            PreviewError::Config(e) => {
                error!(error = %e, "Invalid card configuration");
            }
            PreviewError::Client(e) => {
                error!(error = %e, "Failed to create HTTP client");
            }
            PreviewError::DriverStopped => warn!("Paste sent after card driver stopped"),
        }
    }
}
