use async_trait::async_trait;

mod card;
mod config;
mod driver;
mod error;
mod extractor;
mod fetcher;
#[cfg(feature = "logging")]
mod logging;
mod presentation;
mod state;
mod utils;
mod validator;

pub use card::LinkPreviewCard;
pub use config::{CardConfig, DEFAULT_ENDPOINT, DEFAULT_THEME_COLOR_VAR, ENDPOINT_ENV};
pub use driver::{CardDriver, CardHandle};
pub use error::{FetchError, PreviewError, ValidationError};
pub use extractor::{KeyRules, MetadataExtractor};
pub use fetcher::{Fetcher, FetcherConfig};
#[cfg(feature = "logging")]
pub use logging::{log_card, log_error_card, setup_logging, LogConfig, LogLevelGuard};
pub use presentation::{derive, CardBody, DefaultColor, RenderModel, ThemeClass};
pub use state::{apply_event, Event, FetchTicket, PreviewState};
pub use validator::{classify, UrlValidator, ValidatorConfig, Validity};

/// Normalized metadata for one link. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub canonical_url: Option<String>,
    pub theme_color: Option<String>,
}

/// Anything that can turn a valid link into [`Metadata`].
#[async_trait]
pub trait MetadataSource {
    async fn fetch(&self, link: &str) -> Result<Metadata, FetchError>;
}
