use crate::{FetcherConfig, KeyRules, PreviewError, ValidatorConfig};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://open-apis.hax.cloud/api/services/website/metadata";

/// CSS custom property carrying the card's theme color.
pub const DEFAULT_THEME_COLOR_VAR: &str = "--link-preview-card-theme-color";

/// Environment variable overriding [`CardConfig::endpoint`].
pub const ENDPOINT_ENV: &str = "LINK_PREVIEW_ENDPOINT";

/// Theming and service settings for one card.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    /// Metadata service endpoint; the link is appended as `q`.
    pub endpoint: String,
    /// Host substrings that select the institution theme.
    pub institution_domains: Vec<String>,
    pub theme_color_var: String,
    /// Colors a card may pick as its default at mount.
    pub palette: Vec<String>,
    pub allowed_schemes: Vec<String>,
    /// Key-name needles used to read the service response.
    pub key_rules: KeyRules,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            institution_domains: vec!["psu.edu".to_string()],
            theme_color_var: DEFAULT_THEME_COLOR_VAR.to_string(),
            palette: [
                "#1e407c", "#009cde", "#bc204b", "#f2665e", "#008755", "#4a7729", "#e98300",
                "#ffd100", "#6a3028", "#314d64",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
            key_rules: KeyRules::default(),
        }
    }
}

impl CardConfig {
    /// Defaults with the endpoint taken from `LINK_PREVIEW_ENDPOINT` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                debug!(endpoint = %endpoint, "Using metadata endpoint from environment");
                config.endpoint = endpoint.trim().to_string();
            }
        }
        config
    }

    pub fn from_json(json: &str) -> Result<Self, PreviewError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PreviewError::Config(format!("Failed to parse card config: {e}")))?;
        config.check()?;
        Ok(config)
    }

    /// Rejects settings a card cannot work with. Cards run this at mount.
    pub fn check(&self) -> Result<(), PreviewError> {
        if self.allowed_schemes.is_empty() {
            return Err(PreviewError::Config(
                "At least one URL scheme must be allowed".to_string(),
            ));
        }
        if self.theme_color_var.is_empty() || !self.theme_color_var.starts_with("--") {
            return Err(PreviewError::Config(format!(
                "Theme color variable must be a CSS custom property, got {:?}",
                self.theme_color_var
            )));
        }
        Ok(())
    }

    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            allowed_schemes: self
                .allowed_schemes
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            endpoint: self.endpoint.clone(),
            ..FetcherConfig::default()
        }
    }
}
