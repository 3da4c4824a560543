use crate::error::ValidationError;
use std::collections::HashSet;
use url::Url;

/// Classification of a candidate link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Empty,
    Invalid,
    Valid,
}

/// Configuration for URL validation
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Allowed URL schemes (default: ["http", "https"])
    pub allowed_schemes: HashSet<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        let mut allowed_schemes = HashSet::new();
        allowed_schemes.insert("http".to_string());
        allowed_schemes.insert("https".to_string());

        Self { allowed_schemes }
    }
}

/// Decides whether a pasted candidate is a well-formed absolute URL.
#[derive(Debug, Clone, Default)]
pub struct UrlValidator {
    config: ValidatorConfig,
}

impl UrlValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(ValidatorConfig::default())
    }

    /// Parses the candidate and checks it against the scheme policy.
    pub fn validate(&self, candidate: &str) -> Result<Url, ValidationError> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return Err(ValidationError::Empty);
        }

        let url = Url::parse(candidate)?;

        if !self.config.allowed_schemes.contains(url.scheme()) {
            return Err(ValidationError::UnsupportedScheme(url.scheme().to_string()));
        }

        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(url),
            _ => Err(ValidationError::MissingHost),
        }
    }

    pub fn classify(&self, candidate: &str) -> Validity {
        match self.validate(candidate) {
            Ok(_) => Validity::Valid,
            Err(ValidationError::Empty) => Validity::Empty,
            Err(_) => Validity::Invalid,
        }
    }
}

/// Classifies a candidate with the default http/https policy.
pub fn classify(candidate: &str) -> Validity {
    UrlValidator::with_default_config().classify(candidate)
}
