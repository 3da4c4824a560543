use crate::utils::host_of;
use crate::{CardConfig, PreviewState, Validity};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Visual style bucket for a visible card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ThemeClass {
    #[default]
    Default,
    InstitutionTheme,
    SourceTheme,
}

impl ThemeClass {
    pub fn css_class(&self) -> &'static str {
        match self {
            ThemeClass::Default => "theme-default",
            ThemeClass::InstitutionTheme => "theme-institution",
            ThemeClass::SourceTheme => "theme-source",
        }
    }
}

/// Color assigned to a card once at mount, used when the source has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultColor(String);

impl DefaultColor {
    pub fn pick<R: Rng>(palette: &[String], rng: &mut R) -> Self {
        match palette.choose(&mut *rng) {
            Some(color) => Self(color.clone()),
            None => Self(format!("#{:06x}", rng.gen_range(0..=0xff_ffffu32))),
        }
    }

    pub fn random(palette: &[String]) -> Self {
        Self::pick(palette, &mut rand::thread_rng())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DefaultColor {
    fn from(color: &str) -> Self {
        Self(color.to_string())
    }
}

/// Card fields; `None` fields are not rendered at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub canonical_url: Option<String>,
}

/// What the host renderer paints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderModel {
    pub loading: bool,
    pub card_visible: bool,
    pub theme_class: ThemeClass,
    /// Value for the theme color custom property.
    pub theme_color: String,
    pub theme_color_var: String,
    pub body: CardBody,
}

impl RenderModel {
    pub fn css_class(&self) -> String {
        if self.card_visible {
            format!("card {}", self.theme_class.css_class())
        } else {
            "card cardInvis".to_string()
        }
    }

    /// Inline style declaring the theme color custom property.
    pub fn theme_style(&self) -> String {
        format!("{}: {};", self.theme_color_var, self.theme_color)
    }
}

/// Computes the render model for the current state.
pub fn derive(state: &PreviewState, config: &CardConfig, default_color: &DefaultColor) -> RenderModel {
    let source_color = state.metadata().and_then(|m| m.theme_color.clone());
    let mut model = RenderModel {
        loading: state.is_loading(),
        card_visible: false,
        theme_class: ThemeClass::Default,
        theme_color: source_color
            .clone()
            .unwrap_or_else(|| default_color.as_str().to_string()),
        theme_color_var: config.theme_color_var.clone(),
        body: CardBody::default(),
    };

    if state.is_loading() || state.validity() != Validity::Valid {
        return model;
    }
    let Some(metadata) = state.metadata() else {
        return model;
    };

    model.card_visible = true;
    model.theme_class = if is_institution_link(state.raw_link(), &config.institution_domains) {
        ThemeClass::InstitutionTheme
    } else if source_color.is_some() {
        ThemeClass::SourceTheme
    } else {
        ThemeClass::Default
    };
    model.body = CardBody {
        title: metadata.title.clone(),
        description: metadata.description.clone(),
        image_url: metadata.image_url.clone(),
        canonical_url: metadata.canonical_url.clone(),
    };
    model
}

fn is_institution_link(link: &str, domains: &[String]) -> bool {
    let Some(host) = host_of(link) else {
        return false;
    };
    domains
        .iter()
        .filter(|domain| !domain.is_empty())
        .any(|domain| host.contains(&domain.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply_event, Event, FetchError, Metadata};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn loaded(link: &str, metadata: Metadata) -> PreviewState {
        let state = apply_event(PreviewState::default(), Event::Paste(link.to_string()));
        let ticket = state.in_flight().cloned().unwrap();
        apply_event(
            state,
            Event::FetchCompleted {
                ticket,
                outcome: Ok(metadata),
            },
        )
    }

    fn colored(color: &str) -> Metadata {
        Metadata {
            title: Some("Page".into()),
            theme_color: Some(color.into()),
            ..Metadata::default()
        }
    }

    #[test]
    fn test_loading_suppresses_card() {
        let state = apply_event(PreviewState::default(), Event::Paste("https://a.b/c".into()));
        let model = derive(&state, &CardConfig::default(), &"#123456".into());

        assert!(model.loading);
        assert!(!model.card_visible);
        assert_eq!(model.body, CardBody::default());
    }

    #[test]
    fn test_institution_theme_beats_source_color() {
        let state = loaded("https://psu.edu/page", colored("#ff0000"));
        let model = derive(&state, &CardConfig::default(), &"#123456".into());

        assert!(model.card_visible);
        assert_eq!(model.theme_class, ThemeClass::InstitutionTheme);
    }

    #[test]
    fn test_institution_match_is_case_insensitive_substring() {
        let state = loaded("https://WWW.Engr.PSU.EDU/about", Metadata::default());
        let model = derive(&state, &CardConfig::default(), &"#123456".into());
        assert_eq!(model.theme_class, ThemeClass::InstitutionTheme);
    }

    #[test]
    fn test_source_theme_uses_source_color() {
        let state = loaded("https://www.rust-lang.org/", colored("#dea584"));
        let model = derive(&state, &CardConfig::default(), &"#123456".into());

        assert_eq!(model.theme_class, ThemeClass::SourceTheme);
        assert_eq!(model.theme_color, "#dea584");
        assert_eq!(model.theme_style(), "--link-preview-card-theme-color: #dea584;");
        assert_eq!(model.css_class(), "card theme-source");
    }

    #[test]
    fn test_default_theme_uses_instance_color() {
        let metadata = Metadata {
            title: Some("Plain".into()),
            ..Metadata::default()
        };
        let state = loaded("https://example.com/", metadata);
        let model = derive(&state, &CardConfig::default(), &"#123456".into());

        assert_eq!(model.theme_class, ThemeClass::Default);
        assert_eq!(model.theme_color, "#123456");
        assert_eq!(model.body.title.as_deref(), Some("Plain"));
        assert_eq!(model.body.description, None);
    }

    #[test]
    fn test_failed_fetch_hides_card() {
        let state = apply_event(PreviewState::default(), Event::Paste("https://a.b/c".into()));
        let ticket = state.in_flight().cloned().unwrap();
        let state = apply_event(
            state,
            Event::FetchCompleted {
                ticket,
                outcome: Err(FetchError::HttpStatus(404)),
            },
        );
        let model = derive(&state, &CardConfig::default(), &"#123456".into());

        assert!(!model.loading);
        assert!(!model.card_visible);
        assert_eq!(model.css_class(), "card cardInvis");
    }

    #[test]
    fn test_invalid_link_hides_card() {
        let state = apply_event(PreviewState::default(), Event::Paste("nope".into()));
        let model = derive(&state, &CardConfig::default(), &"#123456".into());

        assert!(!model.loading);
        assert!(!model.card_visible);
        assert_eq!(model.theme_class, ThemeClass::Default);
    }

    #[test]
    fn test_default_color_pick_is_from_palette() {
        let palette = vec!["#111111".to_string(), "#222222".to_string()];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let color = DefaultColor::pick(&palette, &mut rng);
            assert!(palette.iter().any(|c| c == color.as_str()));
        }
    }

    #[test]
    fn test_default_color_without_palette_is_hex() {
        let mut rng = StdRng::seed_from_u64(7);
        let color = DefaultColor::pick(&[], &mut rng);
        assert_eq!(color.as_str().len(), 7);
        assert!(color.as_str().starts_with('#'));
        assert!(color.as_str()[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
