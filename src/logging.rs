use crate::utils::truncate_str;
use crate::RenderModel;
use std::fmt::Display;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};
use unicode_width::UnicodeWidthStr;

#[derive(Debug)]
pub struct LogConfig {
    pub log_dir: PathBuf,
    pub log_level: String,
    pub console_output: bool,
    pub file_output: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".into(),
            log_level: "info".into(),
            console_output: true,
            file_output: false,
        }
    }
}

const CARD_WIDTH: usize = 72;
const LABEL_WIDTH: usize = 7;
// Borders and one space of padding on each side.
const CONTENT_WIDTH: usize = CARD_WIDTH - LABEL_WIDTH - 4;

fn create_separator(width: usize, ch: char) -> String {
    std::iter::repeat(ch).take(width).collect()
}

/// Draws labelled rows inside a box exactly `CARD_WIDTH` columns wide.
fn boxed(rows: &[(&str, String)]) -> String {
    let edge = create_separator(CARD_WIDTH - 2, '═');
    let mut out = format!("╔{edge}╗");
    for (label, value) in rows {
        let value: String = value.split_whitespace().collect::<Vec<_>>().join(" ");
        let value = truncate_str(&value, CONTENT_WIDTH);
        let padding = CONTENT_WIDTH.saturating_sub(value.width());
        out.push_str(&format!(
            "\n║ {label:<LABEL_WIDTH$}{value}{} ║",
            " ".repeat(padding)
        ));
    }
    out.push_str(&format!("\n╚{edge}╝"));
    out
}

fn card_block(model: &RenderModel, link: &str) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".into());
    boxed(&[
        ("Link:", link.to_string()),
        ("Title:", field(&model.body.title)),
        ("Desc:", field(&model.body.description)),
        ("Image:", field(&model.body.image_url)),
        ("URL:", field(&model.body.canonical_url)),
        (
            "Theme:",
            format!("{} ({})", model.theme_class.css_class(), model.theme_color),
        ),
    ])
}

fn error_block<E: Display + std::error::Error>(link: &str, error: &E) -> String {
    let mut details = error.to_string();
    if let Some(source) = error.source() {
        details = format!("{details} (caused by: {source})");
    }
    boxed(&[("Link:", link.to_string()), ("Error:", details)])
}

/// Logs the visible card as a boxed block.
pub fn log_card(model: &RenderModel, link: &str) {
    info!("\n{}", card_block(model, link));
}

pub fn log_error_card<E: Display + std::error::Error>(link: &str, error: &E) {
    error!("\n{}", error_block(link, error));
}

pub fn setup_logging(config: LogConfig) -> Result<(), crate::PreviewError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let mut layers = Vec::new();

    if config.console_output {
        let console_layer = subscriber_fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .compact();
        layers.push(console_layer.boxed());
    }

    if config.file_output {
        std::fs::create_dir_all(&config.log_dir).map_err(|e| {
            crate::PreviewError::Config(format!(
                "Failed to create log directory {}: {e}",
                config.log_dir.display()
            ))
        })?;

        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "link-preview-card.log");

        let file_layer = subscriber_fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_writer(file_appender);

        layers.push(file_layer.boxed());
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| crate::PreviewError::Config(format!("Failed to set global subscriber: {e}")))?;

    debug!("Logging system initialized with config: {:?}", config);
    Ok(())
}

/// Scoped subscriber at a fixed level; restores the previous one on drop.
pub struct LogLevelGuard {
    _guard: tracing::dispatcher::DefaultGuard,
}

impl LogLevelGuard {
    pub fn set_level(level: &str) -> Self {
        let filter = EnvFilter::new(level);
        let subscriber = tracing_subscriber::registry()
            .with(subscriber_fmt::layer())
            .with(filter);

        LogLevelGuard {
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CardBody, FetchError, ThemeClass};

    fn model(title: &str) -> RenderModel {
        RenderModel {
            loading: false,
            card_visible: true,
            theme_class: ThemeClass::SourceTheme,
            theme_color: "#dea584".into(),
            theme_color_var: "--link-preview-card-theme-color".into(),
            body: CardBody {
                title: Some(title.into()),
                ..CardBody::default()
            },
        }
    }

    fn assert_box(block: &str, rows: usize) {
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), rows + 2);
        for line in &lines {
            assert_eq!(line.width(), CARD_WIDTH, "line {line:?}");
        }
        assert!(lines[0].starts_with('╔') && lines[0].ends_with('╗'));
        assert!(lines[rows + 1].starts_with('╚') && lines[rows + 1].ends_with('╝'));
    }

    #[test]
    fn test_card_block_rows_fit_the_box() {
        let long_link = format!("https://example.com/{}", "segment/".repeat(30));
        let title = "深入理解 Rust 所有权与借用检查器的完整指南，附带大量示例代码与练习题";
        let block = card_block(&model(title), &long_link);

        assert_box(&block, 6);
        let link_row = block.lines().nth(1).unwrap();
        assert!(link_row.starts_with("║ Link:  https://example.com/segment/"));
        assert!(link_row.trim_end_matches('║').trim_end().ends_with("..."));
        assert!(block.contains("║ Desc:  -"));
        assert!(block.contains("║ Theme: theme-source (#dea584)"));
    }

    #[test]
    fn test_error_block_flattens_and_bounds_message() {
        let error = FetchError::Network(format!("line one\nline two {}", "x".repeat(200)));
        let block = error_block("https://a.b/c", &error);

        assert_box(&block, 2);
        let error_row = block.lines().nth(2).unwrap();
        assert!(error_row.starts_with("║ Error: Network error: line one line two x"));
        assert!(error_row.trim_end_matches('║').trim_end().ends_with("..."));

        let short = error_block("https://a.b/c", &FetchError::HttpStatus(503));
        assert_box(&short, 2);
        assert!(short.contains("Metadata service returned status 503"));
    }

    #[test]
    fn test_log_cards_under_scoped_level() {
        let _guard = LogLevelGuard::set_level("debug");
        log_card(&model("Rust Programming Language"), "https://www.rust-lang.org");
        log_error_card("https://a.b/c", &FetchError::HttpStatus(503));
    }
}
