use unicode_width::UnicodeWidthChar;

use url::Url;

/// Safely truncate a string, ensuring it is not truncated in the middle of multi-byte characters
///
/// The output's display width never exceeds `max_width`, ellipsis included.
#[cfg_attr(not(feature = "logging"), allow(dead_code))]
pub fn truncate_str(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthStr;

    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(1);

        if current_width + char_width + 3 > max_width {
            break;
        }

        result.push(c);
        current_width += char_width;
    }

    result.push_str("...");
    result
}

/// Lower-cased host of an absolute link, if it has one.
pub fn host_of(link: &str) -> Option<String> {
    let parsed = Url::parse(link.trim()).ok()?;
    parsed.host_str().map(|host| host.to_ascii_lowercase())
}
