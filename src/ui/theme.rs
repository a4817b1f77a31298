//! Theme management and ANSI escape sequence generation.
//!
//! This module defines the color scheme system for the plugin, supporting both
//! built-in themes and custom themes loaded from TOML files. It provides
//! utilities for converting hex colors to ANSI escape sequences.
//!
//! # Built-in Themes
//!
//! - `essalud-dark`: Dark theme with institutional blues (default)
//! - `essalud-light`: Light theme for bright terminals
//!
//! # TOML Format
//!
//! ```toml
//! name = "my-theme"
//!
//! [colors]
//! header_fg = "#e6edf3"
//! selection_fg = "#0d1117"
//! selection_bg = "#58a6ff"
//! selected_mark_fg = "#3fb950"
//! text_normal = "#c9d1d9"
//! text_dim = "#6e7681"
//! border = "#30363d"
//! card_fg = "#c9d1d9"
//! card_active_fg = "#0d1117"
//! card_active_bg = "#d29922"
//! chip_fg = "#79c0ff"
//! search_bar_border = "#58a6ff"
//! match_highlight_fg = "#0d1117"
//! match_highlight_bg = "#d29922"
//! empty_state_fg = "#58a6ff"
//! notice_info_fg = "#79c0ff"
//! notice_success_fg = "#3fb950"
//! notice_warning_fg = "#d29922"
//! notice_error_fg = "#f85149"
//! overlay_border = "#58a6ff"
//! ```
//!
//! # Example
//!
//! ```
//! use bolsas_queue::ui::theme::Theme;
//!
//! let theme = Theme::from_name("essalud-dark").unwrap();
//! println!("{}", Theme::fg(&theme.colors.header_fg));
//! println!("{}Bold Text{}", Theme::bold(), Theme::reset());
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::domain::error::{QueueError, Result};
use crate::ui::viewmodel::NoticeLevel;

/// Theme used when no configuration names one.
pub const DEFAULT_THEME: &str = "essalud-dark";

/// Color scheme configuration for UI rendering.
///
/// Contains theme metadata and color definitions. Can be loaded from built-in
/// themes or custom TOML files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Theme {
    /// Human-readable theme name.
    pub name: String,
    /// Color palette for all UI elements.
    pub colors: ThemeColors,
}

/// Color definitions for all UI elements.
///
/// All colors are specified as hex strings (e.g., "#c9d1d9"). Optional fields
/// default to `None`, allowing themes to opt out of certain styling.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThemeColors {
    /// Header text color.
    pub header_fg: String,
    /// Optional header background color.
    #[serde(default)]
    pub header_bg: Option<String>,

    /// Cursor row foreground color.
    pub selection_fg: String,
    /// Cursor row background color.
    pub selection_bg: String,
    /// `[x]` mark of selected rows.
    pub selected_mark_fg: String,

    /// Normal text color.
    pub text_normal: String,
    /// Dimmed text color (footer, secondary info).
    pub text_dim: String,

    /// Border and separator line color.
    pub border: String,

    /// Stat card text.
    pub card_fg: String,
    /// Active stat card text.
    pub card_active_fg: String,
    /// Active stat card background.
    pub card_active_bg: String,
    /// Filter chip text.
    pub chip_fg: String,

    /// Search bar border color.
    pub search_bar_border: String,
    /// Fuzzy match highlight foreground.
    pub match_highlight_fg: String,
    /// Fuzzy match highlight background.
    pub match_highlight_bg: String,

    /// Empty state message color.
    pub empty_state_fg: String,

    pub notice_info_fg: String,
    pub notice_success_fg: String,
    pub notice_warning_fg: String,
    pub notice_error_fg: String,

    /// Picker, prompt and confirmation frame.
    pub overlay_border: String,
}

impl ThemeColors {
    /// Banner color for a severity.
    #[must_use]
    pub fn notice(&self, level: NoticeLevel) -> &str {
        match level {
            NoticeLevel::Info => &self.notice_info_fg,
            NoticeLevel::Success => &self.notice_success_fg,
            NoticeLevel::Warning => &self.notice_warning_fg,
            NoticeLevel::Error => &self.notice_error_fg,
        }
    }
}

impl Theme {
    /// Loads a built-in theme by name.
    ///
    /// Supported names: `essalud-dark`, `essalud-light`.
    ///
    /// # Returns
    ///
    /// - `Some(Theme)` if the theme name is recognized
    /// - `None` if the theme name is unknown
    ///
    /// # Example
    ///
    /// ```
    /// use bolsas_queue::ui::theme::Theme;
    ///
    /// let theme = Theme::from_name("essalud-light").unwrap();
    /// assert_eq!(theme.name, "essalud-light");
    /// assert!(Theme::from_name("solarized").is_none());
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let toml_str = match name {
            "essalud-dark" => include_str!("../../themes/essalud-dark.toml"),
            "essalud-light" => include_str!("../../themes/essalud-light.toml"),
            _ => return None,
        };

        toml::from_str(toml_str).ok()
    }

    /// Loads a theme from a TOML file.
    ///
    /// # Parameters
    ///
    /// * `path` - Path to the TOML file
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Io`] if the file cannot be read and
    /// [`QueueError::Theme`] if the TOML content cannot be parsed (invalid
    /// syntax, missing fields, type mismatches).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;

        toml::from_str(&contents).map_err(|e| QueueError::Theme(format!("Failed to parse theme TOML: {e}")))
    }

    /// Palette with plain greys, used if a built-in theme fails to parse.
    fn monochrome() -> Self {
        let grey = |hex: &str| hex.to_string();
        Self {
            name: "monochrome".to_string(),
            colors: ThemeColors {
                header_fg: grey("#ffffff"),
                header_bg: None,
                selection_fg: grey("#000000"),
                selection_bg: grey("#c0c0c0"),
                selected_mark_fg: grey("#ffffff"),
                text_normal: grey("#d0d0d0"),
                text_dim: grey("#808080"),
                border: grey("#606060"),
                card_fg: grey("#d0d0d0"),
                card_active_fg: grey("#000000"),
                card_active_bg: grey("#d0d0d0"),
                chip_fg: grey("#ffffff"),
                search_bar_border: grey("#c0c0c0"),
                match_highlight_fg: grey("#000000"),
                match_highlight_bg: grey("#ffffff"),
                empty_state_fg: grey("#c0c0c0"),
                notice_info_fg: grey("#d0d0d0"),
                notice_success_fg: grey("#ffffff"),
                notice_warning_fg: grey("#ffffff"),
                notice_error_fg: grey("#ffffff"),
                overlay_border: grey("#c0c0c0"),
            },
        }
    }

    /// Converts a hex color to RGB tuple.
    ///
    /// Strips `#` prefix if present, validates length, and parses hex digits.
    /// Returns `(255, 255, 255)` (white) on parse errors.
    fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
        let hex = hex.trim_start_matches('#').trim();

        if hex.len() != 6 || !hex.is_ascii() {
            return (255, 255, 255);
        }

        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(255);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(255);

        (r, g, b)
    }

    /// Generates an ANSI 24-bit foreground color escape sequence.
    ///
    /// # Example
    ///
    /// ```
    /// use bolsas_queue::ui::theme::Theme;
    ///
    /// assert_eq!(Theme::fg("#58a6ff"), "\u{1b}[38;2;88;166;255m");
    /// ```
    #[must_use]
    pub fn fg(hex: &str) -> String {
        let (r, g, b) = Self::hex_to_rgb(hex);
        format!("\u{001b}[38;2;{r};{g};{b}m")
    }

    /// Generates an ANSI 24-bit background color escape sequence.
    #[must_use]
    pub fn bg(hex: &str) -> String {
        let (r, g, b) = Self::hex_to_rgb(hex);
        format!("\u{001b}[48;2;{r};{g};{b}m")
    }

    /// Returns the ANSI bold escape sequence (`\x1b[1m`).
    #[must_use]
    pub const fn bold() -> &'static str {
        "\u{001b}[1m"
    }

    /// Returns the ANSI dim escape sequence (`\x1b[2m`).
    #[must_use]
    pub const fn dim() -> &'static str {
        "\u{001b}[2m"
    }

    /// Returns the ANSI reset escape sequence (`\x1b[0m`).
    ///
    /// Clears all styling (colors, bold, dim, etc.).
    #[must_use]
    pub const fn reset() -> &'static str {
        "\u{001b}[0m"
    }
}

impl Default for Theme {
    /// Returns the default theme (`essalud-dark`).
    fn default() -> Self {
        Self::from_name(DEFAULT_THEME).unwrap_or_else(|| {
            tracing::warn!(theme = DEFAULT_THEME, "built-in theme failed to parse, using monochrome");
            Self::monochrome()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn built_in_themes_parse() {
        assert_eq!(Theme::default().name, DEFAULT_THEME);
        assert!(Theme::from_name("essalud-light").is_some());
    }

    #[test]
    fn malformed_hex_falls_back_to_white() {
        assert_eq!(Theme::hex_to_rgb("#zzz"), (255, 255, 255));
        assert_eq!(Theme::hex_to_rgb("ñññ"), (255, 255, 255));
        assert_eq!(Theme::hex_to_rgb("#000000"), (0, 0, 0));
    }

    #[test]
    fn theme_file_round_trips_and_rejects_garbage() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        let serialized = toml::to_string(&Theme::monochrome()).unwrap();
        good.write_all(serialized.as_bytes()).unwrap();
        assert_eq!(Theme::from_file(good.path()).unwrap().name, "monochrome");

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        bad.write_all(b"name = 3").unwrap();
        assert!(matches!(Theme::from_file(bad.path()), Err(QueueError::Theme(_))));
        assert!(matches!(Theme::from_file("/nonexistent/theme.toml"), Err(QueueError::Io(_))));
    }
}
