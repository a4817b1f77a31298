//! Bolsas Queue: a Zellij plugin for working the solicitud queue of a
//! healthcare scheduling backend.
//!
//! Coordinators use it to page through pending solicitudes, narrow them with
//! filters and stat cards, and act on one row, a page, or every matching row:
//! assign a gestora, change the bolsa, delete, edit contact data, or send a
//! reminder.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Zellij Plugin Shim (main.rs)                       │  ← Keys, HTTP, permissions
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← Controllers
//! │  - Query, pagination, selection                     │
//! │  - Page loader, catalog cache, bulk executor        │
//! │  - Event handling and view model computation        │
//! └─────────────────────────────────────────────────────┘
//!         │                                      │
//! ┌───────────────────────┐          ┌───────────────────────┐
//! │ UI Layer (ui/)        │          │ Backend Layer         │
//! │ - Rendering           │          │ (backend/)            │
//! │ - Theming             │          │ - Request messages    │
//! │ - Components          │          │ - HTTP codec          │
//! └───────────────────────┘          └───────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Infrastructure & Domain Layers                     │
//! │  - Sandbox paths (infrastructure/)                  │
//! │  - Errors, records, catalogs (domain/)              │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - OpenTelemetry tracing to a JSON-lines file       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The library never calls the Zellij host API. The handler returns
//! [`Action`]s and the shim in `main.rs` executes them, which keeps every
//! controller testable natively.
//!
//! # Configuration
//!
//! ```kdl
//! pane {
//!     plugin location="file:/path/to/bolsas-queue.wasm" {
//!         api_base_url "https://citas.example.org/api"
//!         auth_token "eyJhbGciOi..."
//!         page_size "50"
//!         theme "essalud-light"
//!         trace_level "debug"
//!     }
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use bolsas_queue::{handle_event, initialize, Config, Event};
//!
//! let mut state = initialize(&Config::default());
//! let (_, actions) = handle_event(&mut state, &Event::Mounted)?;
//! assert!(!actions.is_empty());
//! # Ok::<(), bolsas_queue::QueueError>(())
//! ```

#![allow(clippy::multiple_crate_versions)]

pub mod app;
pub mod backend;
pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod ui;

pub use app::{handle_event, Action, AppState, Event, InputMode};
pub use backend::codec::ApiConfig;
pub use domain::{QueueError, Result, SolicitudRecord};
pub use ui::Theme;

use std::collections::BTreeMap;

use app::pagination::{DEFAULT_PAGE_SIZE, PAGE_SIZES};

/// Backend root used when `api_base_url` is not configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Plugin configuration parsed from Zellij's configuration system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the solicitud API, without a trailing slash.
    pub api_base_url: String,

    /// Bearer token sent as `Authorization`.
    pub auth_token: Option<String>,

    /// Initial page size, always one of [`PAGE_SIZES`].
    pub page_size: u32,

    /// Built-in theme name. Ignored if `theme_file` is set.
    pub theme_name: Option<String>,

    /// Path to a custom TOML theme file; `~` resolves under `/host`.
    pub theme_file: Option<String>,

    /// `EnvFilter` directive for exported spans. Default: `"info"`.
    pub trace_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            theme_name: None,
            theme_file: None,
            trace_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parses configuration from Zellij's configuration map.
    ///
    /// Blank values count as missing. A `page_size` that is not a number or
    /// not one of the offered sizes falls back to the default with a warning.
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use bolsas_queue::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("api_base_url".to_string(), "https://citas.test/api/".to_string());
    /// map.insert("page_size".to_string(), "50".to_string());
    ///
    /// let config = Config::from_zellij(&map);
    /// assert_eq!(config.api_base_url, "https://citas.test/api");
    /// assert_eq!(config.page_size, 50);
    /// ```
    #[must_use]
    pub fn from_zellij(config: &BTreeMap<String, String>) -> Self {
        let value = |key: &str| {
            config
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        let defaults = Self::default();

        let page_size = match value("page_size") {
            None => defaults.page_size,
            Some(raw) => match raw.parse::<u32>() {
                Ok(size) if PAGE_SIZES.contains(&size) => size,
                _ => {
                    tracing::warn!(page_size = %raw, "unsupported page size, using default");
                    defaults.page_size
                }
            },
        };

        Self {
            api_base_url: value("api_base_url")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            auth_token: value("auth_token"),
            page_size,
            theme_name: value("theme"),
            theme_file: value("theme_file"),
            trace_level: value("trace_level").unwrap_or(defaults.trace_level),
        }
    }

    /// Connection settings for the HTTP codec.
    #[must_use]
    pub fn api(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_base_url.clone(),
            auth_token: self.auth_token.clone(),
        }
    }

    /// Resolves the theme: file first, then built-in name, then the default.
    ///
    /// Load failures are logged and fall back to the default theme.
    #[must_use]
    pub fn theme(&self) -> Theme {
        if let Some(theme_file) = &self.theme_file {
            let path = infrastructure::expand_tilde(theme_file);
            return Theme::from_file(&path).unwrap_or_else(|e| {
                tracing::warn!(theme_file = %path, error = %e, "failed to load theme from file, using default");
                Theme::default()
            });
        }

        self.theme_name.as_ref().map_or_else(Theme::default, |theme_name| {
            Theme::from_name(theme_name).unwrap_or_else(|| {
                tracing::warn!(theme_name = %theme_name, "unknown theme, using default");
                Theme::default()
            })
        })
    }
}

/// Builds the initial application state.
///
/// Nothing is requested yet; the shim sends [`Event::Mounted`] once the host
/// grants web access, which loads catalogs and then the first page.
#[must_use]
pub fn initialize(config: &Config) -> AppState {
    tracing::debug!(api_base_url = %config.api_base_url, page_size = config.page_size, "initializing bolsas-queue plugin");
    AppState::new(config.theme(), config.page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn empty_map_yields_defaults() {
        assert_eq!(Config::from_zellij(&BTreeMap::new()), Config::default());
    }

    #[test]
    fn invalid_page_sizes_fall_back() {
        assert_eq!(Config::from_zellij(&map(&[("page_size", "25")])).page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(Config::from_zellij(&map(&[("page_size", "veinte")])).page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(Config::from_zellij(&map(&[("page_size", "100")])).page_size, 100);
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = Config::from_zellij(&map(&[("auth_token", "  "), ("trace_level", "")]));
        assert_eq!(config.auth_token, None);
        assert_eq!(config.trace_level, "info");
    }

    #[test]
    fn api_settings_carry_the_token() {
        let config = Config::from_zellij(&map(&[("auth_token", "abc"), ("api_base_url", "https://x.test/api")]));
        let api = config.api();
        assert_eq!(api.base_url, "https://x.test/api");
        assert_eq!(api.auth_token.as_deref(), Some("abc"));
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let config = Config {
            theme_name: Some("solarized".to_string()),
            ..Config::default()
        };
        assert_eq!(config.theme().name, ui::theme::DEFAULT_THEME);

        let config = Config {
            theme_file: Some("/nonexistent/theme.toml".to_string()),
            ..Config::default()
        };
        assert_eq!(config.theme().name, ui::theme::DEFAULT_THEME);
    }
}
