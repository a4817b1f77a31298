//! Path manipulation utilities for Zellij sandbox environment.
//!
//! The plugin only touches the filesystem for two things: user theme files and
//! the span log. Both are resolved here so the sandbox mapping lives in one
//! place.

use std::path::PathBuf;

/// File the span exporter appends to, inside [`get_data_dir`].
pub const SPAN_FILE_NAME: &str = "bolsas-queue-spans.jsonl";

/// Returns the data directory for the plugin's span log.
///
/// The directory is located at `/host/.local/share/zellij/bolsas-queue` in the
/// Zellij sandbox. `/host` points to the cwd of the last focused terminal, or the
/// folder where Zellij was started, which usually makes this
/// `~/.local/share/zellij/bolsas-queue`.
///
/// # Examples
///
/// ```
/// use bolsas_queue::infrastructure::get_data_dir;
///
/// let data_dir = get_data_dir();
/// assert_eq!(data_dir.to_str().unwrap(), "/host/.local/share/zellij/bolsas-queue");
/// ```
#[must_use]
pub fn get_data_dir() -> PathBuf {
    PathBuf::from("/host/.local/share/zellij").join("bolsas-queue")
}

/// Expands tilde paths to use the `/host` prefix for Zellij sandbox.
///
/// Used for the `theme_file` option, which users write relative to their home.
///
/// # Examples
///
/// ```
/// use bolsas_queue::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("~/themes/queue.toml"), "/host/themes/queue.toml");
/// assert_eq!(expand_tilde("~"), "/host");
/// assert_eq!(expand_tilde("/absolute/path"), "/absolute/path");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") {
        path.replacen('~', "/host", 1)
    } else if path == "~" {
        "/host".to_string()
    } else {
        path.to_string()
    }
}
