//! Header component renderer.
//!
//! Renders the title bar: plugin title on the left, pagination summary on the
//! right, and a loading marker while a list request is in flight.

use crate::ui::helpers::{char_len, position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::HeaderInfo;

const LOADING_MARKER: &str = "⟳ ";

/// Renders the header title bar at the specified row.
///
/// # Layout
///
/// ```text
/// [title][loading marker]          [pagination summary ]
/// ```
///
/// The pagination summary is dropped first when the terminal is too narrow.
///
/// # Returns
///
/// The next available row position (row + 1)
pub fn render_header(row: usize, header: &HeaderInfo, theme: &Theme, cols: usize) -> usize {
    let mut left = header.title.clone();
    if header.is_loading {
        left.push_str(LOADING_MARKER);
    }
    let left = truncate(&left, cols);
    let right = format!("{} ", header.pagination);
    let room = cols.saturating_sub(char_len(&left));
    let right = if char_len(&right) <= room { right } else { String::new() };

    position_cursor(row, 1);
    print!("{}", Theme::bold());
    print!("{}", Theme::fg(&theme.colors.header_fg));
    if let Some(bg) = &theme.colors.header_bg {
        print!("{}", Theme::bg(bg));
    }

    print!("{left}");
    print!("{}", " ".repeat(room.saturating_sub(char_len(&right))));
    print!("{right}");

    print!("{}", Theme::reset());
    row + 1
}
