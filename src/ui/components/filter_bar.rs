//! Filter summary line renderer.
//!
//! Shows the DNI search field, one chip per active filter, and the page sort.
//! While the search term is being edited the field shows a text cursor.

use crate::ui::helpers::{char_len, position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::FilterBarInfo;

/// Renders the filter bar at the specified row.
///
/// # Returns
///
/// The next available row position (row + 1)
pub fn render_filter_bar(row: usize, bar: &FilterBarInfo, theme: &Theme, cols: usize) -> usize {
    let mut segments: Vec<(&str, String)> = Vec::new();

    if let Some(search) = &bar.search {
        let cursor = if search.is_editing { "▏" } else { "" };
        segments.push((theme.colors.search_bar_border.as_str(), format!("DNI: {}{cursor}", search.query)));
    }
    for chip in &bar.chips {
        segments.push((theme.colors.chip_fg.as_str(), format!("[{chip}]")));
    }
    if let Some(sort) = &bar.sort {
        segments.push((theme.colors.text_dim.as_str(), sort.clone()));
    }
    if segments.is_empty() {
        segments.push((theme.colors.text_dim.as_str(), "Sin filtros · f: filtrar".to_string()));
    }

    position_cursor(row, 1);
    let mut used = 0;
    for (color, text) in segments {
        if used >= cols {
            break;
        }
        let shown = truncate(&format!("{text} "), cols - used);
        used += char_len(&shown);
        print!("{}", Theme::fg(color));
        print!("{shown}");
    }
    print!("{}", " ".repeat(cols.saturating_sub(used)));
    print!("{}", Theme::reset());
    row + 1
}
