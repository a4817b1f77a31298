//! Shared rendering utilities and helpers.
//!
//! This module provides low-level rendering utilities used across multiple UI
//! components: cursor positioning, width-aware truncation and padding, and
//! fuzzy match highlighting with proper ANSI escape sequence management.
//!
//! Widths are measured in characters, not bytes, so accented labels
//! ("Pediatría", "Deserción") line up like plain ASCII ones.
//!
//! # Example
//!
//! ```
//! use bolsas_queue::ui::helpers::{fit, render_highlighted_text};
//! use bolsas_queue::ui::theme::Theme;
//!
//! let theme = Theme::default();
//! render_highlighted_text("Cardiología", &[(0, 4)], &theme, false);
//! assert_eq!(fit("Cardiología", 8), "Cardiol…");
//! ```

use crate::ui::theme::Theme;

/// Positions the cursor at a specific row and column.
///
/// Uses ANSI escape sequence `\u{1b}[{row};{col}H` to move the cursor.
/// Coordinates are 1-indexed (row 1 = first row, col 1 = first column).
pub fn position_cursor(row: usize, col: usize) {
    print!("\u{1b}[{row};{col}H");
}

/// Number of characters in `text`.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Truncates `text` to `width` characters, ending in `…` when cut.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    if char_len(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}

/// Truncates or right-pads `text` to exactly `width` characters.
#[must_use]
pub fn fit(text: &str, width: usize) -> String {
    let cut = truncate(text, width);
    let padding = width.saturating_sub(char_len(&cut));
    format!("{cut}{}", " ".repeat(padding))
}

/// Prints `text` centered in `cols` columns, filling the whole line.
pub fn print_centered(text: &str, cols: usize) {
    let text = truncate(text, cols);
    let len = char_len(&text);
    let padding = cols.saturating_sub(len) / 2;
    print!("{}", " ".repeat(padding));
    print!("{text}");
    print!("{}", " ".repeat(cols.saturating_sub(padding + len)));
}

/// Renders text with highlighted character ranges for fuzzy matches.
///
/// Splits the text into highlighted and normal sections based on the provided
/// character ranges. Highlighted sections use match highlight colors unless the
/// item is under the cursor, in which case selection colors take precedence.
///
/// # Parameters
///
/// * `text` - The text to render
/// * `ranges` - Character index ranges to highlight `(start, end)` (inclusive start, exclusive end)
/// * `theme` - Active color theme for highlight colors
/// * `is_selected` - Whether the item is under the cursor (disables match highlighting)
///
/// # Output
///
/// Prints to stdout using ANSI escape sequences:
/// - Normal sections: current text color
/// - Highlighted sections: `match_highlight_fg` + `match_highlight_bg`
/// - After each highlight, `text_normal` is restored
pub fn render_highlighted_text(text: &str, ranges: &[(usize, usize)], theme: &Theme, is_selected: bool) {
    if ranges.is_empty() || is_selected {
        print!("{text}");
        return;
    }

    let chars: Vec<char> = text.chars().collect();
    let mut current_pos = 0;

    for &(start, end) in ranges {
        let start = start.min(chars.len());
        let end = end.min(chars.len());
        if start > current_pos {
            let normal_section: String = chars[current_pos..start].iter().collect();
            print!("{normal_section}");
        }

        print!("{}", Theme::fg(&theme.colors.match_highlight_fg));
        print!("{}", Theme::bg(&theme.colors.match_highlight_bg));
        let highlighted_section: String = chars[start.max(current_pos)..end.max(current_pos)].iter().collect();
        print!("{highlighted_section}");
        print!("{}", Theme::reset());
        print!("{}", Theme::fg(&theme.colors.text_normal));

        current_pos = current_pos.max(end);
    }

    if current_pos < chars.len() {
        let remaining: String = chars[current_pos..].iter().collect();
        print!("{remaining}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate("Deserción", 9), "Deserción");
        assert_eq!(truncate("Deserción", 5), "Dese…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn fit_pads_to_width() {
        assert_eq!(fit("Red", 6), "Red   ");
        assert_eq!(char_len(&fit("Atención", 4)), 4);
    }
}
