//! Empty state component renderer.
//!
//! Shown in place of the table while the first page loads, after a failed load,
//! or when no solicitud matches.

use crate::ui::helpers::{position_cursor, print_centered};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::EmptyState;

/// Renders a centered message and optional hint starting at `row`.
pub fn render_empty_state(row: usize, empty: &EmptyState, theme: &Theme, cols: usize) {
    position_cursor(row, 1);
    print!("{}", Theme::fg(&theme.colors.empty_state_fg));
    print_centered(&empty.message, cols);
    print!("{}", Theme::reset());

    if let Some(hint) = &empty.hint {
        position_cursor(row + 1, 1);
        print!("{}", Theme::dim());
        print!("{}", Theme::fg(&theme.colors.text_dim));
        print_centered(hint, cols);
        print!("{}", Theme::reset());
    }
}
