//! Composable UI component renderers.
//!
//! This module provides specialized rendering components for different UI
//! elements. Each component renders one part of the interface at a given row
//! and returns the next free row.
//!
//! # Components
//!
//! - [`header`]: Title bar with pagination summary
//! - [`cards`]: Stat cards strip
//! - [`filter_bar`]: Search term, filter chips and sort
//! - [`table`]: Queue page with responsive columns
//! - [`status`]: Selection summary and banner
//! - [`overlay`]: Picker, prompt and delete confirmation
//! - [`empty`]: Empty state message
//! - [`footer`]: Keybinding hints
//!
//! # Layout
//!
//! ```text
//! [Header]
//! [Cards]
//! [Filter bar]
//! [Border]
//! [Column titles]
//! [Rows | Empty state]      ← overlay drawn over this area
//! [Selection summary]
//! [Banner]
//! [Border]
//! [Footer]
//! ```

mod cards;
mod empty;
mod filter_bar;
mod footer;
mod header;
mod overlay;
mod status;
mod table;

use crate::ui::helpers::position_cursor;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::UIViewModel;

/// Rows below the table: selection summary, banner, border, footer.
const BOTTOM_ROWS: usize = 4;

/// Renders a horizontal border line at the specified row.
///
/// # Returns
///
/// The next available row position (row + 1)
fn render_border(row: usize, color: &str, cols: usize) -> usize {
    position_cursor(row, 1);
    print!("{}", Theme::fg(color));
    print!("{}", "─".repeat(cols));
    print!("{}", Theme::reset());
    row + 1
}

/// Renders the full layout for one frame.
///
/// # Parameters
///
/// * `vm` - View model with rows and chrome content
/// * `theme` - Active color theme
/// * `cols` - Terminal width in columns
/// * `rows` - Terminal height in rows
pub fn render_layout(vm: &UIViewModel, theme: &Theme, cols: usize, rows: usize) {
    let mut current_row = 1;

    current_row = header::render_header(current_row, &vm.header, theme, cols);
    current_row = cards::render_cards(current_row, &vm.cards, theme, cols);
    current_row = filter_bar::render_filter_bar(current_row, &vm.filter_bar, theme, cols);
    current_row = render_border(current_row, &theme.colors.border, cols);
    current_row = table::render_table_headers(current_row, &vm.columns, theme, cols);
    let table_top = current_row;

    if let Some(empty) = &vm.empty_state {
        empty::render_empty_state(table_top + 1, empty, theme, cols);
    } else {
        table::render_table_rows(table_top, &vm.columns, &vm.rows, theme, cols);
    }

    let selection_row = rows.saturating_sub(BOTTOM_ROWS - 1).max(table_top);
    let mut bottom_row = status::render_selection_bar(selection_row, vm.selection_bar.as_deref(), theme, cols);
    bottom_row = status::render_notice(bottom_row, vm.notice.as_ref(), theme, cols);
    bottom_row = render_border(bottom_row, &theme.colors.border, cols);
    footer::render_footer(bottom_row, &vm.footer, theme, cols);

    if let Some(overlay) = &vm.overlay {
        overlay::render_overlay(overlay, theme, table_top, selection_row.saturating_sub(1), cols);
    }
}
