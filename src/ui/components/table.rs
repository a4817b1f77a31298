//! Table component renderer.
//!
//! Renders the queue page as fixed-width columns chosen by the view model. Each
//! row starts with a selection mark; the cursor row is drawn with the selection
//! colors across the full terminal width.

use crate::ui::helpers::{fit, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{ColumnInfo, RowItem};

const MARK_SELECTED: &str = "[x] ";
const MARK_UNSELECTED: &str = "[ ] ";

/// Renders the column titles at the specified row.
///
/// # Returns
///
/// The next available row position (row + 1)
pub fn render_table_headers(row: usize, columns: &[ColumnInfo], theme: &Theme, cols: usize) -> usize {
    position_cursor(row, 1);
    print!("{}", Theme::bold());
    print!("{}", Theme::fg(&theme.colors.header_fg));
    let mut line = " ".repeat(MARK_SELECTED.len());
    for column in columns {
        line.push_str(&fit(&column.title, column.width));
        line.push(' ');
    }
    print!("{}", fit(&line, cols));
    print!("{}", Theme::reset());
    row + 1
}

/// Renders all visible rows starting at the specified row.
///
/// # Returns
///
/// The next available row position (row + number of rows)
pub fn render_table_rows(row: usize, columns: &[ColumnInfo], items: &[RowItem], theme: &Theme, cols: usize) -> usize {
    let mut current_row = row;
    for item in items {
        current_row = render_table_row(current_row, columns, item, theme, cols);
    }
    current_row
}

/// Renders a single row.
///
/// # Styling Precedence
///
/// 1. Cursor row: selection colors over the whole line
/// 2. Selected rows: colored `[x]` mark
/// 3. Normal text color
fn render_table_row(row: usize, columns: &[ColumnInfo], item: &RowItem, theme: &Theme, cols: usize) -> usize {
    position_cursor(row, 1);

    let base = || {
        if item.is_cursor {
            format!(
                "{}{}",
                Theme::fg(&theme.colors.selection_fg),
                Theme::bg(&theme.colors.selection_bg)
            )
        } else {
            Theme::fg(&theme.colors.text_normal)
        }
    };

    print!("{}", base());
    if item.is_selected {
        if !item.is_cursor {
            print!("{}", Theme::fg(&theme.colors.selected_mark_fg));
        }
        print!("{MARK_SELECTED}");
        print!("{}", base());
    } else {
        print!("{MARK_UNSELECTED}");
    }

    let mut line = String::new();
    for (column, cell) in columns.iter().zip(&item.cells) {
        line.push_str(&fit(cell, column.width));
        line.push(' ');
    }
    print!("{}", fit(&line, cols.saturating_sub(MARK_SELECTED.len())));

    print!("{}", Theme::reset());
    row + 1
}
