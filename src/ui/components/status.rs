//! Selection summary and banner lines.

use crate::ui::helpers::{fit, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::NoticeInfo;

/// Renders the selection summary, or a blank line when nothing is selected.
pub fn render_selection_bar(row: usize, summary: Option<&str>, theme: &Theme, cols: usize) -> usize {
    position_cursor(row, 1);
    print!("{}", Theme::fg(&theme.colors.selected_mark_fg));
    print!("{}", fit(summary.map_or(String::new(), |s| format!(" {s}")).as_str(), cols));
    print!("{}", Theme::reset());
    row + 1
}

/// Renders the banner in its severity color.
pub fn render_notice(row: usize, notice: Option<&NoticeInfo>, theme: &Theme, cols: usize) -> usize {
    position_cursor(row, 1);
    match notice {
        Some(notice) => {
            print!("{}", Theme::bold());
            print!("{}", Theme::fg(theme.colors.notice(notice.level)));
            print!("{}", fit(&format!(" {}", notice.text), cols));
        }
        None => print!("{}", " ".repeat(cols)),
    }
    print!("{}", Theme::reset());
    row + 1
}
