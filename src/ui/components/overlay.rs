//! Modal overlays drawn over the table: option picker, text prompt, and delete
//! confirmation.
//!
//! Every overlay is a framed box centered horizontally and anchored at the top
//! of the table area. The picker scrolls its list so the highlighted option
//! stays visible.

use crate::ui::helpers::{char_len, fit, position_cursor, render_highlighted_text, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{ConfirmInfo, Overlay, PickerInfo, PromptInfo};

const MAX_BOX_WIDTH: usize = 72;
/// Frame rows around the picker list: top, query, separator, error, bottom.
const PICKER_CHROME: usize = 5;

/// Box geometry in terminal cells.
#[derive(Debug, Clone, Copy)]
struct Frame {
    top: usize,
    left: usize,
    inner: usize,
}

impl Frame {
    fn centered(top: usize, cols: usize) -> Self {
        let width = cols.saturating_sub(4).min(MAX_BOX_WIDTH).max(12);
        Self {
            top,
            left: cols.saturating_sub(width) / 2 + 1,
            inner: width - 2,
        }
    }

    fn border(&self, row: usize, (open, fill, close): (char, char, char), title: &str, theme: &Theme) {
        position_cursor(row, self.left);
        print!("{}", Theme::fg(&theme.colors.overlay_border));
        let title = truncate(title, self.inner.saturating_sub(2));
        let title = if title.is_empty() { String::new() } else { format!(" {title} ") };
        let rest = self.inner.saturating_sub(char_len(&title));
        print!("{open}{}{title}{}{close}", fill, fill.to_string().repeat(rest.saturating_sub(1)));
        print!("{}", Theme::reset());
    }

    /// Opens a content line; the caller prints exactly `inner` cells then calls `close`.
    fn open(&self, row: usize, theme: &Theme) {
        position_cursor(row, self.left);
        print!("{}│{}", Theme::fg(&theme.colors.overlay_border), Theme::reset());
    }

    fn close(theme: &Theme) {
        print!("{}{}│{}", Theme::reset(), Theme::fg(&theme.colors.overlay_border), Theme::reset());
    }

    fn text_line(&self, row: usize, text: &str, color: &str, theme: &Theme) {
        self.open(row, theme);
        print!("{}", Theme::fg(color));
        print!("{}", fit(text, self.inner));
        Self::close(theme);
    }
}

/// Renders `overlay` between rows `top` and `bottom` inclusive.
pub fn render_overlay(overlay: &Overlay, theme: &Theme, top: usize, bottom: usize, cols: usize) {
    let frame = Frame::centered(top, cols);
    match overlay {
        Overlay::Picker(picker) => render_picker(frame, picker, theme, bottom),
        Overlay::Prompt(prompt) => render_prompt(frame, prompt, theme),
        Overlay::Confirm(confirm) => render_confirm(frame, confirm, theme),
    }
}

fn render_picker(frame: Frame, picker: &PickerInfo, theme: &Theme, bottom: usize) {
    let capacity = (bottom + 1).saturating_sub(frame.top + PICKER_CHROME).max(1);
    let start = picker
        .selected_index
        .saturating_sub(capacity.saturating_sub(1))
        .min(picker.items.len().saturating_sub(capacity));
    let visible = picker.items.iter().enumerate().skip(start).take(capacity);

    let mut row = frame.top;
    frame.border(row, ('┌', '─', '┐'), &picker.title, theme);
    row += 1;
    frame.text_line(row, &format!("> {}▏", picker.query), &theme.colors.search_bar_border, theme);
    row += 1;
    frame.border(row, ('├', '─', '┤'), "", theme);
    row += 1;

    if picker.items.is_empty() {
        frame.text_line(row, "  Sin coincidencias", &theme.colors.text_dim, theme);
        row += 1;
    }
    for (index, item) in visible {
        let is_current = index == picker.selected_index;
        frame.open(row, theme);
        if is_current {
            print!("{}", Theme::fg(&theme.colors.selection_fg));
            print!("{}", Theme::bg(&theme.colors.selection_bg));
        } else {
            print!("{}", Theme::fg(&theme.colors.text_normal));
        }
        let label = truncate(&item.label, frame.inner.saturating_sub(2));
        print!("  ");
        render_highlighted_text(&label, &item.highlight_ranges, theme, is_current);
        print!("{}", " ".repeat(frame.inner.saturating_sub(char_len(&label) + 2)));
        Frame::close(theme);
        row += 1;
    }

    let error = picker.error.as_deref().unwrap_or_default();
    frame.text_line(row, error, &theme.colors.notice_error_fg, theme);
    frame.border(row + 1, ('└', '─', '┘'), "", theme);
}

fn render_prompt(frame: Frame, prompt: &PromptInfo, theme: &Theme) {
    frame.border(frame.top, ('┌', '─', '┐'), &prompt.label, theme);
    frame.text_line(
        frame.top + 1,
        &format!("> {}▏", prompt.input),
        &theme.colors.search_bar_border,
        theme,
    );
    let error = prompt.error.as_deref().unwrap_or_default();
    frame.text_line(frame.top + 2, error, &theme.colors.notice_error_fg, theme);
    frame.border(frame.top + 3, ('└', '─', '┘'), "Enter: aceptar · Esc: cancelar", theme);
}

fn render_confirm(frame: Frame, confirm: &ConfirmInfo, theme: &Theme) {
    frame.border(frame.top, ('┌', '─', '┐'), "Confirmar eliminación", theme);
    frame.text_line(frame.top + 1, "", &theme.colors.text_normal, theme);
    frame.text_line(
        frame.top + 2,
        &format!(" {}", confirm.message),
        &theme.colors.notice_warning_fg,
        theme,
    );
    frame.text_line(frame.top + 3, "", &theme.colors.text_normal, theme);
    frame.border(frame.top + 4, ('└', '─', '┘'), "y: eliminar · n: cancelar", theme);
}
