//! Stat card strip renderer.
//!
//! One line of `label count` cards. The active card (its filter is applied) is
//! drawn inverted; the focused card carries a `▸` marker.

use crate::ui::helpers::{char_len, position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::CardInfo;

/// Renders the card strip at the specified row.
///
/// Cards that do not fit in `cols` are omitted.
///
/// # Returns
///
/// The next available row position (row + 1)
pub fn render_cards(row: usize, cards: &[CardInfo], theme: &Theme, cols: usize) -> usize {
    position_cursor(row, 1);
    let mut used = 0;

    for card in cards {
        let marker = if card.is_focused { "▸" } else { " " };
        let text = format!("{marker}{} {} ", card.label, card.count);
        let len = char_len(&text);
        if used + len + 1 > cols {
            break;
        }

        if card.is_active {
            print!("{}", Theme::fg(&theme.colors.card_active_fg));
            print!("{}", Theme::bg(&theme.colors.card_active_bg));
        } else {
            print!("{}", Theme::fg(&theme.colors.card_fg));
        }
        if card.is_focused {
            print!("{}", Theme::bold());
        }
        print!("{}", truncate(&text, cols - used));
        print!("{} ", Theme::reset());
        used += len + 1;
    }

    print!("{}", " ".repeat(cols.saturating_sub(used)));
    row + 1
}
