//! Key bindings per input mode.
//!
//! The plugin shim converts host key events into [`Key`] values and asks
//! [`map_key`] for the matching [`Event`]. Keeping the table here rather than in
//! the shim lets it be tested without the host runtime.
//!
//! # Bindings
//!
//! Normal mode:
//! - `j`/`Down`, `k`/`Up`: Move the row cursor
//! - `h`/`Left`, `l`/`Right`, `g`/`Home`, `G`/`End`: Change page
//! - `z`: Cycle page size
//! - `/`: Search by DNI
//! - `f`: Filter picker, `x`: Clear filters, `s`: Sort the page
//! - `Tab`/`Enter`: Focus and toggle stat cards
//! - `Space`: Toggle row, `v`: Select page, `V`: Select every match, `u`: Clear selection
//! - `A`: Assign, `B`: Change bag type, `D`: Delete
//! - `P`: Phones, `I`: Attention facility, `F`: Preferred date, `N`: Reminder
//! - `R`: Retry / reload, `C`: Refresh catalogs, `q`: Close
//!
//! Text modes pass printable keys through as [`Event::Char`]; `Enter` submits and
//! `Esc` cancels. The delete confirmation answers to `y`/`n`.

use super::handler::Event;
use super::modes::InputMode;

/// Host-independent key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    /// `Ctrl+n`
    CtrlN,
    /// `Ctrl+p`
    CtrlP,
}

/// Maps a key to an event for the current mode, `None` when unbound.
///
/// # Example
///
/// ```
/// use bolsas_queue::app::handler::Event;
/// use bolsas_queue::app::keymap::{map_key, Key};
/// use bolsas_queue::app::InputMode;
///
/// assert_eq!(map_key(InputMode::Normal, Key::Char('j')), Some(Event::CursorDown));
/// assert_eq!(map_key(InputMode::Search, Key::Char('j')), Some(Event::Char('j')));
/// ```
#[must_use]
pub fn map_key(mode: InputMode, key: Key) -> Option<Event> {
    match key {
        Key::CtrlN => return Some(Event::CursorDown),
        Key::CtrlP => return Some(Event::CursorUp),
        _ => {}
    }

    match mode {
        InputMode::Normal => map_normal(key),
        InputMode::ConfirmDelete => match key {
            Key::Char('y' | 'Y' | 's' | 'S') | Key::Enter => Some(Event::ConfirmDelete),
            Key::Char('n' | 'N') | Key::Esc => Some(Event::CancelDelete),
            _ => None,
        },
        InputMode::Search | InputMode::Picker(_) | InputMode::Prompt(_) => match key {
            Key::Enter => Some(Event::Submit),
            Key::Esc => Some(Event::Cancel),
            Key::Backspace => Some(Event::Backspace),
            Key::Down => Some(Event::CursorDown),
            Key::Up => Some(Event::CursorUp),
            Key::Char(c) => Some(Event::Char(c)),
            _ => None,
        },
    }
}

fn map_normal(key: Key) -> Option<Event> {
    let event = match key {
        Key::Char('j') | Key::Down => Event::CursorDown,
        Key::Char('k') | Key::Up => Event::CursorUp,
        Key::Char('h') | Key::Left => Event::PreviousPage,
        Key::Char('l') | Key::Right => Event::NextPage,
        Key::Char('g') | Key::Home => Event::FirstPage,
        Key::Char('G') | Key::End => Event::LastPage,
        Key::Char('z') => Event::CyclePageSize,
        Key::Char('/') => Event::StartSearch,
        Key::Char('f') => Event::OpenFilterPicker,
        Key::Char('x') => Event::ClearFilters,
        Key::Char('s') => Event::OpenSortPicker,
        Key::Tab => Event::FocusNextCard,
        Key::Char('c') | Key::Enter => Event::ToggleFocusedCard,
        Key::Char(' ') => Event::ToggleRow,
        Key::Char('v') => Event::SelectPage,
        Key::Char('V') => Event::SelectAllMatching,
        Key::Char('u') => Event::ClearSelection,
        Key::Char('A') => Event::StartAssign,
        Key::Char('B') => Event::StartChangeBagType,
        Key::Char('D') => Event::StartDelete,
        Key::Char('P') => Event::EditPhones,
        Key::Char('I') => Event::EditAttentionFacility,
        Key::Char('F') => Event::EditPreferredDate,
        Key::Char('N') => Event::StartReminder,
        Key::Char('R') => Event::Retry,
        Key::Char('C') => Event::RefreshCatalogs,
        Key::Char('q') => Event::CloseFocus,
        _ => return None,
    };
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::modes::{PickerPurpose, PromptPurpose};

    #[test]
    fn text_modes_capture_command_letters() {
        let picker = InputMode::Picker(PickerPurpose::AssignManager);
        assert_eq!(map_key(picker, Key::Char('q')), Some(Event::Char('q')));
        assert_eq!(map_key(picker, Key::Enter), Some(Event::Submit));
        let prompt = InputMode::Prompt(PromptPurpose::Phones { id: 1 });
        assert_eq!(map_key(prompt, Key::Esc), Some(Event::Cancel));
    }

    #[test]
    fn confirmation_only_answers_yes_or_no() {
        assert_eq!(map_key(InputMode::ConfirmDelete, Key::Char('y')), Some(Event::ConfirmDelete));
        assert_eq!(map_key(InputMode::ConfirmDelete, Key::Esc), Some(Event::CancelDelete));
        assert_eq!(map_key(InputMode::ConfirmDelete, Key::Char('j')), None);
    }

    #[test]
    fn ctrl_navigation_works_everywhere() {
        assert_eq!(map_key(InputMode::Search, Key::CtrlN), Some(Event::CursorDown));
        assert_eq!(map_key(InputMode::Normal, Key::CtrlP), Some(Event::CursorUp));
    }
}
