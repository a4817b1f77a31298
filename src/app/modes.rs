//! Input mode state machine for the queue view.
//!
//! The mode decides how a key is interpreted. Row-level modes capture the
//! target solicitud id on entry, so moving the cursor while a chooser is open
//! can never redirect the mutation to another row.
//!
//! # Example
//!
//! ```
//! use bolsas_queue::app::modes::{InputMode, PickerPurpose};
//!
//! let mode = InputMode::Picker(PickerPurpose::AssignManager);
//! assert!(mode.captures_text());
//! assert!(!InputMode::Normal.captures_text());
//! ```

use super::query::FilterDimension;
use crate::backend::ReminderChannel;

/// What a picker submission does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerPurpose {
    /// Choose which filter dimension to edit next.
    ChooseDimension,
    /// Set the value of one filter dimension.
    Filter(FilterDimension),
    /// Assign the selection to a case manager.
    AssignManager,
    /// Move the selection to another bag type.
    ChangeBagType,
    /// Set the attention facility of one row.
    AttentionFacility { id: i64 },
    /// Sort the loaded page.
    SortColumn,
    /// Channel for a reminder to one row.
    ReminderChannel { id: i64 },
}

/// What a free-text prompt submission does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    /// `AAAA-MM-DD`, or empty to clear.
    FilterDate(FilterDimension),
    /// `phone[,alternate]`.
    Phones { id: i64 },
    /// `AAAA-MM-DD`.
    PreferredDate { id: i64 },
    /// Optional reminder text.
    ReminderMessage { id: i64, channel: ReminderChannel },
}

impl PromptPurpose {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FilterDate(FilterDimension::DateEnd) => "Fecha hasta (AAAA-MM-DD, vacío = todas)",
            Self::FilterDate(_) => "Fecha desde (AAAA-MM-DD, vacío = todas)",
            Self::Phones { .. } => "Teléfonos (principal[,alterno])",
            Self::PreferredDate { .. } => "Fecha preferida (AAAA-MM-DD)",
            Self::ReminderMessage { .. } => "Mensaje del recordatorio (opcional)",
        }
    }
}

/// Current input handling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Navigation and commands.
    #[default]
    Normal,
    /// Typing digits into the search term; applied on every keystroke.
    Search,
    /// An option picker is open.
    Picker(PickerPurpose),
    /// A text prompt is open.
    Prompt(PromptPurpose),
    /// Waiting for y/n on a pending delete.
    ConfirmDelete,
}

impl InputMode {
    /// Whether printable keys are text rather than commands.
    #[must_use]
    pub const fn captures_text(self) -> bool {
        matches!(self, Self::Search | Self::Picker(_) | Self::Prompt(_))
    }
}
