//! View model types representing renderable UI state.
//!
//! View models are created via `AppState::compute_viewmodel()` and consumed by
//! the renderer. They hold display-ready strings only: every fallback, label
//! lookup and count has already been resolved.
//!
//! # Example
//!
//! ```
//! use bolsas_queue::ui::viewmodel::{FooterInfo, HeaderInfo, UIViewModel};
//!
//! let vm = UIViewModel {
//!     header: HeaderInfo {
//!         title: " Bolsa de solicitudes ".to_string(),
//!         pagination: "Página 1 de 1".to_string(),
//!         is_loading: false,
//!     },
//!     footer: FooterInfo { keybindings: "q: salir".to_string() },
//!     ..UIViewModel::default()
//! };
//! assert!(vm.rows.is_empty());
//! ```

/// Complete UI view model for rendering.
#[derive(Debug, Clone, Default)]
pub struct UIViewModel {
    /// Title and pagination summary.
    pub header: HeaderInfo,

    /// Stat filter cards, in display order.
    pub cards: Vec<CardInfo>,

    /// Active filters, search term and sort.
    pub filter_bar: FilterBarInfo,

    /// Table columns that fit the terminal width.
    pub columns: Vec<ColumnInfo>,

    /// Visible window of rows.
    pub rows: Vec<RowItem>,

    /// Selection summary and promotion hint, when anything is selected.
    pub selection_bar: Option<String>,

    /// Banner message (bulk outcome, failure, progress).
    pub notice: Option<NoticeInfo>,

    /// Picker, prompt or confirmation drawn over the table.
    pub overlay: Option<Overlay>,

    /// Shown instead of the table when there is nothing to list.
    pub empty_state: Option<EmptyState>,

    /// Keybinding hints for the current mode.
    pub footer: FooterInfo,
}

/// Header bar content.
#[derive(Debug, Clone, Default)]
pub struct HeaderInfo {
    pub title: String,
    /// "Página x de y · n solicitudes · s por página".
    pub pagination: String,
    pub is_loading: bool,
}

/// One stat filter card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInfo {
    pub label: String,
    /// Count text, `…` until statistics arrive.
    pub count: String,
    pub is_active: bool,
    pub is_focused: bool,
}

/// Filter summary line.
#[derive(Debug, Clone, Default)]
pub struct FilterBarInfo {
    /// `Dimension: value` chips for every active filter.
    pub chips: Vec<String>,
    /// Search term, shown while typing or when non-empty.
    pub search: Option<SearchBarInfo>,
    /// Active sort description.
    pub sort: Option<String>,
}

/// Search bar state.
#[derive(Debug, Clone)]
pub struct SearchBarInfo {
    pub query: String,
    pub is_editing: bool,
}

/// One table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub title: String,
    pub width: usize,
}

/// One table row, cells aligned with [`UIViewModel::columns`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowItem {
    pub cells: Vec<String>,
    /// Row under the cursor.
    pub is_cursor: bool,
    /// Row part of the selection.
    pub is_selected: bool,
}

/// Severity of a banner message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Banner message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeInfo {
    pub level: NoticeLevel,
    pub text: String,
}

/// Modal content drawn over the table.
#[derive(Debug, Clone)]
pub enum Overlay {
    Picker(PickerInfo),
    Prompt(PromptInfo),
    Confirm(ConfirmInfo),
}

/// Option picker content.
#[derive(Debug, Clone)]
pub struct PickerInfo {
    pub title: String,
    pub query: String,
    pub items: Vec<PickerItem>,
    /// Cursor index within `items`.
    pub selected_index: usize,
    /// Inline validation error for the submitted value.
    pub error: Option<String>,
}

/// One picker line.
#[derive(Debug, Clone)]
pub struct PickerItem {
    pub label: String,
    /// Character ranges to highlight, end exclusive.
    pub highlight_ranges: Vec<(usize, usize)>,
}

/// Free-text prompt content.
#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub label: String,
    pub input: String,
    /// Inline validation error.
    pub error: Option<String>,
}

/// Delete confirmation content.
#[derive(Debug, Clone)]
pub struct ConfirmInfo {
    pub message: String,
}

/// Empty state message.
#[derive(Debug, Clone)]
pub struct EmptyState {
    pub message: String,
    pub hint: Option<String>,
}

/// Footer content.
#[derive(Debug, Clone, Default)]
pub struct FooterInfo {
    pub keybindings: String,
}
