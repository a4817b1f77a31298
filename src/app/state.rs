//! Application state management and view model computation.
//!
//! [`AppState`] owns one instance of every queue controller plus the transient
//! UI state (input mode, picker, prompt buffer, cursor, banner). It is the single
//! place where the cross-controller invariants are enforced:
//!
//! - a query change resets the page to 0, clears the selection and schedules
//!   exactly one reload, all in [`AppState::on_query_changed`];
//! - page and page-size changes clear the selection;
//! - no list request leaves before every catalog kind has settled;
//! - every request is tagged with the mount epoch.
//!
//! View models are computed on demand from state snapshots.
//!
//! # Example
//!
//! ```
//! use bolsas_queue::app::AppState;
//! use bolsas_queue::ui::theme::Theme;
//!
//! let mut state = AppState::new(Theme::default(), 20);
//! let actions = state.mount();
//! assert_eq!(state.epoch, 1);
//! assert!(!actions.is_empty());
//! let viewmodel = state.compute_viewmodel(30, 120);
//! assert!(viewmodel.rows.is_empty());
//! ```

use super::actions::Action;
use super::bulk::{BulkActionExecutor, BulkOutcome};
use super::catalogs::CatalogCache;
use super::loader::{ListLoader, QueueRow, RequestKey, EM_DASH};
use super::modes::{InputMode, PickerPurpose, PromptPurpose};
use super::pagination::PaginationState;
use super::picker::{Picker, PickerOption};
use super::query::{FilterDimension, QueryChanged, QueryStateManager, SortColumn, SortDirection};
use super::selection::{SelectionMode, SelectionState, SelectionTarget};
use super::stat_cards::{StatCard, StatFilterCards};
use crate::backend::{BackendRequest, Outbound, ReminderChannel, SearchPage};
use crate::domain::catalog::MANAGEMENT_STATE_FALLBACK;
use crate::domain::{ApiFailure, BagState, CatalogEntry, CatalogKind, QueueError, StatCount, StatDimension};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{
    CardInfo, ColumnInfo, ConfirmInfo, EmptyState, FilterBarInfo, FooterInfo, HeaderInfo, NoticeInfo, NoticeLevel,
    Overlay, PickerInfo, PickerItem, PromptInfo, RowItem, SearchBarInfo, UIViewModel,
};

/// Medical-condition values the backend filters on.
pub const MEDICAL_CONDITIONS: [&str; 4] = ["Pendiente", "Atendido", "Deserción", "Sin atención"];

/// Rows taken by header, cards, filter bar, column titles, selection bar,
/// notice and footer.
const CHROME_ROWS: usize = 9;
/// Width of the `[x]` selection mark plus its gap.
const SELECTION_MARK_WIDTH: usize = 4;

/// Banner message stored in state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    /// Set for list-load failures; cleared by the next committed page.
    pub retry: bool,
}

impl Notice {
    #[must_use]
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            retry: false,
        }
    }
}

/// Central application state container.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Mount epoch; replies tagged with another epoch are dropped.
    pub epoch: u64,
    pub catalogs: CatalogCache,
    pub query: QueryStateManager,
    pub pagination: PaginationState,
    pub loader: ListLoader,
    pub selection: SelectionState,
    pub bulk: BulkActionExecutor,
    pub cards: StatFilterCards,

    /// Current input handling mode.
    pub input_mode: InputMode,

    /// Option list while `input_mode` is a picker.
    pub picker: Picker,

    /// Text typed into the open prompt.
    pub prompt_input: String,

    /// Inline validation error shown inside the open picker or prompt.
    pub field_error: Option<String>,

    /// Index of the row under the cursor within the loaded page.
    pub cursor: usize,

    /// Banner message.
    pub notice: Option<Notice>,

    /// Color scheme for UI rendering.
    pub theme: Theme,

    default_page_size: u32,
    list_released: bool,
}

impl AppState {
    /// Creates an unmounted state.
    ///
    /// # Parameters
    ///
    /// * `theme` - Color scheme for UI rendering
    /// * `page_size` - Initial page size; invalid values fall back to 20
    #[must_use]
    pub fn new(theme: Theme, page_size: u32) -> Self {
        Self {
            epoch: 0,
            catalogs: CatalogCache::default(),
            query: QueryStateManager::default(),
            pagination: PaginationState::new(page_size),
            loader: ListLoader::default(),
            selection: SelectionState::default(),
            bulk: BulkActionExecutor::default(),
            cards: StatFilterCards::default(),
            input_mode: InputMode::Normal,
            picker: Picker::default(),
            prompt_input: String::new(),
            field_error: None,
            cursor: 0,
            notice: None,
            theme,
            default_page_size: page_size,
            list_released: false,
        }
    }

    /// Starts a fresh controller lifecycle.
    ///
    /// Every controller is reset, the epoch is bumped so replies to requests of
    /// the previous mount are dropped, and the catalog load round begins. The
    /// first list request follows once catalogs are ready.
    ///
    /// # Returns
    ///
    /// One request per catalog kind and statistics dimension.
    pub fn mount(&mut self) -> Vec<Action> {
        let epoch = self.epoch + 1;
        let theme = std::mem::take(&mut self.theme);
        *self = Self::new(theme, self.default_page_size);
        self.epoch = epoch;
        tracing::debug!(epoch, "queue controller mounted");
        self.refresh_catalogs()
    }

    /// Wraps a request in the current epoch.
    #[must_use]
    pub fn send(&self, request: BackendRequest) -> Action {
        Action::Send(Outbound {
            epoch: self.epoch,
            request,
        })
    }

    /// Reloads every catalog and statistic under a new generation.
    pub fn refresh_catalogs(&mut self) -> Vec<Action> {
        let plan = self.catalogs.begin_load();
        let generation = plan.generation;
        plan.catalogs
            .into_iter()
            .map(|kind| BackendRequest::load_catalog(kind, generation))
            .chain(
                plan.statistics
                    .into_iter()
                    .map(|dimension| BackendRequest::load_statistics(dimension, generation)),
            )
            .map(|request| self.send(request))
            .collect()
    }

    /// What the list should show right now.
    #[must_use]
    pub fn request_key(&self) -> RequestKey {
        RequestKey {
            query: self.query.canonical(),
            page: self.pagination.page_index(),
            size: self.pagination.page_size(),
        }
    }

    /// Requests the current page unless the catalog gate is still closed.
    ///
    /// `force` re-issues even when the same key is on screen or in flight.
    pub fn reload(&mut self, force: bool) -> Vec<Action> {
        if !self.list_released {
            tracing::debug!("list request held until catalogs are ready");
            return vec![];
        }
        let key = self.request_key();
        self.loader
            .request(key, force)
            .map(|request| self.send(request))
            .into_iter()
            .collect()
    }

    /// Applies the three reset effects of a query change together.
    pub fn on_query_changed(&mut self, change: QueryChanged) -> Vec<Action> {
        tracing::debug!(revision = change.revision, "query changed, back to page 0");
        self.pagination.on_query_changed();
        self.selection.clear();
        self.cursor = 0;
        self.reload(false)
    }

    /// Moves to a page, clamped; clears the selection when the page changes.
    pub fn go_to_page(&mut self, target: i64) -> Vec<Action> {
        if !self.pagination.change_page(target) {
            return vec![];
        }
        self.selection.clear();
        self.cursor = 0;
        self.reload(false)
    }

    /// Moves by `delta` pages.
    pub fn step_page(&mut self, delta: i64) -> Vec<Action> {
        self.go_to_page(i64::from(self.pagination.page_index()) + delta)
    }

    pub fn last_page(&mut self) -> Vec<Action> {
        self.go_to_page(i64::from(self.pagination.total_pages()) - 1)
    }

    /// Switches to the next allowed page size, from page 0.
    pub fn cycle_page_size(&mut self) -> Vec<Action> {
        let next = self.pagination.next_page_size();
        match self.pagination.set_page_size(next) {
            Ok(true) => {
                tracing::debug!(page_size = next, "page size changed");
                self.selection.clear();
                self.cursor = 0;
                self.reload(false)
            }
            Ok(false) => vec![],
            Err(e) => {
                self.report_error(&e);
                vec![]
            }
        }
    }

    /// Applies one catalog reply and releases the first list request once
    /// every kind has settled.
    pub fn apply_catalog(
        &mut self,
        generation: u64,
        kind: CatalogKind,
        outcome: Result<Vec<CatalogEntry>, ApiFailure>,
    ) -> Vec<Action> {
        if !self.catalogs.apply_catalog(generation, kind, outcome) {
            return vec![];
        }
        if self.loader.has_loaded() {
            self.loader.remap(&self.catalogs, self.query.state().sort);
        }
        if !self.list_released && self.catalogs.catalogs_ready() {
            self.list_released = true;
            tracing::debug!("catalogs ready, issuing first list request");
            return self.reload(false);
        }
        vec![]
    }

    /// Applies one statistics reply. Returns whether it was current.
    pub fn apply_statistics(
        &mut self,
        generation: u64,
        dimension: StatDimension,
        outcome: Result<Vec<StatCount>, ApiFailure>,
    ) -> bool {
        self.catalogs.apply_statistics(generation, dimension, outcome)
    }

    /// Commits a page reply when its token is current.
    ///
    /// # Returns
    ///
    /// Whether anything changed, and a follow-up request when the page index
    /// fell beyond the new last page (e.g. after deleting its last rows).
    pub fn apply_page(&mut self, token: u64, page: SearchPage) -> (bool, Vec<Action>) {
        let total = page.total_elements;
        let sort = self.query.state().sort;
        if !self.loader.commit(token, page, &self.catalogs, sort) {
            return (false, vec![]);
        }
        self.pagination.record_response(total);
        self.selection.retain_loaded(&self.loader.loaded_ids());
        self.clamp_cursor();
        if self.notice.as_ref().is_some_and(|notice| notice.retry) {
            self.notice = None;
        }

        let last = self.pagination.total_pages().saturating_sub(1);
        if self.pagination.page_index() > last {
            return (true, self.go_to_page(i64::from(last)));
        }
        (true, vec![])
    }

    /// Records a failed list load; rows already on screen stay.
    pub fn fail_page(&mut self, token: u64, failure: ApiFailure) -> bool {
        let text = failure.user_message();
        let retry = failure.is_retryable();
        if !self.loader.fail(token, failure) {
            return false;
        }
        self.notice = Some(Notice {
            level: NoticeLevel::Error,
            text,
            retry,
        });
        true
    }

    /// Reacts to a finished bulk or row action.
    pub fn finish_action(&mut self, outcome: &BulkOutcome) -> Vec<Action> {
        let level = if outcome.is_error() {
            NoticeLevel::Error
        } else if outcome.failure_count > 0 || outcome.changed_nothing() {
            NoticeLevel::Warning
        } else {
            NoticeLevel::Success
        };
        self.notice = Some(Notice::new(level, outcome.message.clone()));
        if !outcome.should_refresh() {
            return vec![];
        }
        self.selection.clear();
        self.reload(true)
    }

    /// Shows a local error as a banner, or inline when an input is open.
    pub fn report_error(&mut self, error: &QueueError) {
        tracing::debug!(error = %error, "reporting error");
        let text = error.to_string();
        if matches!(self.input_mode, InputMode::Picker(_) | InputMode::Prompt(_)) {
            self.field_error = Some(text);
        } else {
            let level = if matches!(error, QueueError::Busy | QueueError::EmptySelection) {
                NoticeLevel::Warning
            } else {
                NoticeLevel::Error
            };
            self.notice = Some(Notice::new(level, text));
        }
    }

    pub fn move_cursor_down(&mut self) {
        let len = self.loader.rows().len();
        if len > 0 {
            self.cursor = (self.cursor + 1) % len;
        }
    }

    pub fn move_cursor_up(&mut self) {
        let len = self.loader.rows().len();
        if len == 0 {
            return;
        }
        self.cursor = if self.cursor == 0 { len - 1 } else { self.cursor - 1 };
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.loader.rows().len().saturating_sub(1));
    }

    /// Row under the cursor.
    #[must_use]
    pub fn current_row(&self) -> Option<&QueueRow> {
        self.loader.rows().get(self.cursor)
    }

    /// What bulk actions should operate on.
    #[must_use]
    pub fn selection_target(&self) -> Option<SelectionTarget> {
        self.selection.target(self.pagination.total_elements())
    }

    /// Opens a picker for `purpose`.
    pub fn open_picker(&mut self, purpose: PickerPurpose) {
        let (title, options) = self.options_for(purpose);
        self.picker = Picker::new(title, options);
        self.field_error = None;
        self.input_mode = InputMode::Picker(purpose);
    }

    /// Opens a prompt for `purpose` with `initial` text.
    pub fn open_prompt(&mut self, purpose: PromptPurpose, initial: String) {
        self.prompt_input = initial;
        self.field_error = None;
        self.input_mode = InputMode::Prompt(purpose);
    }

    /// Closes any picker or prompt.
    pub fn close_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.picker = Picker::default();
        self.prompt_input.clear();
        self.field_error = None;
    }

    /// Title and options for a picker.
    #[must_use]
    pub fn options_for(&self, purpose: PickerPurpose) -> (String, Vec<PickerOption>) {
        match purpose {
            PickerPurpose::ChooseDimension => {
                let options = FilterDimension::ALL
                    .iter()
                    .enumerate()
                    .map(|(index, dimension)| {
                        let current = self
                            .query
                            .state()
                            .value_of(*dimension)
                            .map_or_else(|| "Todos".to_string(), |value| self.display_value(*dimension, &value));
                        PickerOption::new(index.to_string(), format!("{}: {current}", dimension.label()))
                    })
                    .collect();
                ("Filtrar por".to_string(), options)
            }
            PickerPurpose::Filter(dimension) => (dimension.label().to_string(), self.filter_options(dimension)),
            PickerPurpose::AssignManager => (
                "Asignar gestora".to_string(),
                Self::id_options(self.catalogs.entries(CatalogKind::CaseManagers)),
            ),
            PickerPurpose::ChangeBagType => (
                "Cambiar tipo de bolsa".to_string(),
                Self::id_options(self.catalogs.entries(CatalogKind::BagTypes)),
            ),
            PickerPurpose::AttentionFacility { .. } => (
                "IPRESS de atención".to_string(),
                Self::id_options(self.catalogs.entries(CatalogKind::Facilities)),
            ),
            PickerPurpose::SortColumn => {
                let sort = self.query.state().sort;
                let options = SortColumn::ALL
                    .iter()
                    .enumerate()
                    .map(|(index, column)| {
                        let marker = match sort {
                            Some(spec) if spec.column == *column => direction_arrow(spec.direction),
                            _ => "",
                        };
                        PickerOption::new(index.to_string(), format!("{}{marker}", column.label()))
                    })
                    .collect();
                ("Ordenar página por".to_string(), options)
            }
            PickerPurpose::ReminderChannel { .. } => (
                "Enviar recordatorio por".to_string(),
                ReminderChannel::ALL
                    .iter()
                    .map(|channel| PickerOption::new(channel.code(), channel.label()))
                    .collect(),
            ),
        }
    }

    fn id_options(entries: &[CatalogEntry]) -> Vec<PickerOption> {
        entries
            .iter()
            .map(|entry| PickerOption::new(entry.id.to_string(), entry.label.clone()))
            .collect()
    }

    fn counted(&self, dimension: Option<StatDimension>, value: &str, label: &str) -> String {
        match dimension.and_then(|d| self.catalogs.stat_count(d, value)) {
            Some(count) => format!("{label} ({count})"),
            None => label.to_string(),
        }
    }

    fn filter_options(&self, dimension: FilterDimension) -> Vec<PickerOption> {
        let stat = stat_dimension(dimension);
        let mut options = vec![PickerOption::new("todos", "Todos")];
        let from_catalog = |kind: CatalogKind| -> Vec<PickerOption> {
            self.catalogs
                .entries(kind)
                .iter()
                .map(|entry| PickerOption::new(entry.code.clone(), self.counted(stat, &entry.code, &entry.label)))
                .collect()
        };

        match dimension {
            FilterDimension::BagTypes => {
                let chosen = &self.query.state().bag_types;
                options.extend(self.catalogs.entries(CatalogKind::BagTypes).iter().map(|entry| {
                    let mark = if chosen.contains(&entry.code) { "[x] " } else { "[ ] " };
                    PickerOption::new(
                        entry.code.clone(),
                        format!("{mark}{}", self.counted(stat, &entry.code, &entry.label)),
                    )
                }));
            }
            FilterDimension::Network => options.extend(from_catalog(CatalogKind::Networks)),
            FilterDimension::AscriptionFacility | FilterDimension::AttentionFacility => {
                options.extend(from_catalog(CatalogKind::Facilities));
            }
            FilterDimension::Specialty => options.extend(from_catalog(CatalogKind::Specialties)),
            FilterDimension::ManagementState => {
                let dynamic = from_catalog(CatalogKind::ManagementStates);
                if dynamic.is_empty() {
                    options.extend(
                        MANAGEMENT_STATE_FALLBACK
                            .iter()
                            .map(|(code, label)| PickerOption::new(*code, self.counted(stat, code, label))),
                    );
                } else {
                    options.extend(dynamic);
                }
            }
            FilterDimension::AppointmentType => {
                options.extend(
                    self.catalogs
                        .stat_values(StatDimension::AppointmentType)
                        .iter()
                        .map(|stat| PickerOption::new(stat.value.clone(), format!("{} ({})", stat.value, stat.count))),
                );
            }
            FilterDimension::Assignment => {
                options.push(PickerOption::new("asignados", self.counted(stat, "asignados", "Asignados")));
                options.push(PickerOption::new("sin_asignar", self.counted(stat, "sin_asignar", "Sin asignar")));
                options.extend(
                    self.catalogs
                        .entries(CatalogKind::CaseManagers)
                        .iter()
                        .map(|entry| PickerOption::new(entry.id.to_string(), format!("Gestora: {}", entry.label))),
                );
            }
            FilterDimension::BagState => {
                options.extend(
                    BagState::ALL
                        .iter()
                        .map(|state| PickerOption::new(state.code(), self.counted(stat, state.code(), state.label()))),
                );
            }
            FilterDimension::MedicalCondition => {
                options.extend(MEDICAL_CONDITIONS.iter().map(|value| PickerOption::new(*value, *value)));
            }
            FilterDimension::DateStart | FilterDimension::DateEnd => {}
        }
        options
    }

    /// Human label for a stored filter value.
    fn display_value(&self, dimension: FilterDimension, value: &str) -> String {
        let catalog_label = |kind: CatalogKind, code: &str| {
            self.catalogs
                .resolve_label(kind, code)
                .unwrap_or_else(|| code.to_string())
        };
        match dimension {
            FilterDimension::BagTypes => value
                .split(',')
                .map(|code| catalog_label(CatalogKind::BagTypes, code))
                .collect::<Vec<_>>()
                .join(", "),
            FilterDimension::Network => catalog_label(CatalogKind::Networks, value),
            FilterDimension::AscriptionFacility | FilterDimension::AttentionFacility => {
                catalog_label(CatalogKind::Facilities, value)
            }
            FilterDimension::Specialty => catalog_label(CatalogKind::Specialties, value),
            FilterDimension::ManagementState => self.catalogs.management_state_label(Some(value)),
            FilterDimension::BagState => BagState::parse(value).map_or_else(|| value.to_string(), |s| s.label().to_string()),
            FilterDimension::Assignment => match value {
                "asignados" => "Asignados".to_string(),
                "sin_asignar" => "Sin asignar".to_string(),
                id => id
                    .parse::<i64>()
                    .ok()
                    .and_then(|id| self.catalogs.by_id(CatalogKind::CaseManagers, id))
                    .map_or_else(|| format!("Gestora #{id}"), |entry| entry.label.clone()),
            },
            FilterDimension::AppointmentType
            | FilterDimension::MedicalCondition
            | FilterDimension::DateStart
            | FilterDimension::DateEnd => value.to_string(),
        }
    }

    /// Computes a renderable UI view model from current state and terminal dimensions.
    ///
    /// # Parameters
    ///
    /// * `rows` - Terminal height in character cells
    /// * `cols` - Terminal width in character cells
    ///
    /// # Windowing Algorithm
    ///
    /// 1. Subtract the chrome rows from the terminal height
    /// 2. Center the window around the cursor
    /// 3. Shift the window back when it would run past the last row
    #[must_use]
    pub fn compute_viewmodel(&self, rows: usize, cols: usize) -> UIViewModel {
        let _span = tracing::trace_span!("compute_viewmodel", rows, cols).entered();

        let columns = fit_columns(cols);
        let all_rows = self.loader.rows();
        let available_rows = rows.saturating_sub(CHROME_ROWS).max(1);

        let mut visible_start = self.cursor.saturating_sub(available_rows / 2);
        let visible_end = (visible_start + available_rows).min(all_rows.len());
        if visible_end - visible_start < available_rows && all_rows.len() >= available_rows {
            visible_start = visible_end.saturating_sub(available_rows);
        }

        let display_rows = all_rows[visible_start..visible_end]
            .iter()
            .enumerate()
            .map(|(offset, row)| RowItem {
                cells: columns.iter().map(|column| column.cell(row)).collect(),
                is_cursor: visible_start + offset == self.cursor,
                is_selected: self.selection.contains(row.id),
            })
            .collect();

        UIViewModel {
            header: self.compute_header(),
            cards: self.compute_cards(),
            filter_bar: self.compute_filter_bar(),
            columns: columns
                .iter()
                .map(|column| ColumnInfo {
                    title: column.title().to_string(),
                    width: column.width(),
                })
                .collect(),
            rows: display_rows,
            selection_bar: self.compute_selection_bar(),
            notice: self.compute_notice(),
            overlay: self.compute_overlay(),
            empty_state: self.compute_empty_state(),
            footer: self.compute_footer(),
        }
    }

    fn compute_header(&self) -> HeaderInfo {
        let total = self.pagination.total_elements();
        HeaderInfo {
            title: " Bolsa de solicitudes ".to_string(),
            pagination: format!(
                "Página {} de {} · {total} solicitudes · {} por página",
                self.pagination.page_index() + 1,
                self.pagination.total_pages(),
                self.pagination.page_size()
            ),
            is_loading: self.loader.is_loading() || !self.list_released,
        }
    }

    fn compute_cards(&self) -> Vec<CardInfo> {
        let state = self.query.state();
        StatCard::ALL
            .iter()
            .enumerate()
            .map(|(index, card)| CardInfo {
                label: card.label().to_string(),
                count: card
                    .count(&self.catalogs)
                    .map_or_else(|| "…".to_string(), |count| count.to_string()),
                is_active: card.is_active(state),
                is_focused: index == self.cards.focused_index(),
            })
            .collect()
    }

    fn compute_filter_bar(&self) -> FilterBarInfo {
        let state = self.query.state();
        let chips = FilterDimension::ALL
            .iter()
            .filter_map(|dimension| {
                state
                    .value_of(*dimension)
                    .map(|value| format!("{}: {}", dimension.label(), self.display_value(*dimension, &value)))
            })
            .collect();
        let is_editing = self.input_mode == InputMode::Search;
        let search = (is_editing || !state.search.is_empty()).then(|| SearchBarInfo {
            query: state.search.clone(),
            is_editing,
        });
        let sort = state
            .sort
            .map(|spec| format!("Orden: {}{}", spec.column.label(), direction_arrow(spec.direction)));
        FilterBarInfo { chips, search, sort }
    }

    fn compute_selection_bar(&self) -> Option<String> {
        if self.selection.is_empty() {
            return None;
        }
        let total = self.pagination.total_elements();
        let loaded = self.loader.rows().len();
        Some(match self.selection.mode() {
            SelectionMode::AllMatching => format!("Todas las {total} solicitudes coincidentes seleccionadas"),
            _ => {
                let count = self.selection.selected_count(total);
                if self.selection.can_promote(loaded, total) {
                    format!("{count} seleccionada(s) en esta página · V: seleccionar las {total} coincidentes")
                } else {
                    format!("{count} seleccionada(s)")
                }
            }
        })
    }

    fn compute_notice(&self) -> Option<NoticeInfo> {
        if let Some(progress) = self.bulk.progress() {
            return Some(NoticeInfo {
                level: NoticeLevel::Info,
                text: progress,
            });
        }
        self.notice.as_ref().map(|notice| NoticeInfo {
            level: notice.level,
            text: notice.text.clone(),
        })
    }

    fn compute_overlay(&self) -> Option<Overlay> {
        match self.input_mode {
            InputMode::Normal | InputMode::Search => None,
            InputMode::Picker(_) => Some(Overlay::Picker(PickerInfo {
                title: self.picker.title().to_string(),
                query: self.picker.query().to_string(),
                items: self
                    .picker
                    .visible()
                    .map(|(option, matched)| PickerItem {
                        label: option.label.clone(),
                        highlight_ranges: matched.highlight_ranges.clone(),
                    })
                    .collect(),
                selected_index: self.picker.cursor(),
                error: self.field_error.clone(),
            })),
            InputMode::Prompt(purpose) => Some(Overlay::Prompt(PromptInfo {
                label: purpose.label().to_string(),
                input: self.prompt_input.clone(),
                error: self.field_error.clone(),
            })),
            InputMode::ConfirmDelete => self.bulk.pending_delete().map(|pending| {
                Overlay::Confirm(ConfirmInfo {
                    message: format!(
                        "¿Eliminar {} solicitud(es)? Esta acción no se puede deshacer. (y/n)",
                        pending.count
                    ),
                })
            }),
        }
    }

    fn compute_empty_state(&self) -> Option<EmptyState> {
        if !self.loader.rows().is_empty() {
            return None;
        }
        Some(if !self.loader.has_loaded() {
            match self.loader.last_failure() {
                Some(failure) => EmptyState {
                    message: failure.user_message(),
                    hint: failure.is_retryable().then(|| "R: reintentar".to_string()),
                },
                None => EmptyState {
                    message: "Cargando solicitudes…".to_string(),
                    hint: None,
                },
            }
        } else if self.query.state().is_filtered() {
            EmptyState {
                message: "Ninguna solicitud coincide con los filtros".to_string(),
                hint: Some("x: limpiar filtros".to_string()),
            }
        } else {
            EmptyState {
                message: "No hay solicitudes registradas".to_string(),
                hint: None,
            }
        })
    }

    fn compute_footer(&self) -> FooterInfo {
        let keybindings = match self.input_mode {
            InputMode::Normal => {
                "j/k: mover  h/l: página  z: tamaño  /: DNI  f: filtrar  x: limpiar  s: ordenar  Tab/c: tarjetas  \
                 space/v/V/u: selección  A: asignar  B: bolsa  D: eliminar  P/I/F/N: fila  R: recargar  C: catálogos  q: salir"
            }
            InputMode::Search => "Escriba el DNI  Enter: aceptar  Esc: borrar búsqueda",
            InputMode::Picker(_) => "Escriba para filtrar  ↑/↓: mover  Enter: elegir  Esc: cancelar",
            InputMode::Prompt(_) => "Enter: aceptar  Esc: cancelar",
            InputMode::ConfirmDelete => "y: eliminar  n: cancelar",
        };
        FooterInfo {
            keybindings: keybindings.to_string(),
        }
    }
}

const fn direction_arrow(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => " ▲",
        SortDirection::Descending => " ▼",
    }
}

/// Statistics dimension that decorates a filter's options.
const fn stat_dimension(dimension: FilterDimension) -> Option<StatDimension> {
    match dimension {
        FilterDimension::BagTypes => Some(StatDimension::BagType),
        FilterDimension::ManagementState => Some(StatDimension::ManagementState),
        FilterDimension::Specialty => Some(StatDimension::Specialty),
        FilterDimension::AscriptionFacility | FilterDimension::AttentionFacility => Some(StatDimension::Facility),
        FilterDimension::Network => Some(StatDimension::Network),
        FilterDimension::AppointmentType => Some(StatDimension::AppointmentType),
        FilterDimension::BagState => Some(StatDimension::BagState),
        FilterDimension::Assignment => Some(StatDimension::Assignment),
        FilterDimension::MedicalCondition | FilterDimension::DateStart | FilterDimension::DateEnd => None,
    }
}

/// Columns of the queue table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableColumn {
    Dni,
    Patient,
    Age,
    Phone,
    Bag,
    PreferredDate,
    Specialty,
    AttentionFacility,
    Network,
    BagState,
    ManagementState,
    CaseManager,
    AssignedAt,
    MedicalCondition,
}

impl TableColumn {
    /// Display order.
    const ALL: [Self; 14] = [
        Self::Dni,
        Self::Patient,
        Self::Age,
        Self::Phone,
        Self::Bag,
        Self::PreferredDate,
        Self::Specialty,
        Self::AttentionFacility,
        Self::Network,
        Self::BagState,
        Self::ManagementState,
        Self::CaseManager,
        Self::AssignedAt,
        Self::MedicalCondition,
    ];

    const fn title(self) -> &'static str {
        match self {
            Self::Dni => "DNI",
            Self::Patient => "Paciente",
            Self::Age => "Edad",
            Self::Phone => "Teléfono",
            Self::Bag => "Bolsa",
            Self::PreferredDate => "F. preferida",
            Self::Specialty => "Especialidad",
            Self::AttentionFacility => "IPRESS atención",
            Self::Network => "Red",
            Self::BagState => "Estado",
            Self::ManagementState => "Gestión",
            Self::CaseManager => "Gestora",
            Self::AssignedAt => "Asignado",
            Self::MedicalCondition => "Condición",
        }
    }

    const fn width(self) -> usize {
        match self {
            Self::Dni => 9,
            Self::Patient => 26,
            Self::Age => 4,
            Self::Phone | Self::MedicalCondition => 11,
            Self::Bag | Self::Specialty | Self::AssignedAt => 16,
            Self::PreferredDate => 12,
            Self::AttentionFacility | Self::ManagementState => 20,
            Self::Network => 14,
            Self::BagState => 10,
            Self::CaseManager => 18,
        }
    }

    /// Lower is kept first on narrow terminals.
    const fn priority(self) -> u8 {
        match self {
            Self::Dni => 0,
            Self::Patient => 1,
            Self::ManagementState => 2,
            Self::CaseManager => 3,
            Self::BagState => 4,
            Self::Bag => 5,
            Self::Phone => 6,
            Self::Specialty => 7,
            Self::PreferredDate => 8,
            Self::Age => 9,
            Self::AssignedAt => 10,
            Self::AttentionFacility => 11,
            Self::MedicalCondition => 12,
            Self::Network => 13,
        }
    }

    fn cell(self, row: &QueueRow) -> String {
        match self {
            Self::Dni => row.dni.clone(),
            Self::Patient => row.patient_name.clone(),
            Self::Age => row.age.map_or_else(|| EM_DASH.to_string(), |age| age.to_string()),
            Self::Phone => row.phone.clone(),
            Self::Bag => row.bag.clone(),
            Self::PreferredDate => row.preferred_date.clone(),
            Self::Specialty => row.specialty.clone(),
            Self::AttentionFacility => row.attention_facility.clone(),
            Self::Network => row.network.clone(),
            Self::BagState => row.bag_state.clone(),
            Self::ManagementState => row.management_state.clone(),
            Self::CaseManager => row.case_manager.clone(),
            Self::AssignedAt => row.assigned_at.clone(),
            Self::MedicalCondition => row.medical_condition.clone(),
        }
    }
}

/// Highest-priority columns that fit in `cols`, in display order.
fn fit_columns(cols: usize) -> Vec<TableColumn> {
    let mut budget = cols.saturating_sub(SELECTION_MARK_WIDTH);
    let mut by_priority = TableColumn::ALL;
    by_priority.sort_by_key(|column| column.priority());

    let mut fitted = Vec::new();
    for column in by_priority {
        let needed = column.width() + 1;
        if needed <= budget {
            budget -= needed;
            fitted.push(column);
        }
    }
    TableColumn::ALL
        .into_iter()
        .filter(|column| fitted.contains(column))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_terminals_keep_identity_columns() {
        let columns = fit_columns(60);
        assert!(columns.contains(&TableColumn::Dni));
        assert!(columns.contains(&TableColumn::Patient));
        assert!(!columns.contains(&TableColumn::Network));
        assert_eq!(fit_columns(400).len(), TableColumn::ALL.len());
    }

    #[test]
    fn mount_requests_every_catalog_and_statistic() {
        let mut state = AppState::new(Theme::default(), 50);
        let actions = state.mount();
        assert_eq!(actions.len(), CatalogKind::ALL.len() + StatDimension::ALL.len());
        assert_eq!(state.pagination.page_size(), 50);
        assert!(state.reload(false).is_empty());
    }

    #[test]
    fn remount_bumps_epoch_and_resets_controllers() {
        let mut state = AppState::new(Theme::default(), 20);
        state.mount();
        let _ = state.query.set_search("123");
        state.mount();
        assert_eq!(state.epoch, 2);
        assert!(state.query.state().search.is_empty());
    }

    #[test]
    fn filter_options_start_with_all() {
        let mut state = AppState::new(Theme::default(), 20);
        state.mount();
        let (_, options) = state.options_for(PickerPurpose::Filter(FilterDimension::ManagementState));
        assert_eq!(options[0].value, "todos");
        assert_eq!(options.len(), MANAGEMENT_STATE_FALLBACK.len() + 1);
    }
}
