//! Event handling and state transition logic.
//!
//! This module implements the core event handler that processes user input,
//! lifecycle events, and backend replies, translating them into state changes
//! and action sequences.
//!
//! # Architecture
//!
//! The handler follows a unidirectional data flow pattern:
//! 1. Events arrive from the plugin runtime (keys, permission results, web replies)
//! 2. [`handle_event`] pattern-matches the event type
//! 3. State mutations occur via `AppState` and its controllers
//! 4. Actions are collected and returned for execution
//!
//! # Event Types
//!
//! - **Lifecycle**: `Mounted`, `CloseFocus`
//! - **Navigation**: `CursorDown`, `CursorUp`, page movement, `CyclePageSize`
//! - **Query**: `StartSearch`, `OpenFilterPicker`, `ClearFilters`, stat cards, sort
//! - **Selection**: `ToggleRow`, `SelectPage`, `SelectAllMatching`, `ClearSelection`
//! - **Actions**: assignment, bag change, two-phase delete, row edits, reminders
//! - **Input**: `Char`, `Backspace`, `Submit`, `Cancel`
//! - **Backend**: `BackendReply`, routed by response kind
//!
//! User-facing failures (validation, busy, empty selection) never escape as
//! errors: they become a banner or an inline field error.
//!
//! # Example
//!
//! ```
//! use bolsas_queue::app::{handle_event, AppState, Event};
//! use bolsas_queue::ui::theme::Theme;
//!
//! let mut state = AppState::new(Theme::default(), 20);
//! let (render, actions) = handle_event(&mut state, &Event::Mounted)?;
//! assert!(render);
//! assert!(!actions.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::NaiveDate;

use super::bulk::BulkStep;
use super::modes::{InputMode, PickerPurpose, PromptPurpose};
use super::query::{FilterDimension, SortColumn};
use crate::app::{Action, AppState};
use crate::backend::{BackendReply, BackendRequest, BackendResponse, ReminderChannel};
use crate::domain::error::{QueueError, Result};

const PHONE_MIN_DIGITS: usize = 6;
const PHONE_MAX_DIGITS: usize = 15;

/// Events triggered by user input, lifecycle changes, or backend replies.
///
/// Each event represents a discrete occurrence that may cause state changes
/// and action emissions. The event handler processes these sequentially,
/// ensuring deterministic state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Starts a fresh lifecycle: resets every controller and loads catalogs.
    Mounted,
    /// A decoded reply to an earlier request.
    BackendReply(BackendReply),
    /// Closes the floating pane and hides the plugin UI.
    CloseFocus,

    /// Moves the row or picker cursor down (wraps to top).
    CursorDown,
    /// Moves the row or picker cursor up (wraps to bottom).
    CursorUp,

    PreviousPage,
    NextPage,
    FirstPage,
    LastPage,
    /// Switches to the next allowed page size.
    CyclePageSize,

    /// Starts typing a DNI search term.
    StartSearch,
    /// Opens the filter dimension chooser.
    OpenFilterPicker,
    /// Clears every filter and the search term.
    ClearFilters,
    /// Moves focus to the next stat card.
    FocusNextCard,
    /// Applies or clears the focused stat card's filter.
    ToggleFocusedCard,
    /// Opens the page sort chooser.
    OpenSortPicker,

    /// Toggles the row under the cursor.
    ToggleRow,
    /// Selects every loaded row.
    SelectPage,
    /// Extends a full-page selection to every matching row.
    SelectAllMatching,
    ClearSelection,

    /// Opens the case manager chooser for the selection.
    StartAssign,
    /// Opens the bag type chooser for the selection.
    StartChangeBagType,
    /// First phase of deletion.
    StartDelete,
    /// Second phase of deletion.
    ConfirmDelete,
    CancelDelete,
    /// Edits the phones of the row under the cursor.
    EditPhones,
    /// Changes the attention facility of the row under the cursor.
    EditAttentionFacility,
    /// Changes the preferred date of the row under the cursor.
    EditPreferredDate,
    /// Sends a reminder to the patient of the row under the cursor.
    StartReminder,
    /// Reissues the current list request.
    Retry,
    /// Reloads catalogs and statistics.
    RefreshCatalogs,

    /// Appends a character to the active text input.
    Char(char),
    /// Removes the last character of the active text input.
    Backspace,
    /// Accepts the active input.
    Submit,
    /// Leaves the active input.
    Cancel,
}

/// Processes an event, mutates application state, and returns actions to execute.
///
/// # Parameters
///
/// * `state` - Mutable reference to application state
/// * `event` - Event to process
///
/// # Returns
///
/// Whether the UI should re-render, and the actions to execute in order.
///
/// # Errors
///
/// Reserved for failures the user cannot act on; every error a user can fix is
/// reported through the state instead.
///
/// # Tracing
///
/// Each call creates a debug-level span with the event type.
pub fn handle_event(state: &mut AppState, event: &Event) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event_type = ?event).entered();

    let outcome = match event {
        Event::Mounted => Ok((true, state.mount())),
        Event::CloseFocus => Ok((false, vec![Action::CloseFocus])),
        Event::BackendReply(reply) => {
            if reply.epoch != state.epoch {
                tracing::debug!(reply_epoch = reply.epoch, epoch = state.epoch, "dropping reply from previous mount");
                return Ok((false, vec![]));
            }
            Ok(route_response(state, &reply.response))
        }

        Event::CursorDown => {
            match state.input_mode {
                InputMode::Picker(_) => state.picker.move_down(),
                _ => state.move_cursor_down(),
            }
            Ok((true, vec![]))
        }
        Event::CursorUp => {
            match state.input_mode {
                InputMode::Picker(_) => state.picker.move_up(),
                _ => state.move_cursor_up(),
            }
            Ok((true, vec![]))
        }

        Event::PreviousPage => Ok((true, state.step_page(-1))),
        Event::NextPage => Ok((true, state.step_page(1))),
        Event::FirstPage => Ok((true, state.go_to_page(0))),
        Event::LastPage => Ok((true, state.last_page())),
        Event::CyclePageSize => Ok((true, state.cycle_page_size())),

        Event::StartSearch => {
            state.input_mode = InputMode::Search;
            Ok((true, vec![]))
        }
        Event::OpenFilterPicker => {
            state.open_picker(PickerPurpose::ChooseDimension);
            Ok((true, vec![]))
        }
        Event::ClearFilters => {
            let change = state.query.clear_all();
            Ok((true, state.on_query_changed(change)))
        }
        Event::FocusNextCard => {
            state.cards.focus_next();
            Ok((true, vec![]))
        }
        Event::ToggleFocusedCard => toggle_focused_card(state),
        Event::OpenSortPicker => {
            state.open_picker(PickerPurpose::SortColumn);
            Ok((true, vec![]))
        }

        Event::ToggleRow => {
            let Some(id) = state.current_row().map(|row| row.id) else {
                return Ok((false, vec![]));
            };
            state.selection.toggle_row(id, &state.loader.loaded_ids());
            Ok((true, vec![]))
        }
        Event::SelectPage => {
            state.selection.select_all_on_page(&state.loader.loaded_ids());
            Ok((true, vec![]))
        }
        Event::SelectAllMatching => {
            let loaded = state.loader.rows().len();
            let total = state.pagination.total_elements();
            Ok((state.selection.promote_to_all_matching(loaded, total), vec![]))
        }
        Event::ClearSelection => {
            state.selection.clear();
            Ok((true, vec![]))
        }

        Event::StartAssign => start_selection_picker(state, PickerPurpose::AssignManager),
        Event::StartChangeBagType => start_selection_picker(state, PickerPurpose::ChangeBagType),
        Event::StartDelete => {
            let target = state.selection_target();
            state.bulk.request_delete(target).map(|pending| {
                tracing::debug!(count = pending.count, "delete awaiting confirmation");
            })?;
            state.input_mode = InputMode::ConfirmDelete;
            Ok((true, vec![]))
        }
        Event::ConfirmDelete => {
            state.input_mode = InputMode::Normal;
            let query = state.query.canonical();
            let request = state.bulk.confirm_delete(&query)?;
            Ok((true, vec![state.send(request)]))
        }
        Event::CancelDelete => {
            state.bulk.cancel_delete();
            state.input_mode = InputMode::Normal;
            Ok((true, vec![]))
        }
        Event::EditPhones => start_row_action(state, |state, id| {
            let initial = state
                .loader
                .record(id)
                .map(|record| match (&record.phone, &record.alternate_phone) {
                    (Some(phone), Some(alternate)) => format!("{phone},{alternate}"),
                    (Some(phone), None) => phone.clone(),
                    _ => String::new(),
                })
                .unwrap_or_default();
            state.open_prompt(PromptPurpose::Phones { id }, initial);
        }),
        Event::EditAttentionFacility => start_row_action(state, |state, id| {
            state.open_picker(PickerPurpose::AttentionFacility { id });
        }),
        Event::EditPreferredDate => start_row_action(state, |state, id| {
            let initial = state
                .loader
                .record(id)
                .and_then(|record| record.preferred_date.clone())
                .and_then(|raw| raw.get(..10).map(str::to_string))
                .unwrap_or_default();
            state.open_prompt(PromptPurpose::PreferredDate { id }, initial);
        }),
        Event::StartReminder => start_row_action(state, |state, id| {
            state.open_picker(PickerPurpose::ReminderChannel { id });
        }),
        Event::Retry => {
            tracing::debug!("reissuing list request");
            Ok((true, state.reload(true)))
        }
        Event::RefreshCatalogs => Ok((true, state.refresh_catalogs())),

        Event::Char(c) => Ok(on_char(state, *c)),
        Event::Backspace => Ok(on_backspace(state)),
        Event::Submit => match state.input_mode {
            InputMode::Search => {
                state.input_mode = InputMode::Normal;
                Ok((true, vec![]))
            }
            InputMode::Picker(purpose) => submit_picker(state, purpose),
            InputMode::Prompt(purpose) => submit_prompt(state, purpose),
            InputMode::Normal | InputMode::ConfirmDelete => Ok((false, vec![])),
        },
        Event::Cancel => match state.input_mode {
            InputMode::Search => {
                state.input_mode = InputMode::Normal;
                let actions = state
                    .query
                    .set_search("")
                    .map(|change| state.on_query_changed(change))
                    .unwrap_or_default();
                Ok((true, actions))
            }
            InputMode::Picker(_) | InputMode::Prompt(_) => {
                state.close_input();
                Ok((true, vec![]))
            }
            InputMode::Normal | InputMode::ConfirmDelete => Ok((false, vec![])),
        },
    };

    match outcome {
        Ok(result) => Ok(result),
        Err(error) => {
            state.report_error(&error);
            Ok((true, vec![]))
        }
    }
}

/// Sends a response to the controller that owns its request.
fn route_response(state: &mut AppState, response: &BackendResponse) -> (bool, Vec<Action>) {
    match response {
        BackendResponse::PageLoaded { token, page } => state.apply_page(*token, page.clone()),
        BackendResponse::Failed {
            request: BackendRequest::SearchPage { token, .. },
            failure,
        } => (state.fail_page(*token, failure.clone()), vec![]),
        BackendResponse::CatalogLoaded {
            kind,
            generation,
            entries,
        } => (true, state.apply_catalog(*generation, *kind, Ok(entries.clone()))),
        BackendResponse::Failed {
            request: BackendRequest::LoadCatalog { kind, generation, .. },
            failure,
        } => (true, state.apply_catalog(*generation, *kind, Err(failure.clone()))),
        BackendResponse::StatisticsLoaded {
            dimension,
            generation,
            counts,
        } => (state.apply_statistics(*generation, *dimension, Ok(counts.clone())), vec![]),
        BackendResponse::Failed {
            request: BackendRequest::LoadStatistics { dimension, generation, .. },
            failure,
        } => (state.apply_statistics(*generation, *dimension, Err(failure.clone())), vec![]),
        other => match state.bulk.on_response(other) {
            BulkStep::Ignored => {
                tracing::debug!("response matched no running action");
                (false, vec![])
            }
            BulkStep::Continue(request) => (true, vec![state.send(request)]),
            BulkStep::Finished(outcome) => (true, state.finish_action(&outcome)),
        },
    }
}

fn toggle_focused_card(state: &mut AppState) -> Result<(bool, Vec<Action>)> {
    let card = state.cards.focused();
    let mut changed = None;
    for (dimension, value) in card.activation(state.query.state()) {
        if let Some(change) = state.query.set_filter(dimension, &value)? {
            changed = Some(change);
        }
    }
    tracing::debug!(card = card.label(), changed = changed.is_some(), "stat card toggled");
    Ok((true, changed.map(|change| state.on_query_changed(change)).unwrap_or_default()))
}

/// Opens a chooser for a selection-wide action after checking it could run.
fn start_selection_picker(state: &mut AppState, purpose: PickerPurpose) -> Result<(bool, Vec<Action>)> {
    if state.bulk.is_processing() {
        return Err(QueueError::Busy);
    }
    if state.selection.is_empty() {
        return Err(QueueError::EmptySelection);
    }
    state.open_picker(purpose);
    Ok((true, vec![]))
}

/// Opens the input for a row action on the row under the cursor.
fn start_row_action(state: &mut AppState, open: impl FnOnce(&mut AppState, i64)) -> Result<(bool, Vec<Action>)> {
    if state.bulk.is_processing() {
        return Err(QueueError::Busy);
    }
    let Some(id) = state.current_row().map(|row| row.id) else {
        return Ok((false, vec![]));
    };
    open(state, id);
    Ok((true, vec![]))
}

fn on_char(state: &mut AppState, c: char) -> (bool, Vec<Action>) {
    match state.input_mode {
        InputMode::Search => {
            let actions = state
                .query
                .push_search_char(c)
                .map(|change| state.on_query_changed(change))
                .unwrap_or_default();
            tracing::trace!(query = %state.query.state().search, char = %c, "search term updated");
            (true, actions)
        }
        InputMode::Picker(_) => {
            state.picker.push_char(c);
            state.field_error = None;
            (true, vec![])
        }
        InputMode::Prompt(_) => {
            state.prompt_input.push(c);
            state.field_error = None;
            (true, vec![])
        }
        InputMode::Normal | InputMode::ConfirmDelete => (false, vec![]),
    }
}

fn on_backspace(state: &mut AppState) -> (bool, Vec<Action>) {
    match state.input_mode {
        InputMode::Search => {
            let actions = state
                .query
                .pop_search_char()
                .map(|change| state.on_query_changed(change))
                .unwrap_or_default();
            (true, actions)
        }
        InputMode::Picker(_) => {
            state.picker.pop_char();
            (true, vec![])
        }
        InputMode::Prompt(_) => {
            state.prompt_input.pop();
            (true, vec![])
        }
        InputMode::Normal | InputMode::ConfirmDelete => (false, vec![]),
    }
}

fn parse_id(value: &str) -> Result<i64> {
    value
        .parse()
        .map_err(|_| QueueError::validation(format!("Identificador inválido: {value}")))
}

fn parse_index(value: &str, len: usize) -> Result<usize> {
    value
        .parse::<usize>()
        .ok()
        .filter(|index| *index < len)
        .ok_or_else(|| QueueError::validation("Opción inválida"))
}

fn submit_picker(state: &mut AppState, purpose: PickerPurpose) -> Result<(bool, Vec<Action>)> {
    let Some(option) = state.picker.selected().cloned() else {
        state.field_error = Some("Ninguna opción coincide".to_string());
        return Ok((true, vec![]));
    };
    tracing::debug!(?purpose, value = %option.value, "picker submitted");

    match purpose {
        PickerPurpose::ChooseDimension => {
            let dimension = FilterDimension::ALL[parse_index(&option.value, FilterDimension::ALL.len())?];
            if dimension.is_date() {
                let current = state.query.state().value_of(dimension).unwrap_or_default();
                state.open_prompt(PromptPurpose::FilterDate(dimension), current);
            } else {
                state.open_picker(PickerPurpose::Filter(dimension));
            }
            Ok((true, vec![]))
        }
        PickerPurpose::Filter(FilterDimension::BagTypes) if option.value != "todos" => {
            // Stays open so several bag types can be toggled in a row.
            let change = state.query.toggle_bag_type(&option.value);
            let cursor = state.picker.cursor();
            state.open_picker(purpose);
            for _ in 0..cursor {
                state.picker.move_down();
            }
            Ok((true, state.on_query_changed(change)))
        }
        PickerPurpose::Filter(dimension) => apply_filter(state, dimension, &option.value),
        PickerPurpose::AssignManager => {
            let manager_id = parse_id(&option.value)?;
            state.close_input();
            let target = state.selection_target().ok_or(QueueError::EmptySelection)?;
            let query = state.query.canonical();
            let request = state.bulk.assign_case_manager(target, &query, manager_id)?;
            Ok((true, vec![state.send(request)]))
        }
        PickerPurpose::ChangeBagType => {
            let bag_type_id = parse_id(&option.value)?;
            state.close_input();
            let target = state.selection_target().ok_or(QueueError::EmptySelection)?;
            let query = state.query.canonical();
            let request = state.bulk.change_bag_type(target, &query, bag_type_id)?;
            Ok((true, vec![state.send(request)]))
        }
        PickerPurpose::AttentionFacility { id } => {
            let facility_id = parse_id(&option.value)?;
            state.close_input();
            let request = state
                .bulk
                .begin_row_action(BackendRequest::update_attention_facility(id, facility_id))?;
            Ok((true, vec![state.send(request)]))
        }
        PickerPurpose::SortColumn => {
            let column = SortColumn::ALL[parse_index(&option.value, SortColumn::ALL.len())?];
            let spec = state.query.sort_by(column);
            state.loader.apply_sort(Some(spec));
            state.cursor = 0;
            state.close_input();
            Ok((true, vec![]))
        }
        PickerPurpose::ReminderChannel { id } => {
            let channel = ReminderChannel::parse(&option.value)
                .ok_or_else(|| QueueError::validation("Canal de recordatorio inválido"))?;
            state.open_prompt(PromptPurpose::ReminderMessage { id, channel }, String::new());
            Ok((true, vec![]))
        }
    }
}

/// Applies a filter value; a rejected value keeps the input open with the error.
fn apply_filter(state: &mut AppState, dimension: FilterDimension, value: &str) -> Result<(bool, Vec<Action>)> {
    let change = state.query.set_filter(dimension, value)?;
    state.close_input();
    Ok((true, change.map(|change| state.on_query_changed(change)).unwrap_or_default()))
}

fn submit_prompt(state: &mut AppState, purpose: PromptPurpose) -> Result<(bool, Vec<Action>)> {
    let input = state.prompt_input.trim().to_string();
    tracing::debug!(?purpose, "prompt submitted");

    let request = match purpose {
        PromptPurpose::FilterDate(dimension) => return apply_filter(state, dimension, &input),
        PromptPurpose::Phones { id } => {
            let (phone, alternate) = parse_phones(&input)?;
            BackendRequest::update_phones(id, phone, alternate)
        }
        PromptPurpose::PreferredDate { id } => {
            let date = NaiveDate::parse_from_str(&input, "%Y-%m-%d")
                .map_err(|_| QueueError::validation("Fecha inválida, use AAAA-MM-DD"))?;
            BackendRequest::update_preferred_date(id, date)
        }
        PromptPurpose::ReminderMessage { id, channel } => {
            let message = (!input.is_empty()).then_some(input);
            BackendRequest::send_reminder(id, channel, message)
        }
    };

    state.close_input();
    let request = state.bulk.begin_row_action(request)?;
    Ok((true, vec![state.send(request)]))
}

/// Parses `phone[,alternate]`; both must be plain digit strings.
fn parse_phones(input: &str) -> Result<(String, Option<String>)> {
    let mut parts = input.split(',').map(str::trim);
    let phone = parts.next().unwrap_or_default();
    let alternate = parts.next().filter(|part| !part.is_empty());
    if parts.next().is_some() {
        return Err(QueueError::validation("Ingrese como máximo dos teléfonos"));
    }
    let valid = |value: &str| {
        (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit())
    };
    if !valid(phone) {
        return Err(QueueError::validation("Teléfono inválido: use solo dígitos"));
    }
    if let Some(alternate) = alternate {
        if !valid(alternate) {
            return Err(QueueError::validation("Teléfono alterno inválido: use solo dígitos"));
        }
    }
    Ok((phone.to_string(), alternate.map(str::to_string)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::Theme;

    #[test]
    fn phones_accept_one_or_two_numbers() {
        assert_eq!(parse_phones("987654321").unwrap(), ("987654321".to_string(), None));
        assert_eq!(
            parse_phones("987654321, 014567890").unwrap(),
            ("987654321".to_string(), Some("014567890".to_string()))
        );
        assert!(parse_phones("98x").is_err());
        assert!(parse_phones("").is_err());
        assert!(parse_phones("987654321,1234567,7654321").is_err());
    }

    #[test]
    fn replies_from_previous_mount_are_dropped() {
        let mut state = AppState::new(Theme::default(), 20);
        handle_event(&mut state, &Event::Mounted).unwrap();
        handle_event(&mut state, &Event::Mounted).unwrap();
        let stale = Event::BackendReply(BackendReply {
            epoch: 1,
            response: BackendResponse::MatchingIdsCollected {
                page: 0,
                ids: vec![1],
                unreadable: 0,
                total_elements: 1,
            },
        });
        assert_eq!(handle_event(&mut state, &stale).unwrap(), (false, vec![]));
    }

    #[test]
    fn bulk_actions_without_selection_warn() {
        let mut state = AppState::new(Theme::default(), 20);
        handle_event(&mut state, &Event::Mounted).unwrap();
        let (render, actions) = handle_event(&mut state, &Event::StartAssign).unwrap();
        assert!(render);
        assert!(actions.is_empty());
        assert_eq!(state.input_mode, InputMode::Normal);
        let notice = state.notice.as_ref().unwrap();
        assert_eq!(notice.text, QueueError::EmptySelection.to_string());
    }

    #[test]
    fn invalid_date_keeps_prompt_open() {
        let mut state = AppState::new(Theme::default(), 20);
        handle_event(&mut state, &Event::Mounted).unwrap();
        state.open_prompt(PromptPurpose::FilterDate(FilterDimension::DateStart), String::new());
        for c in "2024-13-40".chars() {
            handle_event(&mut state, &Event::Char(c)).unwrap();
        }
        let (_, actions) = handle_event(&mut state, &Event::Submit).unwrap();
        assert!(actions.is_empty());
        assert!(matches!(state.input_mode, InputMode::Prompt(_)));
        assert!(state.field_error.is_some());
    }
}
