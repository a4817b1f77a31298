//! End-to-end flows through `handle_event` with simulated backend replies.

use bolsas_queue::app::selection::SelectionMode;
use bolsas_queue::app::state::Notice;
use bolsas_queue::backend::{BackendReply, BackendRequest, BackendResponse, MutationReceipt, SearchPage};
use bolsas_queue::domain::{ApiFailure, BagState, CatalogEntry, CatalogKind, SolicitudRecord, StatDimension};
use bolsas_queue::ui::NoticeLevel;
use bolsas_queue::{handle_event, Action, AppState, Event, InputMode, Theme};

const TOTAL: u64 = 734;

fn requests(actions: Vec<Action>) -> Vec<BackendRequest> {
    actions
        .into_iter()
        .filter_map(|action| match action {
            Action::Send(outbound) => Some(outbound.request),
            Action::CloseFocus => None,
        })
        .collect()
}

fn fire(state: &mut AppState, event: Event) -> Vec<BackendRequest> {
    let (_, actions) = handle_event(state, &event).unwrap();
    requests(actions)
}

fn reply(state: &mut AppState, response: BackendResponse) -> Vec<BackendRequest> {
    let epoch = state.epoch;
    fire(state, Event::BackendReply(BackendReply { epoch, response }))
}

fn search_token(request: &BackendRequest) -> u64 {
    match request {
        BackendRequest::SearchPage { token, .. } => *token,
        other => panic!("expected a page request, got {other:?}"),
    }
}

fn records(ids: std::ops::Range<i64>) -> Vec<SolicitudRecord> {
    ids.map(|id| SolicitudRecord {
        id,
        patient_dni: Some(format!("{:08}", 40_000_000 + id)),
        patient_name: Some(format!("Paciente {id}")),
        ..SolicitudRecord::default()
    })
    .collect()
}

fn page(ids: std::ops::Range<i64>, total: u64) -> SearchPage {
    SearchPage {
        records: records(ids),
        total_elements: total,
        total_pages: u32::try_from(total.div_ceil(20)).unwrap(),
    }
}

fn entry(id: i64, code: &str, label: &str) -> CatalogEntry {
    CatalogEntry {
        id,
        code: code.to_string(),
        label: label.to_string(),
    }
}

fn entries_for(kind: CatalogKind) -> Vec<CatalogEntry> {
    match kind {
        CatalogKind::CaseManagers => vec![entry(7, "G7", "Rosa Quispe"), entry(8, "G8", "Ana Torres")],
        CatalogKind::BagTypes => vec![entry(3, "BOLSA_107", "Bolsa 107"), entry(4, "BOLSA_DENGUE", "Dengue")],
        CatalogKind::Networks => vec![entry(1, "RED_SABOGAL", "Red Sabogal")],
        _ => Vec::new(),
    }
}

/// Mounts and settles every catalog; returns the first page request.
fn mount_ready(state: &mut AppState) -> BackendRequest {
    let sent = fire(state, Event::Mounted);
    assert_eq!(sent.len(), CatalogKind::ALL.len() + StatDimension::ALL.len());

    let mut released = Vec::new();
    for kind in CatalogKind::ALL {
        assert!(released.is_empty(), "list requested before catalogs were ready");
        released = reply(
            state,
            BackendResponse::CatalogLoaded {
                kind,
                generation: 1,
                entries: entries_for(kind),
            },
        );
    }
    assert_eq!(released.len(), 1);
    released.remove(0)
}

/// Mounts and loads page 0 of a 734-row queue.
fn loaded_state() -> AppState {
    let mut state = AppState::new(Theme::default(), 20);
    let first = mount_ready(&mut state);
    reply(
        &mut state,
        BackendResponse::PageLoaded {
            token: search_token(&first),
            page: page(1..21, TOTAL),
        },
    );
    state
}

fn notice(state: &AppState) -> &Notice {
    state.notice.as_ref().expect("a notice should be shown")
}

#[test]
fn first_page_waits_for_catalogs() {
    let mut state = AppState::new(Theme::default(), 20);
    let first = mount_ready(&mut state);

    match first {
        BackendRequest::SearchPage { page, size, query, .. } => {
            assert_eq!((page, size), (0, 20));
            assert!(query.to_params().is_empty());
        }
        other => panic!("unexpected request {other:?}"),
    }
}

#[test]
fn last_page_of_734_holds_14_rows() {
    let mut state = loaded_state();
    assert_eq!(state.pagination.total_pages(), 37);

    let sent = fire(&mut state, Event::LastPage);
    let token = match &sent[..] {
        [BackendRequest::SearchPage { token, page, .. }] => {
            assert_eq!(*page, 36);
            *token
        }
        other => panic!("unexpected requests {other:?}"),
    };

    reply(
        &mut state,
        BackendResponse::PageLoaded {
            token,
            page: page(721..735, TOTAL),
        },
    );
    assert_eq!(state.loader.rows().len(), 14);
    assert_eq!(state.pagination.page_index(), 36);
}

#[test]
fn search_change_resets_page_and_selection() {
    let mut state = loaded_state();
    let token = search_token(&fire(&mut state, Event::NextPage)[0]);
    reply(
        &mut state,
        BackendResponse::PageLoaded {
            token,
            page: page(21..41, TOTAL),
        },
    );
    fire(&mut state, Event::SelectPage);
    assert_eq!(state.selection.mode(), SelectionMode::Page);

    fire(&mut state, Event::StartSearch);
    let sent = fire(&mut state, Event::Char('4'));

    assert_eq!(state.pagination.page_index(), 0);
    assert!(state.selection.is_empty());
    match &sent[..] {
        [BackendRequest::SearchPage { page, query, .. }] => {
            assert_eq!(*page, 0);
            assert_eq!(query.free_text_search.as_deref(), Some("4"));
        }
        other => panic!("unexpected requests {other:?}"),
    }
}

#[test]
fn filter_race_keeps_the_last_filter() {
    let mut state = loaded_state();

    fire(&mut state, Event::FocusNextCard);
    let pending = fire(&mut state, Event::ToggleFocusedCard).remove(0);
    fire(&mut state, Event::FocusNextCard);
    let observed = fire(&mut state, Event::ToggleFocusedCard).remove(0);

    match &observed {
        BackendRequest::SearchPage { page, query, .. } => {
            assert_eq!(*page, 0);
            assert_eq!(query.bag_state.as_deref(), Some(BagState::Observed.code()));
        }
        other => panic!("unexpected request {other:?}"),
    }
    assert!(search_token(&observed) > search_token(&pending));

    reply(
        &mut state,
        BackendResponse::PageLoaded {
            token: search_token(&observed),
            page: page(100..105, 5),
        },
    );
    reply(
        &mut state,
        BackendResponse::PageLoaded {
            token: search_token(&pending),
            page: page(1..21, 400),
        },
    );

    assert_eq!(state.loader.rows().len(), 5);
    assert_eq!(state.loader.rows()[0].id, 100);
    assert_eq!(state.pagination.total_elements(), 5);
    assert_eq!(state.query.state().bag_state, Some(BagState::Observed));
}

#[test]
fn clearing_filters_reloads_page_zero_and_keeps_sort() {
    let mut state = loaded_state();
    fire(&mut state, Event::FocusNextCard);
    let filtered = fire(&mut state, Event::ToggleFocusedCard).remove(0);
    reply(
        &mut state,
        BackendResponse::PageLoaded {
            token: search_token(&filtered),
            page: page(1..21, 300),
        },
    );
    let second = fire(&mut state, Event::NextPage).remove(0);
    reply(
        &mut state,
        BackendResponse::PageLoaded {
            token: search_token(&second),
            page: page(21..41, 300),
        },
    );
    fire(&mut state, Event::OpenSortPicker);
    assert!(fire(&mut state, Event::Submit).is_empty());
    let sort = state.query.state().sort;
    assert!(sort.is_some());
    fire(&mut state, Event::SelectPage);
    assert_eq!(state.pagination.page_index(), 1);

    let sent = fire(&mut state, Event::ClearFilters);

    match &sent[..] {
        [BackendRequest::SearchPage { page, size, query, .. }] => {
            assert_eq!((*page, *size), (0, 20));
            assert!(query.to_params().is_empty());
        }
        other => panic!("unexpected requests {other:?}"),
    }
    assert_eq!(state.pagination.page_index(), 0);
    assert!(state.selection.is_empty());
    assert_eq!(state.query.state().sort, sort);
}

#[test]
fn page_size_change_reloads_page_zero() {
    let mut state = loaded_state();
    let second = fire(&mut state, Event::NextPage).remove(0);
    reply(
        &mut state,
        BackendResponse::PageLoaded {
            token: search_token(&second),
            page: page(21..41, TOTAL),
        },
    );
    fire(&mut state, Event::SelectPage);

    let sent = fire(&mut state, Event::CyclePageSize);

    match &sent[..] {
        [BackendRequest::SearchPage { page, size, .. }] => assert_eq!((*page, *size), (0, 50)),
        other => panic!("unexpected requests {other:?}"),
    }
    assert_eq!(state.pagination.page_size(), 50);
    assert!(state.selection.is_empty());
}

#[test]
fn stale_page_reply_is_ignored() {
    let mut state = loaded_state();
    let older = search_token(&fire(&mut state, Event::NextPage)[0]);
    let newer = search_token(&fire(&mut state, Event::NextPage)[0]);
    assert!(newer > older);

    reply(
        &mut state,
        BackendResponse::PageLoaded {
            token: older,
            page: page(21..41, TOTAL),
        },
    );
    assert_eq!(state.loader.rows()[0].id, 1);

    reply(
        &mut state,
        BackendResponse::PageLoaded {
            token: newer,
            page: page(41..61, TOTAL),
        },
    );
    assert_eq!(state.loader.rows()[0].id, 41);
}

#[test]
fn bag_change_continues_past_failures() {
    let mut state = loaded_state();
    fire(&mut state, Event::ToggleRow);
    fire(&mut state, Event::CursorDown);
    fire(&mut state, Event::ToggleRow);

    fire(&mut state, Event::StartChangeBagType);
    assert!(matches!(state.input_mode, InputMode::Picker(_)));
    let first = fire(&mut state, Event::Submit).remove(0);
    assert!(matches!(first, BackendRequest::ChangeBagType { id: 1, bag_type_id: 3, .. }));
    assert!(state.bulk.is_processing());

    let second = reply(
        &mut state,
        BackendResponse::Failed {
            request: first,
            failure: ApiFailure::network(None),
        },
    )
    .remove(0);
    assert!(matches!(second, BackendRequest::ChangeBagType { id: 2, .. }));

    let after = reply(
        &mut state,
        BackendResponse::MutationApplied {
            request: second,
            receipt: MutationReceipt::default(),
        },
    );

    assert!(!state.bulk.is_processing());
    assert_eq!(notice(&state).level, NoticeLevel::Warning);
    assert_eq!(notice(&state).text, "1 exitosos, 1 fallidos");
    assert!(state.selection.is_empty());
    assert!(matches!(after[..], [BackendRequest::SearchPage { .. }]));
}

#[test]
fn delete_needs_confirmation() {
    let mut state = loaded_state();
    fire(&mut state, Event::SelectPage);

    assert!(fire(&mut state, Event::StartDelete).is_empty());
    assert_eq!(state.input_mode, InputMode::ConfirmDelete);
    assert_eq!(state.bulk.pending_delete().map(|pending| pending.count), Some(20));

    fire(&mut state, Event::CancelDelete);
    assert!(state.bulk.pending_delete().is_none());
    assert!(!state.bulk.is_processing());

    fire(&mut state, Event::StartDelete);
    let delete = fire(&mut state, Event::ConfirmDelete).remove(0);
    match &delete {
        BackendRequest::DeleteMany { ids, .. } => assert_eq!(ids, &(1..21).collect::<Vec<_>>()),
        other => panic!("unexpected request {other:?}"),
    }

    let after = reply(
        &mut state,
        BackendResponse::MutationApplied {
            request: delete,
            receipt: MutationReceipt {
                affected: Some(20),
                message: None,
            },
        },
    );
    assert_eq!(notice(&state).level, NoticeLevel::Success);
    assert!(matches!(after[..], [BackendRequest::SearchPage { .. }]));
}

fn matching(page: u32, ids: std::ops::RangeInclusive<i64>, total_elements: u64) -> BackendResponse {
    BackendResponse::MatchingIdsCollected {
        page,
        ids: ids.collect(),
        unreadable: 0,
        total_elements,
    }
}

/// Selects every matching row and confirms deletion; returns the first id page request.
fn confirm_all_matching_delete(state: &mut AppState) -> BackendRequest {
    fire(state, Event::SelectPage);
    fire(state, Event::SelectAllMatching);
    assert_eq!(state.selection.mode(), SelectionMode::AllMatching);

    fire(state, Event::StartDelete);
    assert_eq!(state.bulk.pending_delete().map(|pending| pending.count), Some(TOTAL));
    fire(state, Event::ConfirmDelete).remove(0)
}

#[test]
fn all_matching_delete_collects_every_id_first() {
    let mut state = loaded_state();
    let collect = confirm_all_matching_delete(&mut state);
    assert!(matches!(collect, BackendRequest::CollectMatchingIds { page: 0, size: 500, .. }));

    let next = reply(&mut state, matching(0, 1..=500, TOTAL)).remove(0);
    assert!(matches!(next, BackendRequest::CollectMatchingIds { page: 1, .. }));

    let delete = reply(&mut state, matching(1, 501..=734, TOTAL)).remove(0);
    match delete {
        BackendRequest::DeleteMany { ids, .. } => assert_eq!(ids, (1..=734).collect::<Vec<_>>()),
        other => panic!("unexpected request {other:?}"),
    }
}

#[test]
fn incomplete_matching_set_is_never_deleted() {
    let mut state = loaded_state();
    confirm_all_matching_delete(&mut state);

    let next = reply(&mut state, matching(0, 5..=7, TOTAL));
    assert!(matches!(next[..], [BackendRequest::CollectMatchingIds { page: 1, .. }]));

    let after = reply(&mut state, matching(1, 1..=0, TOTAL));
    assert!(after.is_empty());
    assert!(!state.bulk.is_processing());
    assert_eq!(notice(&state).level, NoticeLevel::Error);
    assert_eq!(
        notice(&state).text,
        "Solo se obtuvieron 3 de 734 solicitudes coincidentes; no se realizó ningún cambio"
    );
    assert_eq!(state.selection.mode(), SelectionMode::AllMatching);
}

#[test]
fn matching_set_that_moved_since_confirmation_is_not_deleted() {
    let mut state = loaded_state();
    confirm_all_matching_delete(&mut state);

    let after = reply(&mut state, matching(0, 1..=500, TOTAL + 6));
    assert!(after.is_empty());
    assert_eq!(notice(&state).level, NoticeLevel::Error);
    assert!(!state.bulk.is_processing());
}

#[test]
fn all_matching_assignment_is_filtered_server_side() {
    let mut state = loaded_state();
    fire(&mut state, Event::SelectPage);
    fire(&mut state, Event::SelectAllMatching);

    fire(&mut state, Event::StartAssign);
    let assign = fire(&mut state, Event::Submit).remove(0);
    assert!(matches!(assign, BackendRequest::AssignManagerFiltered { manager_id: 7, .. }));

    reply(
        &mut state,
        BackendResponse::MutationApplied {
            request: assign,
            receipt: MutationReceipt {
                affected: Some(TOTAL),
                message: None,
            },
        },
    );
    assert_eq!(notice(&state).level, NoticeLevel::Success);
    assert_eq!(notice(&state).text, "734 solicitud(es) asignada(s)");
    assert!(state.selection.is_empty());
}

#[test]
fn second_action_is_rejected_while_one_runs() {
    let mut state = loaded_state();
    fire(&mut state, Event::SelectPage);
    fire(&mut state, Event::StartAssign);
    assert_eq!(fire(&mut state, Event::Submit).len(), 1);

    fire(&mut state, Event::SelectPage);
    assert!(fire(&mut state, Event::StartChangeBagType).is_empty());
    assert_eq!(notice(&state).level, NoticeLevel::Warning);
    assert_eq!(state.input_mode, InputMode::Normal);
}

#[test]
fn retry_after_network_failure() {
    let mut state = loaded_state();
    let request = fire(&mut state, Event::NextPage).remove(0);
    let token = search_token(&request);

    reply(
        &mut state,
        BackendResponse::Failed {
            request,
            failure: ApiFailure::network(None),
        },
    );
    assert!(notice(&state).retry);
    assert_eq!(state.loader.rows()[0].id, 1);

    let retried = search_token(&fire(&mut state, Event::Retry)[0]);
    assert!(retried > token);
    reply(
        &mut state,
        BackendResponse::PageLoaded {
            token: retried,
            page: page(21..41, TOTAL),
        },
    );
    assert!(state.notice.is_none());
    assert_eq!(state.loader.rows()[0].id, 21);
}

#[test]
fn remount_drops_replies_of_the_previous_lifecycle() {
    let mut state = loaded_state();
    let token = search_token(&fire(&mut state, Event::NextPage)[0]);
    let old_epoch = state.epoch;

    fire(&mut state, Event::Mounted);
    let (render, actions) = handle_event(
        &mut state,
        &Event::BackendReply(BackendReply {
            epoch: old_epoch,
            response: BackendResponse::PageLoaded {
                token,
                page: page(21..41, TOTAL),
            },
        }),
    )
    .unwrap();

    assert!(!render);
    assert!(actions.is_empty());
    assert!(state.loader.rows().is_empty());
}
