//! Bulk and row-level mutations over the selection.
//!
//! Only one action may run at a time: while [`BulkActionExecutor::is_processing`]
//! is true every new action is rejected with [`QueueError::Busy`], never queued.
//!
//! - Assignment sends one request: single, batched, or filtered server-side for
//!   an all-matching selection.
//! - Bag-type change sends one request per id, strictly in sequence, and counts
//!   successes and failures without stopping on errors.
//! - Deletion is two-phase: [`request_delete`](BulkActionExecutor::request_delete)
//!   stores a confirmation, [`confirm_delete`](BulkActionExecutor::confirm_delete)
//!   executes it.
//!
//! All-matching deletion and bag-type change first collect every matching id
//! from the search endpoint, page by page, and then operate on exactly that
//! list. Collection aborts without touching anything if the matching total
//! moves away from the confirmed one, or if a page holds rows without a
//! readable id. Reported counts come from the backend, never from the size the
//! selection claimed.

use super::query::CanonicalQuery;
use super::selection::SelectionTarget;
use crate::backend::{BackendRequest, BackendResponse, MutationReceipt};
use crate::domain::{ApiFailure, QueueError, Result};
use std::collections::VecDeque;

/// Rows per page while collecting all-matching ids; below the server's page cap.
pub const COLLECT_PAGE_SIZE: u32 = 500;

/// Which action an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkKind {
    Assign,
    ChangeBagType,
    Delete,
    RowUpdate,
    Reminder,
}

/// Final report of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub kind: BulkKind,
    pub success_count: u64,
    pub failure_count: u64,
    /// Text for the status banner; backend wording when it sent any.
    pub message: String,
}

impl BulkOutcome {
    /// Whether anything changed server-side, so the list must reload.
    #[must_use]
    pub const fn should_refresh(&self) -> bool {
        self.success_count > 0
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.success_count == 0 && self.failure_count > 0
    }

    /// Finished cleanly but nothing was changed.
    #[must_use]
    pub const fn changed_nothing(&self) -> bool {
        self.success_count == 0 && self.failure_count == 0
    }

    fn failed(kind: BulkKind, failure: &ApiFailure) -> Self {
        Self {
            kind,
            success_count: 0,
            failure_count: 1,
            message: failure.user_message(),
        }
    }
}

/// Pending delete awaiting the user's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pub target: SelectionTarget,
    /// Records the user is told about in the prompt.
    pub count: u64,
}

/// Result of feeding a response to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkStep {
    /// The response does not belong to the running action.
    Ignored,
    /// Send this next.
    Continue(BackendRequest),
    /// The action is over.
    Finished(BulkOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AfterResolve {
    ChangeBagType { bag_type_id: i64 },
    Delete,
}

impl AfterResolve {
    const fn kind(&self) -> BulkKind {
        match self {
            Self::ChangeBagType { .. } => BulkKind::ChangeBagType,
            Self::Delete => BulkKind::Delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Resolving {
    after: AfterResolve,
    query: CanonicalQuery,
    /// Matching total the user confirmed.
    expected: u64,
    next_page: u32,
    ids: Vec<i64>,
}

impl Resolving {
    fn start(after: AfterResolve, query: &CanonicalQuery, expected: u64) -> (Stage, BackendRequest) {
        let request = BackendRequest::collect_matching_ids(query.clone(), 0, COLLECT_PAGE_SIZE);
        let stage = Stage::ResolvingIds(Self {
            after,
            query: query.clone(),
            expected,
            next_page: 0,
            ids: Vec::new(),
        });
        (stage, request)
    }

    fn aborted(&self, message: String) -> (Option<Stage>, BulkStep) {
        tracing::warn!(expected = self.expected, collected = self.ids.len(), %message, "all-matching action aborted");
        (
            None,
            BulkStep::Finished(BulkOutcome {
                kind: self.after.kind(),
                success_count: 0,
                failure_count: self.expected.max(1),
                message,
            }),
        )
    }

    fn on_page(mut self, page_ids: &[i64], unreadable: u64, total_elements: u64) -> (Option<Stage>, BulkStep) {
        if total_elements == 0 {
            return (
                None,
                BulkStep::Finished(BulkOutcome {
                    kind: self.after.kind(),
                    success_count: 0,
                    failure_count: 0,
                    message: "Ninguna solicitud coincide con los filtros".to_string(),
                }),
            );
        }
        if total_elements != self.expected {
            return self.aborted(format!(
                "Las solicitudes coincidentes cambiaron ({} → {total_elements}); no se realizó ningún cambio",
                self.expected
            ));
        }
        if unreadable > 0 {
            return self.aborted(format!(
                "{unreadable} solicitud(es) coincidente(s) no se pudieron leer; no se realizó ningún cambio"
            ));
        }
        if page_ids.is_empty() {
            return self.aborted(format!(
                "Solo se obtuvieron {} de {} solicitudes coincidentes; no se realizó ningún cambio",
                self.ids.len(),
                self.expected
            ));
        }

        self.ids.extend_from_slice(page_ids);
        let collected = self.ids.len() as u64;
        if collected < self.expected {
            self.next_page += 1;
            tracing::debug!(collected, expected = self.expected, page = self.next_page, "collecting matching ids");
            let request = BackendRequest::collect_matching_ids(self.query.clone(), self.next_page, COLLECT_PAGE_SIZE);
            return (Some(Stage::ResolvingIds(self)), BulkStep::Continue(request));
        }
        if collected > self.expected {
            return self.aborted(format!(
                "Se obtuvieron {collected} solicitudes para {} coincidentes; no se realizó ningún cambio",
                self.expected
            ));
        }

        match self.after {
            AfterResolve::ChangeBagType { bag_type_id } => match bag_loop(std::mem::take(&mut self.ids), bag_type_id) {
                Some((stage, request)) => (Some(stage), BulkStep::Continue(request)),
                None => self.aborted("No se obtuvieron solicitudes coincidentes".to_string()),
            },
            AfterResolve::Delete => (
                Some(Stage::Deleting {
                    requested: self.ids.len(),
                }),
                BulkStep::Continue(BackendRequest::delete_many(self.ids)),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    ResolvingIds(Resolving),
    Assigning { requested: usize },
    ChangingBagType {
        bag_type_id: i64,
        current: i64,
        remaining: VecDeque<i64>,
        success: u64,
        failure: u64,
        total: usize,
    },
    Deleting { requested: usize },
    Row(BulkKind),
}

/// Single-flight executor for mutations.
#[derive(Debug, Clone, Default)]
pub struct BulkActionExecutor {
    stage: Option<Stage>,
    pending_delete: Option<DeleteConfirmation>,
    last_outcome: Option<BulkOutcome>,
}

impl BulkActionExecutor {
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.stage.is_some()
    }

    #[must_use]
    pub const fn pending_delete(&self) -> Option<&DeleteConfirmation> {
        self.pending_delete.as_ref()
    }

    #[must_use]
    pub const fn last_outcome(&self) -> Option<&BulkOutcome> {
        self.last_outcome.as_ref()
    }

    /// Human-readable progress of the running action.
    #[must_use]
    pub fn progress(&self) -> Option<String> {
        Some(match self.stage.as_ref()? {
            Stage::ResolvingIds(resolving) => format!(
                "Obteniendo solicitudes coincidentes {}/{}…",
                resolving.ids.len(),
                resolving.expected
            ),
            Stage::Assigning { requested } => format!("Asignando {requested} solicitud(es)…"),
            Stage::ChangingBagType {
                success, failure, total, ..
            } => format!("Cambiando bolsa {}/{total}…", success + failure + 1),
            Stage::Deleting { requested } => format!("Eliminando {requested} solicitud(es)…"),
            Stage::Row(_) => "Actualizando solicitud…".to_string(),
        })
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_processing() {
            tracing::debug!("rejecting action while another is in flight");
            return Err(QueueError::Busy);
        }
        Ok(())
    }

    /// Assigns the selection to a case manager.
    ///
    /// # Parameters
    ///
    /// * `target` - Explicit ids or the all-matching set
    /// * `query` - Canonical query, used only for all-matching
    /// * `manager_id` - Case manager to assign
    ///
    /// # Errors
    ///
    /// [`QueueError::Busy`] while another action runs, [`QueueError::EmptySelection`]
    /// for an empty id list.
    pub fn assign_case_manager(
        &mut self,
        target: SelectionTarget,
        query: &CanonicalQuery,
        manager_id: i64,
    ) -> Result<BackendRequest> {
        self.ensure_idle()?;
        let (request, requested) = match target {
            SelectionTarget::Ids(ids) if ids.is_empty() => return Err(QueueError::EmptySelection),
            SelectionTarget::Ids(ids) if ids.len() == 1 => (BackendRequest::assign_manager(ids[0], manager_id), 1),
            SelectionTarget::Ids(ids) => {
                let requested = ids.len();
                (BackendRequest::assign_manager_batch(ids, manager_id), requested)
            }
            SelectionTarget::AllMatching { total } => (
                BackendRequest::assign_manager_filtered(query.clone(), manager_id),
                usize::try_from(total).unwrap_or(usize::MAX),
            ),
        };
        tracing::debug!(request = request.name(), requested, manager_id, "assignment started");
        self.stage = Some(Stage::Assigning { requested });
        Ok(request)
    }

    /// Moves every targeted solicitud to another bag type, one request at a time.
    ///
    /// # Errors
    ///
    /// [`QueueError::Busy`] or [`QueueError::EmptySelection`].
    pub fn change_bag_type(
        &mut self,
        target: SelectionTarget,
        query: &CanonicalQuery,
        bag_type_id: i64,
    ) -> Result<BackendRequest> {
        self.ensure_idle()?;
        match target {
            SelectionTarget::Ids(ids) => {
                let (stage, request) = bag_loop(ids, bag_type_id).ok_or(QueueError::EmptySelection)?;
                self.stage = Some(stage);
                Ok(request)
            }
            SelectionTarget::AllMatching { total } => {
                let (stage, request) = Resolving::start(AfterResolve::ChangeBagType { bag_type_id }, query, total);
                self.stage = Some(stage);
                Ok(request)
            }
        }
    }

    /// First phase of deletion: remember what would be deleted.
    ///
    /// # Errors
    ///
    /// [`QueueError::Busy`], or [`QueueError::EmptySelection`] when `target` is
    /// `None` or empty.
    pub fn request_delete(&mut self, target: Option<SelectionTarget>) -> Result<&DeleteConfirmation> {
        self.ensure_idle()?;
        let target = match target {
            None => return Err(QueueError::EmptySelection),
            Some(SelectionTarget::Ids(ids)) if ids.is_empty() => return Err(QueueError::EmptySelection),
            Some(target) => target,
        };
        let count = match &target {
            SelectionTarget::Ids(ids) => ids.len() as u64,
            SelectionTarget::AllMatching { total } => *total,
        };
        Ok(self.pending_delete.insert(DeleteConfirmation { target, count }))
    }

    /// Drops a pending confirmation.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Second phase of deletion.
    ///
    /// # Errors
    ///
    /// [`QueueError::Busy`], or a validation error when nothing awaits
    /// confirmation.
    pub fn confirm_delete(&mut self, query: &CanonicalQuery) -> Result<BackendRequest> {
        self.ensure_idle()?;
        let confirmation = self
            .pending_delete
            .take()
            .ok_or_else(|| QueueError::validation("No hay eliminación pendiente de confirmar"))?;
        match confirmation.target {
            SelectionTarget::Ids(ids) => {
                self.stage = Some(Stage::Deleting { requested: ids.len() });
                Ok(BackendRequest::delete_many(ids))
            }
            SelectionTarget::AllMatching { total } => {
                let (stage, request) = Resolving::start(AfterResolve::Delete, query, total);
                self.stage = Some(stage);
                Ok(request)
            }
        }
    }

    /// Starts a single-row mutation (phones, facility, date, reminder).
    ///
    /// # Errors
    ///
    /// [`QueueError::Busy`] while another action runs.
    pub fn begin_row_action(&mut self, request: BackendRequest) -> Result<BackendRequest> {
        self.ensure_idle()?;
        let kind = if matches!(request, BackendRequest::SendReminder { .. }) {
            BulkKind::Reminder
        } else {
            BulkKind::RowUpdate
        };
        self.stage = Some(Stage::Row(kind));
        Ok(request)
    }

    /// Feeds a backend response to the running action.
    pub fn on_response(&mut self, response: &BackendResponse) -> BulkStep {
        let Some(stage) = self.stage.take() else {
            return BulkStep::Ignored;
        };
        let (next_stage, step) = Self::advance(stage, response);
        self.stage = next_stage;
        if let BulkStep::Finished(outcome) = &step {
            tracing::debug!(
                kind = ?outcome.kind,
                success = outcome.success_count,
                failure = outcome.failure_count,
                "action finished"
            );
            self.last_outcome = Some(outcome.clone());
        }
        step
    }

    fn advance(stage: Stage, response: &BackendResponse) -> (Option<Stage>, BulkStep) {
        use BackendResponse::{Failed, MatchingIdsCollected, MutationApplied};

        match (stage, response) {
            (
                Stage::ResolvingIds(resolving),
                MatchingIdsCollected {
                    page,
                    ids,
                    unreadable,
                    total_elements,
                },
            ) if *page == resolving.next_page => resolving.on_page(ids, *unreadable, *total_elements),
            (Stage::ResolvingIds(resolving), Failed { request: BackendRequest::CollectMatchingIds { .. }, failure }) => {
                (None, BulkStep::Finished(BulkOutcome::failed(resolving.after.kind(), failure)))
            }

            (
                Stage::Assigning { requested },
                MutationApplied {
                    request:
                        request @ (BackendRequest::AssignManager { .. }
                        | BackendRequest::AssignManagerBatch { .. }
                        | BackendRequest::AssignManagerFiltered { .. }),
                    receipt,
                },
            ) => {
                let confirmed = match request {
                    BackendRequest::AssignManagerFiltered { .. } => receipt.affected,
                    _ => Some(receipt.affected.unwrap_or(requested as u64)),
                };
                let message = receipt.message.clone().unwrap_or_else(|| match confirmed {
                    Some(0) => "Ninguna solicitud fue asignada".to_string(),
                    Some(count) => format!("{count} solicitud(es) asignada(s)"),
                    None => "Asignación aplicada".to_string(),
                });
                (
                    None,
                    BulkStep::Finished(BulkOutcome {
                        kind: BulkKind::Assign,
                        success_count: confirmed.unwrap_or(requested as u64),
                        failure_count: 0,
                        message,
                    }),
                )
            }
            (
                Stage::Assigning { .. },
                Failed {
                    request:
                        BackendRequest::AssignManager { .. }
                        | BackendRequest::AssignManagerBatch { .. }
                        | BackendRequest::AssignManagerFiltered { .. },
                    failure,
                },
            ) => (None, BulkStep::Finished(BulkOutcome::failed(BulkKind::Assign, failure))),

            (
                Stage::ChangingBagType {
                    bag_type_id,
                    current,
                    mut remaining,
                    mut success,
                    mut failure,
                    total,
                },
                MutationApplied { request: BackendRequest::ChangeBagType { id, .. }, .. }
                | Failed { request: BackendRequest::ChangeBagType { id, .. }, .. },
            ) if *id == current => {
                if matches!(response, MutationApplied { .. }) {
                    success += 1;
                } else {
                    failure += 1;
                    tracing::warn!(id, "bag type change failed, continuing");
                }
                match remaining.pop_front() {
                    Some(next) => (
                        Some(Stage::ChangingBagType {
                            bag_type_id,
                            current: next,
                            remaining,
                            success,
                            failure,
                            total,
                        }),
                        BulkStep::Continue(BackendRequest::change_bag_type(next, bag_type_id)),
                    ),
                    None => (
                        None,
                        BulkStep::Finished(BulkOutcome {
                            kind: BulkKind::ChangeBagType,
                            success_count: success,
                            failure_count: failure,
                            message: format!("{success} exitosos, {failure} fallidos"),
                        }),
                    ),
                }
            }

            (Stage::Deleting { requested }, MutationApplied { request: BackendRequest::DeleteMany { .. }, receipt }) => {
                let deleted = receipt.affected.unwrap_or(requested as u64);
                let message = receipt
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("{deleted} solicitud(es) eliminada(s)"));
                (
                    None,
                    BulkStep::Finished(BulkOutcome {
                        kind: BulkKind::Delete,
                        success_count: deleted,
                        failure_count: 0,
                        message,
                    }),
                )
            }
            (Stage::Deleting { .. }, Failed { request: BackendRequest::DeleteMany { .. }, failure }) => {
                (None, BulkStep::Finished(BulkOutcome::failed(BulkKind::Delete, failure)))
            }

            (Stage::Row(kind), MutationApplied { request, receipt }) if is_row_request(request) => {
                (None, BulkStep::Finished(row_outcome(kind, receipt)))
            }
            (Stage::Row(kind), Failed { request, failure }) if is_row_request(request) => {
                (None, BulkStep::Finished(BulkOutcome::failed(kind, failure)))
            }

            (stage, _) => (Some(stage), BulkStep::Ignored),
        }
    }
}

/// Starts the sequential loop; `None` for an empty id list.
fn bag_loop(ids: Vec<i64>, bag_type_id: i64) -> Option<(Stage, BackendRequest)> {
    let total = ids.len();
    let mut remaining: VecDeque<i64> = ids.into();
    let current = remaining.pop_front()?;
    tracing::debug!(total, bag_type_id, "bag type change loop started");
    let stage = Stage::ChangingBagType {
        bag_type_id,
        current,
        remaining,
        success: 0,
        failure: 0,
        total,
    };
    Some((stage, BackendRequest::change_bag_type(current, bag_type_id)))
}

const fn is_row_request(request: &BackendRequest) -> bool {
    matches!(
        request,
        BackendRequest::UpdatePhones { .. }
            | BackendRequest::UpdateAttentionFacility { .. }
            | BackendRequest::UpdatePreferredDate { .. }
            | BackendRequest::SendReminder { .. }
    )
}

fn row_outcome(kind: BulkKind, receipt: &MutationReceipt) -> BulkOutcome {
    let fallback = if kind == BulkKind::Reminder {
        "Recordatorio enviado"
    } else {
        "Solicitud actualizada"
    };
    BulkOutcome {
        kind,
        success_count: 1,
        failure_count: 0,
        message: receipt.message.clone().unwrap_or_else(|| fallback.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;
    use chrono::NaiveDate;

    fn applied(request: BackendRequest, affected: Option<u64>) -> BackendResponse {
        BackendResponse::MutationApplied {
            request,
            receipt: MutationReceipt { affected, message: None },
        }
    }

    fn failed(request: BackendRequest) -> BackendResponse {
        BackendResponse::Failed {
            request,
            failure: ApiFailure {
                kind: FailureKind::Validation,
                status: Some(400),
                message: Some("Bolsa inválida".to_string()),
            },
        }
    }

    fn drive(executor: &mut BulkActionExecutor, first: BackendRequest, fail_ids: &[i64]) -> BulkOutcome {
        let mut request = first;
        loop {
            let id = match &request {
                BackendRequest::ChangeBagType { id, .. } => *id,
                other => panic!("unexpected {other:?}"),
            };
            let response = if fail_ids.contains(&id) {
                failed(request.clone())
            } else {
                applied(request.clone(), None)
            };
            match executor.on_response(&response) {
                BulkStep::Continue(next) => request = next,
                BulkStep::Finished(outcome) => return outcome,
                BulkStep::Ignored => panic!("response ignored"),
            }
        }
    }

    #[test]
    fn bag_type_loop_continues_past_failures() {
        let mut executor = BulkActionExecutor::default();
        let first = executor
            .change_bag_type(SelectionTarget::Ids(vec![1, 2, 3]), &CanonicalQuery::default(), 9)
            .unwrap();
        let outcome = drive(&mut executor, first, &[2]);
        assert_eq!((outcome.success_count, outcome.failure_count), (2, 1));
        assert_eq!(outcome.message, "2 exitosos, 1 fallidos");
        assert!(outcome.should_refresh());
        assert!(!executor.is_processing());
    }

    #[test]
    fn every_failure_is_reported_without_refresh() {
        let mut executor = BulkActionExecutor::default();
        let first = executor
            .change_bag_type(SelectionTarget::Ids(vec![4, 5]), &CanonicalQuery::default(), 9)
            .unwrap();
        let outcome = drive(&mut executor, first, &[4, 5]);
        assert_eq!((outcome.success_count, outcome.failure_count), (0, 2));
        assert!(outcome.is_error());
        assert!(!outcome.should_refresh());
    }

    #[test]
    fn concurrent_actions_are_rejected() {
        let mut executor = BulkActionExecutor::default();
        executor
            .assign_case_manager(SelectionTarget::Ids(vec![1, 2]), &CanonicalQuery::default(), 3)
            .unwrap();
        assert!(matches!(
            executor.change_bag_type(SelectionTarget::Ids(vec![1]), &CanonicalQuery::default(), 2),
            Err(QueueError::Busy)
        ));
        assert!(matches!(executor.request_delete(Some(SelectionTarget::Ids(vec![1]))), Err(QueueError::Busy)));
    }

    #[test]
    fn assignment_shape_follows_selection() {
        let query = CanonicalQuery::default();
        let mut executor = BulkActionExecutor::default();
        let single = executor.assign_case_manager(SelectionTarget::Ids(vec![7]), &query, 3).unwrap();
        assert!(matches!(single, BackendRequest::AssignManager { id: 7, manager_id: 3, .. }));

        let mut executor = BulkActionExecutor::default();
        let batch = executor.assign_case_manager(SelectionTarget::Ids(vec![7, 8]), &query, 3).unwrap();
        assert!(matches!(batch, BackendRequest::AssignManagerBatch { .. }));

        let mut executor = BulkActionExecutor::default();
        let filtered = executor
            .assign_case_manager(SelectionTarget::AllMatching { total: 100 }, &query, 3)
            .unwrap();
        assert!(matches!(filtered, BackendRequest::AssignManagerFiltered { .. }));
        let BulkStep::Finished(outcome) = executor.on_response(&applied(filtered, Some(100))) else {
            panic!("expected finish");
        };
        assert_eq!(outcome.success_count, 100);
        assert_eq!(outcome.message, "100 solicitud(es) asignada(s)");
    }

    #[test]
    fn filtered_assignment_without_count_does_not_claim_one() {
        let query = CanonicalQuery::default();
        let mut executor = BulkActionExecutor::default();
        let filtered = executor
            .assign_case_manager(SelectionTarget::AllMatching { total: 100 }, &query, 3)
            .unwrap();
        let BulkStep::Finished(outcome) = executor.on_response(&applied(filtered, None)) else {
            panic!("expected finish");
        };
        assert_eq!(outcome.message, "Asignación aplicada");
    }

    #[test]
    fn empty_selection_is_rejected() {
        let mut executor = BulkActionExecutor::default();
        assert!(matches!(
            executor.assign_case_manager(SelectionTarget::Ids(vec![]), &CanonicalQuery::default(), 1),
            Err(QueueError::EmptySelection)
        ));
        assert!(matches!(executor.request_delete(None), Err(QueueError::EmptySelection)));
        assert!(matches!(
            executor.change_bag_type(SelectionTarget::Ids(vec![]), &CanonicalQuery::default(), 2),
            Err(QueueError::EmptySelection)
        ));
        assert!(!executor.is_processing());
    }

    #[test]
    fn delete_needs_confirmation() {
        let query = CanonicalQuery::default();
        let mut executor = BulkActionExecutor::default();
        assert!(executor.confirm_delete(&query).is_err());

        let confirmation = executor.request_delete(Some(SelectionTarget::Ids(vec![1, 2]))).unwrap();
        assert_eq!(confirmation.count, 2);
        assert!(!executor.is_processing());

        executor.cancel_delete();
        assert!(executor.confirm_delete(&query).is_err());

        executor.request_delete(Some(SelectionTarget::Ids(vec![1, 2]))).unwrap();
        let request = executor.confirm_delete(&query).unwrap();
        assert!(matches!(request, BackendRequest::DeleteMany { ref ids, .. } if ids == &vec![1, 2]));
        let BulkStep::Finished(outcome) = executor.on_response(&applied(request, Some(2))) else {
            panic!("expected finish");
        };
        assert_eq!(outcome.success_count, 2);
    }

    fn collected(page: u32, ids: Vec<i64>, total_elements: u64) -> BackendResponse {
        BackendResponse::MatchingIdsCollected {
            page,
            ids,
            unreadable: 0,
            total_elements,
        }
    }

    fn confirm_all_matching_delete(executor: &mut BulkActionExecutor, total: u64) -> BackendRequest {
        executor.request_delete(Some(SelectionTarget::AllMatching { total })).unwrap();
        executor.confirm_delete(&CanonicalQuery::default()).unwrap()
    }

    #[test]
    fn all_matching_delete_walks_every_page() {
        let mut executor = BulkActionExecutor::default();
        let collect = confirm_all_matching_delete(&mut executor, 1200);
        assert!(matches!(
            collect,
            BackendRequest::CollectMatchingIds { page: 0, size: COLLECT_PAGE_SIZE, .. }
        ));

        let BulkStep::Continue(second) = executor.on_response(&collected(0, (1..=500).collect(), 1200)) else {
            panic!("expected second page");
        };
        assert!(matches!(second, BackendRequest::CollectMatchingIds { page: 1, .. }));
        assert_eq!(executor.progress().unwrap(), "Obteniendo solicitudes coincidentes 500/1200…");

        let BulkStep::Continue(third) = executor.on_response(&collected(1, (501..=1000).collect(), 1200)) else {
            panic!("expected third page");
        };
        assert!(matches!(third, BackendRequest::CollectMatchingIds { page: 2, .. }));

        let BulkStep::Continue(delete) = executor.on_response(&collected(2, (1001..=1200).collect(), 1200)) else {
            panic!("expected delete request");
        };
        assert!(matches!(delete, BackendRequest::DeleteMany { ref ids, .. } if ids.len() == 1200));
        let BulkStep::Finished(outcome) = executor.on_response(&applied(delete, Some(1200))) else {
            panic!("expected finish");
        };
        assert_eq!(outcome.success_count, 1200);
    }

    #[test]
    fn short_collection_deletes_nothing() {
        let mut executor = BulkActionExecutor::default();
        confirm_all_matching_delete(&mut executor, 2500);

        let BulkStep::Continue(next) = executor.on_response(&collected(0, vec![1, 2, 3], 2500)) else {
            panic!("expected next page");
        };
        assert!(matches!(next, BackendRequest::CollectMatchingIds { page: 1, .. }));

        let BulkStep::Finished(outcome) = executor.on_response(&collected(1, vec![], 2500)) else {
            panic!("expected abort");
        };
        assert!(outcome.is_error());
        assert!(!outcome.should_refresh());
        assert_eq!(
            outcome.message,
            "Solo se obtuvieron 3 de 2500 solicitudes coincidentes; no se realizó ningún cambio"
        );
        assert!(!executor.is_processing());
    }

    #[test]
    fn moved_total_or_unreadable_rows_abort_collection() {
        let mut executor = BulkActionExecutor::default();
        confirm_all_matching_delete(&mut executor, 734);
        let BulkStep::Finished(outcome) = executor.on_response(&collected(0, (1..=500).collect(), 740)) else {
            panic!("expected abort");
        };
        assert!(outcome.is_error());
        assert!(outcome.message.starts_with("Las solicitudes coincidentes cambiaron (734 → 740)"));

        let mut executor = BulkActionExecutor::default();
        executor
            .change_bag_type(SelectionTarget::AllMatching { total: 3 }, &CanonicalQuery::default(), 5)
            .unwrap();
        let unreadable = BackendResponse::MatchingIdsCollected {
            page: 0,
            ids: vec![1, 2],
            unreadable: 1,
            total_elements: 3,
        };
        let BulkStep::Finished(outcome) = executor.on_response(&unreadable) else {
            panic!("expected abort");
        };
        assert_eq!(outcome.kind, BulkKind::ChangeBagType);
        assert!(outcome.is_error());
    }

    #[test]
    fn replies_for_other_pages_are_ignored() {
        let mut executor = BulkActionExecutor::default();
        confirm_all_matching_delete(&mut executor, 3);
        assert_eq!(executor.on_response(&collected(4, vec![1, 2, 3], 3)), BulkStep::Ignored);
        assert!(executor.is_processing());
    }

    #[test]
    fn all_matching_bag_change_runs_over_collected_ids() {
        let query = CanonicalQuery::default();
        let mut executor = BulkActionExecutor::default();
        executor
            .change_bag_type(SelectionTarget::AllMatching { total: 2 }, &query, 5)
            .unwrap();
        let BulkStep::Continue(first) = executor.on_response(&collected(0, vec![8, 9], 2)) else {
            panic!("expected first change");
        };
        let outcome = drive(&mut executor, first, &[]);
        assert_eq!((outcome.success_count, outcome.failure_count), (2, 0));
    }

    #[test]
    fn zero_affected_assignment_changes_nothing() {
        let mut executor = BulkActionExecutor::default();
        let filtered = executor
            .assign_case_manager(SelectionTarget::AllMatching { total: 100 }, &CanonicalQuery::default(), 3)
            .unwrap();
        let BulkStep::Finished(outcome) = executor.on_response(&applied(filtered, Some(0))) else {
            panic!("expected finish");
        };
        assert_eq!(outcome.success_count, 0);
        assert!(outcome.changed_nothing());
        assert!(!outcome.should_refresh());
        assert_eq!(outcome.message, "Ninguna solicitud fue asignada");
    }

    #[test]
    fn unrelated_responses_are_ignored() {
        let mut executor = BulkActionExecutor::default();
        let request = executor
            .begin_row_action(BackendRequest::update_preferred_date(
                1,
                NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            ))
            .unwrap();
        assert_eq!(
            executor.on_response(&applied(BackendRequest::delete_many(vec![1]), Some(1))),
            BulkStep::Ignored
        );
        assert!(executor.is_processing());
        let BulkStep::Finished(outcome) = executor.on_response(&failed(request)) else {
            panic!("expected finish");
        };
        assert_eq!(outcome.message, "Bolsa inválida");
        assert!(!executor.is_processing());
    }
}
