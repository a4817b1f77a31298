//! Paginated list loading with last-request-wins ordering.
//!
//! Every search request carries a sequence token from a monotonic counter. A
//! reply is committed only if its token is the latest one issued and still in
//! flight; anything else is dropped on arrival, even when an older request
//! resolves after a newer one. There is no network abort: superseded requests
//! finish and are ignored.
//!
//! Committed records are mapped into [`QueueRow`]s with explicit fallbacks for
//! every optional field, then sorted client-side when a sort is active. Sorting
//! touches only the loaded page and compares raw timestamps for date columns.

use super::catalogs::CatalogCache;
use super::query::{CanonicalQuery, SortColumn, SortDirection, SortSpec};
use crate::backend::{BackendRequest, SearchPage};
use crate::domain::solicitud::parse_timestamp;
use crate::domain::{ApiFailure, CatalogKind, SolicitudRecord};
use chrono::NaiveDateTime;
use std::cmp::Ordering;

/// Fallback for missing identity and descriptor fields.
pub const NOT_AVAILABLE: &str = "N/A";
/// Fallback for missing secondary fields.
pub const EM_DASH: &str = "—";
/// Shown when no case manager is assigned.
pub const UNASSIGNED: &str = "Sin asignar";

const DISPLAY_DATE: &str = "%d/%m/%Y";
const DISPLAY_DATE_TIME: &str = "%d/%m/%Y %H:%M";

/// Identity of a list request: what the server is asked for.
///
/// Sort is deliberately absent; it never reaches the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestKey {
    pub query: CanonicalQuery,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    token: u64,
    key: RequestKey,
}

/// Display-ready row of the queue table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRow {
    pub id: i64,
    pub dni: String,
    pub patient_name: String,
    pub sex: String,
    pub age: Option<u32>,
    pub phone: String,
    pub alternate_phone: String,
    pub bag: String,
    pub preferred_date: String,
    pub appointment_type: String,
    pub specialty: String,
    pub ascription_facility: String,
    pub attention_facility: String,
    pub network: String,
    pub bag_state: String,
    pub management_state: String,
    pub case_manager: String,
    pub case_manager_id: Option<i64>,
    pub assigned_at: String,
    pub state_change: String,
    pub medical_condition: String,
    preferred_date_raw: Option<NaiveDateTime>,
    assigned_at_raw: Option<NaiveDateTime>,
    requested_at_raw: Option<NaiveDateTime>,
}

fn or_fallback(value: Option<&String>, fallback: &str) -> String {
    value.map_or_else(|| fallback.to_string(), Clone::clone)
}

fn display_date(raw: Option<&String>, format: &str) -> String {
    match raw {
        None => EM_DASH.to_string(),
        Some(raw) => parse_timestamp(raw).map_or_else(|| raw.clone(), |parsed| parsed.format(format).to_string()),
    }
}

impl QueueRow {
    /// Maps a normalized record using catalog lookups for labels.
    #[must_use]
    pub fn from_record(record: &SolicitudRecord, catalogs: &CatalogCache) -> Self {
        let bag = record
            .bag_alias
            .clone()
            .or_else(|| {
                record
                    .bag_type_id
                    .and_then(|id| catalogs.by_id(CatalogKind::BagTypes, id))
                    .map(|entry| entry.label.clone())
            })
            .or_else(|| {
                record
                    .bag_code
                    .as_deref()
                    .and_then(|code| catalogs.resolve_label(CatalogKind::BagTypes, code))
            })
            .or_else(|| record.bag_code.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let case_manager = record
            .manager_name
            .clone()
            .or_else(|| {
                record
                    .manager_id
                    .and_then(|id| catalogs.by_id(CatalogKind::CaseManagers, id))
                    .map(|entry| entry.label.clone())
            })
            .or_else(|| record.manager_id.map(|id| format!("Gestora #{id}")))
            .unwrap_or_else(|| UNASSIGNED.to_string());

        let attention_facility = record
            .attention_facility
            .clone()
            .or_else(|| {
                record
                    .attention_facility_id
                    .and_then(|id| catalogs.by_id(CatalogKind::Facilities, id))
                    .map(|entry| entry.label.clone())
            })
            .unwrap_or_else(|| EM_DASH.to_string());

        let state_change = match (&record.state_changed_by, &record.state_changed_at) {
            (Some(who), Some(when)) => format!("{who} · {}", display_date(Some(when), DISPLAY_DATE_TIME)),
            (Some(who), None) => who.clone(),
            (None, Some(when)) => display_date(Some(when), DISPLAY_DATE_TIME),
            (None, None) => EM_DASH.to_string(),
        };

        Self {
            id: record.id,
            dni: or_fallback(record.patient_dni.as_ref(), NOT_AVAILABLE),
            patient_name: or_fallback(record.patient_name.as_ref(), NOT_AVAILABLE),
            sex: or_fallback(record.patient_sex.as_ref(), EM_DASH),
            age: record.patient_age,
            phone: or_fallback(record.phone.as_ref(), EM_DASH),
            alternate_phone: or_fallback(record.alternate_phone.as_ref(), EM_DASH),
            bag,
            preferred_date: display_date(record.preferred_date.as_ref(), DISPLAY_DATE),
            appointment_type: or_fallback(record.appointment_type.as_ref(), EM_DASH),
            specialty: or_fallback(record.specialty.as_ref(), NOT_AVAILABLE),
            ascription_facility: or_fallback(record.ascription_facility.as_ref(), NOT_AVAILABLE),
            attention_facility,
            network: or_fallback(record.network.as_ref(), NOT_AVAILABLE),
            bag_state: record.bag_state.map_or_else(|| EM_DASH.to_string(), |state| state.label().to_string()),
            management_state: catalogs.management_state_label(record.management_state_code.as_deref()),
            case_manager,
            case_manager_id: record.manager_id,
            assigned_at: display_date(record.assigned_at.as_ref(), DISPLAY_DATE_TIME),
            state_change,
            medical_condition: or_fallback(record.medical_condition.as_ref(), "Pendiente"),
            preferred_date_raw: record.preferred_date.as_deref().and_then(parse_timestamp),
            assigned_at_raw: record.assigned_at.as_deref().and_then(parse_timestamp),
            requested_at_raw: record.requested_at.as_deref().and_then(parse_timestamp),
        }
    }
}

fn text_key(value: &str) -> Option<String> {
    (value != NOT_AVAILABLE && value != EM_DASH && value != UNASSIGNED).then(|| value.to_lowercase())
}

/// Orders present values by direction; missing values always go last.
fn compare_present<T: Ord>(a: Option<T>, b: Option<T>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Ascending => a.cmp(&b),
            SortDirection::Descending => b.cmp(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_rows(a: &QueueRow, b: &QueueRow, spec: SortSpec) -> Ordering {
    let direction = spec.direction;
    match spec.column {
        SortColumn::PatientName => compare_present(text_key(&a.patient_name), text_key(&b.patient_name), direction),
        SortColumn::Dni => compare_present(text_key(&a.dni), text_key(&b.dni), direction),
        SortColumn::Age => compare_present(a.age, b.age, direction),
        SortColumn::PreferredDate => compare_present(a.preferred_date_raw, b.preferred_date_raw, direction),
        SortColumn::Specialty => compare_present(text_key(&a.specialty), text_key(&b.specialty), direction),
        SortColumn::BagType => compare_present(text_key(&a.bag), text_key(&b.bag), direction),
        SortColumn::ManagementState => {
            compare_present(text_key(&a.management_state), text_key(&b.management_state), direction)
        }
        SortColumn::CaseManager => compare_present(text_key(&a.case_manager), text_key(&b.case_manager), direction),
        SortColumn::AssignedAt => compare_present(a.assigned_at_raw, b.assigned_at_raw, direction),
        SortColumn::RequestedAt => compare_present(a.requested_at_raw, b.requested_at_raw, direction),
    }
}

/// Loader for the visible page.
#[derive(Debug, Clone, Default)]
pub struct ListLoader {
    next_token: u64,
    in_flight: Option<InFlight>,
    committed: Option<RequestKey>,
    records: Vec<SolicitudRecord>,
    rows: Vec<QueueRow>,
    last_failure: Option<ApiFailure>,
    has_loaded: bool,
}

impl ListLoader {
    /// Issues a request for `key` unless it would duplicate one already in
    /// flight or already on screen.
    ///
    /// `force` bypasses the duplicate check (reload after a mutation, retry).
    ///
    /// # Returns
    ///
    /// The tokened request to send, or `None` when nothing needs to go out.
    pub fn request(&mut self, key: RequestKey, force: bool) -> Option<BackendRequest> {
        if !force {
            let duplicate = match &self.in_flight {
                Some(in_flight) => in_flight.key == key,
                None => self.committed.as_ref() == Some(&key),
            };
            if duplicate {
                tracing::debug!(page = key.page, size = key.size, "list request already satisfied");
                return None;
            }
        }

        self.next_token += 1;
        let token = self.next_token;
        tracing::debug!(token, page = key.page, size = key.size, "issuing list request");
        let request = BackendRequest::search_page(token, key.query.clone(), key.page, key.size);
        self.in_flight = Some(InFlight { token, key });
        Some(request)
    }

    /// Commits a page if `token` is the latest in flight.
    ///
    /// Returns `false` when the reply was stale and nothing changed.
    pub fn commit(&mut self, token: u64, page: SearchPage, catalogs: &CatalogCache, sort: Option<SortSpec>) -> bool {
        let Some(in_flight) = self.in_flight.take_if_token(token) else {
            tracing::debug!(token, latest = self.next_token, "discarding stale list reply");
            return false;
        };

        tracing::debug!(token, rows = page.records.len(), total = page.total_elements, "committing list reply");
        self.committed = Some(in_flight.key);
        self.records = page.records;
        self.last_failure = None;
        self.has_loaded = true;
        self.remap(catalogs, sort);
        true
    }

    /// Records a failure of the latest request; previous rows stay visible.
    ///
    /// Returns `false` for stale tokens.
    pub fn fail(&mut self, token: u64, failure: ApiFailure) -> bool {
        if self.in_flight.take_if_token(token).is_none() {
            tracing::debug!(token, "discarding stale list failure");
            return false;
        }
        tracing::warn!(token, error = %failure.user_message(), "list request failed");
        self.last_failure = Some(failure);
        true
    }

    /// Rebuilds rows from the committed records, e.g. after catalogs refresh.
    pub fn remap(&mut self, catalogs: &CatalogCache, sort: Option<SortSpec>) {
        self.rows = self
            .records
            .iter()
            .map(|record| QueueRow::from_record(record, catalogs))
            .collect();
        self.apply_sort(sort);
    }

    /// Sorts the loaded rows; `None` leaves server order.
    pub fn apply_sort(&mut self, sort: Option<SortSpec>) {
        if let Some(spec) = sort {
            self.rows.sort_by(|a, b| compare_rows(a, b, spec));
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[QueueRow] {
        &self.rows
    }

    /// Ids of loaded rows in display order.
    #[must_use]
    pub fn loaded_ids(&self) -> Vec<i64> {
        self.rows.iter().map(|row| row.id).collect()
    }

    #[must_use]
    pub fn record(&self, id: i64) -> Option<&SolicitudRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub const fn has_loaded(&self) -> bool {
        self.has_loaded
    }

    #[must_use]
    pub const fn last_failure(&self) -> Option<&ApiFailure> {
        self.last_failure.as_ref()
    }

    /// Latest token handed out.
    #[must_use]
    pub const fn latest_token(&self) -> u64 {
        self.next_token
    }

    /// Key of the request on screen or in flight, for retries.
    #[must_use]
    pub fn current_key(&self) -> Option<&RequestKey> {
        self.in_flight
            .as_ref()
            .map(|in_flight| &in_flight.key)
            .or(self.committed.as_ref())
    }
}

trait TakeIfToken {
    fn take_if_token(&mut self, token: u64) -> Option<InFlight>;
}

impl TakeIfToken for Option<InFlight> {
    fn take_if_token(&mut self, token: u64) -> Option<InFlight> {
        if self.as_ref().is_some_and(|in_flight| in_flight.token == token) {
            self.take()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BagState;

    fn key(page: u32) -> RequestKey {
        RequestKey {
            query: CanonicalQuery::default(),
            page,
            size: 20,
        }
    }

    fn token_of(request: &BackendRequest) -> u64 {
        match request {
            BackendRequest::SearchPage { token, .. } => *token,
            other => panic!("unexpected request {other:?}"),
        }
    }

    fn record(id: i64, name: &str, preferred: &str) -> SolicitudRecord {
        SolicitudRecord {
            id,
            patient_name: Some(name.to_string()),
            preferred_date: Some(preferred.to_string()),
            ..SolicitudRecord::default()
        }
    }

    fn page(records: Vec<SolicitudRecord>, total: u64) -> SearchPage {
        SearchPage {
            records,
            total_elements: total,
            total_pages: 1,
        }
    }

    #[test]
    fn older_reply_arriving_last_is_discarded() {
        let catalogs = CatalogCache::default();
        let mut loader = ListLoader::default();
        let a = token_of(&loader.request(key(0), false).unwrap());
        let mut filtered = key(0);
        filtered.query.network = Some("Red Sabogal".into());
        let b = token_of(&loader.request(filtered.clone(), false).unwrap());
        assert!(b > a);

        assert!(loader.commit(b, page(vec![record(2, "B", "2025-01-01")], 1), &catalogs, None));
        assert!(!loader.commit(a, page(vec![record(1, "A", "2025-01-01")], 1), &catalogs, None));
        assert_eq!(loader.loaded_ids(), vec![2]);
        assert_eq!(loader.current_key(), Some(&filtered));
    }

    #[test]
    fn duplicate_requests_are_not_reissued() {
        let catalogs = CatalogCache::default();
        let mut loader = ListLoader::default();
        let token = token_of(&loader.request(key(0), false).unwrap());
        assert!(loader.request(key(0), false).is_none());
        loader.commit(token, page(vec![], 0), &catalogs, None);
        assert!(loader.request(key(0), false).is_none());
        assert!(loader.request(key(0), true).is_some());
        assert!(loader.request(key(1), false).is_some());
    }

    #[test]
    fn failure_keeps_previous_rows() {
        let catalogs = CatalogCache::default();
        let mut loader = ListLoader::default();
        let first = token_of(&loader.request(key(0), false).unwrap());
        loader.commit(first, page(vec![record(5, "E", "2025-01-01")], 1), &catalogs, None);

        let second = token_of(&loader.request(key(1), false).unwrap());
        assert!(loader.fail(second, ApiFailure::network(None)));
        assert_eq!(loader.loaded_ids(), vec![5]);
        assert!(loader.last_failure().is_some());
        assert!(!loader.is_loading());
        assert!(!loader.fail(second, ApiFailure::network(None)));
    }

    #[test]
    fn missing_fields_resolve_to_fallbacks() {
        let catalogs = CatalogCache::default();
        let row = QueueRow::from_record(&SolicitudRecord { id: 1, ..SolicitudRecord::default() }, &catalogs);
        assert_eq!(row.dni, NOT_AVAILABLE);
        assert_eq!(row.phone, EM_DASH);
        assert_eq!(row.bag, NOT_AVAILABLE);
        assert_eq!(row.case_manager, UNASSIGNED);
        assert_eq!(row.management_state, "Pendiente de citar");
        assert_eq!(row.medical_condition, "Pendiente");
        assert_eq!(row.bag_state, EM_DASH);
    }

    #[test]
    fn date_columns_sort_by_raw_timestamp() {
        let catalogs = CatalogCache::default();
        let mut loader = ListLoader::default();
        let token = token_of(&loader.request(key(0), false).unwrap());
        let records = vec![
            record(1, "Uno", "2025-02-01"),
            record(2, "Dos", "2024-12-31"),
            record(3, "Tres", "2025-01-15"),
        ];
        let ascending = SortSpec {
            column: SortColumn::PreferredDate,
            direction: SortDirection::Ascending,
        };
        loader.commit(token, page(records, 3), &catalogs, Some(ascending));
        // "31/12/2024" < "01/02/2025" is false as display strings; raw order wins.
        assert_eq!(loader.loaded_ids(), vec![2, 3, 1]);

        loader.apply_sort(Some(SortSpec {
            direction: SortDirection::Descending,
            ..ascending
        }));
        assert_eq!(loader.loaded_ids(), vec![1, 3, 2]);
    }

    #[test]
    fn missing_values_sort_last_in_both_directions() {
        let catalogs = CatalogCache::default();
        let mut loader = ListLoader::default();
        let token = token_of(&loader.request(key(0), false).unwrap());
        let mut without_age = record(1, "Sin edad", "2025-01-01");
        without_age.patient_age = None;
        let mut older = record(2, "Mayor", "2025-01-01");
        older.patient_age = Some(80);
        let mut younger = record(3, "Menor", "2025-01-01");
        younger.patient_age = Some(30);
        younger.bag_state = Some(BagState::Observed);

        let spec = SortSpec {
            column: SortColumn::Age,
            direction: SortDirection::Descending,
        };
        loader.commit(token, page(vec![without_age, older, younger], 3), &catalogs, Some(spec));
        assert_eq!(loader.loaded_ids(), vec![2, 3, 1]);
    }
}
