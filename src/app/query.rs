//! Filter, search and sort state for the solicitud queue.
//!
//! [`QueryState`] holds one slot per filter dimension. UI-level "all" values
//! (`todas`, `todos`, empty) are stored as absent, so [`QueryState::canonical`]
//! can never leak a sentinel into request parameters.
//!
//! [`QueryStateManager`] wraps the state and reports a [`QueryChanged`] for every
//! logical change. The caller reacts to that value exactly once: page back to 0,
//! selection cleared, one reload scheduled.

use crate::domain::{BagState, QueueError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Literal values the UI uses for "no filter".
const ALL_SENTINELS: &[&str] = &["todas", "todos", "all", "*"];

/// Maximum length of the digit-only search term (a DNI).
pub const SEARCH_MAX_LEN: usize = 8;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whether `raw` means "every value" for a dimension.
#[must_use]
pub fn is_all_sentinel(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || ALL_SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(trimmed))
}

/// Keeps ASCII digits only and truncates to [`SEARCH_MAX_LEN`].
///
/// # Example
///
/// ```
/// use bolsas_queue::app::query::sanitize_search;
///
/// assert_eq!(sanitize_search("DNI 1234-5678 9"), "12345678");
/// ```
#[must_use]
pub fn sanitize_search(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(SEARCH_MAX_LEN)
        .collect()
}

/// A filterable dimension of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterDimension {
    BagTypes,
    Network,
    AscriptionFacility,
    AttentionFacility,
    Specialty,
    ManagementState,
    AppointmentType,
    Assignment,
    BagState,
    MedicalCondition,
    DateStart,
    DateEnd,
}

impl FilterDimension {
    /// Every dimension, in the order the filter picker lists them.
    pub const ALL: [Self; 12] = [
        Self::BagTypes,
        Self::ManagementState,
        Self::BagState,
        Self::Assignment,
        Self::Specialty,
        Self::Network,
        Self::AscriptionFacility,
        Self::AttentionFacility,
        Self::AppointmentType,
        Self::MedicalCondition,
        Self::DateStart,
        Self::DateEnd,
    ];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BagTypes => "Tipo de bolsa",
            Self::Network => "Red",
            Self::AscriptionFacility => "IPRESS de adscripción",
            Self::AttentionFacility => "IPRESS de atención",
            Self::Specialty => "Especialidad",
            Self::ManagementState => "Estado de gestión",
            Self::AppointmentType => "Tipo de cita",
            Self::Assignment => "Asignación",
            Self::BagState => "Estado de bolsa",
            Self::MedicalCondition => "Condición médica",
            Self::DateStart => "Fecha desde",
            Self::DateEnd => "Fecha hasta",
        }
    }

    /// Whether values are typed rather than picked from a list.
    #[must_use]
    pub const fn is_date(self) -> bool {
        matches!(self, Self::DateStart | Self::DateEnd)
    }
}

/// Assignment slot of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssignmentFilter {
    #[default]
    All,
    Assigned,
    Unassigned,
    ByManager(i64),
}

impl AssignmentFilter {
    /// Parses a picker value: `asignados`, `sin_asignar`, or a manager id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for anything else.
    pub fn parse(raw: &str) -> Result<Self> {
        if is_all_sentinel(raw) {
            return Ok(Self::All);
        }
        let value = raw.trim().to_lowercase();
        match value.as_str() {
            "asignados" | "assigned" => Ok(Self::Assigned),
            "sin_asignar" | "sin-asignar" | "unassigned" => Ok(Self::Unassigned),
            _ => value
                .parse::<i64>()
                .map(Self::ByManager)
                .map_err(|_| QueueError::validation(format!("Filtro de asignación desconocido: {raw}"))),
        }
    }
}

/// Sortable columns of the loaded page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortColumn {
    PatientName,
    Dni,
    Age,
    PreferredDate,
    Specialty,
    BagType,
    ManagementState,
    CaseManager,
    AssignedAt,
    RequestedAt,
}

impl SortColumn {
    pub const ALL: [Self; 10] = [
        Self::PatientName,
        Self::Dni,
        Self::Age,
        Self::PreferredDate,
        Self::Specialty,
        Self::BagType,
        Self::ManagementState,
        Self::CaseManager,
        Self::AssignedAt,
        Self::RequestedAt,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PatientName => "Paciente",
            Self::Dni => "DNI",
            Self::Age => "Edad",
            Self::PreferredDate => "Fecha preferida",
            Self::Specialty => "Especialidad",
            Self::BagType => "Bolsa",
            Self::ManagementState => "Estado de gestión",
            Self::CaseManager => "Gestora",
            Self::AssignedAt => "Fecha de asignación",
            Self::RequestedAt => "Fecha de solicitud",
        }
    }
}

/// Ascending or descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Active client-side sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

/// Every filter slot, the search term, and the page-local sort.
///
/// `Default` is the fully unfiltered query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryState {
    /// Empty means every bag type.
    pub bag_types: BTreeSet<String>,
    pub network: Option<String>,
    pub ascription_facility: Option<String>,
    pub attention_facility: Option<String>,
    pub specialty: Option<String>,
    pub management_state: Option<String>,
    pub appointment_type: Option<String>,
    pub assignment: AssignmentFilter,
    pub bag_state: Option<BagState>,
    pub medical_condition: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    /// Digits only, at most [`SEARCH_MAX_LEN`].
    pub search: String,
    /// Not sent to the server and not a filter: changing it never resets paging.
    pub sort: Option<SortSpec>,
}

impl QueryState {
    /// Applies a picker or prompt value to one dimension.
    ///
    /// Sentinel values clear the dimension. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed dates, unknown bag states or
    /// assignment values, and date ranges whose start is after their end. The
    /// state is left untouched in that case.
    pub fn set_filter(&mut self, dimension: FilterDimension, raw: &str) -> Result<bool> {
        let mut next = self.clone();
        let text = (!is_all_sentinel(raw)).then(|| raw.trim().to_string());

        match dimension {
            FilterDimension::BagTypes => {
                next.bag_types = text
                    .map(|csv| {
                        csv.split(',')
                            .map(str::trim)
                            .filter(|code| !code.is_empty() && !is_all_sentinel(code))
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default();
            }
            FilterDimension::Network => next.network = text,
            FilterDimension::AscriptionFacility => next.ascription_facility = text,
            FilterDimension::AttentionFacility => next.attention_facility = text,
            FilterDimension::Specialty => next.specialty = text,
            FilterDimension::ManagementState => next.management_state = text.map(|code| code.to_uppercase()),
            FilterDimension::AppointmentType => next.appointment_type = text,
            FilterDimension::MedicalCondition => next.medical_condition = text,
            FilterDimension::Assignment => next.assignment = AssignmentFilter::parse(raw)?,
            FilterDimension::BagState => {
                next.bag_state = match text {
                    None => None,
                    Some(code) => Some(
                        BagState::parse(&code)
                            .ok_or_else(|| QueueError::validation(format!("Estado de bolsa desconocido: {code}")))?,
                    ),
                };
            }
            FilterDimension::DateStart => next.date_start = text.as_deref().map(parse_date).transpose()?,
            FilterDimension::DateEnd => next.date_end = text.as_deref().map(parse_date).transpose()?,
        }

        if let (Some(start), Some(end)) = (next.date_start, next.date_end) {
            if start > end {
                return Err(QueueError::validation(
                    "La fecha de inicio no puede ser posterior a la fecha de fin",
                ));
            }
        }

        let changed = next != *self;
        *self = next;
        Ok(changed)
    }

    /// Adds or removes one bag-type code from the set.
    pub fn toggle_bag_type(&mut self, code: &str) {
        if !self.bag_types.remove(code) {
            self.bag_types.insert(code.to_string());
        }
    }

    /// Current value of a dimension as a picker value, `None` when unfiltered.
    #[must_use]
    pub fn value_of(&self, dimension: FilterDimension) -> Option<String> {
        match dimension {
            FilterDimension::BagTypes => {
                (!self.bag_types.is_empty()).then(|| self.bag_types.iter().cloned().collect::<Vec<_>>().join(","))
            }
            FilterDimension::Network => self.network.clone(),
            FilterDimension::AscriptionFacility => self.ascription_facility.clone(),
            FilterDimension::AttentionFacility => self.attention_facility.clone(),
            FilterDimension::Specialty => self.specialty.clone(),
            FilterDimension::ManagementState => self.management_state.clone(),
            FilterDimension::AppointmentType => self.appointment_type.clone(),
            FilterDimension::MedicalCondition => self.medical_condition.clone(),
            FilterDimension::Assignment => match self.assignment {
                AssignmentFilter::All => None,
                AssignmentFilter::Assigned => Some("asignados".to_string()),
                AssignmentFilter::Unassigned => Some("sin_asignar".to_string()),
                AssignmentFilter::ByManager(id) => Some(id.to_string()),
            },
            FilterDimension::BagState => self.bag_state.map(|state| state.code().to_string()),
            FilterDimension::DateStart => self.date_start.map(|d| d.format(DATE_FORMAT).to_string()),
            FilterDimension::DateEnd => self.date_end.map(|d| d.format(DATE_FORMAT).to_string()),
        }
    }

    /// Whether any filter or search is active.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        FilterDimension::ALL.iter().any(|d| self.value_of(*d).is_some()) || !self.search.is_empty()
    }

    /// Builds the request parameters, with every sentinel already absent.
    #[must_use]
    pub fn canonical(&self) -> CanonicalQuery {
        let (assignment_filter, manager_id) = match self.assignment {
            AssignmentFilter::All => (None, None),
            AssignmentFilter::Assigned => (Some("asignados".to_string()), None),
            AssignmentFilter::Unassigned => (Some("sin_asignar".to_string()), None),
            AssignmentFilter::ByManager(id) => (None, Some(id)),
        };

        CanonicalQuery {
            bag_types: self.value_of(FilterDimension::BagTypes),
            network: self.network.clone(),
            ascription_facility: self.ascription_facility.clone(),
            attention_facility: self.attention_facility.clone(),
            specialty: self.specialty.clone(),
            management_state_code: self.management_state.clone(),
            appointment_type: self.appointment_type.clone(),
            assignment_filter,
            free_text_search: (!self.search.is_empty()).then(|| self.search.clone()),
            date_start: self.date_start,
            date_end: self.date_end,
            medical_condition: self.medical_condition.clone(),
            manager_id,
            bag_state: self.bag_state.map(|state| state.code().to_string()),
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| QueueError::validation(format!("Fecha inválida (use AAAA-MM-DD): {raw}")))
}

/// Server-side filter parameters; `None` means the parameter is omitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanonicalQuery {
    pub bag_types: Option<String>,
    pub network: Option<String>,
    pub ascription_facility: Option<String>,
    pub attention_facility: Option<String>,
    pub specialty: Option<String>,
    pub management_state_code: Option<String>,
    pub appointment_type: Option<String>,
    pub assignment_filter: Option<String>,
    pub free_text_search: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub medical_condition: Option<String>,
    pub manager_id: Option<i64>,
    pub bag_state: Option<String>,
}

impl CanonicalQuery {
    /// Present parameters as `(name, value)` pairs, in a stable order.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let date = |d: &NaiveDate| d.format(DATE_FORMAT).to_string();
        [
            ("bagTypes", self.bag_types.clone()),
            ("network", self.network.clone()),
            ("ascriptionFacility", self.ascription_facility.clone()),
            ("attentionFacility", self.attention_facility.clone()),
            ("specialty", self.specialty.clone()),
            ("managementStateCode", self.management_state_code.clone()),
            ("appointmentType", self.appointment_type.clone()),
            ("assignmentFilter", self.assignment_filter.clone()),
            ("freeTextSearch", self.free_text_search.clone()),
            ("dateStart", self.date_start.as_ref().map(date)),
            ("dateEnd", self.date_end.as_ref().map(date)),
            ("medicalCondition", self.medical_condition.clone()),
            ("managerId", self.manager_id.map(|id| id.to_string())),
            ("bagState", self.bag_state.clone()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

/// Proof that the canonical query changed; handled exactly once by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct QueryChanged {
    /// Monotonic revision of the query after the change.
    pub revision: u64,
}

/// Owner of [`QueryState`]; the only way to mutate filters and search.
#[derive(Debug, Clone, Default)]
pub struct QueryStateManager {
    state: QueryState,
    revision: u64,
}

impl QueryStateManager {
    #[must_use]
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    #[must_use]
    pub fn canonical(&self) -> CanonicalQuery {
        self.state.canonical()
    }

    fn changed(&mut self) -> QueryChanged {
        self.revision += 1;
        QueryChanged {
            revision: self.revision,
        }
    }

    /// Sets one dimension from a UI value.
    ///
    /// # Returns
    ///
    /// `Some(QueryChanged)` if the stored value differs afterwards, `None` if the
    /// same value was re-applied.
    ///
    /// # Errors
    ///
    /// Propagates validation errors from [`QueryState::set_filter`].
    pub fn set_filter(&mut self, dimension: FilterDimension, raw: &str) -> Result<Option<QueryChanged>> {
        let changed = self.state.set_filter(dimension, raw)?;
        tracing::debug!(?dimension, value = raw, changed, "filter applied");
        Ok(changed.then(|| self.changed()))
    }

    /// Adds or removes a bag type from the set filter.
    pub fn toggle_bag_type(&mut self, code: &str) -> QueryChanged {
        self.state.toggle_bag_type(code);
        self.changed()
    }

    /// Replaces the search term with the sanitized form of `input`.
    pub fn set_search(&mut self, input: &str) -> Option<QueryChanged> {
        let sanitized = sanitize_search(input);
        if sanitized == self.state.search {
            return None;
        }
        self.state.search = sanitized;
        Some(self.changed())
    }

    /// Appends a keystroke to the search term; non-digits are dropped.
    pub fn push_search_char(&mut self, c: char) -> Option<QueryChanged> {
        let mut next = self.state.search.clone();
        next.push(c);
        self.set_search(&next)
    }

    /// Removes the last digit of the search term.
    pub fn pop_search_char(&mut self) -> Option<QueryChanged> {
        let mut next = self.state.search.clone();
        next.pop()?;
        self.set_search(&next)
    }

    /// Resets every dimension and the search term; always one change.
    ///
    /// The page-local sort is kept.
    pub fn clear_all(&mut self) -> QueryChanged {
        let sort = self.state.sort;
        self.state = QueryState {
            sort,
            ..QueryState::default()
        };
        self.changed()
    }

    /// Sorts by `column`, toggling direction when it is already active.
    pub fn sort_by(&mut self, column: SortColumn) -> SortSpec {
        let direction = match self.state.sort {
            Some(SortSpec {
                column: current,
                direction: SortDirection::Ascending,
            }) if current == column => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        let spec = SortSpec { column, direction };
        self.state.sort = Some(spec);
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_never_reach_the_canonical_query() {
        let mut manager = QueryStateManager::default();
        manager.set_filter(FilterDimension::Network, "Todas").unwrap();
        manager.set_filter(FilterDimension::Specialty, "todos").unwrap();
        manager.set_filter(FilterDimension::BagTypes, "todas").unwrap();
        assert_eq!(manager.canonical(), CanonicalQuery::default());
        assert!(manager.canonical().to_params().is_empty());
    }

    #[test]
    fn reapplying_the_same_value_is_not_a_change() {
        let mut manager = QueryStateManager::default();
        assert!(manager.set_filter(FilterDimension::Network, "Red Rebagliati").unwrap().is_some());
        assert!(manager.set_filter(FilterDimension::Network, "Red Rebagliati").unwrap().is_none());
        assert!(manager.set_filter(FilterDimension::Network, "todas").unwrap().is_some());
    }

    #[test]
    fn search_keeps_digits_and_caps_length() {
        let mut manager = QueryStateManager::default();
        assert!(manager.set_search("12a34b56789").is_some());
        assert_eq!(manager.state().search, "12345678");
        assert!(manager.push_search_char('x').is_none());
        assert!(manager.push_search_char('9').is_none());
        assert!(manager.pop_search_char().is_some());
        assert_eq!(manager.state().search, "1234567");
    }

    #[test]
    fn management_state_and_search_populate_together() {
        let mut manager = QueryStateManager::default();
        manager.set_filter(FilterDimension::ManagementState, "OBSERVADO").unwrap();
        manager.set_search("12345678");
        let query = manager.canonical();
        assert_eq!(query.management_state_code.as_deref(), Some("OBSERVADO"));
        assert_eq!(query.free_text_search.as_deref(), Some("12345678"));

        let first = manager.clear_all();
        assert_eq!(manager.canonical(), CanonicalQuery::default());
        assert_eq!(manager.state().search, "");
        assert!(manager.clear_all().revision > first.revision);
    }

    #[test]
    fn clear_all_keeps_sort() {
        let mut manager = QueryStateManager::default();
        manager.sort_by(SortColumn::Age);
        let _ = manager.clear_all();
        assert_eq!(manager.state().sort.map(|s| s.column), Some(SortColumn::Age));
    }

    #[test]
    fn inverted_date_range_is_rejected_without_mutation() {
        let mut manager = QueryStateManager::default();
        manager.set_filter(FilterDimension::DateEnd, "2025-01-31").unwrap();
        let error = manager.set_filter(FilterDimension::DateStart, "2025-02-01").unwrap_err();
        assert!(matches!(error, QueueError::Validation { .. }));
        assert_eq!(manager.state().date_start, None);
    }

    #[test]
    fn malformed_date_is_a_validation_error() {
        let mut manager = QueryStateManager::default();
        assert!(manager.set_filter(FilterDimension::DateStart, "31/01/2025").is_err());
    }

    #[test]
    fn assignment_maps_to_filter_or_manager_id() {
        let mut state = QueryState::default();
        state.set_filter(FilterDimension::Assignment, "sin_asignar").unwrap();
        assert_eq!(state.canonical().assignment_filter.as_deref(), Some("sin_asignar"));

        state.set_filter(FilterDimension::Assignment, "42").unwrap();
        let query = state.canonical();
        assert_eq!(query.assignment_filter, None);
        assert_eq!(query.manager_id, Some(42));

        assert!(state.set_filter(FilterDimension::Assignment, "quizá").is_err());
    }

    #[test]
    fn bag_types_serialize_as_csv() {
        let mut state = QueryState::default();
        state.toggle_bag_type("BOLSA_107");
        state.toggle_bag_type("BOLSA_DENGUE");
        let params = state.canonical().to_params();
        assert_eq!(params, vec![("bagTypes", "BOLSA_107,BOLSA_DENGUE".to_string())]);
        state.toggle_bag_type("BOLSA_107");
        assert_eq!(state.value_of(FilterDimension::BagTypes).as_deref(), Some("BOLSA_DENGUE"));
    }

    #[test]
    fn sort_toggles_on_same_column_and_resets_on_new_one() {
        let mut manager = QueryStateManager::default();
        assert_eq!(manager.sort_by(SortColumn::PreferredDate).direction, SortDirection::Ascending);
        assert_eq!(manager.sort_by(SortColumn::PreferredDate).direction, SortDirection::Descending);
        assert_eq!(manager.sort_by(SortColumn::PreferredDate).direction, SortDirection::Ascending);
        manager.sort_by(SortColumn::PreferredDate);
        assert_eq!(manager.sort_by(SortColumn::Age).direction, SortDirection::Ascending);
    }
}
