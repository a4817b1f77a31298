//! Reference-data cache with per-dimension isolation.
//!
//! Each catalog kind and each statistics dimension is requested independently.
//! A failed kind becomes an empty list and is marked [`CatalogStatus::Failed`];
//! the others are unaffected. [`CatalogCache::catalogs_ready`] gates the first
//! list request on catalogs only. Statistics are display decoration and may
//! arrive after the first render.
//!
//! Every load round carries a generation number so that replies belonging to an
//! earlier refresh are discarded on arrival.

use crate::domain::catalog::{fallback_management_label, DEFAULT_MANAGEMENT_STATE};
use crate::domain::{ApiFailure, CatalogEntry, CatalogKind, StatCount, StatDimension};
use std::collections::{BTreeMap, HashMap};

/// Label shown for a management-state code nobody knows.
pub const UNKNOWN_MANAGEMENT_STATE: &str = "Estado no registrado";

/// Load status of one catalog kind or statistics dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogStatus {
    #[default]
    NotRequested,
    Loading,
    Loaded,
    Failed,
}

impl CatalogStatus {
    const fn is_settled(self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }
}

#[derive(Debug, Clone, Default)]
struct CatalogSlot {
    status: CatalogStatus,
    entries: Vec<CatalogEntry>,
    by_id: HashMap<i64, usize>,
    by_code: HashMap<String, usize>,
}

impl CatalogSlot {
    fn replace(&mut self, entries: Vec<CatalogEntry>, status: CatalogStatus) {
        self.by_id = entries.iter().enumerate().map(|(i, e)| (e.id, i)).collect();
        self.by_code = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.code.to_uppercase(), i))
            .collect();
        self.entries = entries;
        self.status = status;
    }
}

#[derive(Debug, Clone, Default)]
struct StatSlot {
    status: CatalogStatus,
    counts: Vec<StatCount>,
}

/// What a load round must request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    pub generation: u64,
    pub catalogs: Vec<CatalogKind>,
    pub statistics: Vec<StatDimension>,
}

/// Cached catalogs and statistics.
#[derive(Debug, Clone, Default)]
pub struct CatalogCache {
    generation: u64,
    catalogs: BTreeMap<CatalogKind, CatalogSlot>,
    statistics: BTreeMap<StatDimension, StatSlot>,
}

impl CatalogCache {
    /// Starts a new load round; previous entries stay visible until replaced.
    pub fn begin_load(&mut self) -> LoadPlan {
        self.generation += 1;
        for kind in CatalogKind::ALL {
            self.catalogs.entry(kind).or_default().status = CatalogStatus::Loading;
        }
        for dimension in StatDimension::ALL {
            self.statistics.entry(dimension).or_default().status = CatalogStatus::Loading;
        }
        tracing::debug!(generation = self.generation, "catalog load round started");
        LoadPlan {
            generation: self.generation,
            catalogs: CatalogKind::ALL.to_vec(),
            statistics: StatDimension::ALL.to_vec(),
        }
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Applies one catalog reply. Returns `false` for stale generations.
    ///
    /// A failure replaces the kind with an empty list.
    pub fn apply_catalog(
        &mut self,
        generation: u64,
        kind: CatalogKind,
        outcome: Result<Vec<CatalogEntry>, ApiFailure>,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(?kind, generation, current = self.generation, "discarding stale catalog reply");
            return false;
        }
        let slot = self.catalogs.entry(kind).or_default();
        match outcome {
            Ok(entries) => {
                tracing::debug!(?kind, count = entries.len(), "catalog loaded");
                slot.replace(entries, CatalogStatus::Loaded);
            }
            Err(failure) => {
                tracing::warn!(?kind, error = %failure.user_message(), "catalog failed to load, using empty list");
                slot.replace(Vec::new(), CatalogStatus::Failed);
            }
        }
        true
    }

    /// Applies one statistics reply. Returns `false` for stale generations.
    pub fn apply_statistics(
        &mut self,
        generation: u64,
        dimension: StatDimension,
        outcome: Result<Vec<StatCount>, ApiFailure>,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        let slot = self.statistics.entry(dimension).or_default();
        match outcome {
            Ok(counts) => {
                slot.counts = counts;
                slot.status = CatalogStatus::Loaded;
            }
            Err(failure) => {
                tracing::warn!(?dimension, error = %failure.user_message(), "statistics failed to load");
                slot.counts.clear();
                slot.status = CatalogStatus::Failed;
            }
        }
        true
    }

    /// True once every catalog kind has either loaded or failed.
    #[must_use]
    pub fn catalogs_ready(&self) -> bool {
        CatalogKind::ALL
            .iter()
            .all(|kind| self.status(*kind).is_settled())
    }

    #[must_use]
    pub fn status(&self, kind: CatalogKind) -> CatalogStatus {
        self.catalogs.get(&kind).map_or(CatalogStatus::NotRequested, |slot| slot.status)
    }

    #[must_use]
    pub fn entries(&self, kind: CatalogKind) -> &[CatalogEntry] {
        self.catalogs.get(&kind).map_or(&[], |slot| slot.entries.as_slice())
    }

    #[must_use]
    pub fn by_id(&self, kind: CatalogKind, id: i64) -> Option<&CatalogEntry> {
        let slot = self.catalogs.get(&kind)?;
        slot.by_id.get(&id).map(|i| &slot.entries[*i])
    }

    #[must_use]
    pub fn by_code(&self, kind: CatalogKind, code: &str) -> Option<&CatalogEntry> {
        let slot = self.catalogs.get(&kind)?;
        slot.by_code.get(&code.to_uppercase()).map(|i| &slot.entries[*i])
    }

    /// Label for `code` from the dynamic catalog, then the static table.
    ///
    /// Only management states have a static table.
    #[must_use]
    pub fn resolve_label(&self, kind: CatalogKind, code: &str) -> Option<String> {
        self.by_code(kind, code).map(|entry| entry.label.clone()).or_else(|| {
            (kind == CatalogKind::ManagementStates)
                .then(|| fallback_management_label(code))
                .flatten()
                .map(String::from)
        })
    }

    /// Display label for a row's management state; never the raw code.
    ///
    /// Rows without a code are treated as the default state.
    #[must_use]
    pub fn management_state_label(&self, code: Option<&str>) -> String {
        let code = code.unwrap_or(DEFAULT_MANAGEMENT_STATE);
        self.resolve_label(CatalogKind::ManagementStates, code)
            .unwrap_or_else(|| UNKNOWN_MANAGEMENT_STATE.to_string())
    }

    /// Count for one value of a dimension, if statistics have arrived.
    #[must_use]
    pub fn stat_count(&self, dimension: StatDimension, value: &str) -> Option<u64> {
        let slot = self.statistics.get(&dimension)?;
        if slot.status != CatalogStatus::Loaded {
            return None;
        }
        Some(
            slot.counts
                .iter()
                .filter(|stat| stat.value.eq_ignore_ascii_case(value))
                .map(|stat| stat.count)
                .sum(),
        )
    }

    /// Sum of all counts of a dimension.
    #[must_use]
    pub fn stat_total(&self, dimension: StatDimension) -> Option<u64> {
        let slot = self.statistics.get(&dimension)?;
        (slot.status == CatalogStatus::Loaded).then(|| slot.counts.iter().map(|stat| stat.count).sum())
    }

    /// Raw counts of a dimension, for option lists without a catalog.
    #[must_use]
    pub fn stat_values(&self, dimension: StatDimension) -> &[StatCount] {
        self.statistics.get(&dimension).map_or(&[], |slot| slot.counts.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;

    fn entry(id: i64, code: &str, label: &str) -> CatalogEntry {
        CatalogEntry {
            id,
            code: code.to_string(),
            label: label.to_string(),
        }
    }

    fn failure() -> ApiFailure {
        ApiFailure {
            kind: FailureKind::Server,
            status: Some(500),
            message: None,
        }
    }

    #[test]
    fn one_failed_kind_does_not_block_the_others() {
        let mut cache = CatalogCache::default();
        let plan = cache.begin_load();
        assert!(!cache.catalogs_ready());

        for kind in CatalogKind::ALL {
            let outcome = if kind == CatalogKind::Networks {
                Err(failure())
            } else {
                Ok(vec![entry(1, "X", "Equis")])
            };
            assert!(cache.apply_catalog(plan.generation, kind, outcome));
        }

        assert!(cache.catalogs_ready());
        assert_eq!(cache.status(CatalogKind::Networks), CatalogStatus::Failed);
        assert!(cache.entries(CatalogKind::Networks).is_empty());
        assert_eq!(cache.entries(CatalogKind::Facilities).len(), 1);
    }

    #[test]
    fn statistics_are_not_part_of_the_gate() {
        let mut cache = CatalogCache::default();
        let plan = cache.begin_load();
        for kind in CatalogKind::ALL {
            cache.apply_catalog(plan.generation, kind, Ok(vec![]));
        }
        assert!(cache.catalogs_ready());
        assert_eq!(cache.stat_total(StatDimension::BagState), None);
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut cache = CatalogCache::default();
        let first = cache.begin_load();
        let second = cache.begin_load();
        assert!(!cache.apply_catalog(first.generation, CatalogKind::BagTypes, Ok(vec![entry(1, "A", "A")])));
        assert!(cache.apply_catalog(second.generation, CatalogKind::BagTypes, Ok(vec![entry(2, "B", "B")])));
        assert_eq!(cache.entries(CatalogKind::BagTypes)[0].id, 2);
    }

    #[test]
    fn management_label_prefers_dynamic_then_static() {
        let mut cache = CatalogCache::default();
        let plan = cache.begin_load();
        cache.apply_catalog(
            plan.generation,
            CatalogKind::ManagementStates,
            Ok(vec![entry(1, "CITADO", "Citado (catálogo)")]),
        );
        assert_eq!(cache.management_state_label(Some("citado")), "Citado (catálogo)");
        assert_eq!(cache.management_state_label(Some("NO_DESEA")), "No desea");
        assert_eq!(cache.management_state_label(None), "Pendiente de citar");
        assert_eq!(cache.management_state_label(Some("XYZ")), UNKNOWN_MANAGEMENT_STATE);
    }

    #[test]
    fn lookups_by_id_and_code() {
        let mut cache = CatalogCache::default();
        let plan = cache.begin_load();
        cache.apply_catalog(plan.generation, CatalogKind::CaseManagers, Ok(vec![entry(7, "7", "Ana Ruiz")]));
        assert_eq!(cache.by_id(CatalogKind::CaseManagers, 7).map(|e| e.label.as_str()), Some("Ana Ruiz"));
        assert!(cache.by_code(CatalogKind::CaseManagers, "8").is_none());
    }

    #[test]
    fn stat_counts_sum_matching_values() {
        let mut cache = CatalogCache::default();
        let plan = cache.begin_load();
        cache.apply_statistics(
            plan.generation,
            StatDimension::BagState,
            Ok(vec![
                StatCount { value: "PENDIENTE".into(), count: 40 },
                StatCount { value: "ATENDIDO".into(), count: 10 },
            ]),
        );
        assert_eq!(cache.stat_count(StatDimension::BagState, "pendiente"), Some(40));
        assert_eq!(cache.stat_total(StatDimension::BagState), Some(50));
    }
}
