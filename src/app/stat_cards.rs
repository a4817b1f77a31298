//! Summary cards that double as quick filters.
//!
//! A card's active state is computed from [`QueryState`] on every call, so the
//! cards can never disagree with the filters actually sent to the server.

use super::catalogs::CatalogCache;
use super::query::{AssignmentFilter, FilterDimension, QueryState};
use crate::domain::{BagState, StatDimension};

/// Assignment statistics value for records without a case manager.
const UNASSIGNED_STAT: &str = "sin_asignar";

/// One summary card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCard {
    Total,
    BagState(BagState),
    Unassigned,
}

impl StatCard {
    /// Cards in display order.
    pub const ALL: [Self; 5] = [
        Self::Total,
        Self::BagState(BagState::Pending),
        Self::BagState(BagState::Observed),
        Self::BagState(BagState::Attended),
        Self::Unassigned,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Total => "Total",
            Self::BagState(state) => state.label(),
            Self::Unassigned => "Sin asignar",
        }
    }

    /// Count shown on the card, `None` until statistics arrive.
    #[must_use]
    pub fn count(self, catalogs: &CatalogCache) -> Option<u64> {
        match self {
            Self::Total => catalogs.stat_total(StatDimension::BagState),
            Self::BagState(state) => catalogs.stat_count(StatDimension::BagState, state.code()),
            Self::Unassigned => catalogs.stat_count(StatDimension::Assignment, UNASSIGNED_STAT),
        }
    }

    /// Whether the query currently filters the way this card does.
    ///
    /// `Total` is active when neither a bag state nor the unassigned filter is set.
    #[must_use]
    pub fn is_active(self, query: &QueryState) -> bool {
        match self {
            Self::Total => query.bag_state.is_none() && query.assignment != AssignmentFilter::Unassigned,
            Self::BagState(state) => query.bag_state == Some(state),
            Self::Unassigned => query.assignment == AssignmentFilter::Unassigned,
        }
    }

    /// Filter edits that activating this card performs.
    ///
    /// Activating an active card returns its dimension to "all". Activating
    /// `Total` clears both card dimensions.
    #[must_use]
    pub fn activation(self, query: &QueryState) -> Vec<(FilterDimension, String)> {
        let all = || String::from("todos");
        match self {
            Self::Total => {
                let mut edits = Vec::new();
                if query.bag_state.is_some() {
                    edits.push((FilterDimension::BagState, all()));
                }
                if query.assignment == AssignmentFilter::Unassigned {
                    edits.push((FilterDimension::Assignment, all()));
                }
                edits
            }
            Self::BagState(_) if self.is_active(query) => vec![(FilterDimension::BagState, all())],
            Self::BagState(state) => vec![(FilterDimension::BagState, state.code().to_string())],
            Self::Unassigned if self.is_active(query) => vec![(FilterDimension::Assignment, all())],
            Self::Unassigned => vec![(FilterDimension::Assignment, UNASSIGNED_STAT.to_string())],
        }
    }
}

/// Keyboard focus over the card row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatFilterCards {
    focus: usize,
}

impl StatFilterCards {
    #[must_use]
    pub const fn focused_index(&self) -> usize {
        self.focus
    }

    #[must_use]
    pub const fn focused(&self) -> StatCard {
        StatCard::ALL[self.focus]
    }

    /// Moves focus to the next card, wrapping.
    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % StatCard::ALL.len();
    }
}
