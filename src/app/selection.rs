//! Tri-state row selection.
//!
//! `None` with explicit ids is a partial selection of the loaded page, `Page`
//! means every loaded row, and `AllMatching` means every record matching the
//! current query on every page. The caller clears the selection whenever the
//! query or the page changes.

use std::collections::BTreeSet;

/// How far the selection reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Nothing, or an explicit subset of the loaded page.
    #[default]
    None,
    /// Every row of the loaded page.
    Page,
    /// Every record matching the query, across pages.
    AllMatching,
}

/// What a bulk action should operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionTarget {
    /// Exactly these ids.
    Ids(Vec<i64>),
    /// The server-side matching set, `total` records when last counted.
    AllMatching { total: u64 },
}

/// Selection over the loaded page and, conceptually, the matching set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    mode: SelectionMode,
    explicit_ids: BTreeSet<i64>,
}

impl SelectionState {
    #[must_use]
    pub const fn mode(&self) -> SelectionMode {
        self.mode
    }

    #[must_use]
    pub const fn explicit_ids(&self) -> &BTreeSet<i64> {
        &self.explicit_ids
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mode == SelectionMode::None && self.explicit_ids.is_empty()
    }

    /// Whether `id` is part of the selection.
    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.mode == SelectionMode::AllMatching || self.explicit_ids.contains(&id)
    }

    /// Number of selected records given the current server total.
    #[must_use]
    pub fn selected_count(&self, total_elements: u64) -> u64 {
        match self.mode {
            SelectionMode::AllMatching => total_elements,
            _ => self.explicit_ids.len() as u64,
        }
    }

    /// Flips one row.
    ///
    /// In `AllMatching` the selection first falls back to the loaded page minus
    /// the toggled row, since a cross-page exclusion list is not tracked.
    pub fn toggle_row(&mut self, id: i64, loaded_ids: &[i64]) {
        if self.mode == SelectionMode::AllMatching {
            self.explicit_ids = loaded_ids.iter().copied().filter(|loaded| *loaded != id).collect();
            self.mode = SelectionMode::None;
        } else if !self.explicit_ids.remove(&id) && loaded_ids.contains(&id) {
            self.explicit_ids.insert(id);
        }
        self.normalize(loaded_ids);
    }

    /// Selects every loaded row.
    pub fn select_all_on_page(&mut self, loaded_ids: &[i64]) {
        self.explicit_ids = loaded_ids.iter().copied().collect();
        self.mode = if self.explicit_ids.is_empty() {
            SelectionMode::None
        } else {
            SelectionMode::Page
        };
    }

    /// Whether "select all matching" should be offered.
    ///
    /// Only when the whole loaded page is selected and the server reports more
    /// matches than are loaded.
    #[must_use]
    pub fn can_promote(&self, loaded_count: usize, total_elements: u64) -> bool {
        self.mode == SelectionMode::Page
            && self.explicit_ids.len() == loaded_count
            && (loaded_count as u64) < total_elements
    }

    /// Extends the selection to every matching record.
    ///
    /// Returns `false` and leaves the state unchanged when promotion is not
    /// offered.
    pub fn promote_to_all_matching(&mut self, loaded_count: usize, total_elements: u64) -> bool {
        if !self.can_promote(loaded_count, total_elements) {
            return false;
        }
        self.mode = SelectionMode::AllMatching;
        true
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.mode = SelectionMode::None;
        self.explicit_ids.clear();
    }

    /// Forgets ids that are no longer loaded after a reload of the same page.
    pub fn retain_loaded(&mut self, loaded_ids: &[i64]) {
        if self.mode == SelectionMode::AllMatching {
            return;
        }
        self.explicit_ids.retain(|id| loaded_ids.contains(id));
        self.normalize(loaded_ids);
    }

    /// The ids or matching set a bulk action should target.
    #[must_use]
    pub fn target(&self, total_elements: u64) -> Option<SelectionTarget> {
        match self.mode {
            SelectionMode::AllMatching => Some(SelectionTarget::AllMatching { total: total_elements }),
            _ if self.explicit_ids.is_empty() => None,
            _ => Some(SelectionTarget::Ids(self.explicit_ids.iter().copied().collect())),
        }
    }

    fn normalize(&mut self, loaded_ids: &[i64]) {
        let whole_page = !loaded_ids.is_empty()
            && self.explicit_ids.len() == loaded_ids.len()
            && loaded_ids.iter().all(|id| self.explicit_ids.contains(id));
        self.mode = if whole_page {
            SelectionMode::Page
        } else {
            SelectionMode::None
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: [i64; 4] = [10, 11, 12, 13];

    #[test]
    fn toggling_every_row_becomes_page_mode() {
        let mut selection = SelectionState::default();
        for id in PAGE {
            selection.toggle_row(id, &PAGE);
        }
        assert_eq!(selection.mode(), SelectionMode::Page);
        selection.toggle_row(12, &PAGE);
        assert_eq!(selection.mode(), SelectionMode::None);
        assert_eq!(selection.explicit_ids().len(), 3);
    }

    #[test]
    fn rows_outside_the_page_are_ignored() {
        let mut selection = SelectionState::default();
        selection.toggle_row(99, &PAGE);
        assert!(selection.is_empty());
    }

    #[test]
    fn promotion_requires_full_page_and_more_matches() {
        let mut selection = SelectionState::default();
        selection.toggle_row(10, &PAGE);
        assert!(!selection.can_promote(PAGE.len(), 100));

        selection.select_all_on_page(&PAGE);
        assert!(!selection.can_promote(PAGE.len(), 4));
        assert!(selection.promote_to_all_matching(PAGE.len(), 100));
        assert_eq!(selection.mode(), SelectionMode::AllMatching);
        assert_eq!(selection.selected_count(100), 100);
        assert_eq!(selection.target(100), Some(SelectionTarget::AllMatching { total: 100 }));
    }

    #[test]
    fn toggle_in_all_matching_demotes_to_page_minus_row() {
        let mut selection = SelectionState::default();
        selection.select_all_on_page(&PAGE);
        selection.promote_to_all_matching(PAGE.len(), 50);
        selection.toggle_row(11, &PAGE);
        assert_eq!(selection.mode(), SelectionMode::None);
        assert_eq!(selection.target(50), Some(SelectionTarget::Ids(vec![10, 12, 13])));
    }

    #[test]
    fn clear_resets_everything() {
        let mut selection = SelectionState::default();
        selection.select_all_on_page(&PAGE);
        selection.clear();
        assert!(selection.is_empty());
        assert_eq!(selection.target(10), None);
    }

    #[test]
    fn retain_loaded_drops_vanished_rows() {
        let mut selection = SelectionState::default();
        selection.select_all_on_page(&PAGE);
        selection.retain_loaded(&[10, 11, 14]);
        assert_eq!(selection.explicit_ids().iter().copied().collect::<Vec<_>>(), vec![10, 11]);
        assert_eq!(selection.mode(), SelectionMode::None);
    }

    #[test]
    fn empty_page_cannot_be_selected() {
        let mut selection = SelectionState::default();
        selection.select_all_on_page(&[]);
        assert!(selection.is_empty());
    }
}
