//! Fuzzy-narrowed option list used by every chooser in the queue view.
//!
//! Options are matched against the typed query with the Skim algorithm. With an
//! empty query every option is listed in its original order; otherwise options
//! are ordered by score and carry the matched character ranges for
//! highlighting.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// One choosable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOption {
    /// Value handed back on submit (code, id, or index).
    pub value: String,
    /// Text shown and matched against.
    pub label: String,
}

impl PickerOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A visible option and its highlight ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerMatch {
    pub index: usize,
    /// `(start, end)` character ranges, end exclusive.
    pub highlight_ranges: Vec<(usize, usize)>,
}

/// Option list with a query and a cursor.
#[derive(Debug, Clone, Default)]
pub struct Picker {
    title: String,
    query: String,
    options: Vec<PickerOption>,
    matches: Vec<PickerMatch>,
    cursor: usize,
}

impl Picker {
    /// Creates a picker listing every option.
    ///
    /// # Parameters
    ///
    /// * `title` - Heading shown above the list
    /// * `options` - Options in display order
    ///
    /// # Example
    ///
    /// ```
    /// use bolsas_queue::app::picker::{Picker, PickerOption};
    ///
    /// let mut picker = Picker::new(
    ///     "Red",
    ///     vec![PickerOption::new("1", "Red Lima"), PickerOption::new("2", "Red Arequipa")],
    /// );
    /// for c in "areq".chars() {
    ///     picker.push_char(c);
    /// }
    /// assert_eq!(picker.selected().map(|o| o.value.as_str()), Some("2"));
    /// ```
    #[must_use]
    pub fn new(title: impl Into<String>, options: Vec<PickerOption>) -> Self {
        let mut picker = Self {
            title: title.into(),
            query: String::new(),
            options,
            matches: Vec::new(),
            cursor: 0,
        };
        picker.apply_filter();
        picker
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Visible options with their highlight ranges, best match first.
    pub fn visible(&self) -> impl Iterator<Item = (&PickerOption, &PickerMatch)> {
        self.matches.iter().map(|m| (&self.options[m.index], m))
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.matches.len()
    }

    /// Option under the cursor.
    #[must_use]
    pub fn selected(&self) -> Option<&PickerOption> {
        self.matches.get(self.cursor).map(|m| &self.options[m.index])
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.apply_filter();
    }

    pub fn pop_char(&mut self) {
        if self.query.pop().is_some() {
            self.apply_filter();
        }
    }

    /// Moves the cursor down, wrapping to the top.
    pub fn move_down(&mut self) {
        if !self.matches.is_empty() {
            self.cursor = (self.cursor + 1) % self.matches.len();
        }
    }

    /// Moves the cursor up, wrapping to the bottom.
    pub fn move_up(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        self.cursor = if self.cursor == 0 {
            self.matches.len() - 1
        } else {
            self.cursor - 1
        };
    }

    fn apply_filter(&mut self) {
        let _span = tracing::trace_span!("picker_filter", options = self.options.len(), query_len = self.query.len())
            .entered();

        if self.query.is_empty() {
            self.matches = (0..self.options.len())
                .map(|index| PickerMatch {
                    index,
                    highlight_ranges: Vec::new(),
                })
                .collect();
        } else {
            let matcher = SkimMatcherV2::default().ignore_case();
            let mut scored: Vec<(i64, PickerMatch)> = self
                .options
                .iter()
                .enumerate()
                .filter_map(|(index, option)| {
                    matcher
                        .fuzzy_indices(&option.label, &self.query)
                        .map(|(score, indices)| {
                            (
                                score,
                                PickerMatch {
                                    index,
                                    highlight_ranges: coalesce_ranges(&indices),
                                },
                            )
                        })
                })
                .collect();
            scored.sort_by(|a, b| b.0.cmp(&a.0));
            self.matches = scored.into_iter().map(|(_, m)| m).collect();
        }

        self.cursor = self.cursor.min(self.matches.len().saturating_sub(1));
    }
}

/// Coalesces sorted character indices into `(start, end)` runs.
fn coalesce_ranges(indices: &[usize]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for &idx in indices {
        match ranges.last_mut() {
            Some((_, end)) if *end == idx => *end = idx + 1,
            _ => ranges.push((idx, idx + 1)),
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picker() -> Picker {
        Picker::new(
            "Especialidad",
            vec![
                PickerOption::new("todos", "Todos"),
                PickerOption::new("CARD", "Cardiología"),
                PickerOption::new("NEUM", "Neumología"),
                PickerOption::new("PED", "Pediatría"),
            ],
        )
    }

    #[test]
    fn empty_query_lists_everything_in_order() {
        let picker = picker();
        assert_eq!(picker.visible_count(), 4);
        assert_eq!(picker.selected().map(|o| o.value.as_str()), Some("todos"));
    }

    #[test]
    fn typing_narrows_and_highlights() {
        let mut picker = picker();
        for c in "neu".chars() {
            picker.push_char(c);
        }
        assert_eq!(picker.visible_count(), 1);
        let (option, matched) = picker.visible().next().unwrap();
        assert_eq!(option.value, "NEUM");
        assert_eq!(matched.highlight_ranges, vec![(0, 3)]);

        picker.pop_char();
        picker.pop_char();
        picker.pop_char();
        assert_eq!(picker.visible_count(), 4);
    }

    #[test]
    fn cursor_wraps_and_clamps() {
        let mut picker = picker();
        picker.move_up();
        assert_eq!(picker.cursor(), 3);
        picker.move_down();
        assert_eq!(picker.cursor(), 0);

        picker.move_up();
        picker.push_char('z');
        picker.push_char('z');
        picker.push_char('z');
        assert_eq!(picker.visible_count(), 0);
        assert_eq!(picker.selected(), None);
    }

    #[test]
    fn ranges_coalesce_runs() {
        assert_eq!(coalesce_ranges(&[0, 1, 2, 5, 7, 8]), vec![(0, 3), (5, 6), (7, 9)]);
        assert!(coalesce_ranges(&[]).is_empty());
    }
}
