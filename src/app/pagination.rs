//! Page index, page size and server total.
//!
//! State is created on mount, mutated only by query resets and explicit page or
//! size changes, and never persisted.

use crate::domain::{QueueError, Result};

/// Page sizes offered to the user.
pub const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];

/// Page size used when the configured one is not allowed.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Paging state of the queue view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    page_index: u32,
    page_size: u32,
    total_elements: u64,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PaginationState {
    /// Starts on page 0; sizes outside [`PAGE_SIZES`] fall back to the default.
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        let page_size = if PAGE_SIZES.contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        Self {
            page_index: 0,
            page_size,
            total_elements: 0,
        }
    }

    #[must_use]
    pub const fn page_index(&self) -> u32 {
        self.page_index
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub const fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// `ceil(total / size)`, and 1 when there are no results.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        if self.total_elements == 0 {
            return 1;
        }
        let pages = self.total_elements.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Moves to `target`, clamped to `[0, total_pages - 1]`.
    ///
    /// Returns whether the page index changed.
    pub fn change_page(&mut self, target: i64) -> bool {
        let last = i64::from(self.total_pages() - 1);
        let clamped = u32::try_from(target.clamp(0, last)).unwrap_or(0);
        let changed = clamped != self.page_index;
        self.page_index = clamped;
        changed
    }

    /// Moves by `delta` pages, clamped.
    pub fn step(&mut self, delta: i64) -> bool {
        self.change_page(i64::from(self.page_index) + delta)
    }

    /// Changes the page size and returns to page 0.
    ///
    /// Treated as a query change by the caller even when the size is unchanged
    /// but the page was not 0.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `size` is not one of [`PAGE_SIZES`].
    pub fn set_page_size(&mut self, size: u32) -> Result<bool> {
        if !PAGE_SIZES.contains(&size) {
            return Err(QueueError::validation(format!("Tamaño de página no permitido: {size}")));
        }
        let changed = size != self.page_size || self.page_index != 0;
        self.page_size = size;
        self.page_index = 0;
        Ok(changed)
    }

    /// Next allowed size after the current one, wrapping around.
    #[must_use]
    pub fn next_page_size(&self) -> u32 {
        let position = PAGE_SIZES.iter().position(|s| *s == self.page_size).unwrap_or(0);
        PAGE_SIZES[(position + 1) % PAGE_SIZES.len()]
    }

    /// Back to page 0, keeping the size.
    pub fn on_query_changed(&mut self) {
        self.page_index = 0;
    }

    /// Stores the total from the latest committed response.
    pub fn record_response(&mut self, total_elements: u64) {
        self.total_elements = total_elements;
    }

    /// Number of rows the current page should hold given the total.
    #[must_use]
    pub fn expected_rows(&self) -> u64 {
        let before = u64::from(self.page_index) * u64::from(self.page_size);
        self.total_elements.saturating_sub(before).min(u64::from(self.page_size))
    }
}
