#![forbid(unsafe_code)]

//! Per-grid paging state.

use std::ops::Range;

use crate::config::{GridConfig, MAX_PREFETCH_PAGES};
use crate::planner::{WindowRequest, page_range};
use crate::record::HeaderField;
use crate::view::last_page_index;

/// Paging state of one grid instance.
///
/// `current_page` is only meaningful once [`loaded`](Self::loaded) is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSession {
    /// Records per page.
    pub page_size: usize,
    /// Extra pages requested beyond the current one on every fetch.
    pub prefetch_pages: usize,
    /// Page currently considered active.
    pub current_page: usize,
    /// Total reported by the most recent response; `0` means unknown or empty.
    pub total_records: usize,
    header: Vec<HeaderField>,
    loaded: bool,
}

impl GridSession {
    /// Fresh session for `config`. Prefetch is clamped to
    /// [`MAX_PREFETCH_PAGES`] even when `config` was never validated.
    #[must_use]
    pub fn new(config: &GridConfig) -> Self {
        Self {
            page_size: config.page_size,
            prefetch_pages: config.prefetch_pages.min(MAX_PREFETCH_PAGES),
            current_page: 0,
            total_records: 0,
            header: Vec::new(),
            loaded: false,
        }
    }

    /// Column headers; empty until a response carried them.
    #[must_use]
    pub fn header(&self) -> &[HeaderField] {
        &self.header
    }

    /// Set the header if none has been set yet. Returns whether it was taken.
    pub fn adopt_header(&mut self, header: Vec<HeaderField>) -> bool {
        if !self.header.is_empty() || header.is_empty() {
            return false;
        }
        self.header = header;
        true
    }

    /// Whether at least one fetch has succeeded.
    #[must_use]
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// Record a successful fetch. Returns `true` the first time only.
    pub fn mark_loaded(&mut self) -> bool {
        !std::mem::replace(&mut self.loaded, true)
    }

    /// Index of the last page according to the current total.
    #[must_use]
    pub fn last_page_index(&self) -> usize {
        last_page_index(self.total_records, self.page_size)
    }

    /// Index range of `page`.
    #[must_use]
    pub fn page_range(&self, page: usize) -> Range<usize> {
        page_range(page, self.page_size)
    }

    /// Planner input for a request of `page`.
    #[must_use]
    pub fn window_request(&self, page: usize, force_reload: bool) -> WindowRequest {
        WindowRequest {
            page,
            page_size: self.page_size,
            prefetch_pages: self.prefetch_pages,
            total_records: self.total_records,
            force_reload,
        }
    }
}
