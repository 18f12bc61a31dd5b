#![forbid(unsafe_code)]

//! Window planning: which record indices must be fetched for a page request.
//!
//! Planning is pure. It looks at the cache only through an index predicate and
//! never mutates anything; the caller is responsible for evicting a forced
//! page before acting on the plan.
//!
//! # Algorithm
//!
//! ```text
//! start   = page * page_size
//! max     = (page + prefetch_pages + 1) * page_size
//! end     = min(max, total)   if total > 0
//!         = max               otherwise (unknown total, fetch optimistically)
//! missing = { i in [start, end) : !cached(i) }
//!         ∪ [start, start + page_size)   if force_reload
//! ```
//!
//! The set is counted rather than collected, so planning allocates nothing.
//! A non-empty `missing` set becomes one request `(min(missing), |missing|)`.
//! The count is a number of records, not the width of the span: when a forced
//! page and an unrelated gap further ahead are both missing, the request covers
//! `|missing|` records starting at the first gap.

use std::ops::Range;

/// Inputs to [`plan_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRequest {
    /// Page being requested (0-based).
    pub page: usize,
    /// Records per page. Must be non-zero.
    pub page_size: usize,
    /// Extra pages to fetch beyond the requested one.
    pub prefetch_pages: usize,
    /// Total reported by the last response; `0` means unknown.
    pub total_records: usize,
    /// Treat the requested page as uncached regardless of the cache.
    pub force_reload: bool,
}

impl WindowRequest {
    /// Index range of the requested page itself.
    #[must_use]
    pub fn page_range(&self) -> Range<usize> {
        page_range(self.page, self.page_size)
    }

    /// Index range considered by this planning step (page plus prefetch),
    /// clamped to the known total.
    #[must_use]
    pub fn desired_window(&self) -> Range<usize> {
        let start = self.page.saturating_mul(self.page_size);
        let max = self
            .page
            .saturating_add(self.prefetch_pages)
            .saturating_add(1)
            .saturating_mul(self.page_size);
        let end = if self.total_records > 0 {
            max.min(self.total_records)
        } else {
            max
        };
        start..end.max(start)
    }
}

/// Result of planning a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPlan {
    /// Everything in the window is cached; render without fetching.
    Cached,
    /// A fetch is required.
    Fetch {
        /// First missing index.
        start_index: usize,
        /// Number of missing records to request from `start_index`.
        count: usize,
        /// The requested page is fully cached and may be rendered before the
        /// fetch resolves (the gap lies entirely in the prefetch area).
        page_ready: bool,
    },
}

impl WindowPlan {
    /// Whether a fetch is required.
    #[must_use]
    pub fn needs_fetch(&self) -> bool {
        matches!(self, WindowPlan::Fetch { .. })
    }
}

/// Index range covered by `page`.
#[must_use]
pub fn page_range(page: usize, page_size: usize) -> Range<usize> {
    let start = page.saturating_mul(page_size);
    start..start.saturating_add(page_size)
}

/// Plan the fetch (if any) needed to satisfy `request`.
///
/// `cached` reports whether an index is already present in the cache. The
/// missing set is counted, never materialized: a forced page contributes its
/// whole range, and the rest of the window contributes its uncached indices.
pub fn plan_window(request: &WindowRequest, cached: impl Fn(usize) -> bool) -> WindowPlan {
    let page = request.page_range();
    let forced = request.force_reload && !page.is_empty();

    let mut start_index = forced.then_some(page.start);
    let mut count = if forced { page.len() } else { 0 };
    for i in request.desired_window() {
        if forced && page.contains(&i) {
            continue;
        }
        if !cached(i) {
            start_index.get_or_insert(i);
            count += 1;
        }
    }

    let Some(start_index) = start_index else {
        return WindowPlan::Cached;
    };
    WindowPlan::Fetch {
        start_index,
        count,
        page_ready: page.end <= start_index,
    }
}
