#![forbid(unsafe_code)]

//! The renderer seam: a finalized page handed to whatever draws the grid.
//!
//! The grid never produces markup or cells itself. Each completed page
//! request yields one [`PageView`], passed to [`Renderer::render`]. The view
//! carries everything a renderer needs to draw rows, headers, the footer
//! statistics, the page selector and the navigation controls, plus the
//! [`GridId`] to tag navigation commands with.

use bitflags::bitflags;
use unicode_width::UnicodeWidthStr;

use crate::grid::GridId;
use crate::record::{HeaderField, Record};

/// Paging numbers for one rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// Page being shown (0-based).
    pub current_page: usize,
    /// Records per page.
    pub page_size: usize,
    /// Authoritative total; `0` means unknown or empty.
    pub total_records: usize,
    /// Records actually present for this page.
    pub records_on_page: usize,
}

impl PageMeta {
    /// Number of pages implied by the total.
    #[must_use]
    pub fn page_count(&self) -> usize {
        page_count(self.total_records, self.page_size)
    }

    /// Index of the last page; `0` when the total is unknown.
    #[must_use]
    pub fn last_page_index(&self) -> usize {
        last_page_index(self.total_records, self.page_size)
    }

    /// Footer statistics in the form `"{first}-{last} / {total}"` (1-based).
    ///
    /// A page with no records reads `"0-0 / {total}"`.
    #[must_use]
    pub fn stats_label(&self) -> String {
        if self.records_on_page == 0 {
            return format!("0-0 / {}", self.total_records);
        }
        let first = self.current_page.saturating_mul(self.page_size);
        let last = if self.records_on_page == self.page_size {
            first.saturating_add(self.page_size)
        } else {
            first.saturating_add(self.records_on_page)
        };
        format!("{}-{} / {}", first.saturating_add(1), last, self.total_records)
    }
}

/// `ceil(total / page_size)`.
#[must_use]
pub fn page_count(total_records: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_records.div_ceil(page_size)
}

/// `ceil(total / page_size) - 1`, or `0` when there are no records.
#[must_use]
pub fn last_page_index(total_records: usize, page_size: usize) -> usize {
    page_count(total_records, page_size).saturating_sub(1)
}

bitflags! {
    /// Which navigation moves are possible from the current page.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NavFlags: u8 {
        const FIRST = 0b0001;
        const PREV  = 0b0010;
        const NEXT  = 0b0100;
        const LAST  = 0b1000;
    }
}

impl NavFlags {
    /// Moves permitted by page bounds alone.
    #[must_use]
    pub fn for_page(current_page: usize, last_page_index: usize) -> Self {
        let mut flags = NavFlags::empty();
        if current_page > 0 {
            flags |= NavFlags::FIRST | NavFlags::PREV;
        }
        if current_page < last_page_index {
            flags |= NavFlags::NEXT | NavFlags::LAST;
        }
        flags
    }
}

/// One entry of the page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOption {
    /// Page to go to (0-based).
    pub page: usize,
    /// Page number shown to the user (1-based).
    pub label: usize,
    /// Whether this is the current page.
    pub selected: bool,
}

/// Resolved column widths.
///
/// Header columns get `max(preferred or label width, minimum)`. Columns beyond
/// the header get the minimum, or `None` (size to content) when the minimum is
/// zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnLayout {
    widths: Vec<Option<u16>>,
}

impl ColumnLayout {
    /// Resolve widths for `columns` columns.
    #[must_use]
    pub fn resolve(header: &[HeaderField], min_width: u16, columns: usize) -> Self {
        let count = columns.max(header.len());
        let widths = (0..count)
            .map(|i| match header.get(i) {
                Some(h) => {
                    let natural = h.width.unwrap_or_else(|| {
                        u16::try_from(UnicodeWidthStr::width(h.label.as_str())).unwrap_or(u16::MAX)
                    });
                    Some(natural.max(min_width))
                }
                None if min_width > 0 => Some(min_width),
                None => None,
            })
            .collect();
        Self { widths }
    }

    /// Width of column `index`; `None` means size to content.
    #[must_use]
    pub fn width(&self, index: usize) -> Option<u16> {
        self.widths.get(index).copied().flatten()
    }

    /// Number of resolved columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    /// Whether no columns were resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }
}

/// A page ready to be drawn.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    /// Handle of the grid this page belongs to.
    pub grid: &'a GridId,
    /// Records on the page, ascending by index. Gaps are skipped.
    pub records: Vec<(usize, &'a Record)>,
    /// Column headers; empty when the source never sent any.
    pub header: &'a [HeaderField],
    /// Paging numbers.
    pub meta: PageMeta,
    /// Navigation moves allowed by page bounds.
    pub nav: NavFlags,
    /// Whether a fetch is still outstanding (prefetch after an early render).
    pub loading: bool,
    pub(crate) min_column_width: u16,
    pub(crate) page_selector_enabled: bool,
}

impl PageView<'_> {
    /// Column widths for this page.
    #[must_use]
    pub fn columns(&self) -> ColumnLayout {
        let widest = self.records.iter().map(|(_, r)| r.len()).max().unwrap_or(0);
        ColumnLayout::resolve(self.header, self.min_column_width, widest)
    }

    /// Page selector entries, or `None` when the selector is disabled.
    #[must_use]
    pub fn page_selector(&self) -> Option<Vec<PageOption>> {
        if !self.page_selector_enabled {
            return None;
        }
        Some(
            (0..self.meta.page_count())
                .map(|page| PageOption {
                    page,
                    label: page + 1,
                    selected: page == self.meta.current_page,
                })
                .collect(),
        )
    }

    /// Footer statistics label.
    #[must_use]
    pub fn stats_label(&self) -> String {
        self.meta.stats_label()
    }
}

/// Draws pages.
pub trait Renderer {
    /// Draw `view`. Called once per resolved page request.
    fn render(&mut self, view: &PageView<'_>);
}

impl<F> Renderer for F
where
    F: FnMut(&PageView<'_>),
{
    fn render(&mut self, view: &PageView<'_>) {
        self(view)
    }
}
