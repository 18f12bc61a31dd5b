#![forbid(unsafe_code)]

//! Sparse record cache keyed by global record index.
//!
//! # Invariants
//!
//! 1. **First write wins**: once an index holds a record, [`RecordCache::set_if_absent`]
//!    never replaces it. Only [`RecordCache::evict`] makes an index writable again.
//! 2. **Gaps are allowed**: a page is "fully cached" only when every index in its
//!    range is present; [`RecordCache::slice`] skips gaps silently.
//! 3. **Pure accumulation**: nothing is evicted implicitly. The cache lives as
//!    long as the grid that owns it.
//!
//! The cache knows nothing about pages, fetches or total counts.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::ops::Range;

use crate::record::Record;

/// Counters describing cache activity since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Indices currently present.
    pub entries: usize,
    /// `set_if_absent` calls that stored a record.
    pub stored: u64,
    /// `set_if_absent` calls rejected because the index was occupied.
    pub rejected: u64,
    /// Entries removed by `evict`.
    pub evicted: u64,
}

/// Sparse mapping from record index to record.
#[derive(Debug, Clone, Default)]
pub struct RecordCache {
    records: BTreeMap<usize, Record>,
    stored: u64,
    rejected: u64,
    evicted: u64,
}

impl RecordCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `index` holds a record.
    #[inline]
    #[must_use]
    pub fn has(&self, index: usize) -> bool {
        self.records.contains_key(&index)
    }

    /// The record at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(&index)
    }

    /// Store `record` at `index` unless the index is already occupied.
    ///
    /// Returns `true` if the record was stored.
    pub fn set_if_absent(&mut self, index: usize, record: Record) -> bool {
        match self.records.entry(index) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                self.stored += 1;
                true
            }
            Entry::Occupied(_) => {
                self.rejected += 1;
                false
            }
        }
    }

    /// Remove every entry in the half-open `range`. Returns how many were removed.
    pub fn evict(&mut self, range: Range<usize>) -> usize {
        if range.is_empty() {
            return 0;
        }
        let doomed: Vec<usize> = self.records.range(range).map(|(&i, _)| i).collect();
        for index in &doomed {
            self.records.remove(index);
        }
        self.evicted += doomed.len() as u64;
        doomed.len()
    }

    /// Records present in `[start, start + count)`, ascending, gaps skipped.
    #[must_use]
    pub fn slice(&self, start: usize, count: usize) -> Vec<(usize, &Record)> {
        let end = start.saturating_add(count);
        if end <= start {
            return Vec::new();
        }
        self.records
            .range(start..end)
            .map(|(&i, r)| (i, r))
            .collect()
    }

    /// Number of present indices. Independent of the remote total.
    #[must_use]
    pub fn size(&self) -> usize {
        self.records.len()
    }

    /// Whether no index is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.records.len(),
            stored: self.stored,
            rejected: self.rejected,
            evicted: self.evicted,
        }
    }
}
