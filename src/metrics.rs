//! Lightweight global metrics for slobdict.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - Open (in-memory / file-backed)
//! - Bins (распаковка, деградированные элементы)
//! - Lookup
//! - Writer
//! - Fuzzy suggestions

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Open -----
static OPENED_IN_MEMORY: AtomicU64 = AtomicU64::new(0);
static OPENED_FILE_BACKED: AtomicU64 = AtomicU64::new(0);

// ----- Bins -----
static BINS_DECOMPRESSED: AtomicU64 = AtomicU64::new(0);
static COMPRESSED_BYTES_INFLATED: AtomicU64 = AtomicU64::new(0);
static DEGRADED_ITEMS: AtomicU64 = AtomicU64::new(0);

// ----- Lookup -----
static LOOKUPS: AtomicU64 = AtomicU64::new(0);
static LOOKUP_HITS: AtomicU64 = AtomicU64::new(0);

// ----- Writer -----
static DICTIONARIES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static BINS_WRITTEN: AtomicU64 = AtomicU64::new(0);

// ----- Fuzzy -----
static FUZZY_COMPLETED: AtomicU64 = AtomicU64::new(0);
static FUZZY_CANCELLED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    // Open
    pub opened_in_memory: u64,
    pub opened_file_backed: u64,

    // Bins
    pub bins_decompressed: u64,
    pub compressed_bytes_inflated: u64,
    pub degraded_items: u64,

    // Lookup
    pub lookups: u64,
    pub lookup_hits: u64,

    // Writer
    pub dictionaries_written: u64,
    pub bins_written: u64,

    // Fuzzy
    pub fuzzy_completed: u64,
    pub fuzzy_cancelled: u64,
}

impl MetricsSnapshot {
    pub fn lookup_hit_ratio(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.lookup_hits as f64 / self.lookups as f64
        }
    }
}

// ----- Open -----
pub fn record_open(file_backed: bool) {
    if file_backed {
        OPENED_FILE_BACKED.fetch_add(1, Ordering::Relaxed);
    } else {
        OPENED_IN_MEMORY.fetch_add(1, Ordering::Relaxed);
    }
}

// ----- Bins -----
pub fn record_bin_decompressed(compressed_len: usize) {
    BINS_DECOMPRESSED.fetch_add(1, Ordering::Relaxed);
    COMPRESSED_BYTES_INFLATED.fetch_add(compressed_len as u64, Ordering::Relaxed);
}

pub fn record_degraded_item() {
    DEGRADED_ITEMS.fetch_add(1, Ordering::Relaxed);
}

// ----- Lookup -----
pub fn record_lookup(hit: bool) {
    LOOKUPS.fetch_add(1, Ordering::Relaxed);
    if hit {
        LOOKUP_HITS.fetch_add(1, Ordering::Relaxed);
    }
}

// ----- Writer -----
pub fn record_dictionary_written(bins: usize) {
    DICTIONARIES_WRITTEN.fetch_add(1, Ordering::Relaxed);
    BINS_WRITTEN.fetch_add(bins as u64, Ordering::Relaxed);
}

// ----- Fuzzy -----
pub fn record_fuzzy_completed() {
    FUZZY_COMPLETED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_fuzzy_cancelled() {
    FUZZY_CANCELLED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        opened_in_memory: OPENED_IN_MEMORY.load(Ordering::Relaxed),
        opened_file_backed: OPENED_FILE_BACKED.load(Ordering::Relaxed),
        bins_decompressed: BINS_DECOMPRESSED.load(Ordering::Relaxed),
        compressed_bytes_inflated: COMPRESSED_BYTES_INFLATED.load(Ordering::Relaxed),
        degraded_items: DEGRADED_ITEMS.load(Ordering::Relaxed),
        lookups: LOOKUPS.load(Ordering::Relaxed),
        lookup_hits: LOOKUP_HITS.load(Ordering::Relaxed),
        dictionaries_written: DICTIONARIES_WRITTEN.load(Ordering::Relaxed),
        bins_written: BINS_WRITTEN.load(Ordering::Relaxed),
        fuzzy_completed: FUZZY_COMPLETED.load(Ordering::Relaxed),
        fuzzy_cancelled: FUZZY_CANCELLED.load(Ordering::Relaxed),
    }
}
