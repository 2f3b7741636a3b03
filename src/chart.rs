//! Sparse triangular probability chart.
//!
//! A `SpanChart` holds one cell per span (i, j), 0 <= i <= j < n; each cell
//! is a sparse nonterminal -> probability mapping. Absence of a key means
//! probability zero; callers never store an exactly-zero aggregate, so a
//! present entry is always a nonzero contribution sum.

use crate::symbol::NtId;
use rustc_hash::FxHashMap;

/// Triangular chart of sparse probability cells for one sentence.
#[derive(Debug, Clone)]
pub struct SpanChart {
    n: usize,
    cells: Vec<FxHashMap<NtId, f64>>,
}

impl SpanChart {
    /// Create an empty chart for a sentence of length `n`.
    pub fn new(n: usize) -> Self {
        SpanChart {
            n,
            cells: vec![FxHashMap::default(); n * n],
        }
    }

    /// Sentence length this chart was built for.
    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i <= j && j < self.n, "span out of range");
        i * self.n + j
    }

    /// Probability stored for `nt` over span (i, j), if any.
    #[inline]
    pub fn get(&self, i: usize, j: usize, nt: NtId) -> Option<f64> {
        self.cells[self.idx(i, j)].get(&nt).copied()
    }

    /// The full cell for span (i, j).
    #[inline]
    pub fn cell(&self, i: usize, j: usize) -> &FxHashMap<NtId, f64> {
        &self.cells[self.idx(i, j)]
    }

    /// Add `delta` to the entry for `nt` over span (i, j), creating it if
    /// absent. Contributions from distinct rules sum, never overwrite.
    #[inline]
    pub fn add(&mut self, i: usize, j: usize, nt: NtId, delta: f64) {
        let idx = self.idx(i, j);
        *self.cells[idx].entry(nt).or_insert(0.0) += delta;
    }

    /// Total number of populated (span, nonterminal) entries.
    pub fn entry_count(&self) -> usize {
        self.cells.iter().map(|c| c.len()).sum()
    }
}
