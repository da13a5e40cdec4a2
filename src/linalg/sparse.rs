//! Incrementally-built symmetric sparse matrix, compacted into CSR for the
//! conjugate-gradient solve.
//!
//! Grounded on the teacher's from-scratch sparse assembly in
//! `qp::mpc::augmented_system::StandardSystem::new`, which hand-builds
//! column-pointer/row-index/value arrays rather than going through
//! `faer::sparse::SparseColMat`'s triplet constructor; this module keeps that
//! habit but assembles row-major CSR from an incremental coordinate map
//! instead of a one-shot KKT layout, since the B2B builder adds spring
//! contributions one net at a time rather than building the whole system at
//! once.

use std::collections::BTreeMap;

use faer::Col;

use crate::E;
use crate::error::SolverDiagnostic;

/// A symmetric matrix built by repeated `add(i, j, delta)` calls. Entries at
/// `(i, j)` and `(j, i)` are tracked independently; callers are responsible
/// for adding both sides of an off-diagonal contribution (see
/// `solve::b2b::add_spring`), which is what keeps the representation
/// correct without forcing a symmetric-storage scheme on the accumulator
/// itself.
pub struct SparseMatrix {
    n: usize,
    entries: BTreeMap<(usize, usize), E>,
}

impl SparseMatrix {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            entries: BTreeMap::new(),
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn add(&mut self, i: usize, j: usize, delta: E) {
        *self.entries.entry((i, j)).or_insert(0.) += delta;
    }

    pub fn diag_add(&mut self, i: usize, delta: E) {
        self.add(i, i, delta);
    }

    pub fn diagonal(&self) -> Vec<E> {
        (0..self.n)
            .map(|i| *self.entries.get(&(i, i)).unwrap_or(&0.))
            .collect()
    }

    /// Confirms the matrix is symmetric (to floating-point tolerance) and
    /// free of NaN/infinite entries. Any violation is a programmer error in
    /// the calling solve stage, not a numerical stall.
    pub fn is_symmetric_and_finite(&self) -> Result<(), SolverDiagnostic> {
        for (&(i, j), &v) in &self.entries {
            if !v.is_finite() {
                return Err(SolverDiagnostic::NonFinite);
            }
            let transposed = self.entries.get(&(j, i)).copied().unwrap_or(0.);
            if (v - transposed).abs() > 1e-6 * (1.0 + v.abs()) {
                return Err(SolverDiagnostic::NotSymmetric);
            }
        }
        Ok(())
    }

    /// Compacts the accumulated entries into row-major compressed storage.
    /// Uses a counting sort over row index rather than relying on
    /// `BTreeMap`'s iteration order for anything but grouping by row, so the
    /// layout does not depend on key comparison internals beyond "sorted by
    /// row, then column" (which `BTreeMap<(usize, usize), _>` already gives
    /// us for free).
    pub fn to_csr(&self) -> Csr {
        let mut counts = vec![0usize; self.n];
        for &(i, _) in self.entries.keys() {
            counts[i] += 1;
        }
        let mut row_ptr = vec![0usize; self.n + 1];
        for i in 0..self.n {
            row_ptr[i + 1] = row_ptr[i] + counts[i];
        }
        let nnz = self.entries.len();
        let mut col_idx = vec![0usize; nnz];
        let mut values = vec![0.; nnz];
        let mut cursor = row_ptr.clone();
        for (&(i, j), &v) in &self.entries {
            let pos = cursor[i];
            col_idx[pos] = j;
            values[pos] = v;
            cursor[i] += 1;
        }
        Csr {
            row_ptr,
            col_idx,
            values,
            n: self.n,
        }
    }
}

/// Row-major compressed sparse storage, built once per solve from a
/// [`SparseMatrix`] and consumed by [`crate::linalg::cg::solve`].
pub struct Csr {
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<E>,
    n: usize,
}

impl Csr {
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn diagonal(&self) -> Vec<E> {
        (0..self.n)
            .map(|i| {
                (self.row_ptr[i]..self.row_ptr[i + 1])
                    .find(|&k| self.col_idx[k] == i)
                    .map(|k| self.values[k])
                    .unwrap_or(0.)
            })
            .collect()
    }

    /// Matrix-vector product. A single-threaded row loop, same as the
    /// teacher's CSR spmv in spirit; the per-row accumulation could be
    /// parallelized (each row is independent) but the crate stays
    /// single-threaded end to end (see the concurrency model), so it is not.
    pub fn mat_vec(&self, x: &Col<E>) -> Col<E> {
        let mut out = Col::<E>::zeros(self.n);
        for i in 0..self.n {
            let mut acc = 0.;
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                acc += self.values[k] * x[self.col_idx[k]];
            }
            out[i] = acc;
        }
        out
    }
}
