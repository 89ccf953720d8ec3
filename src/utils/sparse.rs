use std::fmt::Debug;

use num::Num;
use rayon::prelude::*;
use sprs::{CsMat, TriMat};

use crate::error::{DfmError, DfmResult};

/// Cell value of a dfm
pub trait DfmValue: Num + Copy + Default + Debug + Send + Sync {}

impl<T> DfmValue for T where T: Num + Copy + Default + Debug + Send + Sync {}

/// Non-zero count above which rows are mapped in parallel when no
/// threshold is given
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 100_000;

/// SparseMatrixView
/// Reshaping primitives over a CSR `sprs::CsMat`.
///
/// Every operation is value preserving: cells are moved, never altered,
/// and nothing is densified. Rows are mapped in parallel once the matrix
/// holds more than `parallel_threshold` non-zeros; the collect keeps row
/// order so both paths give identical output.
#[derive(Debug, Clone, Copy)]
pub struct SparseMatrixView<'a, N>
where
    N: DfmValue,
{
    mat: &'a CsMat<N>,
    parallel_threshold: usize,
}

impl<'a, N> SparseMatrixView<'a, N>
where
    N: DfmValue,
{
    pub fn new(mat: &'a CsMat<N>) -> Self {
        debug_assert!(mat.is_csr(), "dfm storage must be CSR");
        Self {
            mat,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn rows(&self) -> usize {
        self.mat.rows()
    }

    pub fn cols(&self) -> usize {
        self.mat.cols()
    }

    /// Keep the given columns in the given order
    pub fn select_columns(&self, indices: &[usize]) -> DfmResult<CsMat<N>> {
        let columns: Vec<Option<usize>> = indices.iter().copied().map(Some).collect();
        self.gather_columns(&columns)
    }

    /// Output column `k` is source column `columns[k]`, or all zeros for `None`.
    /// Covers subsetting, reordering and padding in one pass.
    pub fn gather_columns(&self, columns: &[Option<usize>]) -> DfmResult<CsMat<N>> {
        if let Some(j) = columns.iter().flatten().find(|&&j| j >= self.cols()) {
            return Err(DfmError::shape(format!(
                "column {j} outside {} columns",
                self.cols()
            )));
        }
        // source column -> output columns fed by it
        let mut targets: Vec<Vec<usize>> = vec![Vec::new(); self.cols()];
        for (k, src) in columns.iter().enumerate() {
            if let Some(j) = src {
                targets[*j].push(k);
            }
        }
        let rows = self.map_rows(self.rows(), |r| {
            let mut out = Vec::new();
            for (j, v) in row_entries(self.mat, r) {
                for &k in &targets[j] {
                    out.push((k, v));
                }
            }
            out
        });
        Ok(assemble((self.rows(), columns.len()), rows))
    }

    /// Keep the given rows in the given order
    pub fn select_rows(&self, indices: &[usize]) -> DfmResult<CsMat<N>> {
        if let Some(r) = indices.iter().find(|&&r| r >= self.rows()) {
            return Err(DfmError::shape(format!("row {r} outside {} rows", self.rows())));
        }
        let rows = self.map_rows(indices.len(), |k| row_entries(self.mat, indices[k]));
        Ok(assemble((indices.len(), self.cols()), rows))
    }

    /// Append `extra` zero columns on the right
    pub fn zero_extend_columns(&self, extra: usize) -> CsMat<N> {
        let rows = self.map_rows(self.rows(), |r| row_entries(self.mat, r));
        assemble((self.rows(), self.cols() + extra), rows)
    }

    /// Stack `other` below this matrix
    pub fn concat_rows(&self, other: &CsMat<N>) -> DfmResult<CsMat<N>> {
        if self.cols() != other.cols() {
            return Err(DfmError::shape(format!(
                "cannot stack rows: {} columns against {}",
                self.cols(),
                other.cols()
            )));
        }
        Ok(sprs::vstack(&[self.mat.view(), other.view()]))
    }

    /// Place `other` to the right of this matrix
    pub fn concat_columns(&self, other: &CsMat<N>) -> DfmResult<CsMat<N>> {
        if self.rows() != other.rows() {
            return Err(DfmError::shape(format!(
                "cannot bind columns: {} rows against {}",
                self.rows(),
                other.rows()
            )));
        }
        let offset = self.cols();
        let rows = self.map_rows(self.rows(), |r| {
            let mut out = row_entries(self.mat, r);
            out.extend(row_entries(other, r).into_iter().map(|(j, v)| (j + offset, v)));
            out
        });
        Ok(assemble((self.rows(), offset + other.cols()), rows))
    }

    fn map_rows<F>(&self, n: usize, f: F) -> Vec<Vec<(usize, N)>>
    where
        F: Fn(usize) -> Vec<(usize, N)> + Send + Sync,
    {
        if self.mat.nnz() > self.parallel_threshold {
            (0..n).into_par_iter().map(f).collect()
        } else {
            (0..n).map(f).collect()
        }
    }
}

/// Entries of row `r` as `(column, value)`, ascending column
pub fn row_entries<N>(mat: &CsMat<N>, r: usize) -> Vec<(usize, N)>
where
    N: DfmValue,
{
    mat.outer_view(r)
        .map(|row| row.iter().map(|(j, v)| (j, *v)).collect())
        .unwrap_or_default()
}

/// Build CSR storage from per-row entries.
/// Rows are sorted by column; zero values are dropped.
pub fn assemble<N>(shape: (usize, usize), rows: Vec<Vec<(usize, N)>>) -> CsMat<N>
where
    N: DfmValue,
{
    debug_assert_eq!(rows.len(), shape.0);
    let nnz: usize = rows.iter().map(Vec::len).sum();
    let mut indptr = Vec::with_capacity(shape.0 + 1);
    let mut indices = Vec::with_capacity(nnz);
    let mut data = Vec::with_capacity(nnz);
    indptr.push(0);
    for mut row in rows {
        row.sort_unstable_by_key(|(j, _)| *j);
        for (j, v) in row {
            if v != N::zero() {
                indices.push(j);
                data.push(v);
            }
        }
        indptr.push(indices.len());
    }
    CsMat::new(shape, indptr, indices, data)
}

/// All-zero matrix of the given shape
pub fn zeros<N>(shape: (usize, usize)) -> CsMat<N>
where
    N: DfmValue,
{
    assemble(shape, vec![Vec::new(); shape.0])
}

/// Build from `(row, col, value)` triplets; repeated coordinates are summed.
pub fn from_triplets<N, I>(shape: (usize, usize), triplets: I) -> DfmResult<CsMat<N>>
where
    N: DfmValue,
    I: IntoIterator<Item = (usize, usize, N)>,
{
    let mut tri = TriMat::new(shape);
    for (r, c, v) in triplets {
        if r >= shape.0 || c >= shape.1 {
            return Err(DfmError::shape(format!(
                "entry ({r}, {c}) outside {} x {}",
                shape.0, shape.1
            )));
        }
        if v != N::zero() {
            tri.add_triplet(r, c, v);
        }
    }
    let summed: CsMat<N> = tri.to_csr();
    // summing can cancel to zero; drop those
    let rows = (0..shape.0).map(|r| row_entries(&summed, r)).collect();
    Ok(assemble(shape, rows))
}

/// Build from dense rows, each of length `cols`
pub fn from_dense_rows<N>(rows: &[Vec<N>], cols: usize) -> DfmResult<CsMat<N>>
where
    N: DfmValue,
{
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
        return Err(DfmError::shape(format!(
            "row {i} has {} values, expected {cols}",
            row.len()
        )));
    }
    let entries = rows
        .iter()
        .map(|row| row.iter().copied().enumerate().collect())
        .collect();
    Ok(assemble((rows.len(), cols), entries))
}

/// Entry-wise equality of two CSR matrices
pub fn same_values<N>(a: &CsMat<N>, b: &CsMat<N>) -> bool
where
    N: DfmValue,
{
    a.shape() == b.shape() && (0..a.rows()).all(|r| row_entries(a, r) == row_entries(b, r))
}
