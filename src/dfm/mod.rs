pub mod advisory;
pub mod align;
pub mod combine;
pub mod dictionary;
pub mod select;
pub mod serde;

use ::serde::{Deserialize, Serialize};
use sprs::CsMat;

use crate::error::{DfmError, DfmResult};
use crate::utils::label::LabelIndex;
use crate::utils::sparse::{self, row_entries, DfmValue, SparseMatrixView};

/// Settings carried by a dfm.
/// Opaque to combine/select: copied from the left-most (or selected) input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DfmMeta {
    /// weighting scheme identifier, e.g. "count", "prop"
    pub weighting: String,
    pub smooth: f64,
    /// n-gram orders the features were built with
    pub ngrams: Vec<usize>,
    /// joins the parts of multi-word features
    pub concatenator: String,
    /// schema version of the producing crate
    pub version: String,
}

impl Default for DfmMeta {
    fn default() -> Self {
        Self {
            weighting: "count".to_string(),
            smooth: 0.0,
            ngrams: vec![1],
            concatenator: "_".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Document-feature matrix
/// Rows are documents, columns are features, cells are counts or weights.
///
/// A `Dfm` is a value: combine/select return new matrices and never hold on
/// to the storage of their inputs. Storage is CSR with no explicit zeros.
///
/// Document labels are always unique. Feature labels are unique for every
/// dfm built by a constructor; a column-combine may return duplicates, and
/// says so through its advisories (see `compress_features`).
#[derive(Debug, Clone)]
pub struct Dfm<N = f64>
where
    N: DfmValue,
{
    docnames: LabelIndex,
    featnames: LabelIndex,
    matrix: CsMat<N>,
    meta: DfmMeta,
}

impl<N> Dfm<N>
where
    N: DfmValue,
{
    /// Wrap a sparse matrix with its labels.
    ///
    /// # Errors
    /// - `DuplicateLabel` if documents or features repeat
    /// - `Shape` if label counts differ from the matrix dimensions
    pub fn new<D, F>(docnames: D, featnames: F, matrix: CsMat<N>) -> DfmResult<Self>
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        let docnames = LabelIndex::build(docnames, "document")?;
        let featnames = LabelIndex::build(featnames, "feature")?;
        check_shape(&docnames, &featnames, matrix.shape())?;
        // rebuilt so stored zeros are dropped and CSC input becomes CSR
        let shape = matrix.shape();
        let matrix = sparse::from_triplets(shape, matrix.iter().map(|(v, (r, c))| (r, c, *v)))?;
        Ok(Self::from_parts(docnames, featnames, matrix, DfmMeta::default()))
    }

    /// Build from dense rows, one per document
    pub fn from_dense<D, F>(docnames: D, featnames: F, rows: Vec<Vec<N>>) -> DfmResult<Self>
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        let featnames = LabelIndex::build(featnames, "feature")?;
        let matrix = sparse::from_dense_rows(&rows, featnames.len())?;
        Self::new(docnames, featnames.into_labels(), matrix)
    }

    /// Build from `(doc, feature, value)` coordinates; repeats are summed
    pub fn from_triplets<D, F, I>(docnames: D, featnames: F, triplets: I) -> DfmResult<Self>
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
        I: IntoIterator<Item = (usize, usize, N)>,
    {
        let docnames = LabelIndex::build(docnames, "document")?;
        let featnames = LabelIndex::build(featnames, "feature")?;
        let matrix = sparse::from_triplets((docnames.len(), featnames.len()), triplets)?;
        Ok(Self::from_parts(docnames, featnames, matrix, DfmMeta::default()))
    }

    /// Assemble from already validated parts. Feature duplicates are allowed.
    pub(crate) fn from_parts(
        docnames: LabelIndex,
        featnames: LabelIndex,
        matrix: CsMat<N>,
        meta: DfmMeta,
    ) -> Self {
        debug_assert_eq!(matrix.shape(), (docnames.len(), featnames.len()));
        debug_assert!(!docnames.has_duplicates());
        Self {
            docnames,
            featnames,
            matrix,
            meta,
        }
    }

    pub fn with_meta(mut self, meta: DfmMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn docnames(&self) -> &[String] {
        self.docnames.labels_in_order()
    }

    pub fn featnames(&self) -> &[String] {
        self.featnames.labels_in_order()
    }

    pub fn doc_index(&self) -> &LabelIndex {
        &self.docnames
    }

    pub fn feat_index(&self) -> &LabelIndex {
        &self.featnames
    }

    pub fn ndoc(&self) -> usize {
        self.docnames.len()
    }

    pub fn nfeat(&self) -> usize {
        self.featnames.len()
    }

    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    pub fn matrix(&self) -> &CsMat<N> {
        &self.matrix
    }

    pub fn meta(&self) -> &DfmMeta {
        &self.meta
    }

    /// Zero documents or zero features
    pub fn is_degenerate(&self) -> bool {
        self.ndoc() == 0 || self.nfeat() == 0
    }

    /// Cell by position; zero when not stored
    pub fn value_at(&self, doc: usize, feat: usize) -> N {
        self.matrix.get(doc, feat).copied().unwrap_or_else(N::zero)
    }

    /// Cell by labels; `None` when either label is unknown.
    /// A repeated feature label resolves to its first column.
    pub fn value(&self, doc: &str, feat: &str) -> Option<N> {
        let i = self.docnames.position_of(doc)?;
        let j = self.featnames.position_of(feat)?;
        Some(self.value_at(i, j))
    }

    /// Stored `(feature position, value)` pairs of one document
    pub fn row_entries(&self, doc: usize) -> Vec<(usize, N)> {
        row_entries(&self.matrix, doc)
    }

    pub(crate) fn view(&self, parallel_threshold: usize) -> SparseMatrixView<'_, N> {
        SparseMatrixView::new(&self.matrix).with_parallel_threshold(parallel_threshold)
    }

    /// Merge columns sharing a feature label by summing them.
    /// The merged column sits where the label first occurs.
    pub fn compress_features(&self) -> Self {
        if !self.featnames.has_duplicates() {
            return self.clone();
        }
        let keys = self.featnames.distinct();
        let group: Vec<usize> = self
            .featnames()
            .iter()
            .map(|f| keys.position_of(f).unwrap_or_default())
            .collect();
        let rows = (0..self.ndoc())
            .map(|r| {
                let mut merged: Vec<(usize, N)> = self
                    .row_entries(r)
                    .into_iter()
                    .map(|(j, v)| (group[j], v))
                    .collect();
                merged.sort_by_key(|(k, _)| *k);
                merged.dedup_by(|later, kept| {
                    if later.0 == kept.0 {
                        kept.1 = kept.1 + later.1;
                        true
                    } else {
                        false
                    }
                });
                merged
            })
            .collect();
        let matrix = sparse::assemble((self.ndoc(), keys.len()), rows);
        Self::from_parts(self.docnames.clone(), keys, matrix, self.meta.clone())
    }
}

fn check_shape(docnames: &LabelIndex, featnames: &LabelIndex, shape: (usize, usize)) -> DfmResult<()> {
    if shape != (docnames.len(), featnames.len()) {
        return Err(DfmError::shape(format!(
            "{} documents x {} features against a {} x {} matrix",
            docnames.len(),
            featnames.len(),
            shape.0,
            shape.1
        )));
    }
    Ok(())
}

/// Same documents, features and values. Metadata is not compared.
impl<N> PartialEq for Dfm<N>
where
    N: DfmValue,
{
    fn eq(&self, other: &Self) -> bool {
        self.docnames == other.docnames
            && self.featnames == other.featnames
            && sparse::same_values(&self.matrix, &other.matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Dfm {
        Dfm::from_dense(
            ["d1", "d2"],
            ["cat", "dog"],
            vec![vec![1.0, 2.0], vec![0.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn constructors_agree() {
        let a = small();
        let b = Dfm::from_triplets(
            ["d1", "d2"],
            ["cat", "dog"],
            vec![(0, 0, 1.0), (0, 1, 2.0), (1, 1, 1.0)],
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.nnz(), 3);
        assert_eq!(a.value("d1", "dog"), Some(2.0));
        assert_eq!(a.value("d2", "cat"), Some(0.0));
        assert_eq!(a.value("d9", "cat"), None);
    }

    #[test]
    fn duplicate_labels_rejected_on_construction() {
        let res = Dfm::from_dense(["d1", "d1"], ["a"], vec![vec![1.0], vec![2.0]]);
        assert!(matches!(res, Err(DfmError::DuplicateLabel { kind: "document", .. })));
        let res = Dfm::from_dense(["d1"], ["a", "a"], vec![vec![1.0, 2.0]]);
        assert!(matches!(res, Err(DfmError::DuplicateLabel { kind: "feature", .. })));
    }

    #[test]
    fn shape_mismatch_rejected() {
        let m = sparse::zeros::<f64>((2, 3));
        let res = Dfm::new(["d1", "d2"], ["a", "b"], m);
        assert!(matches!(res, Err(DfmError::Shape { .. })));
    }

    #[test]
    fn csc_input_is_normalized() {
        let csr = small().matrix().clone();
        let csc = csr.to_csc();
        let dfm = Dfm::new(["d1", "d2"], ["cat", "dog"], csc).unwrap();
        assert!(dfm.matrix().is_csr());
        assert_eq!(dfm, small());
    }

    #[test]
    fn stored_zeros_are_dropped() {
        let with_zero = CsMat::new((1, 2), vec![0, 2], vec![0, 1], vec![1.0, 0.0]);
        let x = Dfm::new(["d1"], ["cat", "dog"], with_zero).unwrap();
        assert_eq!(x.nnz(), 1);
        assert!(x.matrix().is_csr());
        let dense = Dfm::from_dense(["d1"], ["cat", "dog"], vec![vec![1.0, 0.0]]).unwrap();
        assert_eq!(x, dense);

        let mut tri = sprs::TriMat::new((1, 2));
        tri.add_triplet(0, 0, 1.0);
        tri.add_triplet(0, 1, 0.0);
        let x = Dfm::new(["d1"], ["cat", "dog"], tri.to_csr()).unwrap();
        assert_eq!(x.nnz(), 1);
        assert_eq!(x, dense);
    }

    #[test]
    fn degenerate_detection() {
        assert!(!small().is_degenerate());
        let empty: Dfm = Dfm::from_dense(["d1"], Vec::<String>::new(), vec![vec![]]).unwrap();
        assert!(empty.is_degenerate());
    }

    #[test]
    fn compress_sums_duplicate_columns() {
        let base = small();
        let dfm = Dfm::from_parts(
            base.doc_index().clone(),
            LabelIndex::from_merged(["cat", "dog", "cat"]),
            sparse::from_dense_rows(&[vec![1.0, 2.0, 4.0], vec![0.0, 1.0, 1.0]], 3).unwrap(),
            DfmMeta::default(),
        );
        let compressed = dfm.compress_features();
        assert_eq!(compressed.featnames(), &["cat".to_string(), "dog".to_string()]);
        assert_eq!(compressed.value("d1", "cat"), Some(5.0));
        assert_eq!(compressed.value("d2", "cat"), Some(1.0));
        assert_eq!(compressed.value("d2", "dog"), Some(1.0));
    }
}
