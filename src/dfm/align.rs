use std::collections::HashMap;

use crate::dfm::Dfm;
use crate::error::{DfmError, DfmResult};
use crate::utils::label::LabelIndex;
use crate::utils::sparse::{DfmValue, DEFAULT_PARALLEL_THRESHOLD};

/// FeatureAligner
/// Brings two dfms onto one shared feature space.
///
/// The shared order is every feature of `a` in its own order, then the
/// features only `b` has, in `b`'s order. A label repeated inside one input
/// is matched occurrence by occurrence (the second "x" of `b` pairs with
/// the second "x" of `a`), so no column is ever summed into another.
#[derive(Debug, Clone, Copy)]
pub struct FeatureAligner {
    parallel_threshold: usize,
}

impl Default for FeatureAligner {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_THRESHOLD)
    }
}

impl FeatureAligner {
    pub fn new(parallel_threshold: usize) -> Self {
        Self { parallel_threshold }
    }

    /// Union feature labels for `a` then `b`, and the union position of each
    /// of `b`'s columns
    pub fn union(a: &LabelIndex, b: &LabelIndex) -> (Vec<String>, Vec<usize>) {
        let a_keys: HashMap<(&str, usize), usize> = a
            .occurrence_keys()
            .into_iter()
            .enumerate()
            .map(|(j, key)| (key, j))
            .collect();
        let mut union: Vec<String> = a.labels_in_order().to_vec();
        let b_to_union: Vec<usize> = b
            .occurrence_keys()
            .into_iter()
            .map(|key| match a_keys.get(&key) {
                Some(&j) => j,
                None => {
                    union.push(key.0.to_string());
                    union.len() - 1
                }
            })
            .collect();
        (union, b_to_union)
    }

    /// Zero-pad both inputs to the union of their features.
    ///
    /// # Errors
    /// `EmptyDimension` when either input has no documents or no features.
    pub fn align<N>(&self, a: &Dfm<N>, b: &Dfm<N>) -> DfmResult<(Dfm<N>, Dfm<N>)>
    where
        N: DfmValue,
    {
        for side in [a, b] {
            if side.is_degenerate() {
                return Err(DfmError::EmptyDimension {
                    rows: side.ndoc(),
                    cols: side.nfeat(),
                });
            }
        }

        let (union, b_to_union) = Self::union(a.feat_index(), b.feat_index());
        let extra = union.len() - a.nfeat();

        let mut gather: Vec<Option<usize>> = vec![None; union.len()];
        for (j, &u) in b_to_union.iter().enumerate() {
            gather[u] = Some(j);
        }

        let a_matrix = a.view(self.parallel_threshold).zero_extend_columns(extra);
        let b_matrix = b.view(self.parallel_threshold).gather_columns(&gather)?;
        let featnames = LabelIndex::from_merged(union);

        tracing::trace!(
            a_features = a.nfeat(),
            b_features = b.nfeat(),
            union = featnames.len(),
            "aligned feature sets"
        );

        Ok((
            Dfm::from_parts(a.doc_index().clone(), featnames.clone(), a_matrix, a.meta().clone()),
            Dfm::from_parts(b.doc_index().clone(), featnames, b_matrix, b.meta().clone()),
        ))
    }
}
