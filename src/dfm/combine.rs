use tracing::debug;

use crate::config::DfmConfig;
use crate::dfm::advisory::{Advised, Advisory};
use crate::dfm::align::FeatureAligner;
use crate::dfm::Dfm;
use crate::error::{DfmError, DfmResult};
use crate::utils::label::{make_unique_at, make_unique_generated, LabelIndex};
use crate::utils::sparse::{self, DfmValue};

/// One argument of a combine call.
///
/// Non-dfm values are coerced to a dfm over the document labels of the
/// dfm they are bound to. Unnamed columns get the configured placeholder
/// prefix as their feature label.
#[derive(Debug, Clone)]
pub enum CombineOperand<N = f64>
where
    N: DfmValue,
{
    Dfm(Dfm<N>),
    /// one column holding `value` in every document
    Scalar { name: Option<String>, value: N },
    /// one column, one value per document
    Column { name: Option<String>, values: Vec<N> },
    /// dense rows, one per document
    Matrix {
        featnames: Option<Vec<String>>,
        rows: Vec<Vec<N>>,
    },
}

impl<N> From<Dfm<N>> for CombineOperand<N>
where
    N: DfmValue,
{
    fn from(dfm: Dfm<N>) -> Self {
        CombineOperand::Dfm(dfm)
    }
}

impl<N> CombineOperand<N>
where
    N: DfmValue,
{
    pub fn scalar(value: N) -> Self {
        CombineOperand::Scalar { name: None, value }
    }

    pub fn column(values: Vec<N>) -> Self {
        CombineOperand::Column { name: None, values }
    }

    pub fn named_column(name: impl Into<String>, values: Vec<N>) -> Self {
        CombineOperand::Column {
            name: Some(name.into()),
            values,
        }
    }

    pub fn matrix(rows: Vec<Vec<N>>) -> Self {
        CombineOperand::Matrix {
            featnames: None,
            rows,
        }
    }

    pub fn as_dfm(&self) -> Option<&Dfm<N>> {
        match self {
            CombineOperand::Dfm(dfm) => Some(dfm),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CombineOperand::Dfm(_) => "dfm",
            CombineOperand::Scalar { .. } => "scalar",
            CombineOperand::Column { .. } => "column",
            CombineOperand::Matrix { .. } => "matrix",
        }
    }

    /// Coerce onto the documents and metadata of `host`. A dfm is returned as is.
    fn into_dfm(self, host: &Dfm<N>, prefix: &str) -> DfmResult<Dfm<N>> {
        let docnames = host.doc_index();
        let ndoc = docnames.len();
        let (featnames, rows) = match self {
            CombineOperand::Dfm(dfm) => return Ok(dfm),
            CombineOperand::Scalar { name, value } => (
                vec![name.unwrap_or_else(|| prefix.to_string())],
                vec![vec![value]; ndoc],
            ),
            CombineOperand::Column { name, values } => {
                if values.len() != ndoc {
                    return Err(DfmError::shape(format!(
                        "column has {} values for {ndoc} documents",
                        values.len()
                    )));
                }
                (
                    vec![name.unwrap_or_else(|| prefix.to_string())],
                    values.into_iter().map(|v| vec![v]).collect(),
                )
            }
            CombineOperand::Matrix { featnames, rows } => {
                if rows.len() != ndoc {
                    return Err(DfmError::shape(format!(
                        "matrix has {} rows for {ndoc} documents",
                        rows.len()
                    )));
                }
                let featnames = featnames.unwrap_or_else(|| {
                    let ncol = rows.first().map(Vec::len).unwrap_or(0);
                    (1..=ncol).map(|k| format!("{prefix}{k}")).collect()
                });
                (featnames, rows)
            }
        };
        let matrix = sparse::from_dense_rows(&rows, featnames.len())?;
        Ok(Dfm::from_parts(
            docnames.clone(),
            LabelIndex::from_merged(featnames),
            matrix,
            host.meta().clone(),
        ))
    }
}

/// DfmCombiner
/// Row-wise and column-wise merges of two or more dfms.
///
/// Both directions are a strict left fold: `((x1 + x2) + x3) + ...`, and
/// advisories are raised pair by pair in that order.
#[derive(Debug, Clone, Default)]
pub struct DfmCombiner {
    config: DfmConfig,
}

impl DfmCombiner {
    pub fn new(config: DfmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DfmConfig {
        &self.config
    }

    /// Join by feature: documents are bound row for row.
    ///
    /// The result keeps the documents and metadata of the first operand.
    /// Once the accumulated left side has no documents or no features it is
    /// returned unchanged and the remaining operands are not looked at.
    ///
    /// # Errors
    /// - `InvalidArgument` for an empty operand list
    /// - `Type` when no operand is a dfm to lend document labels
    /// - `Shape` when row counts differ or a coerced value has the wrong length
    #[tracing::instrument(level = "debug", skip_all, fields(operands = operands.len()))]
    pub fn combine_by_feature<N>(&self, operands: Vec<CombineOperand<N>>) -> DfmResult<Advised<Dfm<N>>>
    where
        N: DfmValue,
    {
        if operands.is_empty() {
            return Err(DfmError::invalid_argument("no operands to combine"));
        }
        // a leading non-dfm takes documents and metadata from the first dfm in the list
        let lender = operands
            .iter()
            .find_map(CombineOperand::as_dfm)
            .map(|dfm| {
                Dfm::from_parts(
                    dfm.doc_index().clone(),
                    LabelIndex::default(),
                    sparse::zeros((dfm.ndoc(), 0)),
                    dfm.meta().clone(),
                )
            })
            .ok_or_else(|| DfmError::type_error("column-combine needs at least one dfm operand"))?;

        let prefix = self.config.generated_prefix.as_str();
        let mut operands = operands.into_iter().enumerate();
        let mut out = match operands.next() {
            Some((_, first)) => Advised::new(first.into_dfm(&lender, prefix)?),
            None => return Err(DfmError::invalid_argument("no operands to combine")),
        };

        for (i, operand) in operands {
            if out.value.is_degenerate() {
                debug!(operand = i, "left side is empty, skipping operand");
                continue;
            }
            let right = operand.into_dfm(&out.value, prefix)?;
            let (bound, advisories) = self.bind_columns(&out.value, &right, i)?;
            out.value = bound;
            for advisory in advisories {
                out.push(advisory);
            }
        }
        Ok(out)
    }

    /// Join by document: features are reconciled by union.
    ///
    /// Feature order follows the fold: the left side's features, then the
    /// ones new in each later operand. No canonical order is imposed.
    /// Metadata comes from the left-most operand.
    ///
    /// # Errors
    /// - `InvalidArgument` for an empty operand list
    /// - `Type` when any operand is not a dfm
    #[tracing::instrument(level = "debug", skip_all, fields(operands = operands.len()))]
    pub fn combine_by_document<N>(&self, operands: Vec<CombineOperand<N>>) -> DfmResult<Advised<Dfm<N>>>
    where
        N: DfmValue,
    {
        let mut dfms = operands
            .into_iter()
            .enumerate()
            .map(|(i, operand)| match operand {
                CombineOperand::Dfm(dfm) => Ok(dfm),
                other => Err(DfmError::type_error(format!(
                    "row-combine operand {i} is a {}, not a dfm",
                    other.kind()
                ))),
            })
            .collect::<DfmResult<Vec<_>>>()?
            .into_iter();

        let mut out = match dfms.next() {
            Some(first) => Advised::new(first),
            None => return Err(DfmError::invalid_argument("no operands to combine")),
        };
        for next in dfms {
            let (bound, advisories) = self.bind_rows(&out.value, &next)?;
            out.value = bound;
            for advisory in advisories {
                out.push(advisory);
            }
        }
        Ok(out)
    }

    /// Bind `right`'s columns after `left`'s; `operand` is `right`'s position
    /// in the call, for the advisory
    pub fn bind_columns<N>(
        &self,
        left: &Dfm<N>,
        right: &Dfm<N>,
        operand: usize,
    ) -> DfmResult<(Dfm<N>, Vec<Advisory>)>
    where
        N: DfmValue,
    {
        if left.ndoc() != right.ndoc() {
            return Err(DfmError::shape(format!(
                "cannot bind columns of {} documents to {} documents",
                right.ndoc(),
                left.ndoc()
            )));
        }
        let mut advisories = Vec::new();
        if left.docnames() != right.docnames() {
            advisories.push(Advisory::DocumentMismatch { operand });
        }

        let matrix = left
            .view(self.config.parallel_threshold)
            .concat_columns(right.matrix())?;

        let mut featnames: Vec<String> = left
            .featnames()
            .iter()
            .chain(right.featnames())
            .cloned()
            .collect();
        let renamed = make_unique_generated(&mut featnames, &self.config.generated_prefix);
        if !renamed.is_empty() {
            debug!(renamed = renamed.len(), "disambiguated placeholder features");
        }
        let featnames = LabelIndex::from_merged(featnames);
        let duplicates = featnames.duplicates();
        if !duplicates.is_empty() {
            advisories.push(Advisory::DuplicateFeatures {
                features: duplicates.into_iter().map(str::to_string).collect(),
            });
        }

        let bound = Dfm::from_parts(left.doc_index().clone(), featnames, matrix, left.meta().clone());
        Ok((bound, advisories))
    }

    /// Stack `bottom`'s documents under `top`'s on the union feature space.
    /// A degenerate side yields the other side unchanged.
    pub fn bind_rows<N>(&self, top: &Dfm<N>, bottom: &Dfm<N>) -> DfmResult<(Dfm<N>, Vec<Advisory>)>
    where
        N: DfmValue,
    {
        let aligner = FeatureAligner::new(self.config.parallel_threshold);
        let (top_aligned, bottom_aligned) = match aligner.align(top, bottom) {
            Ok(pair) => pair,
            Err(err) if err.is_recoverable() => {
                debug!(%err, "degenerate row-combine operand");
                let kept = if top.is_degenerate() { bottom } else { top };
                return Ok((kept.clone(), Vec::new()));
            }
            Err(err) => return Err(err),
        };

        let matrix = top_aligned
            .view(self.config.parallel_threshold)
            .concat_rows(bottom_aligned.matrix())?;

        let mut docnames: Vec<String> = top
            .docnames()
            .iter()
            .chain(bottom.docnames())
            .cloned()
            .collect();
        let all: Vec<usize> = (0..docnames.len()).collect();
        let renamed = make_unique_at(&mut docnames, &all, ".");
        let mut advisories = Vec::new();
        if !renamed.is_empty() {
            advisories.push(Advisory::DuplicateDocuments {
                renamed: renamed.into_iter().map(|(_, old, new)| (old, new)).collect(),
            });
        }

        let bound = Dfm::from_parts(
            LabelIndex::from_merged(docnames),
            top_aligned.feat_index().clone(),
            matrix,
            top.meta().clone(),
        );
        Ok((bound, advisories))
    }
}
