use std::fmt;

use ::serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};

use crate::config::DfmConfig;
use crate::dfm::dictionary::Dictionary;
use crate::dfm::Dfm;
use crate::error::{DfmError, DfmResult};
use crate::utils::label::LabelIndex;
use crate::utils::pattern::{PatternMatcher, ValueType};
use crate::utils::sparse::DfmValue;

/// What a selection call matches against
#[derive(Debug, Clone)]
pub enum PatternInput<'a, N = f64>
where
    N: DfmValue,
{
    /// fixed strings, globs or regexes depending on `SelectOptions::valuetype`
    Labels(Vec<String>),
    /// entries are matched with whitespace replaced by the dfm's concatenator
    Dictionary(Dictionary),
    /// exact, case-sensitive match on the reference's labels; a keep-selection
    /// is padded and reordered to the reference's feature set
    Reference(&'a Dfm<N>),
}

impl<'a, N> PatternInput<'a, N>
where
    N: DfmValue,
{
    pub fn labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PatternInput::Labels(labels.into_iter().map(Into::into).collect())
    }
}

impl<'a, N> From<&'a Dfm<N>> for PatternInput<'a, N>
where
    N: DfmValue,
{
    fn from(reference: &'a Dfm<N>) -> Self {
        PatternInput::Reference(reference)
    }
}

impl<'a, N> From<Dictionary> for PatternInput<'a, N>
where
    N: DfmValue,
{
    fn from(dict: Dictionary) -> Self {
        PatternInput::Dictionary(dict)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    #[default]
    Keep,
    Remove,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Keep => write!(f, "keep"),
            Selection::Remove => write!(f, "remove"),
        }
    }
}

/// Per-call selection options.
/// `verbose: None` falls back to the selector's config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectOptions {
    pub selection: Selection,
    pub valuetype: ValueType,
    pub case_insensitive: bool,
    /// inclusive lower bound on feature length in characters
    pub min_nchar: usize,
    /// inclusive upper bound; `None` is unbounded
    pub max_nchar: Option<usize>,
    pub verbose: Option<bool>,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            selection: Selection::Keep,
            valuetype: ValueType::Glob,
            case_insensitive: true,
            min_nchar: 0,
            max_nchar: None,
            verbose: None,
        }
    }
}

impl SelectOptions {
    pub fn keep() -> Self {
        Self::default()
    }

    pub fn remove() -> Self {
        Self {
            selection: Selection::Remove,
            ..Self::default()
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_valuetype(mut self, valuetype: ValueType) -> Self {
        self.valuetype = valuetype;
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn with_nchar(mut self, min_nchar: usize, max_nchar: Option<usize>) -> Self {
        self.min_nchar = min_nchar;
        self.max_nchar = max_nchar;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    fn validate(&self) -> DfmResult<()> {
        match self.max_nchar {
            Some(max) if self.min_nchar > max => Err(DfmError::invalid_argument(format!(
                "min_nchar {} exceeds max_nchar {max}",
                self.min_nchar
            ))),
            _ => Ok(()),
        }
    }

    fn nchar_ok(&self, label: &str) -> bool {
        let n = label.chars().count();
        n >= self.min_nchar && self.max_nchar.map_or(true, |max| n <= max)
    }
}

/// DfmSelector
/// Keeps or removes features (or documents) by label pattern.
///
/// Resolve pattern -> length filter -> keep/remove -> pad to reference.
/// Output columns stay in their original order except in the reference
/// keep path, where they follow the reference exactly. Documents are never
/// reordered by a feature selection.
#[derive(Debug, Clone, Default)]
pub struct DfmSelector {
    config: DfmConfig,
}

impl DfmSelector {
    pub fn new(config: DfmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DfmConfig {
        &self.config
    }

    /// Select features of `x`.
    ///
    /// With no pattern a keep-selection keeps every feature and a
    /// remove-selection removes none; length filters still apply.
    /// A selection that leaves no feature returns a zero-feature dfm.
    ///
    /// # Errors
    /// - `InvalidArgument` when `min_nchar > max_nchar`
    /// - `Pattern` when a glob or regex does not compile
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(ndoc = x.ndoc(), nfeat = x.nfeat(), selection = %options.selection)
    )]
    pub fn select_features<N>(
        &self,
        x: &Dfm<N>,
        pattern: Option<&PatternInput<'_, N>>,
        options: &SelectOptions,
    ) -> DfmResult<Dfm<N>>
    where
        N: DfmValue,
    {
        options.validate()?;
        let nfeat = x.nfeat();

        let (matched, reference) = match pattern {
            None => (no_pattern(options.selection, nfeat), None),
            Some(PatternInput::Reference(y)) => {
                let matcher = PatternMatcher::exact(y.featnames());
                (matcher.match_labels(x.feat_index()).ascending(), Some(*y))
            }
            Some(PatternInput::Labels(labels)) => {
                let matcher = PatternMatcher::new(labels, options.valuetype, options.case_insensitive)?;
                (matcher.match_labels(x.feat_index()).ascending(), None)
            }
            Some(PatternInput::Dictionary(dict)) => {
                let patterns = dict.patterns(&x.meta().concatenator);
                let matcher =
                    PatternMatcher::new(&patterns, options.valuetype, options.case_insensitive)?;
                (matcher.match_labels(x.feat_index()).ascending(), None)
            }
        };

        let mut kept = apply_selection(options.selection, &matched, nfeat);
        if reference.is_none() {
            kept.retain(|&j| options.nchar_ok(&x.featnames()[j]));
        }

        let view = x.view(self.config.parallel_threshold);
        let out = match reference {
            Some(y) if options.selection == Selection::Keep => {
                let columns = reference_columns(x.feat_index(), y.feat_index());
                let padded = columns.iter().filter(|c| c.is_none()).count();
                self.report(options, "features", nfeat, kept.len(), padded);
                Dfm::from_parts(
                    x.doc_index().clone(),
                    y.feat_index().clone(),
                    view.gather_columns(&columns)?,
                    x.meta().clone(),
                )
            }
            _ => {
                self.report(options, "features", nfeat, kept.len(), 0);
                let featnames = LabelIndex::from_merged(kept.iter().map(|&j| x.featnames()[j].clone()));
                Dfm::from_parts(
                    x.doc_index().clone(),
                    featnames,
                    view.select_columns(&kept)?,
                    x.meta().clone(),
                )
            }
        };
        Ok(out)
    }

    /// Keep-selection shorthand
    pub fn keep_features<N>(
        &self,
        x: &Dfm<N>,
        pattern: Option<&PatternInput<'_, N>>,
        options: &SelectOptions,
    ) -> DfmResult<Dfm<N>>
    where
        N: DfmValue,
    {
        let options = options.clone().with_selection(Selection::Keep);
        self.select_features(x, pattern, &options)
    }

    /// Remove-selection shorthand
    pub fn remove_features<N>(
        &self,
        x: &Dfm<N>,
        pattern: Option<&PatternInput<'_, N>>,
        options: &SelectOptions,
    ) -> DfmResult<Dfm<N>>
    where
        N: DfmValue,
    {
        let options = options.clone().with_selection(Selection::Remove);
        self.select_features(x, pattern, &options)
    }

    /// Select documents of `x` by label. Length bounds are not applied and
    /// dictionary entries are matched as written.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(ndoc = x.ndoc(), nfeat = x.nfeat(), selection = %options.selection)
    )]
    pub fn select_documents<N>(
        &self,
        x: &Dfm<N>,
        pattern: Option<&PatternInput<'_, N>>,
        options: &SelectOptions,
    ) -> DfmResult<Dfm<N>>
    where
        N: DfmValue,
    {
        let ndoc = x.ndoc();
        let matched = match pattern {
            None => no_pattern(options.selection, ndoc),
            Some(PatternInput::Reference(y)) => PatternMatcher::exact(y.docnames())
                .match_labels(x.doc_index())
                .ascending(),
            Some(PatternInput::Labels(labels)) => {
                PatternMatcher::new(labels, options.valuetype, options.case_insensitive)?
                    .match_labels(x.doc_index())
                    .ascending()
            }
            Some(PatternInput::Dictionary(dict)) => {
                PatternMatcher::new(&dict.flattened(), options.valuetype, options.case_insensitive)?
                    .match_labels(x.doc_index())
                    .ascending()
            }
        };
        let kept = apply_selection(options.selection, &matched, ndoc);
        self.report(options, "documents", ndoc, kept.len(), 0);

        let docnames = LabelIndex::from_merged(kept.iter().map(|&i| x.docnames()[i].clone()));
        let matrix = x.view(self.config.parallel_threshold).select_rows(&kept)?;
        Ok(Dfm::from_parts(docnames, x.feat_index().clone(), matrix, x.meta().clone()))
    }

    fn report(&self, options: &SelectOptions, what: &str, before: usize, after: usize, padded: usize) {
        let message = report_message(options.selection, what, before, after, padded);
        if self.report_level(options) == Level::INFO {
            info!(before, after, padded, "{message}");
        } else {
            debug!(before, after, padded, "{message}");
        }
    }

    /// `INFO` when the call (or, failing that, the config) asks for verbose output
    fn report_level(&self, options: &SelectOptions) -> Level {
        if options.verbose.unwrap_or(self.config.verbose) {
            Level::INFO
        } else {
            Level::DEBUG
        }
    }
}

fn report_message(selection: Selection, what: &str, before: usize, after: usize, padded: usize) -> String {
    let (verb, count) = match selection {
        Selection::Keep => ("kept", after),
        Selection::Remove => ("removed", before - after),
    };
    if padded > 0 {
        format!("{verb} {count} {what} of {before}, padded {padded}")
    } else {
        format!("{verb} {count} {what} of {before}")
    }
}

/// Matched set when no pattern is given
fn no_pattern(selection: Selection, n: usize) -> Vec<usize> {
    match selection {
        Selection::Keep => (0..n).collect(),
        Selection::Remove => Vec::new(),
    }
}

/// Ascending positions surviving keep/remove of the ascending `matched`
fn apply_selection(selection: Selection, matched: &[usize], n: usize) -> Vec<usize> {
    match selection {
        Selection::Keep => matched.to_vec(),
        Selection::Remove => {
            let mut hit = vec![false; n];
            for &j in matched {
                hit[j] = true;
            }
            (0..n).filter(|&j| !hit[j]).collect()
        }
    }
}

/// Source column of `x` for each reference feature, `None` to pad.
/// The k-th occurrence of a repeated reference label takes the k-th
/// column of `x` with that label.
fn reference_columns(x: &LabelIndex, reference: &LabelIndex) -> Vec<Option<usize>> {
    let matches = PatternMatcher::exact(reference.labels_in_order()).match_labels(x);
    reference
        .occurrence_keys()
        .into_iter()
        .enumerate()
        .map(|(j, (_, occurrence))| matches.for_pattern(j).get(occurrence).copied())
        .collect()
}
