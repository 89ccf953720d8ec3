//! This crate aligns, combines and selects sparse document-feature matrices.

pub mod config;
pub mod dfm;
pub mod error;
pub mod utils;

/// Document-Feature Matrix
/// The central value of this crate: a sparse, labeled matrix with one row per
/// document and one column per feature.
///
/// Internally, it holds:
/// - Document labels (always unique)
/// - Feature labels (unique unless a column-combine reported duplicates)
/// - CSR storage from `sprs`, without explicit zeros
/// - Opaque metadata (`DfmMeta`) copied through every operation
///
/// `Dfm<N>` is generic over the cell type `N` (e.g. f64, f32, u32).
///
/// # Serialization
/// Supported, through the `DfmData` layout.
pub use dfm::{Dfm, DfmMeta};

/// Dfm Data Structure for Serialization
/// Plain documents / features / triplets form of a `Dfm`.
/// Convert it back with `into_dfm`, which validates shape and labels.
pub use dfm::serde::DfmData;

/// Combiner
/// Row-wise (`combine_by_document`) and column-wise (`combine_by_feature`)
/// merges of two or more operands as a left fold.
/// Non-dfm operands (scalars, columns, dense matrices) are coerced for the
/// column-wise merge.
pub use dfm::combine::{CombineOperand, DfmCombiner};

/// Selector
/// Keep or remove features (or documents) by fixed string, glob or regex,
/// by dictionary entries, or exactly to another dfm's features.
pub use dfm::select::{DfmSelector, PatternInput, SelectOptions, Selection};

/// Feature Aligner
/// Zero-pads two dfms onto the union of their features.
pub use dfm::align::FeatureAligner;

/// Dictionary
/// Ordered groups of (possibly multi-word) entries used as a selection pattern.
pub use dfm::dictionary::Dictionary;

/// Advisories
/// Non-fatal data-quality signals returned next to a combine result.
/// Every advisory is also emitted as a `tracing` warn event.
pub use dfm::advisory::{Advised, Advisory, AdvisoryCode};

/// Pattern interpretation: fixed, glob or regex
pub use utils::pattern::ValueType;

pub use config::DfmConfig;
pub use error::{DfmError, DfmResult};

/// Cell value bound: any `num::Num` that is `Copy`, `Default` and thread-safe
pub use utils::sparse::DfmValue;

/// Column-wise merge with an explicit config
pub fn combine_by_feature<N>(
    operands: Vec<CombineOperand<N>>,
    config: &DfmConfig,
) -> DfmResult<Advised<Dfm<N>>>
where
    N: DfmValue,
{
    DfmCombiner::new(config.clone()).combine_by_feature(operands)
}

/// Row-wise merge with an explicit config
pub fn combine_by_document<N>(
    operands: Vec<CombineOperand<N>>,
    config: &DfmConfig,
) -> DfmResult<Advised<Dfm<N>>>
where
    N: DfmValue,
{
    DfmCombiner::new(config.clone()).combine_by_document(operands)
}

pub fn select_features<N>(
    x: &Dfm<N>,
    pattern: Option<&PatternInput<'_, N>>,
    options: &SelectOptions,
    config: &DfmConfig,
) -> DfmResult<Dfm<N>>
where
    N: DfmValue,
{
    DfmSelector::new(config.clone()).select_features(x, pattern, options)
}

pub fn keep_features<N>(
    x: &Dfm<N>,
    pattern: Option<&PatternInput<'_, N>>,
    options: &SelectOptions,
    config: &DfmConfig,
) -> DfmResult<Dfm<N>>
where
    N: DfmValue,
{
    DfmSelector::new(config.clone()).keep_features(x, pattern, options)
}

pub fn remove_features<N>(
    x: &Dfm<N>,
    pattern: Option<&PatternInput<'_, N>>,
    options: &SelectOptions,
    config: &DfmConfig,
) -> DfmResult<Dfm<N>>
where
    N: DfmValue,
{
    DfmSelector::new(config.clone()).remove_features(x, pattern, options)
}
