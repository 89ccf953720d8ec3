//! Typed errors for dfm operations.

use thiserror::Error;

/// Error type for dfm construction, combination and selection.
#[derive(Error, Debug)]
pub enum DfmError {
    /// An operand had to be a dfm (or coercible to one) and was not
    #[error("type error: {message}")]
    Type { message: String },

    /// Zero-row or zero-column operand where labels must be reconciled.
    /// The combiner turns this into the degenerate-return rule.
    #[error("empty dimension: {rows} documents x {cols} features")]
    EmptyDimension { rows: usize, cols: usize },

    /// Duplicate label supplied by a single, non-merge source
    #[error("duplicate {kind} label: {label}")]
    DuplicateLabel { kind: &'static str, label: String },

    /// Pattern could not be compiled
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Labels and matrix dimensions disagree
    #[error("shape error: {message}")]
    Shape { message: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("config error: {message}")]
    Config { message: String },

    /// CBOR encode/decode failure
    #[error("codec error: {source}")]
    Codec {
        #[from]
        source: serde_cbor::Error,
    },
}

impl DfmError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type {
            message: message.into(),
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn duplicate_document(label: impl Into<String>) -> Self {
        Self::DuplicateLabel {
            kind: "document",
            label: label.into(),
        }
    }

    pub fn duplicate_feature(label: impl Into<String>) -> Self {
        Self::DuplicateLabel {
            kind: "feature",
            label: label.into(),
        }
    }

    /// True for errors the combiner absorbs instead of surfacing.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyDimension { .. })
    }
}

pub type DfmResult<T> = Result<T, DfmError>;
