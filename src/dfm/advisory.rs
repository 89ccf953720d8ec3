//! Non-fatal advisories returned next to a combine result.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of advisory, for matching without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdvisoryCode {
    DocumentMismatch,
    DuplicateFeature,
    DuplicateDocument,
}

/// Data-quality concern raised while the operation still completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advisory {
    /// Column-combine operand `operand` (0-based) has document labels that
    /// differ from the left-hand side; rows were bound by position
    DocumentMismatch { operand: usize },
    /// Feature labels still repeated after placeholder disambiguation
    DuplicateFeatures { features: Vec<String> },
    /// Document labels repeated across row-combine operands; `(old, new)`
    DuplicateDocuments { renamed: Vec<(String, String)> },
}

impl Advisory {
    pub fn code(&self) -> AdvisoryCode {
        match self {
            Advisory::DocumentMismatch { .. } => AdvisoryCode::DocumentMismatch,
            Advisory::DuplicateFeatures { .. } => AdvisoryCode::DuplicateFeature,
            Advisory::DuplicateDocuments { .. } => AdvisoryCode::DuplicateDocument,
        }
    }

    /// Record on the `tracing` warn channel
    pub(crate) fn emit(&self) {
        tracing::warn!(code = ?self.code(), "{}", self);
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::DocumentMismatch { operand } => {
                write!(f, "binding columns of operand {operand} with different document labels")
            }
            Advisory::DuplicateFeatures { features } => write!(
                f,
                "binding columns with overlapping features leaves duplicated features: {}",
                features.join(", ")
            ),
            Advisory::DuplicateDocuments { renamed } => write!(
                f,
                "binding rows with overlapping documents renamed {} document(s)",
                renamed.len()
            ),
        }
    }
}

/// A result value plus the advisories raised while producing it, in order
#[derive(Debug, Clone, PartialEq)]
pub struct Advised<T> {
    pub value: T,
    pub advisories: Vec<Advisory>,
}

impl<T> Advised<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            advisories: Vec::new(),
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn is_clean(&self) -> bool {
        self.advisories.is_empty()
    }

    pub fn has(&self, code: AdvisoryCode) -> bool {
        self.advisories.iter().any(|a| a.code() == code)
    }

    pub fn codes(&self) -> Vec<AdvisoryCode> {
        self.advisories.iter().map(Advisory::code).collect()
    }

    /// Append and log
    pub(crate) fn push(&mut self, advisory: Advisory) {
        advisory.emit();
        self.advisories.push(advisory);
    }
}
