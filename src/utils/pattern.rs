use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{DfmError, DfmResult};
use crate::utils::label::LabelIndex;

/// How a pattern string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// exact string equality
    Fixed,
    /// `*` any run, `?` exactly one character, matched against the full label
    #[default]
    Glob,
    /// regular expression, matched against the full label
    Regex,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Fixed => write!(f, "fixed"),
            ValueType::Glob => write!(f, "glob"),
            ValueType::Regex => write!(f, "regex"),
        }
    }
}

#[derive(Debug, Clone)]
enum Compiled {
    Exact(String),
    /// case-insensitive fixed; stored lowercased
    Folded(String),
    Re(Regex),
}

/// PatternMatcher
/// Resolves a pattern set against a LabelIndex.
/// Patterns are OR-ed; every pattern is compiled up front so a malformed
/// regex fails before any matching happens.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    compiled: Vec<Compiled>,
    case_insensitive: bool,
}

impl PatternMatcher {
    pub fn new<S>(patterns: &[S], valuetype: ValueType, case_insensitive: bool) -> DfmResult<Self>
    where
        S: AsRef<str>,
    {
        let compiled = patterns
            .iter()
            .map(|p| compile(p.as_ref(), valuetype, case_insensitive))
            .collect::<DfmResult<Vec<_>>>()?;
        Ok(Self {
            compiled,
            case_insensitive,
        })
    }

    /// Fixed, case-sensitive matching: the mode a reference dfm forces
    pub fn exact<S>(patterns: &[S]) -> Self
    where
        S: AsRef<str>,
    {
        Self {
            compiled: patterns
                .iter()
                .map(|p| Compiled::Exact(p.as_ref().to_string()))
                .collect(),
            case_insensitive: false,
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.compiled.len()
    }

    pub fn match_labels(&self, candidates: &LabelIndex) -> MatchSet {
        let folded: Option<Vec<String>> = self.case_insensitive.then(|| {
            candidates
                .labels_in_order()
                .iter()
                .map(|l| l.to_lowercase())
                .collect()
        });

        let per_pattern = self
            .compiled
            .iter()
            .map(|c| match c {
                Compiled::Exact(p) => candidates.positions_of(p).to_vec(),
                Compiled::Folded(p) => folded
                    .as_ref()
                    .map(|f| {
                        f.iter()
                            .enumerate()
                            .filter(|(_, l)| *l == p)
                            .map(|(i, _)| i)
                            .collect()
                    })
                    .unwrap_or_default(),
                Compiled::Re(re) => candidates
                    .labels_in_order()
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| re.is_match(l))
                    .map(|(i, _)| i)
                    .collect(),
            })
            .collect();
        MatchSet { per_pattern }
    }
}

fn compile(pattern: &str, valuetype: ValueType, case_insensitive: bool) -> DfmResult<Compiled> {
    let source = match valuetype {
        ValueType::Fixed => return Ok(fixed(pattern, case_insensitive)),
        ValueType::Glob if !pattern.contains(['*', '?']) => {
            return Ok(fixed(pattern, case_insensitive))
        }
        ValueType::Glob => format!("^(?:{})$", glob_to_regex(pattern)),
        ValueType::Regex => format!("^(?:{pattern})$"),
    };
    RegexBuilder::new(&source)
        .case_insensitive(case_insensitive)
        .build()
        .map(Compiled::Re)
        .map_err(|source| DfmError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn fixed(pattern: &str, case_insensitive: bool) -> Compiled {
    if case_insensitive {
        Compiled::Folded(pattern.to_lowercase())
    } else {
        Compiled::Exact(pattern.to_string())
    }
}

/// Translate a glob into an unanchored regex body
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }
    out
}

/// Matched candidate positions, grouped by the pattern that produced them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    per_pattern: Vec<Vec<usize>>,
}

impl MatchSet {
    /// Union over all patterns, deduplicated, ascending candidate order
    pub fn ascending(&self) -> Vec<usize> {
        let mut all: Vec<usize> = self.per_pattern.iter().flatten().copied().collect();
        all.sort_unstable();
        all.dedup();
        all
    }

    /// Union in pattern order: first pattern's hits first, duplicates dropped
    pub fn in_pattern_order(&self) -> Vec<usize> {
        let mut seen = HashSet::new();
        self.per_pattern
            .iter()
            .flatten()
            .copied()
            .filter(|i| seen.insert(*i))
            .collect()
    }

    /// Hits of the `j`-th pattern
    pub fn for_pattern(&self, j: usize) -> &[usize] {
        self.per_pattern.get(j).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.per_pattern.iter().all(Vec::is_empty)
    }
}
