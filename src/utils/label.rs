use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::error::{DfmError, DfmResult};

/// LabelIndex
/// Bidirectional mapping between labels and their positions.
///
/// Insertion order is the position order. `build` rejects duplicates;
/// `from_merged` tolerates them because merge output may carry duplicate
/// feature labels until they are disambiguated or reported.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    labels: Vec<String>,
    /// label -> every position holding it, ascending
    positions: IndexMap<String, Vec<usize>>,
}

impl LabelIndex {
    /// Build from a single source.
    /// `kind` names the label space in the error ("document" / "feature").
    pub fn build<I, S>(labels: I, kind: &'static str) -> DfmResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = Self::from_merged(labels);
        if let Some(dup) = index.duplicates().first() {
            return Err(DfmError::DuplicateLabel {
                kind,
                label: dup.to_string(),
            });
        }
        Ok(index)
    }

    /// Build from merge output, duplicates allowed
    pub fn from_merged<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let mut positions: IndexMap<String, Vec<usize>> = IndexMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            positions.entry(label.clone()).or_default().push(i);
        }
        Self { labels, positions }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// First position of `label`
    pub fn position_of(&self, label: &str) -> Option<usize> {
        self.positions.get(label).and_then(|p| p.first().copied())
    }

    /// All positions of `label`, ascending
    pub fn positions_of(&self, label: &str) -> &[usize] {
        self.positions.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, label: &str) -> bool {
        self.positions.contains_key(label)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels_in_order(&self) -> &[String] {
        &self.labels
    }

    pub fn into_labels(self) -> Vec<String> {
        self.labels
    }

    /// Labels occurring more than once, in first-occurrence order
    pub fn duplicates(&self) -> Vec<&str> {
        self.positions
            .iter()
            .filter(|(_, p)| p.len() > 1)
            .map(|(label, _)| label.as_str())
            .collect()
    }

    pub fn has_duplicates(&self) -> bool {
        self.positions.len() != self.labels.len()
    }

    /// Distinct labels in first-occurrence order
    pub fn distinct(&self) -> LabelIndex {
        LabelIndex::from_merged(self.positions.keys().cloned())
    }

    /// `(label, occurrence)` for every position.
    /// The k-th occurrence of a repeated label gets `k` (0-based), so keys
    /// are unique even when labels are not.
    pub fn occurrence_keys(&self) -> Vec<(&str, usize)> {
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(self.positions.len());
        self.labels
            .iter()
            .map(|label| {
                let n = seen.entry(label.as_str()).or_insert(0);
                let key = (label.as_str(), *n);
                *n += 1;
                key
            })
            .collect()
    }
}

impl PartialEq for LabelIndex {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl Eq for LabelIndex {}

/// Rename repeated labels at `targets` so each one is unique.
///
/// The first occurrence keeps its name. Every later occurrence gets
/// `label + sep + k` with the smallest `k >= 1` not already taken by any
/// target label. Positions outside `targets` are neither renamed nor
/// considered. Returns `(position, old, new)` for every rename.
pub fn make_unique_at(
    labels: &mut [String],
    targets: &[usize],
    sep: &str,
) -> Vec<(usize, String, String)> {
    let mut taken: HashSet<String> = targets.iter().map(|&i| labels[i].clone()).collect();
    let mut emitted: HashSet<String> = HashSet::with_capacity(targets.len());
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut renamed = Vec::new();

    for &i in targets {
        if emitted.insert(labels[i].clone()) {
            continue;
        }
        let base = labels[i].clone();
        let k = counters.entry(base.clone()).or_insert(0);
        let candidate = loop {
            *k += 1;
            let candidate = format!("{base}{sep}{k}");
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(candidate.clone());
        emitted.insert(candidate.clone());
        labels[i] = candidate.clone();
        renamed.push((i, base, candidate));
    }
    renamed
}

/// Make-unique restricted to labels starting with `prefix` (no separator),
/// used for generated placeholder features.
///
/// A user label that happens to start with `prefix` is treated the same as
/// a generated one.
pub fn make_unique_generated(labels: &mut [String], prefix: &str) -> Vec<(usize, String, String)> {
    if prefix.is_empty() {
        return Vec::new();
    }
    let targets: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, l)| l.starts_with(prefix))
        .map(|(i, _)| i)
        .collect();
    make_unique_at(labels, &targets, "")
}
