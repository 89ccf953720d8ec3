use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Dictionary
/// Ordered groups of entries; an entry may span several words.
///
/// Used as a selection pattern: entries are flattened in group order and
/// their internal whitespace is replaced by the dfm's concatenator so that
/// "united states" matches the feature "united_states".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    groups: IndexMap<String, Vec<String>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add entries to `key`, creating the group if needed
    pub fn insert<K, I, S>(&mut self, key: K, entries: I) -> &mut Self
    where
        K: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .entry(key.into())
            .or_default()
            .extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn entries(&self, key: &str) -> Option<&[String]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Every entry in group order, as written
    pub fn flattened(&self) -> Vec<String> {
        self.groups.values().flatten().cloned().collect()
    }

    /// Every entry in group order with runs of whitespace joined by `concatenator`
    pub fn patterns(&self, concatenator: &str) -> Vec<String> {
        self.groups
            .values()
            .flatten()
            .map(|entry| entry.split_whitespace().collect::<Vec<_>>().join(concatenator))
            .collect()
    }
}

impl<K, S> FromIterator<(K, Vec<S>)> for Dictionary
where
    K: Into<String>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, Vec<S>)>>(iter: T) -> Self {
        let mut dict = Dictionary::new();
        for (key, entries) in iter {
            dict.insert(key, entries);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_join_multiword_entries() {
        let dict: Dictionary = vec![
            ("country", vec!["united  states", "new zealand"]),
            ("animal", vec!["cat"]),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            dict.patterns("_"),
            vec!["united_states", "new_zealand", "cat"]
        );
        assert_eq!(dict.patterns(" + ")[1], "new + zealand");
        // replacement is literal
        assert_eq!(dict.patterns("$1")[2], "cat");
        assert_eq!(dict.patterns("$1")[1], "new$1zealand");
    }

    #[test]
    fn insert_extends_existing_group() {
        let mut dict = Dictionary::new();
        dict.insert("a", ["x"]).insert("b", ["y"]).insert("a", ["z"]);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.entries("a"), Some(&["x".to_string(), "z".to_string()][..]));
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
