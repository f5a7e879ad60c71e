//! Ordered, duplicate-free set of free-text post tags.

use serde::{Deserialize, Serialize};

/// Tags in order of first insertion.
///
/// Members are trimmed on insert and compared case-sensitively; empty
/// entries are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every comma-separated tag in `entry`.
    ///
    /// Returns how many tags were actually inserted.
    ///
    /// ```
    /// use editorial_core::tags::TagSet;
    ///
    /// let mut tags = TagSet::new();
    /// tags.add_entry("saude, saude, educação");
    /// assert_eq!(tags.as_slice(), ["saude", "educação"]);
    /// ```
    pub fn add_entry(&mut self, entry: &str) -> usize {
        entry.split(',').filter(|tag| self.insert(tag)).count()
    }

    /// Insert a single tag. Returns `false` if it was empty or already present.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove the tag equal to `tag`. Returns whether anything was removed.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_is_split_trimmed_and_deduplicated() {
        let mut tags = TagSet::new();
        let added = tags.add_entry("saude, saude, educação");
        assert_eq!(added, 2);
        assert_eq!(tags.as_slice(), ["saude", "educação"]);
    }

    #[test]
    fn empty_segments_are_ignored() {
        let mut tags = TagSet::new();
        assert_eq!(tags.add_entry(" , ,,  "), 0);
        assert!(tags.is_empty());
    }

    #[test]
    fn duplicates_across_entries_are_suppressed() {
        let mut tags = TagSet::new();
        tags.add_entry("voluntariado");
        tags.add_entry("  voluntariado  ,eventos");
        assert_eq!(tags.as_slice(), ["voluntariado", "eventos"]);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let mut tags = TagSet::new();
        tags.add_entry("Saude, saude");
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn remove_filters_exact_match_only() {
        let mut tags: TagSet = ["saude", "educação"].into_iter().collect();
        assert!(!tags.remove("Saude"));
        assert!(tags.remove("saude"));
        assert_eq!(tags.as_slice(), ["educação"]);
    }

    #[test]
    fn deserialization_deduplicates() {
        let tags: TagSet = serde_json::from_str(r#"["a", " a ", "b", ""]"#).unwrap();
        assert_eq!(tags.as_slice(), ["a", "b"]);
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["a","b"]"#);
    }
}
