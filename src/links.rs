//! Link dictionary - marker keywords and the resources they open
//!
//! The dictionary is built once at startup (from the built-in table or the
//! `[links]` section of the config file) and never changes afterwards.
//! Where one keyword is a prefix of another ("Annexure-2", "Annexure-28")
//! the longest keyword matching at a position wins, whatever the entry order.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{NavigatorError, Result};

/// Annexure table shipped with the purchase manual
const BUILTIN_LINKS: &[(&str, &str)] = &[
    ("Annexure-2", "Annexure 2.pdf"),
    ("Annexure-4", "Annexure 4.pdf"),
    ("Annexure-12", "Annexure 12.pdf"),
    ("Annexure-14", "Annexure 14.pdf"),
    ("Annexure-28", "Annexure 28.pdf"),
    ("Annexure-29", "Annexure 29.pdf"),
    ("Annexure-37", "Annexure 37.pdf"),
];

/// A single keyword -> resource pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub keyword: String,
    pub resource: String,
}

impl LinkEntry {
    pub fn new(keyword: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            resource: resource.into(),
        }
    }
}

/// Immutable keyword -> resource mapping
#[derive(Debug, Clone)]
pub struct LinkDictionary {
    /// Entries in definition order
    entries: Vec<LinkEntry>,
    /// Keyword -> index into `entries`
    index: HashMap<String, usize>,
    /// Alternation of all keywords (None when empty)
    matcher: Option<Regex>,
}

impl LinkDictionary {
    /// Build a dictionary, rejecting empty and duplicate keywords
    pub fn new(entries: Vec<LinkEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            if entry.keyword.is_empty() {
                return Err(NavigatorError::InvalidDictionary(
                    "empty keyword".to_string(),
                ));
            }
            if index.insert(entry.keyword.clone(), i).is_some() {
                return Err(NavigatorError::InvalidDictionary(format!(
                    "duplicate keyword '{}'",
                    entry.keyword
                )));
            }
        }

        let matcher = if entries.is_empty() {
            None
        } else {
            // Alternation is leftmost-first, so longer keywords go first
            let mut keywords: Vec<&str> = entries.iter().map(|e| e.keyword.as_str()).collect();
            keywords.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            let pattern = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let regex = Regex::new(&pattern)
                .map_err(|e| NavigatorError::InvalidDictionary(e.to_string()))?;
            Some(regex)
        };

        Ok(Self {
            entries,
            index,
            matcher,
        })
    }

    /// The built-in annexure table
    pub fn builtin() -> Self {
        let entries = BUILTIN_LINKS
            .iter()
            .map(|(keyword, resource)| LinkEntry::new(*keyword, *resource))
            .collect();
        Self::new(entries).unwrap_or_else(|e| {
            log::error!("built-in link table rejected, links disabled: {}", e);
            Self::empty()
        })
    }

    /// A dictionary with no keywords
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            matcher: None,
        }
    }

    /// Resolve a keyword to its resource identifier
    pub fn resolve(&self, keyword: &str) -> Option<&str> {
        self.index
            .get(keyword)
            .map(|&i| self.entries[i].resource.as_str())
    }

    /// Find the first keyword occurrence at or after byte offset `start`
    ///
    /// Returns the byte range of the match, the longest keyword when several
    /// start at the same position.
    pub fn find_at(&self, text: &str, start: usize) -> Option<(usize, usize)> {
        if start >= text.len() {
            return None;
        }
        self.matcher
            .as_ref()?
            .find_at(text, start)
            .map(|m| (m.start(), m.end()))
    }

    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LinkDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let dict = LinkDictionary::builtin();
        assert_eq!(dict.len(), 7);
        assert_eq!(dict.resolve("Annexure-4"), Some("Annexure 4.pdf"));
        assert_eq!(dict.resolve("Annexure-37"), Some("Annexure 37.pdf"));
        assert_eq!(dict.resolve("Annexure-5"), None);
    }

    #[test]
    fn test_longest_keyword_wins() {
        let short_first = LinkDictionary::new(vec![
            LinkEntry::new("Annexure-2", "a.pdf"),
            LinkEntry::new("Annexure-28", "b.pdf"),
        ])
        .unwrap();
        let long_first = LinkDictionary::new(vec![
            LinkEntry::new("Annexure-28", "b.pdf"),
            LinkEntry::new("Annexure-2", "a.pdf"),
        ])
        .unwrap();

        for dict in [&short_first, &long_first] {
            assert_eq!(dict.find_at("see Annexure-28.", 0), Some((4, 15)));
            assert_eq!(dict.find_at("see Annexure-2.", 0), Some((4, 14)));
            assert_eq!(dict.find_at("Annexure-27", 0), Some((0, 10)));
        }
    }

    #[test]
    fn test_rejects_duplicate_and_empty() {
        let dup = LinkDictionary::new(vec![
            LinkEntry::new("A", "a.pdf"),
            LinkEntry::new("A", "b.pdf"),
        ]);
        assert!(dup.is_err());

        let empty = LinkDictionary::new(vec![LinkEntry::new("", "a.pdf")]);
        assert!(matches!(empty, Err(NavigatorError::InvalidDictionary(_))));
    }

    #[test]
    fn test_find_at() {
        let dict = LinkDictionary::builtin();
        let text = "See Annexure-4 and Annexure-12.";
        assert_eq!(dict.find_at(text, 0), Some((4, 14)));
        assert_eq!(dict.find_at(text, 5), Some((19, 30)));
        assert_eq!(dict.find_at(text, 30), None);
    }

    #[test]
    fn test_keywords_are_literal() {
        let dict = LinkDictionary::new(vec![LinkEntry::new("a.b", "x")]).unwrap();
        assert_eq!(dict.find_at("axb a.b", 0), Some((4, 7)));
    }

    #[test]
    fn test_empty_dictionary_matches_nothing() {
        let dict = LinkDictionary::empty();
        assert!(dict.is_empty());
        assert_eq!(dict.find_at("Annexure-4", 0), None);
    }
}
