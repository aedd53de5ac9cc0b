//! Question store - chapter -> sub-chapter -> question -> answer
//!
//! Loaded once at startup from a JSON file shaped like:
//!
//! ```text
//! [
//!   { "chapter": "...", "sub_chapter": "...",
//!     "questions": [ { "question": "...", "answer": "..." } ] }
//! ]
//! ```
//!
//! Entries that repeat a chapter/sub-chapter pair are merged. Listings keep
//! the order in which names first appear in the file.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{NavigatorError, Result};

/// Answer shown when a question has no entry
pub const ANSWER_NOT_FOUND: &str = "Answer not found.";

#[derive(Debug, Deserialize)]
struct RawEntry {
    chapter: String,
    sub_chapter: String,
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    answer: String,
}

#[derive(Debug, Default)]
struct Subtopic {
    name: String,
    /// (question, answer) pairs
    items: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct Topic {
    name: String,
    subtopics: Vec<Subtopic>,
}

/// Read-only hierarchical lookup table
#[derive(Debug, Default)]
pub struct DataStore {
    topics: Vec<Topic>,
}

impl DataStore {
    /// Load from a JSON file; any failure is a `LoadFailure`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| NavigatorError::LoadFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&contents).map_err(|e| NavigatorError::LoadFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse store contents
    pub fn from_json(contents: &str) -> std::result::Result<Self, serde_json::Error> {
        let raw: Vec<RawEntry> = serde_json::from_str(contents)?;
        let mut store = DataStore::default();

        for entry in raw {
            let ti = match store.topics.iter().position(|t| t.name == entry.chapter) {
                Some(i) => i,
                None => {
                    store.topics.push(Topic {
                        name: entry.chapter,
                        subtopics: Vec::new(),
                    });
                    store.topics.len() - 1
                }
            };
            let topic = &mut store.topics[ti];

            let si = match topic.subtopics.iter().position(|s| s.name == entry.sub_chapter) {
                Some(i) => i,
                None => {
                    topic.subtopics.push(Subtopic {
                        name: entry.sub_chapter,
                        items: Vec::new(),
                    });
                    topic.subtopics.len() - 1
                }
            };
            let subtopic = &mut topic.subtopics[si];

            for q in entry.questions {
                // A repeated question keeps its position and takes the later answer
                match subtopic.items.iter_mut().find(|(label, _)| *label == q.question) {
                    Some(item) => item.1 = q.answer,
                    None => subtopic.items.push((q.question, q.answer)),
                }
            }
        }

        Ok(store)
    }

    fn topic(&self, topic: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.name == topic)
    }

    fn subtopic(&self, topic: &str, subtopic: &str) -> Option<&Subtopic> {
        self.topic(topic)?
            .subtopics
            .iter()
            .find(|s| s.name == subtopic)
    }

    pub fn list_topics(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.name.as_str()).collect()
    }

    /// Sub-chapters of a chapter (empty for an unknown chapter)
    pub fn list_subtopics(&self, topic: &str) -> Vec<&str> {
        self.topic(topic)
            .map(|t| t.subtopics.iter().map(|s| s.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Questions of a sub-chapter (empty if either name is unknown)
    pub fn list_items(&self, topic: &str, subtopic: &str) -> Vec<&str> {
        self.subtopic(topic, subtopic)
            .map(|s| s.items.iter().map(|(label, _)| label.as_str()).collect())
            .unwrap_or_default()
    }

    /// Look up an answer
    pub fn lookup(&self, topic: &str, subtopic: &str, item: &str) -> Result<&str> {
        self.subtopic(topic, subtopic)
            .and_then(|s| s.items.iter().find(|(label, _)| label == item))
            .map(|(_, answer)| answer.as_str())
            .ok_or_else(|| NavigatorError::LookupMiss(format!("{} / {} / {}", topic, subtopic, item)))
    }

    /// Answer text, or the fallback message when there is none
    pub fn get_text(&self, topic: &str, subtopic: &str, item: &str) -> &str {
        self.lookup(topic, subtopic, item).unwrap_or(ANSWER_NOT_FOUND)
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {
            "chapter": "Chapter 1",
            "sub_chapter": "1.1 Scope",
            "questions": [
                { "question": "What is covered?", "answer": "See Annexure-4 for details." },
                { "question": "Who approves?", "answer": "The competent authority." }
            ]
        },
        {
            "chapter": "Chapter 2",
            "sub_chapter": "2.1 Tenders",
            "questions": [
                { "question": "Minimum bids?", "answer": "Three." }
            ]
        },
        {
            "chapter": "Chapter 1",
            "sub_chapter": "1.2 Limits",
            "questions": []
        },
        {
            "chapter": "Chapter 1",
            "sub_chapter": "1.1 Scope",
            "questions": [
                { "question": "Any exceptions?", "answer": "Refer Annexure-12." }
            ]
        }
    ]"#;

    #[test]
    fn test_listings_preserve_order() {
        let store = DataStore::from_json(SAMPLE).unwrap();
        assert_eq!(store.list_topics(), vec!["Chapter 1", "Chapter 2"]);
        assert_eq!(store.list_subtopics("Chapter 1"), vec!["1.1 Scope", "1.2 Limits"]);
        assert_eq!(
            store.list_items("Chapter 1", "1.1 Scope"),
            vec!["What is covered?", "Who approves?", "Any exceptions?"]
        );
        assert!(store.list_items("Chapter 1", "1.2 Limits").is_empty());
    }

    #[test]
    fn test_unknown_names_give_empty_listings() {
        let store = DataStore::from_json(SAMPLE).unwrap();
        assert!(store.list_subtopics("Chapter 9").is_empty());
        assert!(store.list_items("Chapter 9", "1.1 Scope").is_empty());
        assert!(store.list_items("Chapter 1", "9.9").is_empty());
    }

    #[test]
    fn test_get_text() {
        let store = DataStore::from_json(SAMPLE).unwrap();
        assert_eq!(
            store.get_text("Chapter 1", "1.1 Scope", "What is covered?"),
            "See Annexure-4 for details."
        );
        assert_eq!(store.get_text("Chapter 1", "1.1 Scope", "Nope?"), ANSWER_NOT_FOUND);
        assert!(matches!(
            store.lookup("Chapter 2", "2.1 Tenders", "Nope?"),
            Err(NavigatorError::LookupMiss(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let store = DataStore::load(file.path()).unwrap();
        assert_eq!(store.list_topics().len(), 2);
    }

    #[test]
    fn test_load_failures() {
        let missing = DataStore::load(Path::new("/nonexistent/questions.json"));
        assert!(matches!(missing, Err(NavigatorError::LoadFailure { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let malformed = DataStore::load(file.path());
        assert!(matches!(malformed, Err(NavigatorError::LoadFailure { .. })));
    }
}
