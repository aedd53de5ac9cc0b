//! Keyword scanner
//!
//! Splits an answer into runs: single plain characters, or whole keywords
//! from the link dictionary. The reveal engine emits one run per tick, so a
//! linked keyword always appears in one piece.

use crate::links::LinkDictionary;

/// An atomic unit of revealed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    /// A single character with no link
    Plain(char),
    /// A complete dictionary keyword
    Linked { keyword: String, text: String },
}

impl Run {
    fn linked(keyword: &str) -> Self {
        Run::Linked {
            keyword: keyword.to_string(),
            text: keyword.to_string(),
        }
    }

    /// Append this run's text to `out`
    pub fn push_to(&self, out: &mut String) {
        match self {
            Run::Plain(ch) => out.push(*ch),
            Run::Linked { text, .. } => out.push_str(text),
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        match self {
            Run::Plain(_) => 1,
            Run::Linked { text, .. } => text.chars().count(),
        }
    }

    /// Keyword of a linked run
    pub fn keyword(&self) -> Option<&str> {
        match self {
            Run::Plain(_) => None,
            Run::Linked { keyword, .. } => Some(keyword),
        }
    }
}

/// Scan `text` left to right, turning keyword occurrences into linked runs
///
/// Characters consumed by a match are never rescanned.
pub fn scan(text: &str, dict: &LinkDictionary) -> Vec<Run> {
    let mut runs = Vec::with_capacity(text.len());
    let mut pos = 0;

    while pos < text.len() {
        match dict.find_at(text, pos) {
            Some((start, end)) => {
                // Everything before the match is plain
                runs.extend(text[pos..start].chars().map(Run::Plain));
                runs.push(Run::linked(&text[start..end]));
                pos = end;
            }
            None => {
                runs.extend(text[pos..].chars().map(Run::Plain));
                pos = text.len();
            }
        }
    }

    runs
}

/// Concatenate run texts
pub fn join(runs: &[Run]) -> String {
    let mut out = String::new();
    for run in runs {
        run.push_to(&mut out);
    }
    out
}
