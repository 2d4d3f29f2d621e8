//! Matching authors against an institute name.
//!
//! An author belongs to an institute if the institute name occurs, ignoring
//! ASCII case, in the author's name or affiliation. Authors commonly carry
//! the institute inside the name field, e.g. `Jane Doe, MIT Labs`.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::types::{Author, Entry};

pub fn is_from_institute(author: &Author, institute: &str) -> bool {
    if institute.is_empty() {
        return false;
    }
    let needle = institute.to_ascii_lowercase();
    let contains = |text: &str| text.to_ascii_lowercase().contains(&needle);
    contains(author.name()) || author.affiliation().map_or(false, contains)
}

/// Number of authors of `entry` belonging to `institute`
pub fn count_institute_authors(entry: &Entry, institute: &str) -> usize {
    entry
        .authors()
        .iter()
        .filter(|author| is_from_institute(author, institute))
        .count()
}

/// Institute authors found in one entry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EntryMatch {
    /// 1-based position of the entry in the bibliography
    pub position: usize,
    pub key: String,
    pub authors: Vec<String>,
}

impl EntryMatch {
    pub fn count(&self) -> usize {
        self.authors.len()
    }
}

/// Result of looking up an institute in a bibliography, in bibliography order
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct InstituteReport {
    pub institute: String,
    pub matches: Vec<EntryMatch>,
    pub total: usize,
}

impl InstituteReport {
    pub fn new<'e, I>(institute: &str, entries: I) -> InstituteReport
    where
        I: IntoIterator<Item = &'e Entry>,
    {
        let mut matches = Vec::new();
        for (i, entry) in entries.into_iter().enumerate() {
            let authors: Vec<String> = entry
                .authors()
                .iter()
                .filter(|author| is_from_institute(author, institute))
                .map(|author| author.to_string())
                .collect();
            if !authors.is_empty() {
                matches.push(EntryMatch {
                    position: i + 1,
                    key: entry.key().to_string(),
                    authors,
                });
            }
        }
        let total = matches.iter().map(EntryMatch::count).sum();
        InstituteReport {
            institute: institute.to_string(),
            matches,
            total,
        }
    }
}

impl fmt::Display for InstituteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Looking for authors from: {}", self.institute)?;
        writeln!(f)?;
        for m in &self.matches {
            for author in &m.authors {
                writeln!(f, "Found institute author: {}", author)?;
            }
            writeln!(
                f,
                "Entry {} has {} author(s) from {}",
                m.position,
                m.count(),
                self.institute
            )?;
        }
        Ok(())
    }
}
