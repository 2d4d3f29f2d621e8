use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::ops::{Add, AddAssign};
use std::path::Path;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::errors::Error;
use crate::institute::{self, InstituteReport};
use crate::parser::Parser;
use crate::types::Entry;

const DEFAULT_NAME: &str = "Unnamed Database";

/// An ordered collection of entries.
///
/// `a + b` and `a += b` merge two bibliographies: entries of `b` whose key is
/// already present are dropped, then the result is sorted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Bibliography {
    name: String,
    entries: Vec<Entry>,
}

impl Default for Bibliography {
    fn default() -> Self {
        Bibliography::new(DEFAULT_NAME)
    }
}

impl Bibliography {
    pub fn new(name: &str) -> Bibliography {
        Bibliography {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    /// Read a `.bib` file. Skipped entries are logged as warnings; only a
    /// file that cannot be read is an error. The result is sorted.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Bibliography, Error> {
        let path = path.as_ref();
        let mut parser = Parser::from_file(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut bib = Bibliography::from_parser(&path.display().to_string(), &mut parser);
        bib.sort();
        tracing::info!(path = %path.display(), entries = bib.len(), "loaded bibliography");
        Ok(bib)
    }

    /// Collect the valid entries of `parser` in file order.
    pub fn from_parser(name: &str, parser: &mut Parser) -> Bibliography {
        let mut bib = Bibliography::new(name);
        for result in parser.iter() {
            match result {
                Ok(entry) => bib.add_entry(entry),
                Err(err) => tracing::warn!("{}", err),
            }
        }
        bib
    }

    /// Write all entries in the persisted `.bib` format.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let write_err = |source| Error::Write {
            path: path.to_path_buf(),
            source,
        };
        let file = fs::File::create(path).map_err(write_err)?;
        let mut out = BufWriter::new(file);
        out.write_all(self.to_bibtex().as_bytes())
            .and_then(|_| out.flush())
            .map_err(write_err)?;
        tracing::info!(path = %path.display(), entries = self.len(), "saved bibliography");
        Ok(())
    }

    pub fn to_bibtex(&self) -> String {
        self.entries
            .iter()
            .map(Entry::to_bibtex)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn find(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key() == key)
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.key() == key)
    }

    /// Remove the first entry with `key`.
    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        let pos = self.entries.iter().position(|e| e.key() == key)?;
        Some(self.entries.remove(pos))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// True if every entry has a key, a title and a year.
    pub fn validate(&self) -> bool {
        self.entries.iter().all(Entry::is_valid)
    }

    /// Sort by year descending, then title ascending. The sort is stable.
    pub fn sort(&mut self) {
        self.entries.sort_by(Entry::cmp_by_year_title);
    }

    /// A sorted copy of `self` extended by the entries of `other` whose key
    /// is not yet present. The first entry seen for a key wins.
    pub fn merge(&self, other: &Bibliography) -> Bibliography {
        let mut result = self.clone();
        result.merge_from(other);
        result
    }

    fn merge_from(&mut self, other: &Bibliography) {
        let mut keys: HashSet<String> = self.entries.iter().map(|e| e.key().to_string()).collect();
        for entry in &other.entries {
            if keys.insert(entry.key().to_string()) {
                self.entries.push(entry.clone());
            }
        }
        self.sort();
    }

    pub fn find_by_year(&self, year: &str) -> Vec<&Entry> {
        self.entries.iter().filter(|e| e.year() == year).collect()
    }

    /// Entries with an author whose name contains `name`, ignoring ASCII case
    pub fn find_by_author(&self, name: &str) -> Vec<&Entry> {
        let needle = name.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.authors()
                    .iter()
                    .any(|a| a.name().to_ascii_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn find_by_institute(&self, institute: &str) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| institute::count_institute_authors(e, institute) > 0)
            .collect()
    }

    /// Total number of institute authors over all entries
    pub fn count_institute_authors(&self, institute: &str) -> usize {
        self.entries
            .iter()
            .map(|e| institute::count_institute_authors(e, institute))
            .sum()
    }

    pub fn institute_report(&self, institute: &str) -> InstituteReport {
        InstituteReport::new(institute, &self.entries)
    }
}

impl fmt::Display for Bibliography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BibTeX Database: {}", self.name)?;
        writeln!(f, "Number of entries: {}", self.entries.len())?;
        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, entry.headline())?;
        }
        Ok(())
    }
}

impl Add<&Bibliography> for &Bibliography {
    type Output = Bibliography;

    fn add(self, other: &Bibliography) -> Bibliography {
        self.merge(other)
    }
}

impl Add for Bibliography {
    type Output = Bibliography;

    fn add(mut self, other: Bibliography) -> Bibliography {
        self.merge_from(&other);
        self
    }
}

impl AddAssign<&Bibliography> for Bibliography {
    fn add_assign(&mut self, other: &Bibliography) {
        self.merge_from(other);
    }
}

impl AddAssign for Bibliography {
    fn add_assign(&mut self, other: Bibliography) {
        self.merge_from(&other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Author;
    use std::error;

    fn entry(key: &str, year: &str, title: &str) -> Result<Entry, Box<dyn error::Error>> {
        let mut e = Entry::new("article", key);
        e.set_title(title);
        e.set_year(year)?;
        Ok(e)
    }

    fn titles(bib: &Bibliography) -> Vec<(&str, &str)> {
        bib.entries().iter().map(|e| (e.year(), e.title())).collect()
    }

    #[test]
    fn test_sort() -> Result<(), Box<dyn error::Error>> {
        let mut bib = Bibliography::default();
        bib.add_entry(entry("z", "2020", "Z Paper")?);
        bib.add_entry(entry("a", "2023", "A Paper")?);
        bib.add_entry(entry("m", "2023", "M Paper")?);
        bib.sort();
        assert_eq!(
            titles(&bib),
            vec![("2023", "A Paper"), ("2023", "M Paper"), ("2020", "Z Paper")]
        );
        Ok(())
    }

    #[test]
    fn test_sort_is_stable_and_empty_years_last() -> Result<(), Box<dyn error::Error>> {
        let mut bib = Bibliography::new("stable");
        let mut undated = Entry::new("misc", "undated");
        undated.set_title("Undated");
        bib.add_entry(undated);
        bib.add_entry(entry("first", "2001", "Same")?);
        bib.add_entry(entry("second", "2001", "Same")?);
        bib.add_entry(entry("old", "1950", "Zzz")?);
        bib.sort();
        let keys: Vec<&str> = bib.entries().iter().map(Entry::key).collect();
        assert_eq!(keys, vec!["first", "second", "old", "undated"]);
        Ok(())
    }

    #[test]
    fn test_merge_prefers_existing_keys() -> Result<(), Box<dyn error::Error>> {
        let mut a = Bibliography::new("a");
        a.add_entry(entry("k1", "2010", "Original")?);
        let mut b = Bibliography::new("b");
        b.add_entry(entry("k1", "2012", "Replacement")?);
        b.add_entry(entry("k2", "2011", "Other")?);
        b.add_entry(entry("k2", "2011", "Other again")?);

        let merged = &a + &b;
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.name(), "a");
        assert_eq!(merged.find("k1").map(Entry::title), Some("Original"));
        assert_eq!(merged.find("k2").map(Entry::title), Some("Other"));
        assert_eq!(merged.entries()[0].key(), "k2");
        assert_eq!(a.len(), 1);

        a += &b;
        assert_eq!(a, merged);
        assert_eq!(a.clone() + b.clone(), merged);
        Ok(())
    }

    #[test]
    fn test_queries() -> Result<(), Box<dyn error::Error>> {
        let mut bib = Bibliography::new("q");
        let mut e1 = entry("one", "2020", "One")?;
        e1.add_author(Author::new("Jane Doe, MIT"));
        e1.add_author(Author::with_affiliation("Rui Li", "Mitre Corp"));
        let mut e2 = entry("two", "2021", "Two")?;
        e2.add_author(Author::new("Bob Smith"));
        bib.add_entry(e1);
        bib.add_entry(e2);

        assert_eq!(bib.find_by_year("2021").len(), 1);
        assert_eq!(bib.find_by_author("smith").len(), 1);
        assert_eq!(bib.find_by_author("nobody").len(), 0);
        // "Bob Smith" contains "mit" as well
        assert_eq!(bib.count_institute_authors("MIT"), 3);
        assert_eq!(bib.find_by_institute("mitre").len(), 1);
        assert_eq!(bib.count_institute_authors(""), 0);

        let report = bib.institute_report("MIT");
        assert_eq!(report.total, 3);
        assert_eq!(report.matches[1].position, 2);

        assert!(bib.validate());
        assert_eq!(bib.remove("one").map(|e| e.title().to_string()), Some("One".to_string()));
        assert!(bib.remove("one").is_none());
        bib.clear();
        assert!(bib.is_empty());
        Ok(())
    }

    #[test]
    fn test_find_mut_keeps_validation() -> Result<(), Box<dyn error::Error>> {
        let mut bib = Bibliography::new("m");
        bib.add_entry(entry("k", "2000", "T")?);
        let e = bib.find_mut("k").ok_or("missing")?;
        assert!(e.set_year("year two thousand").is_err());
        assert_eq!(bib.get(0).map(Entry::year), Some("2000"));
        Ok(())
    }

    #[test]
    fn test_display() -> Result<(), Box<dyn error::Error>> {
        let mut bib = Bibliography::new("papers.bib");
        bib.add_entry(entry("a", "2023", "A Paper")?);
        assert_eq!(
            bib.to_string(),
            "BibTeX Database: papers.bib\nNumber of entries: 1\n1. [2023] A Paper\n"
        );
        Ok(())
    }
}
