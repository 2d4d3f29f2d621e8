use std::cmp::Ordering;
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::authors;
use crate::errors::FieldError;

/// Number of characters of an abstract shown by the `Display` implementation
/// of `Entry`. `Entry::to_bibtex` never truncates.
pub const ABSTRACT_DISPLAY_LIMIT: usize = 100;

/// One author of an entry, e.g. “Jane Doe” working at “MIT”
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Author {
    name: String,
    affiliation: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Author {
        Author {
            name: name.into(),
            affiliation: None,
        }
    }

    pub fn with_affiliation(name: impl Into<String>, affiliation: impl Into<String>) -> Author {
        let mut author = Author::new(name);
        author.set_affiliation(affiliation);
        author
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn affiliation(&self) -> Option<&str> {
        self.affiliation.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// An empty affiliation removes the affiliation.
    pub fn set_affiliation(&mut self, affiliation: impl Into<String>) {
        let affiliation = affiliation.into();
        self.affiliation = if affiliation.is_empty() {
            None
        } else {
            Some(affiliation)
        };
    }

    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.affiliation {
            Some(affiliation) => write!(f, "{} ({})", self.name, affiliation),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One entry in a `.bib` file
///
/// Fields are set through setters. `year`, `doi` and the URL fields are
/// validated; an invalid value is rejected and the previous value is kept.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Entry {
    kind: String,
    key: String,
    title: String,
    year: String,
    journal: String,
    booktitle: String,
    doi: String,
    #[cfg_attr(feature = "serde", serde(rename = "abstract"))]
    abstract_text: String,
    pdf_url: String,
    code_url: String,
    slides_url: String,
    volume: String,
    number: String,
    pages: String,
    publisher: String,
    address: String,
    authors: Vec<Author>,
}

impl Entry {
    /// Generate an entry with the given type (lowercased) and citation key.
    pub fn new(kind: &str, key: &str) -> Entry {
        Entry {
            kind: kind.trim().to_lowercase(),
            key: key.trim().to_string(),
            ..Entry::default()
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn year(&self) -> &str {
        &self.year
    }
    pub fn journal(&self) -> &str {
        &self.journal
    }
    pub fn booktitle(&self) -> &str {
        &self.booktitle
    }
    pub fn doi(&self) -> &str {
        &self.doi
    }
    pub fn abstract_text(&self) -> &str {
        &self.abstract_text
    }
    pub fn pdf_url(&self) -> &str {
        &self.pdf_url
    }
    pub fn code_url(&self) -> &str {
        &self.code_url
    }
    pub fn slides_url(&self) -> &str {
        &self.slides_url
    }
    pub fn volume(&self) -> &str {
        &self.volume
    }
    pub fn number(&self) -> &str {
        &self.number
    }
    pub fn pages(&self) -> &str {
        &self.pages
    }
    pub fn publisher(&self) -> &str {
        &self.publisher
    }
    pub fn address(&self) -> &str {
        &self.address
    }
    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    /// The journal, or the booktitle for entries without a journal
    pub fn journal_or_booktitle(&self) -> &str {
        if self.journal.is_empty() {
            &self.booktitle
        } else {
            &self.journal
        }
    }

    pub fn set_kind(&mut self, kind: &str) {
        self.kind = kind.trim().to_lowercase();
    }
    pub fn set_key(&mut self, key: &str) {
        self.key = key.trim().to_string();
    }
    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }
    pub fn set_journal(&mut self, journal: &str) {
        self.journal = journal.to_string();
    }
    pub fn set_booktitle(&mut self, booktitle: &str) {
        self.booktitle = booktitle.to_string();
    }
    pub fn set_abstract(&mut self, text: &str) {
        self.abstract_text = text.to_string();
    }

    /// Accepts only plain digit strings in 1900..=2100.
    pub fn set_year(&mut self, year: &str) -> Result<(), FieldError> {
        if !is_valid_year(year) {
            return Err(FieldError::InvalidYear(year.to_string()));
        }
        self.year = year.to_string();
        Ok(())
    }

    /// An empty DOI clears the field.
    pub fn set_doi(&mut self, doi: &str) -> Result<(), FieldError> {
        if !doi.is_empty() && !(doi.len() > 3 && doi.starts_with("10.")) {
            return Err(FieldError::InvalidDoi(doi.to_string()));
        }
        self.doi = doi.to_string();
        Ok(())
    }

    pub fn set_pdf_url(&mut self, url: &str) -> Result<(), FieldError> {
        check_url("pdf", url)?;
        self.pdf_url = url.to_string();
        Ok(())
    }

    pub fn set_code_url(&mut self, url: &str) -> Result<(), FieldError> {
        check_url("code", url)?;
        self.code_url = url.to_string();
        Ok(())
    }

    pub fn set_slides_url(&mut self, url: &str) -> Result<(), FieldError> {
        check_url("slides", url)?;
        self.slides_url = url.to_string();
        Ok(())
    }

    pub fn add_author(&mut self, author: Author) {
        self.authors.push(author);
    }

    /// Replace all authors by the names found in an `author` field.
    pub fn set_authors_from_field(&mut self, field: &str) {
        self.authors = authors::parse_authors(field)
            .into_iter()
            .map(Author::new)
            .collect();
    }

    /// Assign a field by its (lowercase) name, as found in a `.bib` file.
    ///
    /// `booktitle` and `journal` are kept apart, see `journal_or_booktitle`.
    /// `url` only fills the PDF link if no `pdf` field set it. Every
    /// `author` field replaces the authors parsed so far. Unknown names are
    /// ignored.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        match name {
            "title" => self.set_title(value),
            "year" => self.set_year(value)?,
            "journal" => self.set_journal(value),
            "booktitle" => self.set_booktitle(value),
            "author" => self.set_authors_from_field(value),
            "doi" => self.set_doi(value)?,
            "abstract" => self.set_abstract(value),
            "pdf" => self.set_pdf_url(value)?,
            "url" if self.pdf_url.is_empty() => self.set_pdf_url(value)?,
            "code" => self.set_code_url(value)?,
            "slides" | "ppt" => self.set_slides_url(value)?,
            "volume" => self.volume = value.to_string(),
            "number" => self.number = value.to_string(),
            "pages" => self.pages = value.to_string(),
            "publisher" => self.publisher = value.to_string(),
            "address" => self.address = value.to_string(),
            _ => {}
        }
        Ok(())
    }

    /// Names of the required fields that are still empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.key.is_empty() {
            missing.push("key");
        }
        if self.title.is_empty() {
            missing.push("title");
        }
        if self.year.is_empty() {
            missing.push("year");
        }
        missing
    }

    /// An entry needs a key, a title and a year.
    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// The year as a number for sorting; 0 if empty or not purely digits.
    pub fn year_as_int(&self) -> u32 {
        year_rank(&self.year)
    }

    /// Newer entries first, then titles in ascending order.
    pub fn cmp_by_year_title(&self, other: &Entry) -> Ordering {
        other
            .year_as_int()
            .cmp(&self.year_as_int())
            .then_with(|| self.title.cmp(&other.title))
    }

    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(Author::name)
            .collect::<Vec<_>>()
            .join(" and ")
    }

    /// Short form, e.g. “[2023] A Paper”
    pub fn headline(&self) -> String {
        format!("[{}] {}", self.year, self.title)
    }

    /// Serialize this entry in the persisted `.bib` format.
    /// Unlike `Display`, the abstract is written in full.
    pub fn to_bibtex(&self) -> String {
        self.render(None)
    }

    fn render(&self, abstract_limit: Option<usize>) -> String {
        let mut out = format!("@{}{{{},\n", self.kind, self.key);
        let mut field = |name: &str, value: &str| {
            if !value.is_empty() {
                out.push_str(&format!("    {} = {{{}}},\n", name, value));
            }
        };

        field("title", &self.title);
        field("author", &self.author_names());
        field("year", &self.year);
        field("booktitle", &self.booktitle);
        field("journal", &self.journal);
        field("volume", &self.volume);
        field("number", &self.number);
        field("pages", &self.pages);
        field("publisher", &self.publisher);
        field("address", &self.address);
        field("doi", &self.doi);
        field("pdf", &self.pdf_url);
        field("code", &self.code_url);
        field("slides", &self.slides_url);
        match abstract_limit {
            Some(limit) if self.abstract_text.chars().count() > limit => {
                let shortened: String = self.abstract_text.chars().take(limit).collect();
                field("abstract", &format!("{}...", shortened));
            }
            _ => field("abstract", &self.abstract_text),
        }

        out.push_str("}\n");
        out
    }
}

/// Display form of the entry: like `to_bibtex`, but long abstracts are cut
/// after `ABSTRACT_DISPLAY_LIMIT` characters and marked with “...”.
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(Some(ABSTRACT_DISPLAY_LIMIT)))
    }
}

fn is_valid_year(year: &str) -> bool {
    !year.is_empty()
        && year.chars().all(|c| c.is_ascii_digit())
        && matches!(year.parse::<u32>(), Ok(1900..=2100))
}

pub(crate) fn year_rank(year: &str) -> u32 {
    if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
        return 0;
    }
    year.parse().unwrap_or(0)
}

/// Accepts URLs longer than 7 characters starting with `http://` or
/// `https://`, so a bare `https://` passes.
fn check_url(field: &'static str, url: &str) -> Result<(), FieldError> {
    let ok = url.is_empty()
        || (url.len() > 7 && (url.starts_with("http://") || url.starts_with("https://")));
    if ok {
        Ok(())
    } else {
        Err(FieldError::InvalidUrl {
            field,
            value: url.to_string(),
        })
    }
}
