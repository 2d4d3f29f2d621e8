use std::collections::VecDeque;
use std::io;
use std::mem;
use std::path;
use std::str;

use crate::errors::{ParsingError, ParsingErrorKind};
use crate::lexer;
use crate::types;

/// Parser parsing a `.bib` file allowing iteration over `Entry` instances
pub struct Parser {
    pub(crate) lexer: lexer::Lexer,
}

impl Parser {
    /// Use a file at some filepath as source for the parsing process.
    /// The file is read completely and closed before this returns.
    pub fn from_file<P: AsRef<path::Path>>(path: P) -> Result<Parser, io::Error> {
        let lexer = lexer::Lexer::from_file(path)?;
        Ok(Parser { lexer })
    }

    /// Use a string as source for the parsing process.
    pub fn from_string(data: String) -> Parser {
        Parser {
            lexer: lexer::Lexer::from_string(data),
        }
    }

    pub fn iter(&mut self) -> Entries<'_> {
        Entries {
            iter: self.lexer.iter(),
            pending: VecDeque::new(),
            state: ParserState::Outside,
            current: types::Entry::default(),
            opened_at: None,
        }
    }
}

impl str::FromStr for Parser {
    type Err = io::Error;

    /// Use a string as source for the parsing process.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Ok(Parser::from_string(data.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParserState {
    Outside,
    InsideEntry,
}

/// A stateful iterator yielding one `Entry` after another.
///
/// Entries with a malformed header or without key, title or year are yielded
/// as `Err`; iteration continues with the next entry afterwards.
pub struct Entries<'i> {
    pub(crate) iter: lexer::LexingIterator<'i>,
    pub(crate) pending: VecDeque<Result<types::Entry, ParsingError>>,
    pub(crate) state: ParserState,
    pub(crate) current: types::Entry,
    pub(crate) opened_at: Option<lexer::TokenInfo>,
}

impl<'i> Entries<'i> {
    /// parse() consumes one token and pushes finished entries to `self.pending`.
    /// Returns false once the end of the file was processed.
    fn parse(&mut self) -> bool {
        use lexer::Token as T;
        use ParserState as S;

        let (token, info) = match self.iter.next() {
            Some(t) => t,
            None => return false,
        };
        tracing::trace!(line = info.lineno + 1, token = %token, state = ?self.state);

        match (self.state, token) {
            (_, T::EntryHeader { kind, key }) => {
                // a new header implicitly closes an unterminated entry
                self.finish();
                self.current = types::Entry::new(&kind, &key);
                self.opened_at = Some(info);
                self.state = S::InsideEntry;
            }
            (_, T::MalformedHeader) => {
                self.finish();
                self.pending.push_back(Err(ParsingError {
                    kind: ParsingErrorKind::MalformedHeader,
                    info,
                }));
            }
            (S::InsideEntry, T::Field { name, value }) => {
                if let Err(err) = self.current.set_field(&name, &value) {
                    tracing::debug!(
                        key = self.current.key(),
                        line = info.lineno + 1,
                        error = %err,
                        "rejected field value"
                    );
                }
            }
            (S::InsideEntry, T::CloseEntry) | (_, T::EndOfFile) => self.finish(),
            (S::Outside, _) | (S::InsideEntry, T::Text) => {}
        }
        true
    }

    /// Close the open entry, if any, and queue it or the reason it is invalid.
    fn finish(&mut self) {
        if self.state == ParserState::Outside {
            return;
        }
        self.state = ParserState::Outside;

        let entry = mem::take(&mut self.current);
        let info = self.opened_at.take().unwrap_or_else(|| lexer::TokenInfo {
            lineno: 0,
            current_line: String::new(),
            current_id: None,
        });
        let missing = entry.missing_fields();
        if missing.is_empty() {
            tracing::debug!(key = entry.key(), "added entry");
            self.pending.push_back(Ok(entry));
        } else {
            self.pending.push_back(Err(ParsingError {
                kind: ParsingErrorKind::InvalidEntry {
                    key: entry.key().to_string(),
                    missing,
                },
                info,
            }));
        }
    }
}

impl<'s> Iterator for Entries<'s> {
    type Item = Result<types::Entry, ParsingError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(result) = self.pending.pop_front() {
                return Some(result);
            }
            if !self.parse() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error;
    use std::str::FromStr;

    #[test]
    fn test_tolkien() -> Result<(), Box<dyn error::Error>> {
        let mut p = Parser::from_str(
            "@book{tolkien1937,\n  author = {J. R. R. Tolkien},\n  title = {The Hobbit},\n  year = 1937,\n}",
        )?;
        let mut count = 0;
        for e in p.iter() {
            let entry = e?;
            assert_eq!(entry.kind(), "book");
            assert_eq!(entry.key(), "tolkien1937");
            assert_eq!(entry.title(), "The Hobbit");
            assert_eq!(entry.year(), "1937");
            assert_eq!(entry.author_names(), "J. R. R. Tolkien");
            count += 1;
        }
        assert_eq!(count, 1);
        Ok(())
    }

    #[test]
    fn test_taocp() -> Result<(), Box<dyn error::Error>> {
        let src = r#"@Book{DBLP:books/lib/Knuth97,
  author    = {Donald Ervin Knuth},
  title     = {The art of computer programming, Volume I},
  publisher = {Addison-Wesley},
  year      = {1997},
  url       = {https://www.worldcat.org/oclc/312910844},
  isbn      = {0201896834},
  biburl    = {https://dblp.org/rec/books/lib/Knuth97.bib},
}"#;
        let mut p = Parser::from_str(src)?;
        let mut iter = p.iter();
        let entry = iter.next().ok_or("no entry")??;
        assert_eq!(entry.kind(), "book");
        assert_eq!(entry.key(), "DBLP:books/lib/Knuth97");
        assert_eq!(entry.year(), "1997");
        assert_eq!(entry.publisher(), "Addison-Wesley");
        assert_eq!(entry.pdf_url(), "https://www.worldcat.org/oclc/312910844");
        assert!(iter.next().is_none());
        Ok(())
    }

    #[test]
    fn test_invalid_entry_does_not_stop_parsing() -> Result<(), Box<dyn error::Error>> {
        let src = "@article{a,\n title = {First},\n}\n\
                   @article{b,\n title = {No Year},\n year = {someday},\n}\n\
                   @article{c,\n title = {Third},\n year = {2011},\n}\n";
        let mut p = Parser::from_str(src)?;
        let results: Vec<_> = p.iter().collect();
        assert_eq!(results.len(), 3);

        let err = results[0].as_ref().err().ok_or("a should be invalid")?;
        assert_eq!(
            err.kind(),
            &ParsingErrorKind::InvalidEntry {
                key: "a".to_string(),
                missing: vec!["year"]
            }
        );
        assert_eq!(err.line(), 1);
        assert_eq!(
            err.to_string(),
            "invalid entry skipped, missing year in entry 'a' at line 1: @article{a,"
        );
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().map(|e| e.key()).ok(), Some("c"));
        Ok(())
    }

    #[test]
    fn test_malformed_header_is_skipped() -> Result<(), Box<dyn error::Error>> {
        let src = "@article broken,\n title = {Lost},\n year = {2000},\n}\n\
                   @misc{ok,\n title = {Found},\n year = {2001},\n}\n";
        let mut p = Parser::from_str(src)?;
        let results: Vec<_> = p.iter().collect();
        assert_eq!(results.len(), 2);
        let err = results[0].as_ref().err().ok_or("expected error")?;
        assert_eq!(err.kind(), &ParsingErrorKind::MalformedHeader);
        assert_eq!(
            err.to_string(),
            "failed to parse entry header at line 1: @article broken,"
        );
        assert_eq!(results[1].as_ref().map(|e| e.title()).ok(), Some("Found"));
        Ok(())
    }

    #[test]
    fn test_unterminated_entries_are_kept() -> Result<(), Box<dyn error::Error>> {
        let src = "@misc{one,\n title = {One},\n year = {2001},\n\
                   @misc{two,\n title = {Two},\n year = {2002},\n";
        let mut p = Parser::from_str(src)?;
        let keys: Vec<String> = p
            .iter()
            .collect::<Result<Vec<_>, _>>()?
            .iter()
            .map(|e| e.key().to_string())
            .collect();
        assert_eq!(keys, vec!["one", "two"]);
        Ok(())
    }

    #[test]
    fn test_field_rules() -> Result<(), Box<dyn error::Error>> {
        let src = r#"@InProceedings{k,
  Title = "Old Title",
  title = {New Title},
  year = {2015},
  year = {3000},
  booktitle = {Proc. of Stuff},
  author = {A One and B Two},
  author = {C Three},
  doi = {not-a-doi},
  slides = {https://x.org/talk},
  unknown = {whatever},
}
stray = {outside any entry}
"#;
        let mut p = Parser::from_str(src)?;
        let entries = p.iter().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.kind(), "inproceedings");
        assert_eq!(e.title(), "New Title");
        assert_eq!(e.year(), "2015");
        assert_eq!(e.journal_or_booktitle(), "Proc. of Stuff");
        assert_eq!(e.author_names(), "C Three");
        assert_eq!(e.doi(), "");
        assert_eq!(e.slides_url(), "https://x.org/talk");
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<(), Box<dyn error::Error>> {
        let mut p = Parser::from_str("")?;
        assert!(p.iter().next().is_none());
        let mut p = Parser::from_str("just some text\n}\n")?;
        assert!(p.iter().next().is_none());
        Ok(())
    }
}
