use std::fmt;
use std::fs;
use std::io;
use std::io::Read;
use std::path;
use std::str;

use crate::field;

/// A token is one line of the `.bib` file, classified by its shape.
/// Remember, that a bib file entry looks as follows:
///
/// ```tex
/// @Book{works:4,
///   author     = {Shakespeare, William},
///   title      = {Sonnets},
/// }
/// ```
///
/// In this case, the lexer would emit the following Token instances:
/// (EntryHeader("book", "works:4"), Field("author", "Shakespeare, William"),
/// Field("title", "Sonnets"), CloseEntry, EndOfFile). Whether a token is
/// meaningful depends on the parser state, so the lexer never fails.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    EntryHeader { kind: String, key: String },
    MalformedHeader,
    Field { name: String, value: String },
    CloseEntry,
    Text,
    EndOfFile,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntryHeader { kind, key } => write!(f, "@{}{{{},", kind, key),
            Self::MalformedHeader => write!(f, "malformed header"),
            Self::Field { name, value } => write!(f, "{} = {{{}}}", name, value),
            Self::CloseEntry => write!(f, "}}"),
            Self::Text => write!(f, "text"),
            Self::EndOfFile => write!(f, "end of file"),
        }
    }
}

/// Additional source code information attached to a Token
/// for improved error messages
#[derive(Clone, Debug)]
pub(crate) struct TokenInfo {
    pub(crate) lineno: usize,
    pub(crate) current_line: String,
    pub(crate) current_id: Option<String>,
}

pub(crate) struct LexingIterator<'s> {
    pub(crate) lines: str::Lines<'s>,
    pub(crate) lineno: usize,
    pub(crate) current_id: Option<String>, // key of the entry the last header opened
    pub(crate) eof: bool,
}

impl<'s> LexingIterator<'s> {
    fn info(&self, line: &str) -> TokenInfo {
        TokenInfo {
            lineno: self.lineno,
            current_line: line.to_string(),
            current_id: self.current_id.clone(),
        }
    }

    fn classify(&mut self, line: &str) -> Option<Token> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('@') {
            return Some(match parse_header(trimmed) {
                Some((kind, key)) => {
                    self.current_id = Some(key.clone());
                    Token::EntryHeader { kind, key }
                }
                None => {
                    self.current_id = None;
                    Token::MalformedHeader
                }
            });
        }
        if trimmed == "}" {
            return Some(Token::CloseEntry);
        }
        Some(match field::split_field(trimmed) {
            Some((name, value)) => Token::Field { name, value },
            None => Token::Text,
        })
    }
}

impl<'s> Iterator for LexingIterator<'s> {
    type Item = (Token, TokenInfo);

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof {
            return None;
        }
        while let Some(line) = self.lines.next() {
            if let Some(token) = self.classify(line) {
                let info = self.info(line);
                self.lineno += 1;
                return Some((token, info));
            }
            self.lineno += 1; // blank line
        }
        self.eof = true;
        Some((Token::EndOfFile, self.info("")))
    }
}

/// Parse `@type{key,` into a lowercased type and the trimmed key.
/// The key ends at the first `,`, else at a `}`, else at the end of the line.
pub(crate) fn parse_header(line: &str) -> Option<(String, String)> {
    let rest = line.trim().strip_prefix('@')?;
    let (kind, body) = rest.split_once('{')?;
    let end = body.find(',').or_else(|| body.find('}')).unwrap_or(body.len());

    let kind = kind.trim().to_lowercase();
    let key = body[..end].trim().to_string();
    if kind.is_empty() || key.is_empty() {
        return None;
    }
    Some((kind, key))
}

fn decode_lossy(buf: Vec<u8>, path: &path::Path) -> String {
    match String::from_utf8(buf) {
        Ok(src) => src,
        Err(err) => {
            let bytes = err.into_bytes();
            let src = String::from_utf8_lossy(&bytes).into_owned();
            tracing::warn!(
                path = %path.display(),
                replaced = src.matches(char::REPLACEMENT_CHARACTER).count(),
                "file is not valid UTF-8, invalid bytes were replaced"
            );
            src
        }
    }
}

pub(crate) struct Lexer {
    src: String,
}

impl Lexer {
    /// Use a file stored at a `path` as source for the lexing process.
    /// Bytes that are not valid UTF-8 are replaced by U+FFFD.
    pub(crate) fn from_file<P: AsRef<path::Path>>(path: P) -> Result<Lexer, io::Error> {
        let path = path.as_ref();
        let mut fd = fs::File::open(path)?;
        let mut buf = Vec::new();
        fd.read_to_end(&mut buf)?;
        Ok(Lexer {
            src: decode_lossy(buf, path),
        })
    }

    /// Use a string as source for the lexing process.
    pub(crate) fn from_string(data: String) -> Lexer {
        Lexer { src: data }
    }

    pub(crate) fn iter(&self) -> LexingIterator<'_> {
        LexingIterator {
            lines: self.src.lines(),
            lineno: 0,
            current_id: None,
            eof: false,
        }
    }
}

impl str::FromStr for Lexer {
    type Err = io::Error;

    /// Use a string as source for the lexing process.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Ok(Lexer::from_string(data.to_string()))
    }
}
