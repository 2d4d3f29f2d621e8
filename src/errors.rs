use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::lexer;

/// Fatal errors of a load or save operation
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug, PartialEq)]
pub enum ParsingErrorKind {
    #[error("failed to parse entry header")]
    MalformedHeader,
    #[error("invalid entry skipped, missing {}", .missing.join(", "))]
    InvalidEntry {
        key: String,
        missing: Vec<&'static str>,
    },
}

// Represents an entry that was skipped during the parsing process.
// Parsing continues with the next entry after such an error.
#[derive(Debug)]
pub struct ParsingError {
    pub(crate) kind: ParsingErrorKind,
    pub(crate) info: lexer::TokenInfo,
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.info.current_id {
            Some(id) => write!(f, "{} in entry '{}'", self.kind, id)?,
            None => write!(f, "{}", self.kind)?,
        }
        write!(f, " at line {}", self.info.lineno + 1)?;
        if !self.info.current_line.trim().is_empty() {
            write!(f, ": {}", self.info.current_line.trim())?;
        }
        Ok(())
    }
}

impl error::Error for ParsingError {}

impl ParsingError {
    pub fn kind(&self) -> &ParsingErrorKind {
        &self.kind
    }

    /// 1-based line number the error was detected at
    pub fn line(&self) -> usize {
        self.info.lineno + 1
    }
}

/// A field assignment rejected by one of the validating setters of `Entry`.
/// The entry keeps its previous value for that field.
#[derive(Error, Debug, PartialEq)]
pub enum FieldError {
    #[error("year '{0}' is not a number between 1900 and 2100")]
    InvalidYear(String),
    #[error("DOI '{0}' does not start with '10.'")]
    InvalidDoi(String),
    #[error("{field} '{value}' is not an http:// or https:// URL")]
    InvalidUrl { field: &'static str, value: String },
}
