//! This crate reads `.bib` files and finds the authors belonging to an institute.
//!
//! `.bib` files are popular in reference management since many resources
//! allow to export metadata in a BibTeχ file. The files handled here keep
//! one field assignment per line:
//!
//! ```tex
//! @inproceedings{doe2023graphs,
//!     title     = {Graphs for Everyone},
//!     author    = {Jane Doe, MIT and John Roe, ETH Zurich},
//!     year      = {2023},
//!     booktitle = {Proceedings of Graphs},
//!     pdf       = {https://example.org/graphs.pdf},
//! }
//! ```
//!
//! In this example, we call `inproceedings` the `kind` and `doe2023graphs` the
//! `key`. Field values are unwrapped once (one layer of `{}` or `""`); nested
//! braces and multi-line values are not supported. Entries lacking a key, a
//! title or a valid year (1900 to 2100) are skipped with a warning, and
//! parsing continues with the next entry.
//!
//! An author is considered a member of an institute if the institute name
//! occurs in the author's name or affiliation, ignoring case:
//!
//! ```rust
//! use bibinstitute::{Bibliography, Parser};
//! use std::str::FromStr;
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let src = "@article{doe2023,\n  title = {A Paper},\n  year = {2023},\n  author = {Jane Doe, MIT and Bob Roe},\n}\n";
//!     let mut p = Parser::from_str(src)?;
//!     let bib = Bibliography::from_parser("example", &mut p);
//!     assert_eq!(bib.len(), 1);
//!     assert_eq!(bib.count_institute_authors("mit"), 1);
//!     print!("{}", bib.institute_report("MIT"));
//!     Ok(())
//! }
//! ```
//!
//! Bibliographies are sorted newest first, then by title, and can be merged
//! with `+`, keeping the first entry seen for every key.

mod authors;
mod bibliography;
mod errors;
mod field;
mod institute;
mod lexer;
mod parser;
mod types;

pub use crate::authors::parse_authors;
pub use crate::bibliography::Bibliography;
pub use crate::errors::{Error, FieldError, ParsingError, ParsingErrorKind};
pub use crate::field::{extract_field, split_field};
pub use crate::institute::{count_institute_authors, is_from_institute, EntryMatch, InstituteReport};
pub use crate::parser::{Entries, Parser};
pub use crate::types::{Author, Entry, ABSTRACT_DISPLAY_LIMIT};
