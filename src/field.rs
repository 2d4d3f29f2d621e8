//! Extraction of `name = value` assignments from a single line.
//!
//! Values are unwrapped once: a value starting with `{` ends at the next `}`,
//! a value starting with `"` ends at the next `"`, and a bare value ends at the
//! first `,` or `}`. Nested braces are not tracked, so
//! `title = {The {I:} Volume}` yields `The {I:`.

/// Locate `field_name` in `line` and return its unwrapped value.
///
/// The first occurrence of `field_name` is used and there is no word boundary
/// check: looking up `title` in a `booktitle = {...}` line matches the
/// booktitle. Returns `None` if the name is not followed by `=` (only
/// whitespace may come in between) or the value is empty.
pub fn extract_field(line: &str, field_name: &str) -> Option<String> {
    if field_name.is_empty() {
        return None;
    }
    let pos = line.find(field_name)?;
    let after_name = line[pos + field_name.len()..].trim_start();
    let rest = after_name.strip_prefix('=')?;
    unwrap_value(rest).map(str::to_string)
}

/// Split a field line at its first `=` into a lowercased name and the
/// unwrapped value.
pub fn split_field(line: &str) -> Option<(String, String)> {
    let (name, rest) = line.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = unwrap_value(rest)?;
    Some((name.to_lowercase(), value.to_string()))
}

/// Strip one layer of braces or quotes from the text following `=`.
fn unwrap_value(rest: &str) -> Option<&str> {
    let rest = rest.trim_start();
    let value = if let Some(inner) = rest.strip_prefix('{') {
        delimited(inner, '}')
    } else if let Some(inner) = rest.strip_prefix('"') {
        delimited(inner, '"')
    } else {
        match rest.find(|c| c == ',' || c == '}') {
            Some(end) => &rest[..end],
            None => rest,
        }
    };

    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

// An unterminated value runs to the end of the line, minus a trailing comma.
fn delimited(inner: &str, terminator: char) -> &str {
    match inner.find(terminator) {
        Some(end) => &inner[..end],
        None => {
            let inner = inner.trim_end();
            inner.strip_suffix(',').unwrap_or(inner)
        }
    }
}
