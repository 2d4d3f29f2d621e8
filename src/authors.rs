const SEPARATOR: &str = " and ";

/// Split the data of an `author` field into individual names.
///
/// One layer of surrounding curly braces is removed first. Names are
/// separated by the literal ` and `; surrounding whitespace is trimmed and
/// empty segments are dropped.
pub fn parse_authors(field: &str) -> Vec<String> {
    let mut rest = field.trim();
    if let Some(inner) = rest.strip_prefix('{') {
        rest = inner.strip_suffix('}').unwrap_or(inner);
    }

    let mut names = Vec::new();
    loop {
        let (name, next) = match rest.find(SEPARATOR) {
            Some(pos) => (&rest[..pos], Some(&rest[pos + SEPARATOR.len()..])),
            None => (rest, None),
        };
        let name = name.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
        match next {
            Some(next) => rest = next,
            None => break,
        }
    }
    names
}
