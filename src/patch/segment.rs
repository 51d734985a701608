//! Path segmentation for patch targets.
//!
//! A patch path like `Patient.telecom.where(use='home').value[0]` is split
//! into top-level segments on dots, without splitting inside parentheses,
//! brackets, quotes or backticks. The containing path is everything but the
//! last segment; the tail is the last segment decomposed into a field name,
//! an optional array index, or a filter marker when the segment is a
//! predicate call.

use once_cell::sync::Lazy;
use regex::Regex;

static TAIL_RE: Lazy<Regex> = Lazy::new(|| {
    // `name` or `name[3]`
    Regex::new(r"^(\w+)(?:\[(\d+)\])?$").unwrap()
});

/// The last path segment in a form the operation engine can act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tail {
    pub field: Option<String>,
    pub index: Option<usize>,
    /// True when the segment is a predicate (e.g. `where(...)`) rather than
    /// a plain field access.
    pub is_filter: bool,
}

/// Splits a path into top-level segments.
pub(crate) fn split(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in path.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '.' if depth == 0 => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

/// First segment of the path, used to check it addresses the right resource
/// type.
pub(crate) fn root(path: &str) -> String {
    split(path).into_iter().next().unwrap_or_default()
}

/// Everything before the last segment, rejoined.
pub(crate) fn containing_path(path: &str) -> String {
    let segments = split(path);
    segments[..segments.len().saturating_sub(1)].join(".")
}

pub(crate) fn tail(path: &str) -> Tail {
    let segments = split(path);
    let last = segments.last().map(String::as_str).unwrap_or_default();
    if last.contains('(') {
        return Tail {
            field: None,
            index: None,
            is_filter: true,
        };
    }
    match TAIL_RE.captures(last) {
        Some(caps) => Tail {
            field: Some(caps[1].to_string()),
            index: caps.get(2).and_then(|m| m.as_str().parse().ok()),
            is_filter: false,
        },
        None => Tail {
            field: None,
            index: None,
            is_filter: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn split_respects_parenthesized_predicates() {
        assert_eq!(
            split("Practitioner.telecom.where(value='6564664444')"),
            vec!["Practitioner", "telecom", "where(value='6564664444')"]
        );
    }

    #[test]
    fn split_does_not_break_inside_quotes_or_brackets() {
        assert_eq!(
            split("Patient.extension.where(url='http://a.b/c').value"),
            vec![
                "Patient",
                "extension",
                "where(url='http://a.b/c')",
                "value"
            ]
        );
        assert_eq!(split("Patient.name[0].given"), vec!["Patient", "name[0]", "given"]);
    }

    #[test]
    fn containing_path_drops_only_the_last_segment() {
        assert_eq!(
            containing_path("Patient.telecom.where(use='home').value"),
            "Patient.telecom.where(use='home')"
        );
        assert_eq!(containing_path("Patient.birthDate"), "Patient");
    }

    #[test]
    fn tail_extracts_field_and_index() {
        assert_eq!(
            tail("Patient.identifier[2]"),
            Tail {
                field: Some("identifier".into()),
                index: Some(2),
                is_filter: false
            }
        );
        assert_eq!(
            tail("Patient.birthDate"),
            Tail {
                field: Some("birthDate".into()),
                index: None,
                is_filter: false
            }
        );
        assert!(tail("Practitioner.telecom.where(value='x')").is_filter);
    }
}
