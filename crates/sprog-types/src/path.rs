//! Dot/bracket path handling.
//!
//! Paths address values inside nested containers: `a.b[0].c`,
//! `items[2]`, `user['display name']`. A path is split into plain string
//! segments; bracketed numbers and quoted keys both become ordinary
//! segments.

use crate::error::SprogError;

/// Split a path string into its segments.
///
/// Empty segments (`a..b`, leading dots) are rejected, as are unterminated
/// brackets or quotes.
pub fn split_path(path: &str) -> Result<Vec<String>, SprogError> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();
    // true right after `]`, where a segment may end without text
    let mut after_bracket = false;

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if current.is_empty() && !after_bracket {
                    return Err(bad_path(path, "empty segment"));
                }
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                after_bracket = false;
                if chars.peek().is_none() {
                    return Err(bad_path(path, "trailing '.'"));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                let segment = read_bracket(&mut chars, path)?;
                segments.push(segment);
                after_bracket = true;
            }
            ']' => return Err(bad_path(path, "unbalanced ']'")),
            _ => {
                if after_bracket {
                    return Err(bad_path(path, "expected '.' or '[' after ']'"));
                }
                current.push(c);
            }
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    if segments.is_empty() {
        return Err(bad_path(path, "empty path"));
    }
    Ok(segments)
}

fn read_bracket(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    path: &str,
) -> Result<String, SprogError> {
    let mut segment = String::new();
    match chars.peek().copied() {
        Some(quote @ ('\'' | '"')) => {
            chars.next();
            loop {
                match chars.next() {
                    Some(c) if c == quote => break,
                    Some(c) => segment.push(c),
                    None => return Err(bad_path(path, "unterminated quote")),
                }
            }
            if chars.next() != Some(']') {
                return Err(bad_path(path, "expected ']' after quoted key"));
            }
        }
        _ => loop {
            match chars.next() {
                Some(']') => break,
                Some(c) => segment.push(c),
                None => return Err(bad_path(path, "unterminated '['")),
            }
        },
    }
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return Err(bad_path(path, "empty brackets"));
    }
    Ok(trimmed.to_string())
}

fn bad_path(path: &str, reason: &str) -> SprogError {
    SprogError::UnknownPath(format!("malformed path '{path}': {reason}"))
}

/// Join segments back into a canonical path.
///
/// Numeric segments use bracket form, identifiers use dot form, and
/// anything else is quoted.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for segment in segments {
        let segment = segment.as_ref();
        if is_index(segment) {
            out.push('[');
            out.push_str(segment);
            out.push(']');
        } else if is_identifier(segment) {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(segment);
        } else {
            out.push_str("['");
            out.push_str(segment);
            out.push_str("']");
        }
    }
    out
}

/// Parse a segment as a list index.
pub fn parse_index(segment: &str) -> Option<usize> {
    if is_index(segment) {
        segment.parse().ok()
    } else {
        None
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn is_identifier(segment: &str) -> bool {
    !segment.is_empty()
        && !is_index(segment)
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
