//! Key Pattern Matching
//!
//! Single-wildcard glob: `*` matches any (possibly empty) substring and every
//! other character matches itself.

/// Returns true if `text` matches `pattern`.
///
/// # Examples
/// ```
/// use tiercache::cache::glob_match;
///
/// assert!(glob_match("fpl:players:*", "fpl:players:42"));
/// assert!(!glob_match("fpl:players:*", "fpl:fixtures:1"));
/// ```
pub fn glob_match(pattern: &str, text: &str) -> bool {
    // No wildcard at all: exact comparison
    if !pattern.contains('*') {
        return pattern == text;
    }

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let middle: Vec<&str> = parts.collect();
    let (last, inner) = match middle.split_last() {
        Some((last, inner)) => (*last, inner),
        None => ("", &[][..]),
    };

    for segment in inner {
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }

    rest.len() >= last.len() && rest.ends_with(last)
}
