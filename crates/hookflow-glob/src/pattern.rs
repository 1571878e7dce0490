//! Glob matching with `**`, `*`, `?` and `!` negation lists.

use glob::{MatchOptions, Pattern};

/// `*` and `?` never cross a `/`. Matching happens per path segment, so
/// the option is belt-and-braces for patterns that slip a separator into
/// a segment-level wildcard.
fn segment_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

/// Match one pattern segment against one path segment.
///
/// An unparseable pattern segment falls back to literal comparison rather
/// than failing the whole trigger.
fn segment_match(pattern: &str, segment: &str) -> bool {
    match Pattern::new(pattern) {
        Ok(p) => p.matches_with(segment, segment_options()),
        Err(_) => pattern == segment,
    }
}

/// Segment-wise match with no `**` involved: segment counts must agree and
/// every pair must match.
fn plain_match(pattern: &str, path: &str) -> bool {
    let pat_segs: Vec<&str> = pattern.split('/').collect();
    let path_segs: Vec<&str> = path.split('/').collect();
    if pat_segs.len() != path_segs.len() {
        return false;
    }
    pat_segs
        .iter()
        .zip(path_segs.iter())
        .all(|(p, s)| segment_match(p, s))
}

/// Match `pattern` against a slash-normalized `path`.
///
/// - `?` matches one character that is not `/`.
/// - `*` matches zero or more characters that are not `/`.
/// - `**` matches zero or more whole path segments. The pattern is split
///   on the literal `**`: `**/S` requires some suffix of the path's
///   segments (its basename included) to match `S`; `P/**/S` requires the
///   path to start with `P` and some suffix of the remainder to match `S`;
///   `P/**` is satisfied by the prefix match alone.
pub fn glob_match(pattern: &str, path: &str) -> bool {
    let Some(star_star) = pattern.find("**") else {
        return plain_match(pattern, path);
    };

    let prefix = pattern[..star_star].trim_end_matches('/');
    let suffix = pattern[star_star + 2..].trim_start_matches('/');

    let path_segs: Vec<&str> = path.split('/').collect();

    let rest: &[&str] = if prefix.is_empty() {
        &path_segs
    } else {
        let pre_segs: Vec<&str> = prefix.split('/').collect();
        if path_segs.len() < pre_segs.len() {
            return false;
        }
        if !pre_segs
            .iter()
            .zip(path_segs.iter())
            .all(|(p, s)| segment_match(p, s))
        {
            return false;
        }
        &path_segs[pre_segs.len()..]
    };

    if suffix.is_empty() {
        return true;
    }

    // Some suffix of the remaining segments must match; the suffix pattern
    // may itself contain another `**`, so recurse.
    for start in 0..rest.len() {
        let tail = rest[start..].join("/");
        if glob_match(suffix, &tail) {
            return true;
        }
    }
    false
}

/// Apply an ordered pattern list with `!` negation semantics.
///
/// A path included by a non-negated pattern is removed again when a later
/// `!pattern` matches it. Returns whether the path ends up included.
pub fn match_list(patterns: &[String], path: &str) -> bool {
    let mut included = false;
    for pattern in patterns {
        if let Some(negated) = pattern.strip_prefix('!') {
            if included && glob_match(negated, path) {
                included = false;
            }
        } else if !included && glob_match(pattern, path) {
            included = true;
        }
    }
    included
}
