//! Path-prefix normalization and pattern prefixing.
//!
//! Every registry carries a root path built by [`join`] and prepends it to
//! registered patterns with [`full_pattern`]. The invariant maintained here
//! is that a root path is either empty or starts with `/` and never ends
//! with `/`, so concatenating `root + "/segment..."` can never produce a
//! doubled or missing separator.

/// Joins path segments into a normalized absolute prefix.
///
/// Empty segments and bare `"/"` segments are skipped entirely. Each
/// remaining segment has exactly one leading and one trailing `/` stripped
/// and is appended as `/segment`. No segments (or only skipped ones) yield
/// the empty string, not `/`.
///
/// The function is idempotent over its own output:
/// `join([join([a, b]), c]) == join([a, b, c])`.
///
/// # Example
///
/// ```
/// use trellis_router::path::join;
///
/// assert_eq!(join(["api", "v1", "users"]), "/api/v1/users");
/// assert_eq!(join(["/api/", "/v1/"]), "/api/v1");
/// assert_eq!(join(["", "/"]), "");
/// ```
pub fn join<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut path = String::new();
    for segment in segments {
        if segment.is_empty() || segment == "/" {
            continue;
        }
        let segment = segment.strip_prefix('/').unwrap_or(segment);
        let segment = segment.strip_suffix('/').unwrap_or(segment);
        path.push('/');
        path.push_str(segment);
    }
    path
}

/// Prefixes a pattern's path component with `root`, preserving the method
/// token.
///
/// With an empty `root` the pattern is returned unchanged. Otherwise the
/// text before the first space or tab is treated as a method token and kept
/// verbatim, separated from the prefixed path by exactly one space
/// regardless of the separator used in the input.
///
/// # Example
///
/// ```
/// use trellis_router::path::full_pattern;
///
/// assert_eq!(full_pattern("/api", "GET\t/users"), "GET /api/users");
/// assert_eq!(full_pattern("", "/users"), "/users");
/// ```
pub fn full_pattern(root: &str, pattern: &str) -> String {
    if root.is_empty() {
        return pattern.to_string();
    }

    if let Some(i) = pattern.find([' ', '\t']) {
        let method = &pattern[..i];
        let path = pattern[i..].trim_start_matches([' ', '\t']);
        return format!("{method} {root}{path}");
    }

    format!("{root}{pattern}")
}
