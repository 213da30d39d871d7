//! Path normalization.
//!
//! Firmware callers hand the driver relative names, `.`/`..` sequences and
//! repeated separators; the parser kit wants one canonical absolute POSIX
//! path per file. Normalization is lossy past the length bound: callers
//! routinely probe with oversized names and expect idempotent shortening,
//! not an error.

use alloc::string::String;

use smallvec::SmallVec;

/// Longest owned path in bytes, bound inherited from the on-disk parsers.
pub const MAX_PATH: usize = 255;

/// Resolve `.`, `..` and separator runs into a canonical absolute path.
///
/// The result always starts with `/` and never exceeds `limit` bytes;
/// excess output is dropped, mid-segment if necessary (on a character
/// boundary, since paths are UTF-8 throughout the shell).
pub fn normalize(src: &str, limit: usize) -> String {
    let mut segments: SmallVec<[&str; 16]> = SmallVec::new();
    for segment in src.split('/') {
        match segment {
            "" | "." => {}
            // Popping past the root drops the segment.
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut out = String::with_capacity(limit.min(src.len() + 1));
    if limit == 0 {
        return out;
    }
    out.push('/');
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            if out.len() + 1 > limit {
                break;
            }
            out.push('/');
        }
        for c in segment.chars() {
            if out.len() + c.len_utf8() > limit {
                return out;
            }
            out.push(c);
        }
    }
    out
}

/// Split a canonical absolute path into its parent directory and basename.
/// The root splits into `("/", "")`.
pub fn split_dir_base(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(at) => (&path[..at], &path[at + 1..]),
        None => ("/", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> String {
        normalize(s, MAX_PATH)
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(norm(""), "/");
        assert_eq!(norm("/"), "/");
        assert_eq!(norm("///"), "/");
        assert_eq!(norm("a/b"), "/a/b");
        assert_eq!(norm("/a//b/"), "/a/b");
        assert_eq!(norm("/a/./b"), "/a/b");
        assert_eq!(norm("./a"), "/a");
    }

    #[test]
    fn dotdot_pops_and_saturates_at_root() {
        assert_eq!(norm("/a/b/.."), "/a");
        assert_eq!(norm("/a/../b"), "/b");
        assert_eq!(norm("/.."), "/");
        assert_eq!(norm("../../a"), "/a");
        assert_eq!(norm("a/b/../../.."), "/");
    }

    #[test]
    fn idempotent() {
        for p in [
            "", "/", "a", "/a/b/c", "a//b/./../c", "/very/deep/../../path", "/..", "x/../y/z/.",
        ] {
            let once = norm(p);
            assert_eq!(norm(&once), once, "normalize must be idempotent for {p:?}");
        }
    }

    #[test]
    fn always_absolute() {
        for p in ["", "a", "/a", "..", "./x"] {
            assert!(norm(p).starts_with('/'), "{p:?}");
        }
    }

    #[test]
    fn truncates_without_error() {
        let out = normalize("/abcdef/ghij", 6);
        assert_eq!(out, "/abcde");
        // Truncated output is itself a fixed point.
        assert_eq!(normalize(&out, 6), out);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let out = normalize("/ab\u{00E9}cd", 4);
        assert_eq!(out, "/ab");
    }

    #[test]
    fn dir_base_split() {
        assert_eq!(split_dir_base("/a/b/c"), ("/a/b", "c"));
        assert_eq!(split_dir_base("/c"), ("/", "c"));
        assert_eq!(split_dir_base("/"), ("/", ""));
    }
}
