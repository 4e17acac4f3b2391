//! Utility functions

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` segments without touching the filesystem.
///
/// Two spellings of the same artifact path (`a/./b/../c.js` and `a/c.js`)
/// normalize to the same value, which is what marker identity comparison
/// relies on.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }

    out
}

/// Canonical form of `path` when it exists, its lexical normal form otherwise.
pub fn settle_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| normalize_path(path))
}

/// Whether two paths name the same artifact, following symlinks for paths
/// that exist.
pub fn same_file(a: &Path, b: &Path) -> bool {
    normalize_path(a) == normalize_path(b) || settle_path(a) == settle_path(b)
}

/// Check whether `s` can be used as a plain JavaScript identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c == '$' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}

/// Split free-form source text into identifier-like words.
pub fn identifier_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c == '_' || c == '$' || c.is_alphanumeric()))
        .filter(|word| is_identifier(word))
}

/// Generate `<prefix>_<n>` with the smallest `n >= 1` not present in `taken`.
pub fn unique_name(prefix: &str, taken: &BTreeSet<String>) -> String {
    (1usize..)
        .map(|n| format!("{}_{}", prefix, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| prefix.to_string())
}
