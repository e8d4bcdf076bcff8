// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Directory-based commit filtering
//!
//! A commit is retained when it touches the target directory, unless *every*
//! one of its in-scope files falls under an exclude pattern. Exclusion only
//! wins when it is total, so commits with mixed impact are kept.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Inclusion and exclusion criteria for a commit range
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Directory a commit must touch to be retained
    pub target_dir: Option<String>,
    /// Sub-paths, relative to `target_dir`, whose changes alone do not count
    pub exclude_sub_paths: Option<Vec<String>>,
}

impl FilterCriteria {
    /// Build normalized criteria
    ///
    /// A target directory that normalizes to nothing (`"/"`, `"."`) means "no
    /// target". Exclude patterns that escape the scope (absolute paths or
    /// `..` segments) are dropped with a warning.
    #[must_use]
    pub fn new(target_dir: Option<&str>, exclude_sub_paths: Option<&[String]>) -> Self {
        let target_dir = target_dir
            .map(normalize_path)
            .filter(|dir| !dir.is_empty())
            .map(str::to_string);

        let exclude_sub_paths = exclude_sub_paths
            .map(|patterns| {
                patterns
                    .iter()
                    .filter_map(|pattern| {
                        if is_valid_exclude(pattern) {
                            Some(normalize_path(pattern).to_string())
                        } else {
                            warn!(pattern = %pattern, "Ignoring exclude pattern outside the target directory");
                            None
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|patterns| !patterns.is_empty());

        Self {
            target_dir,
            exclude_sub_paths,
        }
    }

    /// Criteria that retain every commit
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether any filtering applies at all
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.target_dir.is_some() || self.exclude_sub_paths.is_some()
    }

    /// Whether inclusion has to be proven from the changed-file list
    #[must_use]
    pub fn requires_target(&self) -> bool {
        self.target_dir.is_some()
    }

    /// Whether exclude patterns are present
    #[must_use]
    pub fn has_excludes(&self) -> bool {
        self.exclude_sub_paths.is_some()
    }

    /// Decide whether a commit with the given changed files is retained
    #[must_use]
    pub fn include<S: AsRef<str>>(&self, files: &[S]) -> bool {
        if !self.is_active() {
            return true;
        }

        let in_scope: Vec<&str> = match &self.target_dir {
            Some(dir) => files
                .iter()
                .map(|f| normalize_path(f.as_ref()))
                .filter_map(|f| strip_dir(f, dir))
                .collect(),
            None => files.iter().map(|f| normalize_path(f.as_ref())).collect(),
        };

        if self.target_dir.is_some() && in_scope.is_empty() {
            return false;
        }

        match &self.exclude_sub_paths {
            Some(patterns) if !in_scope.is_empty() => !in_scope
                .iter()
                .all(|path| patterns.iter().any(|p| is_under(path, p))),
            _ => true,
        }
    }
}

/// Decide whether a commit is retained, normalizing the criteria first
///
/// Equivalent to `FilterCriteria::new(target_dir, exclude_sub_paths).include(files)`.
#[must_use]
pub fn include<S: AsRef<str>>(
    files: &[S],
    target_dir: Option<&str>,
    exclude_sub_paths: Option<&[String]>,
) -> bool {
    FilterCriteria::new(target_dir, exclude_sub_paths).include(files)
}

/// Remove `./` prefixes and surrounding slashes
fn normalize_path(path: &str) -> &str {
    let mut path = path.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    if path == "." {
        return "";
    }
    path.trim_matches('/')
}

fn is_valid_exclude(pattern: &str) -> bool {
    let trimmed = pattern.trim();
    !trimmed.is_empty()
        && !trimmed.starts_with('/')
        && !trimmed.starts_with('\\')
        && !trimmed.split(['/', '\\']).any(|segment| segment == "..")
        && !normalize_path(trimmed).is_empty()
}

/// Whether `path` equals `prefix` or lies below it, by whole segments
fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// `path` relative to `dir`, if it lies inside it
fn strip_dir<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    match path.strip_prefix(dir)? {
        rest if rest.starts_with('/') => Some(&rest[1..]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn excludes(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn test_no_criteria_keeps_everything() {
        assert!(include::<&str>(&[], None, None));
        assert!(include(&["anything.rs"], None, None));
    }

    #[test]
    fn test_files_outside_target_are_dropped() {
        assert!(!include(&["docs/readme.md", "README.md"], Some("src"), None));
    }

    #[test]
    fn test_target_prefix_is_segment_aware() {
        assert!(!include(&["srclib/a.rs"], Some("src"), None));
        assert!(include(&["src/a.rs"], Some("src"), None));
        assert!(include(&["src/a.rs"], Some("./src/"), None));
    }

    #[test]
    fn test_fully_excluded_commit_is_dropped() {
        let ex = excludes(&["tests", "docs/"]);
        assert!(!include(
            &["pkg/tests/a.rs", "pkg/docs/guide.md"],
            Some("pkg"),
            Some(&ex)
        ));
    }

    #[test]
    fn test_partially_excluded_commit_is_kept() {
        let ex = excludes(&["tests"]);
        assert!(include(
            &["pkg/tests/a.rs", "pkg/src/lib.rs"],
            Some("pkg"),
            Some(&ex)
        ));
    }

    #[test]
    fn test_exclusion_ignores_files_outside_target() {
        let ex = excludes(&["tests"]);
        // README.md is out of scope; the only in-scope file is excluded
        assert!(!include(
            &["README.md", "pkg/tests/a.rs"],
            Some("pkg"),
            Some(&ex)
        ));
    }

    #[test]
    fn test_exclusion_without_target() {
        let ex = excludes(&["docs"]);
        assert!(!include(&["docs/a.md", "docs/b/c.md"], None, Some(&ex)));
        assert!(include(&["docs/a.md", "src/main.rs"], None, Some(&ex)));
    }

    #[test]
    fn test_exclude_pattern_is_segment_aware() {
        let ex = excludes(&["test"]);
        assert!(include(&["pkg/tests/a.rs"], Some("pkg"), Some(&ex)));
        let ex = excludes(&["CHANGELOG.md"]);
        assert!(!include(&["pkg/CHANGELOG.md"], Some("pkg"), Some(&ex)));
    }

    #[test]
    fn test_escaping_patterns_are_ignored() {
        let ex = excludes(&["/pkg/tests", "../other", "a/../b", ""]);
        let criteria = FilterCriteria::new(Some("pkg"), Some(&ex));
        assert_eq!(criteria.exclude_sub_paths, None);
        assert!(criteria.include(&["pkg/tests/a.rs"]));
    }

    #[test]
    fn test_empty_file_list_with_excludes_only_is_kept() {
        let ex = excludes(&["docs"]);
        assert!(include::<&str>(&[], None, Some(&ex)));
    }

    #[test]
    fn test_empty_file_list_with_target_is_dropped() {
        assert!(!include::<&str>(&[], Some("src"), None));
    }

    #[test]
    fn test_root_target_means_no_target() {
        let criteria = FilterCriteria::new(Some("/"), None);
        assert!(!criteria.is_active());
        let criteria = FilterCriteria::new(Some("."), None);
        assert!(!criteria.is_active());
    }

    #[test]
    fn test_criteria_flags() {
        let ex = excludes(&["tests"]);
        let criteria = FilterCriteria::new(Some("pkg"), Some(&ex));
        assert!(criteria.is_active());
        assert!(criteria.requires_target());
        assert!(criteria.has_excludes());
        assert!(!FilterCriteria::none().is_active());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./a/b/"), "a/b");
        assert_eq!(normalize_path("/a/"), "a");
        assert_eq!(normalize_path("."), "");
        assert_eq!(normalize_path("././x"), "x");
    }
}
