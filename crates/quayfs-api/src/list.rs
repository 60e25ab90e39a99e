// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Shared directory-listing filter
//!
//! Backends collect the raw child names of a directory and delegate the
//! filtering and rendering to [`filter_entries`], so wildcard and type
//! filters behave identically across backends.

use glob::Pattern;

use crate::error::{FsError, FsResult};
use crate::path;
use crate::types::ListOptions;

/// Apply listing filters to the child names of the directory at `dir_path`.
///
/// `is_dir` reports whether a child name refers to a directory; it is only
/// consulted when a type filter is requested.
pub fn filter_entries<F>(
    dir_path: &str,
    names: Vec<String>,
    options: &ListOptions,
    is_dir: F,
) -> FsResult<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    if options.dirs_only && options.files_only {
        return Err(FsError::ResourceInvalid);
    }

    let pattern = match &options.wildcard {
        Some(wildcard) => Some(Pattern::new(wildcard).map_err(|_| FsError::PathError)?),
        None => None,
    };

    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        if let Some(pattern) = &pattern {
            if !pattern.matches(&name) {
                continue;
            }
        }
        if options.dirs_only && !is_dir(&name) {
            continue;
        }
        if options.files_only && is_dir(&name) {
            continue;
        }
        entries.push(render(dir_path, &name, options));
    }
    Ok(entries)
}

fn render(dir_path: &str, name: &str, options: &ListOptions) -> String {
    if options.absolute {
        path::normalize(&path::join(dir_path, name))
    } else if options.full {
        let joined = path::normalize(&path::join(dir_path, name));
        joined.trim_start_matches('/').to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn wildcard_filters_names() {
        let options = ListOptions {
            wildcard: Some("*.txt".to_string()),
            ..ListOptions::default()
        };
        let out = filter_entries("/docs", names(&["a.txt", "b.rs", "c.txt"]), &options, |_| {
            false
        })
        .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.contains(&"a.txt".to_string()));
        assert!(out.contains(&"c.txt".to_string()));
    }

    #[test]
    fn type_filters_consult_predicate() {
        let options = ListOptions {
            dirs_only: true,
            ..ListOptions::default()
        };
        let out = filter_entries("/", names(&["dir", "file"]), &options, |name| name == "dir")
            .unwrap();
        assert_eq!(out, vec!["dir".to_string()]);

        let options = ListOptions {
            files_only: true,
            ..ListOptions::default()
        };
        let out = filter_entries("/", names(&["dir", "file"]), &options, |name| name == "dir")
            .unwrap();
        assert_eq!(out, vec!["file".to_string()]);
    }

    #[test]
    fn conflicting_type_filters_are_rejected() {
        let options = ListOptions {
            dirs_only: true,
            files_only: true,
            ..ListOptions::default()
        };
        let err = filter_entries("/", names(&["x"]), &options, |_| false).unwrap_err();
        assert!(matches!(err, FsError::ResourceInvalid));
    }

    #[test]
    fn full_and_absolute_render_paths() {
        let options = ListOptions {
            full: true,
            ..ListOptions::default()
        };
        let out = filter_entries("/a/b", names(&["c"]), &options, |_| false).unwrap();
        assert_eq!(out, vec!["a/b/c".to_string()]);

        let options = ListOptions {
            absolute: true,
            ..ListOptions::default()
        };
        let out = filter_entries("/a/b", names(&["c"]), &options, |_| false).unwrap();
        assert_eq!(out, vec!["/a/b/c".to_string()]);
    }
}
