// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Tree node model and path resolution
//!
//! Ownership is strictly downward: a directory owns its children, nothing
//! points back up, and every operation resolves top-down from the root. This
//! keeps the tree acyclic by construction.

use std::collections::{HashMap, HashSet};

use quayfs_api::path;
use quayfs_api::types::Timestamps;

use crate::handle::HandleId;

/// Node variants
#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    Directory {
        /// Child name -> owned child node; names are unique per directory.
        children: HashMap<String, Node>,
    },
    File {
        /// Committed content. `None` for a just-created file that has never
        /// been flushed.
        data: Option<Vec<u8>>,
        /// Live handles currently referencing this node.
        open_handles: HashSet<HandleId>,
        /// Number of handles holding a destructive-operation-blocking claim.
        lock_count: u32,
    },
}

/// A tree entry, either a directory or a file.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    /// The entry's own name as stored in its parent's mapping; kept in sync
    /// on rename.
    pub name: String,
    pub times: Timestamps,
    pub xattrs: HashMap<String, Vec<u8>>,
    pub kind: NodeKind,
}

impl Node {
    pub fn new_dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            times: Timestamps::now(),
            xattrs: HashMap::new(),
            kind: NodeKind::Directory {
                children: HashMap::new(),
            },
        }
    }

    pub fn new_file(name: &str) -> Self {
        Self {
            name: name.to_string(),
            times: Timestamps::now(),
            xattrs: HashMap::new(),
            kind: NodeKind::File {
                data: None,
                open_handles: HashSet::new(),
                lock_count: 0,
            },
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    /// Directories never hold handle claims, so they always report unlocked.
    pub fn is_locked(&self) -> bool {
        match &self.kind {
            NodeKind::File { lock_count, .. } => *lock_count > 0,
            NodeKind::Directory { .. } => false,
        }
    }

    /// Committed content length; absent data counts as zero.
    pub fn content_len(&self) -> u64 {
        match &self.kind {
            NodeKind::File { data, .. } => data.as_ref().map(|d| d.len() as u64).unwrap_or(0),
            NodeKind::Directory { .. } => 0,
        }
    }
}

/// Walk `path` down from `root`, returning the resolved node.
///
/// Expects a normalized path. Resolution fails when a step lands on a file
/// or on a missing child; it has no side effects.
pub(crate) fn resolve<'a>(root: &'a Node, path: &str) -> Option<&'a Node> {
    let mut current = root;
    for component in path::components(path) {
        match &current.kind {
            NodeKind::Directory { children } => current = children.get(component)?,
            NodeKind::File { .. } => return None,
        }
    }
    Some(current)
}

/// Mutable variant of [`resolve`].
pub(crate) fn resolve_mut<'a>(root: &'a mut Node, path: &str) -> Option<&'a mut Node> {
    let mut current = root;
    for component in path::components(path) {
        match &mut current.kind {
            NodeKind::Directory { children } => current = children.get_mut(component)?,
            NodeKind::File { .. } => return None,
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Node {
        let mut root = Node::new_dir("root");
        let mut sub = Node::new_dir("sub");
        if let NodeKind::Directory { children } = &mut sub.kind {
            children.insert("leaf.txt".to_string(), Node::new_file("leaf.txt"));
        }
        if let NodeKind::Directory { children } = &mut root.kind {
            children.insert("sub".to_string(), sub);
        }
        root
    }

    #[test]
    fn resolve_walks_components() {
        let root = sample_tree();
        assert!(resolve(&root, "/").is_some());
        assert!(resolve(&root, "/sub").unwrap().is_dir());
        assert!(resolve(&root, "/sub/leaf.txt").unwrap().is_file());
        assert!(resolve(&root, "/sub/missing").is_none());
    }

    #[test]
    fn resolve_fails_through_files() {
        let root = sample_tree();
        assert!(resolve(&root, "/sub/leaf.txt/below").is_none());
    }

    #[test]
    fn fresh_file_reports_zero_length_and_unlocked() {
        let file = Node::new_file("f");
        assert_eq!(file.content_len(), 0);
        assert!(!file.is_locked());
    }
}
