// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The backend operation contract

use std::time::SystemTime;

use crate::error::FsResult;
use crate::file::VfsFile;
use crate::ops;
use crate::types::{ListOptions, OpenOptions, ResourceInfo};

/// The operation contract every QuayFS backend implements.
///
/// Path arguments are `/`-separated strings relative to the backend's root;
/// backends normalize them on entry. The copy/move operations have default
/// implementations built from the open/read/write primitives (see
/// [`crate::ops`]); backends with richer native semantics override them.
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Open a file for reading/writing per `options`. Opening a directory
    /// path is never valid.
    fn open(&self, path: &str, options: &OpenOptions) -> FsResult<Box<dyn VfsFile>>;

    /// Create a directory. `recursive` creates missing intermediate
    /// directories; `allow_recreate` tolerates an existing directory at the
    /// leaf.
    fn make_dir(&self, path: &str, recursive: bool, allow_recreate: bool) -> FsResult<()>;

    /// Remove a file. Open handles on the node are force-closed, not an
    /// error.
    fn remove(&self, path: &str) -> FsResult<()>;

    /// Remove a directory. `force` deletes a non-empty directory;
    /// `recursive` also removes the chain of parent directories named by the
    /// path.
    fn remove_dir(&self, path: &str, recursive: bool, force: bool) -> FsResult<()>;

    /// Move a node to a new path. Live handles on `src` are flushed and
    /// repointed to `dst`.
    fn rename(&self, src: &str, dst: &str) -> FsResult<()>;

    /// Update access/modification times, defaulting either to "now".
    /// Returns `false` when the path does not resolve.
    fn set_times(
        &self,
        path: &str,
        accessed: Option<SystemTime>,
        modified: Option<SystemTime>,
    ) -> FsResult<bool>;

    /// Metadata for the node at `path`.
    fn metadata(&self, path: &str) -> FsResult<ResourceInfo>;

    /// Child names of the directory at `path`, filtered per `options`.
    /// Iteration order is not guaranteed; callers needing determinism must
    /// sort.
    fn read_dir(&self, path: &str, options: &ListOptions) -> FsResult<Vec<String>>;

    fn set_xattr(&self, path: &str, key: &str, value: &[u8]) -> FsResult<()>;

    /// Extended attribute value, or `None` when the key is unset.
    fn get_xattr(&self, path: &str, key: &str) -> FsResult<Option<Vec<u8>>>;

    /// Remove an extended attribute. A missing key is not an error.
    fn del_xattr(&self, path: &str, key: &str) -> FsResult<()>;

    fn list_xattrs(&self, path: &str) -> FsResult<Vec<String>>;

    /// Human-readable description of the resource at `path`.
    fn describe(&self, path: &str) -> FsResult<String> {
        let info = self.metadata(path)?;
        Ok(if info.is_dir {
            "directory".to_string()
        } else {
            "file".to_string()
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.metadata(path).is_ok()
    }

    fn is_dir(&self, path: &str) -> bool {
        self.metadata(path).map(|info| info.is_dir).unwrap_or(false)
    }

    fn is_file(&self, path: &str) -> bool {
        self.metadata(path).map(|info| !info.is_dir).unwrap_or(false)
    }

    fn copy_file(&self, src: &str, dst: &str, overwrite: bool) -> FsResult<()> {
        ops::copy_file(self, src, dst, overwrite)
    }

    fn move_file(&self, src: &str, dst: &str, overwrite: bool) -> FsResult<()> {
        ops::move_file(self, src, dst, overwrite)
    }

    fn copy_dir(&self, src: &str, dst: &str, overwrite: bool) -> FsResult<()> {
        ops::copy_dir(self, src, dst, overwrite)
    }

    fn move_dir(&self, src: &str, dst: &str, overwrite: bool) -> FsResult<()> {
        ops::move_dir(self, src, dst, overwrite)
    }
}
