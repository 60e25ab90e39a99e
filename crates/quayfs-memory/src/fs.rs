// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The in-memory tree engine

use std::collections::HashMap;
use std::io::{self, SeekFrom};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use quayfs_api::types::{ListOptions, OpenOptions, ResourceInfo};
use quayfs_api::{list, ops, path, Filesystem, FsError, FsResult, VfsFile};

use crate::config::MemoryFsConfig;
use crate::handle::{HandleId, HandleState, MemFile};
use crate::node::{resolve, resolve_mut, Node, NodeKind};

/// Fixed mode bits reported by `metadata`.
const DIR_MODE: u32 = libc::S_IFDIR as u32 | 0o755;
const FILE_MODE: u32 = libc::S_IFREG as u32 | 0o666;

/// Everything guarded by the engine's serialization lock: the owned tree and
/// the registry of live handles.
struct FsState {
    root: Node,
    handles: HashMap<HandleId, HandleState>,
    next_handle_id: u64,
}

impl FsState {
    /// Commit a handle's buffer into its node and release its claim.
    ///
    /// Absent registry entries are tolerated so closing twice is a no-op.
    /// `strict` closes surface a lock-count underflow as [`FsError::LockMismatch`];
    /// forced closes saturate instead, since the node is going away.
    fn release_handle(&mut self, id: HandleId, strict: bool) -> FsResult<()> {
        let Some(state) = self.handles.remove(&id) else {
            return Ok(());
        };
        if let Some(node) = resolve_mut(&mut self.root, &state.path) {
            if let NodeKind::File {
                data,
                open_handles,
                lock_count,
            } = &mut node.kind
            {
                if open_handles.remove(&id) {
                    *data = Some(state.buf);
                    if *lock_count == 0 {
                        if strict {
                            return Err(FsError::LockMismatch);
                        }
                    } else {
                        *lock_count -= 1;
                    }
                }
            }
        }
        Ok(())
    }
}

/// An in-memory filesystem.
///
/// The whole tree lives behind one serialization lock held for the duration
/// of each public operation, so operations observe a total order and there
/// is no partial visibility of an in-progress mutation. Cloning is cheap and
/// shares the underlying tree; handles hold a clone and call back into the
/// engine at flush/close time.
#[derive(Clone)]
pub struct MemoryFs {
    inner: Arc<Inner>,
}

struct Inner {
    config: MemoryFsConfig,
    state: Mutex<FsState>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::with_config(MemoryFsConfig::default())
    }

    pub fn with_config(config: MemoryFsConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(FsState {
                    root: Node::new_dir("root"),
                    handles: HashMap::new(),
                    next_handle_id: 1,
                }),
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, FsState> {
        self.inner.state.lock().unwrap()
    }

    /// Open a file, returning the concrete handle type.
    ///
    /// The trait's `open` boxes the result; callers working with `MemoryFs`
    /// directly can avoid the allocation.
    pub fn open_file(&self, path: &str, options: &OpenOptions) -> FsResult<MemFile> {
        let path = path::normalize(path);
        let (parent_path, name) = path::split(&path);
        if name.is_empty() {
            return Err(FsError::PathError);
        }

        let mut guard = self.lock_state();
        let st = &mut *guard;
        if st.handles.len() >= self.inner.config.max_open_handles {
            return Err(FsError::TooManyOpenHandles);
        }

        // An absent or non-directory parent is simply "not found".
        let parent = resolve_mut(&mut st.root, &parent_path).ok_or(FsError::NotFound)?;
        let NodeKind::Directory { children } = &mut parent.kind else {
            return Err(FsError::NotFound);
        };

        if options.truncate {
            match children.get(&name) {
                None => {
                    children.insert(name.clone(), Node::new_file(&name));
                }
                Some(existing) if existing.is_dir() => return Err(FsError::ResourceInvalid),
                Some(existing) if existing.is_locked() => return Err(FsError::ResourceLocked),
                Some(_) => {}
            }
        } else {
            match children.get(&name) {
                None => return Err(FsError::NotFound),
                Some(existing) if existing.is_dir() => return Err(FsError::ResourceInvalid),
                Some(existing) if options.append && existing.is_locked() => {
                    return Err(FsError::ResourceLocked)
                }
                Some(_) => {}
            }
        }

        let node = children.get_mut(&name).ok_or(FsError::NotFound)?;
        node.times.accessed = SystemTime::now();
        let NodeKind::File {
            data,
            open_handles,
            lock_count,
        } = &mut node.kind
        else {
            return Err(FsError::ResourceInvalid);
        };

        let value = if options.truncate {
            Vec::new()
        } else {
            data.clone().unwrap_or_default()
        };
        let (buf, pos) = if options.truncate {
            (value, 0)
        } else if options.read && options.write {
            // Read-write opens start at the beginning, even with `a+`.
            (value, 0)
        } else if options.append {
            let len = value.len();
            (value, len)
        } else {
            (value, 0)
        };

        let id = HandleId(st.next_handle_id);
        st.next_handle_id += 1;
        open_handles.insert(id);
        *lock_count += 1;

        st.handles.insert(
            id,
            HandleState {
                path: path.clone(),
                options: options.clone(),
                buf,
                pos,
            },
        );
        Ok(MemFile::new(self.clone(), id))
    }

    pub(crate) fn handle_read(&self, id: HandleId, out: &mut [u8]) -> FsResult<usize> {
        let mut guard = self.lock_state();
        let state = guard.handles.get_mut(&id).ok_or(FsError::HandleClosed)?;
        let available = state.buf.len().saturating_sub(state.pos);
        let n = available.min(out.len());
        out[..n].copy_from_slice(&state.buf[state.pos..state.pos + n]);
        state.pos += n;
        Ok(n)
    }

    pub(crate) fn handle_write(&self, id: HandleId, data: &[u8]) -> FsResult<usize> {
        let mut guard = self.lock_state();
        let st = &mut *guard;
        let state = st.handles.get_mut(&id).ok_or(FsError::HandleClosed)?;
        let pos = state.pos;
        // A seek past the end leaves a zero-filled gap, like a sparse write.
        if state.buf.len() < pos {
            state.buf.resize(pos, 0);
        }
        let end = pos + data.len();
        if state.buf.len() < end {
            state.buf.resize(end, 0);
        }
        state.buf[pos..end].copy_from_slice(data);
        state.pos = end;
        let node_path = state.path.clone();

        // The modified time refreshes immediately; content only lands in the
        // node on flush/close.
        if let Some(node) = resolve_mut(&mut st.root, &node_path) {
            node.times.modified = SystemTime::now();
        }
        Ok(data.len())
    }

    pub(crate) fn handle_flush(&self, id: HandleId) -> FsResult<()> {
        let mut guard = self.lock_state();
        let st = &mut *guard;
        let state = st.handles.get(&id).ok_or(FsError::HandleClosed)?;
        let (node_path, buf) = (state.path.clone(), state.buf.clone());
        if let Some(node) = resolve_mut(&mut st.root, &node_path) {
            if let NodeKind::File { data, .. } = &mut node.kind {
                *data = Some(buf);
            }
        }
        Ok(())
    }

    pub(crate) fn handle_seek(&self, id: HandleId, pos: SeekFrom) -> FsResult<u64> {
        let mut guard = self.lock_state();
        let state = guard.handles.get_mut(&id).ok_or(FsError::HandleClosed)?;
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(offset) => state.buf.len() as i64 + offset,
            SeekFrom::Current(offset) => state.pos as i64 + offset,
        };
        if target < 0 {
            return Err(FsError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file",
            )));
        }
        state.pos = target as usize;
        Ok(target as u64)
    }

    pub(crate) fn handle_truncate(&self, id: HandleId, size: u64) -> FsResult<()> {
        let mut guard = self.lock_state();
        let state = guard.handles.get_mut(&id).ok_or(FsError::HandleClosed)?;
        state.buf.resize(size as usize, 0);
        Ok(())
    }

    pub(crate) fn close_handle(&self, id: HandleId) -> FsResult<()> {
        self.lock_state().release_handle(id, true)
    }

    fn xattr_snapshot(&self, path: &str) -> FsResult<HashMap<String, Vec<u8>>> {
        let path = path::normalize(path);
        let guard = self.lock_state();
        let node = resolve(&guard.root, &path).ok_or(FsError::NotFound)?;
        Ok(node.xattrs.clone())
    }

    fn merge_xattrs(&self, path: &str, xattrs: HashMap<String, Vec<u8>>) {
        let path = path::normalize(path);
        let mut guard = self.lock_state();
        if let Some(node) = resolve_mut(&mut guard.root, &path) {
            node.xattrs.extend(xattrs);
        }
    }

    #[cfg(test)]
    pub(crate) fn lock_count_of(&self, path: &str) -> Option<u32> {
        let guard = self.lock_state();
        match resolve(&guard.root, &path::normalize(path)) {
            Some(node) => match &node.kind {
                NodeKind::File { lock_count, .. } => Some(*lock_count),
                NodeKind::Directory { .. } => None,
            },
            None => None,
        }
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for MemoryFs {
    fn open(&self, path: &str, options: &OpenOptions) -> FsResult<Box<dyn VfsFile>> {
        Ok(Box::new(self.open_file(path, options)?))
    }

    fn make_dir(&self, path: &str, recursive: bool, allow_recreate: bool) -> FsResult<()> {
        let path = path::normalize(path);
        let (parent_path, name) = path::split(&path);
        if name.is_empty() {
            return Err(FsError::PathError);
        }

        let mut guard = self.lock_state();
        let st = &mut *guard;

        let parent = if recursive {
            // Create every missing intermediate directory along the parent
            // chain, reusing existing ones.
            let mut current = &mut st.root;
            for component in path::components(&parent_path) {
                let NodeKind::Directory { children } = &mut current.kind else {
                    return Err(FsError::ResourceInvalid);
                };
                current = children
                    .entry(component.to_string())
                    .or_insert_with(|| Node::new_dir(component));
            }
            current
        } else {
            match resolve_mut(&mut st.root, &parent_path) {
                None => return Err(FsError::ParentMissing),
                Some(parent) if parent.is_file() => return Err(FsError::ResourceInvalid),
                Some(parent) => parent,
            }
        };

        let NodeKind::Directory { children } = &mut parent.kind else {
            return Err(FsError::ResourceInvalid);
        };
        match children.get(&name) {
            Some(existing) if existing.is_dir() => {
                if allow_recreate {
                    Ok(())
                } else {
                    Err(FsError::DestinationExists)
                }
            }
            Some(_) => Err(FsError::ResourceInvalid),
            None => {
                children.insert(name.clone(), Node::new_dir(&name));
                Ok(())
            }
        }
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        let path = path::normalize(path);
        let mut guard = self.lock_state();
        let st = &mut *guard;

        let open_ids: Vec<HandleId> = {
            let node = resolve(&st.root, &path).ok_or(FsError::NotFound)?;
            if node.is_dir() {
                return Err(FsError::ResourceInvalid);
            }
            match &node.kind {
                NodeKind::File { open_handles, .. } => open_handles.iter().copied().collect(),
                NodeKind::Directory { .. } => Vec::new(),
            }
        };

        // Deletion proceeds regardless of lock state: orphan every live
        // handle (each close flushes and commits) instead of failing.
        if !open_ids.is_empty() {
            tracing::debug!(
                "force-closing {} open handle(s) before removing {}",
                open_ids.len(),
                path
            );
            for id in open_ids {
                st.release_handle(id, false)?;
            }
        }

        let (parent_path, name) = path::split(&path);
        let parent = resolve_mut(&mut st.root, &parent_path).ok_or(FsError::NotFound)?;
        if let NodeKind::Directory { children } = &mut parent.kind {
            children.remove(&name);
        }
        Ok(())
    }

    fn remove_dir(&self, path: &str, recursive: bool, force: bool) -> FsResult<()> {
        let path = path::normalize(path);
        if path == "/" {
            // Root is never removed.
            return Err(FsError::ResourceInvalid);
        }

        let mut guard = self.lock_state();
        let st = &mut *guard;
        {
            let node = resolve(&st.root, &path).ok_or(FsError::NotFound)?;
            // Directories never hold handle claims; the check is kept for
            // symmetry with files.
            if node.is_locked() {
                return Err(FsError::ResourceLocked);
            }
            let NodeKind::Directory { children } = &node.kind else {
                return Err(FsError::ResourceInvalid);
            };
            if !children.is_empty() && !force {
                return Err(FsError::DirectoryNotEmpty);
            }
        }

        if recursive {
            // Walk upward, removing each ancestor entry from its own parent
            // until the component chain is exhausted.
            tracing::debug!("removing directory chain upward from {}", path);
            let mut current = path;
            while current != "/" {
                let (parent_path, name) = path::split(&current);
                if let Some(parent) = resolve_mut(&mut st.root, &parent_path) {
                    if let NodeKind::Directory { children } = &mut parent.kind {
                        children.remove(&name);
                    }
                }
                current = parent_path;
            }
        } else {
            let (parent_path, name) = path::split(&path);
            let parent = resolve_mut(&mut st.root, &parent_path).ok_or(FsError::NotFound)?;
            if let NodeKind::Directory { children } = &mut parent.kind {
                children.remove(&name);
            }
        }
        Ok(())
    }

    fn rename(&self, src: &str, dst: &str) -> FsResult<()> {
        let src = path::normalize(src);
        let dst = path::normalize(dst);

        let mut guard = self.lock_state();
        let st = &mut *guard;

        if resolve(&st.root, &src).is_none() {
            return Err(FsError::NotFound);
        }
        if resolve(&st.root, &dst).is_some() {
            return Err(FsError::DestinationExists);
        }
        if src == "/" {
            return Err(FsError::ResourceInvalid);
        }
        // Moving a node underneath itself would orphan the subtree.
        if dst.starts_with(&format!("{}/", src)) {
            return Err(FsError::ResourceInvalid);
        }

        let (src_parent_path, src_name) = path::split(&src);
        let (dst_parent_path, dst_name) = path::split(&dst);
        match resolve(&st.root, &dst_parent_path) {
            Some(parent) if parent.is_dir() => {}
            _ => return Err(FsError::ParentMissing),
        }

        // Flush pending writes and repoint live handles so they stay valid
        // after the move.
        let open_ids: Vec<HandleId> = st
            .handles
            .iter()
            .filter(|(_, state)| state.path == src)
            .map(|(&id, _)| id)
            .collect();
        if !open_ids.is_empty() {
            tracing::debug!(
                "repointing {} live handle(s) from {} to {}",
                open_ids.len(),
                src,
                dst
            );
        }
        for id in &open_ids {
            if let Some(state) = st.handles.get(id) {
                let buf = state.buf.clone();
                if let Some(node) = resolve_mut(&mut st.root, &src) {
                    if let NodeKind::File { data, .. } = &mut node.kind {
                        *data = Some(buf);
                    }
                }
            }
            if let Some(state) = st.handles.get_mut(id) {
                state.path = dst.clone();
            }
        }

        let src_parent = resolve_mut(&mut st.root, &src_parent_path).ok_or(FsError::NotFound)?;
        let src_xattrs = src_parent.xattrs.clone();
        let NodeKind::Directory { children } = &mut src_parent.kind else {
            return Err(FsError::NotFound);
        };
        let mut node = children.remove(&src_name).ok_or(FsError::NotFound)?;
        node.name = dst_name.clone();

        let dst_parent =
            resolve_mut(&mut st.root, &dst_parent_path).ok_or(FsError::ParentMissing)?;
        // The source parent's attributes ride along; source wins on key
        // conflicts.
        dst_parent.xattrs.extend(src_xattrs);
        let NodeKind::Directory { children } = &mut dst_parent.kind else {
            return Err(FsError::ParentMissing);
        };
        children.insert(dst_name, node);
        Ok(())
    }

    fn set_times(
        &self,
        path: &str,
        accessed: Option<SystemTime>,
        modified: Option<SystemTime>,
    ) -> FsResult<bool> {
        let path = path::normalize(path);
        let mut guard = self.lock_state();
        match resolve_mut(&mut guard.root, &path) {
            Some(node) => {
                let now = SystemTime::now();
                node.times.accessed = accessed.unwrap_or(now);
                node.times.modified = modified.unwrap_or(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn metadata(&self, path: &str) -> FsResult<ResourceInfo> {
        let path = path::normalize(path);
        let guard = self.lock_state();
        let node = resolve(&guard.root, &path).ok_or(FsError::NotFound)?;
        Ok(if node.is_dir() {
            ResourceInfo {
                times: node.times,
                is_dir: true,
                size: None,
                mode: DIR_MODE,
            }
        } else {
            ResourceInfo {
                times: node.times,
                is_dir: false,
                size: Some(node.content_len()),
                mode: FILE_MODE,
            }
        })
    }

    fn read_dir(&self, path: &str, options: &ListOptions) -> FsResult<Vec<String>> {
        let path = path::normalize(path);
        let guard = self.lock_state();
        let node = resolve(&guard.root, &path).ok_or(FsError::NotFound)?;
        let NodeKind::Directory { children } = &node.kind else {
            return Err(FsError::ResourceInvalid);
        };
        let names: Vec<String> = children.keys().cloned().collect();
        list::filter_entries(&path, names, options, |name| {
            children.get(name).map(|child| child.is_dir()).unwrap_or(false)
        })
    }

    fn set_xattr(&self, path: &str, key: &str, value: &[u8]) -> FsResult<()> {
        let path = path::normalize(path);
        let mut guard = self.lock_state();
        let node = resolve_mut(&mut guard.root, &path).ok_or(FsError::NotFound)?;
        node.xattrs.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_xattr(&self, path: &str, key: &str) -> FsResult<Option<Vec<u8>>> {
        let path = path::normalize(path);
        let guard = self.lock_state();
        let node = resolve(&guard.root, &path).ok_or(FsError::NotFound)?;
        Ok(node.xattrs.get(key).cloned())
    }

    fn del_xattr(&self, path: &str, key: &str) -> FsResult<()> {
        let path = path::normalize(path);
        let mut guard = self.lock_state();
        let node = resolve_mut(&mut guard.root, &path).ok_or(FsError::NotFound)?;
        // A missing key is not an error.
        node.xattrs.remove(key);
        Ok(())
    }

    fn list_xattrs(&self, path: &str) -> FsResult<Vec<String>> {
        let path = path::normalize(path);
        let guard = self.lock_state();
        let node = resolve(&guard.root, &path).ok_or(FsError::NotFound)?;
        Ok(node.xattrs.keys().cloned().collect())
    }

    fn describe(&self, path: &str) -> FsResult<String> {
        let info = self.metadata(path)?;
        Ok(if info.is_dir {
            "memory dir".to_string()
        } else {
            "memory file".to_string()
        })
    }

    // The generic byte-copy algorithms have no notion of extended
    // attributes, so snapshot them before delegating and merge afterward.

    fn copy_file(&self, src: &str, dst: &str, overwrite: bool) -> FsResult<()> {
        let xattrs = self.xattr_snapshot(src)?;
        ops::copy_file(self, src, dst, overwrite)?;
        self.merge_xattrs(dst, xattrs);
        Ok(())
    }

    fn move_file(&self, src: &str, dst: &str, overwrite: bool) -> FsResult<()> {
        let xattrs = self.xattr_snapshot(src)?;
        ops::move_file(self, src, dst, overwrite)?;
        self.merge_xattrs(dst, xattrs);
        Ok(())
    }

    fn copy_dir(&self, src: &str, dst: &str, overwrite: bool) -> FsResult<()> {
        let xattrs = self.xattr_snapshot(src)?;
        ops::copy_dir(self, src, dst, overwrite)?;
        self.merge_xattrs(dst, xattrs);
        Ok(())
    }

    fn move_dir(&self, src: &str, dst: &str, overwrite: bool) -> FsResult<()> {
        let xattrs = self.xattr_snapshot(src)?;
        ops::move_dir(self, src, dst, overwrite)?;
        self.merge_xattrs(dst, xattrs);
        Ok(())
    }
}
