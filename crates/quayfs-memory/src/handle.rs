// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Open-handle state and the caller-facing file object

use std::io::{self, Read, Seek, SeekFrom, Write};

use quayfs_api::types::OpenOptions;
use quayfs_api::{FsResult, VfsFile};

use crate::fs::MemoryFs;

/// Opaque handle identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleId(pub(crate) u64);

/// Engine-side state for one open handle.
///
/// The buffer is private to the handle; content only lands in the node on
/// flush or close. `path` is the node's location at open time and is
/// repointed by the engine when the node is renamed.
#[derive(Debug)]
pub(crate) struct HandleState {
    pub path: String,
    #[allow(dead_code)] // Recorded for diagnostics; mode rules apply at open time
    pub options: OpenOptions,
    pub buf: Vec<u8>,
    pub pos: usize,
}

/// A buffered view over a file node's bytes.
///
/// Reads and writes go to a private buffer seeded at open time; `flush`
/// commits the buffer into the node without closing, `close` commits and
/// releases the handle's claim. Dropping an unclosed `MemFile` closes it.
/// After the engine force-closes the handle (forced removal of its node),
/// every operation fails with a closed-handle error.
pub struct MemFile {
    fs: MemoryFs,
    id: HandleId,
}

impl std::fmt::Debug for MemFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemFile").field("id", &self.id).finish()
    }
}

impl MemFile {
    pub(crate) fn new(fs: MemoryFs, id: HandleId) -> Self {
        Self { fs, id }
    }
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fs.handle_read(self.id, buf).map_err(Into::into)
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.fs.handle_write(self.id, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.fs.handle_flush(self.id).map_err(Into::into)
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.fs.handle_seek(self.id, pos).map_err(Into::into)
    }
}

impl VfsFile for MemFile {
    fn truncate(&mut self, size: u64) -> FsResult<()> {
        self.fs.handle_truncate(self.id, size)
    }

    fn close(&mut self) -> FsResult<()> {
        self.fs.close_handle(self.id)
    }
}

impl Drop for MemFile {
    fn drop(&mut self) {
        // Guaranteed cleanup; closing twice is a no-op.
        let _ = self.fs.close_handle(self.id);
    }
}
