// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Caller-facing file object contract

use std::io::{Read, Seek, Write};

use crate::error::FsResult;

/// A live, per-open-session view over a file's bytes.
///
/// Implementations buffer their content privately and commit it back to the
/// owning node on flush and close. Closing is idempotent; dropping an
/// unclosed file must close it on every code path.
pub trait VfsFile: Read + Write + Seek + Send {
    /// Truncate (or zero-extend) the buffered content to `size` bytes.
    /// The cursor position is left unchanged.
    fn truncate(&mut self, size: u64) -> FsResult<()>;

    /// Commit buffered content and release this handle's claim on the node.
    /// Calling `close` a second time has no effect.
    fn close(&mut self) -> FsResult<()>;
}
