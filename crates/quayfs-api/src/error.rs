// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types shared by every QuayFS backend

use std::io;

/// Filesystem error type
#[derive(thiserror::Error, Debug)]
pub enum FsError {
    /// No node at the given path.
    #[error("not found")]
    NotFound,
    /// A node exists but has the wrong type for the operation.
    #[error("resource invalid")]
    ResourceInvalid,
    /// The target path is already occupied.
    #[error("destination exists")]
    DestinationExists,
    /// An intermediate directory is absent for a non-recursive create.
    #[error("parent directory missing")]
    ParentMissing,
    /// The node has active exclusivity claims incompatible with the operation.
    #[error("resource locked")]
    ResourceLocked,
    /// Non-forced removal of a populated directory.
    #[error("directory not empty")]
    DirectoryNotEmpty,
    /// Malformed or empty path argument.
    #[error("path error")]
    PathError,
    /// Unlock without a matching lock. Internal invariant violation; must not
    /// surface to callers under correct engine behavior.
    #[error("lock count mismatch")]
    LockMismatch,
    /// Operation on a handle that has been closed (explicitly or by a forced
    /// removal of its node).
    #[error("handle is closed")]
    HandleClosed,
    /// The configured open-handle limit was reached.
    #[error("too many open handles")]
    TooManyOpenHandles,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type FsResult<T> = Result<T, FsError>;

impl From<FsError> for io::Error {
    fn from(err: FsError) -> Self {
        match err {
            FsError::Io(e) => e,
            other => {
                let kind = match &other {
                    FsError::NotFound => io::ErrorKind::NotFound,
                    FsError::DestinationExists => io::ErrorKind::AlreadyExists,
                    FsError::ResourceLocked => io::ErrorKind::WouldBlock,
                    FsError::PathError => io::ErrorKind::InvalidInput,
                    _ => io::ErrorKind::Other,
                };
                io::Error::new(kind, other)
            }
        }
    }
}
