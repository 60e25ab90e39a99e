// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! QuayFS API: the filesystem abstraction contract
//!
//! Every QuayFS backend (in-memory, OS-backed, archive, ...) implements the
//! [`Filesystem`] trait defined here, so callers can swap storage backends
//! behind an identical contract. This crate also carries the pieces the
//! contract promises to backends: the shared error taxonomy, path-string
//! utilities, the directory-listing filter helper, and generic copy/move
//! algorithms built purely from the trait's open/read/write primitives.

pub mod error;
pub mod file;
pub mod fs;
pub mod list;
pub mod ops;
pub mod path;
pub mod types;

pub use error::{FsError, FsResult};
pub use file::VfsFile;
pub use fs::Filesystem;
pub use types::{ListOptions, OpenOptions, ResourceInfo, Timestamps};
