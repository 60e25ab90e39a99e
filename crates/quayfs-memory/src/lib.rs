// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory backend for the QuayFS filesystem abstraction
//!
//! [`MemoryFs`] keeps the whole tree in process memory behind one
//! serialization lock, which makes it extremely fast but non-permanent: the
//! tree is volatile and fully lost on process exit. That is the intended
//! contract for this backend; it is a drop-in [`quayfs_api::Filesystem`]
//! for tests, caches and scratch space.

mod config;
mod fs;
mod handle;
mod node;

pub use config::MemoryFsConfig;
pub use fs::MemoryFs;
pub use handle::MemFile;
