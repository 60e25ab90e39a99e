// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration for the in-memory backend

use serde::{Deserialize, Serialize};

/// Tunables for a [`crate::MemoryFs`] instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryFsConfig {
    /// Upper bound on concurrently open handles across the whole tree.
    pub max_open_handles: usize,
}

impl Default for MemoryFsConfig {
    fn default() -> Self {
        Self {
            max_open_handles: 1024,
        }
    }
}
