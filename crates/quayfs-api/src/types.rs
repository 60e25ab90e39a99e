// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Core type definitions for the QuayFS contract

use std::time::SystemTime;

/// Creation/modification/access times of a tree entry.
///
/// All three are assigned at creation and kept monotonically non-decreasing
/// by the backend on each relevant access or mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamps {
    pub created: SystemTime,
    pub modified: SystemTime,
    pub accessed: SystemTime,
}

impl Timestamps {
    pub fn now() -> Self {
        let now = SystemTime::now();
        Self {
            created: now,
            modified: now,
            accessed: now,
        }
    }
}

/// File open options
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub truncate: bool,
}

impl OpenOptions {
    /// Read-only open of an existing file.
    pub fn read() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    /// Truncating write open; creates the file if absent.
    pub fn write() -> Self {
        Self {
            write: true,
            truncate: true,
            ..Self::default()
        }
    }

    /// Appending write open of an existing file.
    pub fn append() -> Self {
        Self {
            write: true,
            append: true,
            ..Self::default()
        }
    }

    /// Parse a classic mode string: `r`, `w`, `a`, each optionally combined
    /// with `+` for read-write; `b` and `t` qualifiers are accepted and
    /// ignored. A string with no recognized flag falls back to a plain read.
    pub fn from_mode(mode: &str) -> Self {
        let mut opts = Self::default();
        for ch in mode.chars() {
            match ch {
                'r' => opts.read = true,
                'w' => {
                    opts.write = true;
                    opts.truncate = true;
                }
                'a' => {
                    opts.write = true;
                    opts.append = true;
                }
                '+' => {
                    opts.read = true;
                    opts.write = true;
                }
                _ => {}
            }
        }
        if !opts.read && !opts.write {
            opts.read = true;
        }
        opts
    }
}

/// Resource metadata returned by [`crate::Filesystem::metadata`]
#[derive(Clone, Debug)]
pub struct ResourceInfo {
    pub times: Timestamps,
    pub is_dir: bool,
    /// Current content length in bytes; `None` for directories. A file whose
    /// content was never committed reports zero.
    pub size: Option<u64>,
    /// Fixed POSIX-style mode bits (file-type bits plus permissions).
    pub mode: u32,
}

/// Filters applied by [`crate::Filesystem::read_dir`]
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    /// Shell-style wildcard matched against entry names (`*.txt`).
    pub wildcard: Option<String>,
    /// Render entries as root-relative paths instead of bare names.
    pub full: bool,
    /// Render entries as absolute paths; implies `full`.
    pub absolute: bool,
    pub dirs_only: bool,
    pub files_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_string_parses_classic_tokens() {
        assert_eq!(OpenOptions::from_mode("r"), OpenOptions::read());
        assert_eq!(OpenOptions::from_mode("w"), OpenOptions::write());
        assert_eq!(OpenOptions::from_mode("a"), OpenOptions::append());

        let rw = OpenOptions::from_mode("r+");
        assert!(rw.read && rw.write && !rw.truncate && !rw.append);

        let wp = OpenOptions::from_mode("w+");
        assert!(wp.read && wp.write && wp.truncate);

        let ap = OpenOptions::from_mode("a+");
        assert!(ap.read && ap.write && ap.append);
    }

    #[test]
    fn mode_string_ignores_qualifiers_and_defaults_to_read() {
        assert_eq!(OpenOptions::from_mode("rb"), OpenOptions::read());
        assert_eq!(OpenOptions::from_mode(""), OpenOptions::read());
        assert_eq!(OpenOptions::from_mode("x"), OpenOptions::read());
    }
}
