// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Generic copy/move algorithms
//!
//! Built entirely from the [`Filesystem`] primitives (open source for read,
//! open destination for write, stream bytes, close both), so every backend
//! gets them without extra work. They have no notion of backend-specific
//! metadata such as extended attributes; backends that carry such metadata
//! override the trait methods and delegate back here for the byte transfer.

use std::io;

use crate::error::{FsError, FsResult};
use crate::fs::Filesystem;
use crate::path;
use crate::types::{ListOptions, OpenOptions};

/// Copy a single file by streaming its bytes.
pub fn copy_file<F: Filesystem + ?Sized>(
    fs: &F,
    src: &str,
    dst: &str,
    overwrite: bool,
) -> FsResult<()> {
    if !overwrite && fs.exists(dst) {
        return Err(FsError::DestinationExists);
    }
    if fs.is_dir(src) {
        return Err(FsError::ResourceInvalid);
    }
    let mut reader = fs.open(src, &OpenOptions::read())?;
    let mut writer = fs.open(dst, &OpenOptions::write())?;
    io::copy(&mut reader, &mut writer)?;
    writer.close()?;
    reader.close()?;
    Ok(())
}

/// Copy a file, then remove the source.
pub fn move_file<F: Filesystem + ?Sized>(
    fs: &F,
    src: &str,
    dst: &str,
    overwrite: bool,
) -> FsResult<()> {
    copy_file(fs, src, dst, overwrite)?;
    fs.remove(src)
}

/// Recursively copy a directory tree.
///
/// Individual files are copied through [`Filesystem::copy_file`] so backend
/// overrides apply per file.
pub fn copy_dir<F: Filesystem + ?Sized>(
    fs: &F,
    src: &str,
    dst: &str,
    overwrite: bool,
) -> FsResult<()> {
    if !fs.is_dir(src) {
        return Err(FsError::ResourceInvalid);
    }
    if !overwrite && fs.exists(dst) {
        return Err(FsError::DestinationExists);
    }
    fs.make_dir(dst, true, true)?;
    for name in fs.read_dir(src, &ListOptions::default())? {
        let src_child = path::join(src, &name);
        let dst_child = path::join(dst, &name);
        if fs.is_dir(&src_child) {
            copy_dir(fs, &src_child, &dst_child, true)?;
        } else {
            fs.copy_file(&src_child, &dst_child, true)?;
        }
    }
    Ok(())
}

/// Copy a directory tree, then force-remove the source directory.
pub fn move_dir<F: Filesystem + ?Sized>(
    fs: &F,
    src: &str,
    dst: &str,
    overwrite: bool,
) -> FsResult<()> {
    copy_dir(fs, src, dst, overwrite)?;
    fs.remove_dir(src, false, true)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Seek, SeekFrom, Write};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::file::VfsFile;
    use crate::fs::MockFilesystem;

    /// Minimal [`VfsFile`] used to stub `open` expectations.
    struct StubFile {
        data: Cursor<Vec<u8>>,
        sink: Option<Arc<Mutex<Vec<u8>>>>,
    }

    impl StubFile {
        fn reader(content: &[u8]) -> Self {
            Self {
                data: Cursor::new(content.to_vec()),
                sink: None,
            }
        }

        fn writer(sink: Arc<Mutex<Vec<u8>>>) -> Self {
            Self {
                data: Cursor::new(Vec::new()),
                sink: Some(sink),
            }
        }
    }

    impl Read for StubFile {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.data.read(buf)
        }
    }

    impl Write for StubFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if let Some(sink) = &self.sink {
                sink.lock().unwrap().extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for StubFile {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.data.seek(pos)
        }
    }

    impl VfsFile for StubFile {
        fn truncate(&mut self, _size: u64) -> FsResult<()> {
            Ok(())
        }

        fn close(&mut self) -> FsResult<()> {
            Ok(())
        }
    }

    #[test]
    fn copy_file_streams_bytes_between_opens() {
        let mut fs = MockFilesystem::new();
        let sink = Arc::new(Mutex::new(Vec::new()));
        let sink_for_open = sink.clone();

        fs.expect_exists().withf(|p| p == "/dst.txt").return_const(false);
        fs.expect_is_dir().withf(|p| p == "/src.txt").return_const(false);
        fs.expect_open()
            .withf(|p, o| p == "/src.txt" && o.read)
            .returning(|_, _| Ok(Box::new(StubFile::reader(b"quay bytes"))));
        fs.expect_open()
            .withf(|p, o| p == "/dst.txt" && o.truncate)
            .returning(move |_, _| Ok(Box::new(StubFile::writer(sink_for_open.clone()))));

        copy_file(&fs, "/src.txt", "/dst.txt", false).expect("copy should succeed");
        assert_eq!(sink.lock().unwrap().as_slice(), b"quay bytes");
    }

    #[test]
    fn copy_file_refuses_existing_destination() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().withf(|p| p == "/dst").return_const(true);

        let err = copy_file(&fs, "/src", "/dst", false).unwrap_err();
        assert!(matches!(err, FsError::DestinationExists));
    }

    #[test]
    fn move_file_removes_source_after_copy() {
        let mut fs = MockFilesystem::new();
        let sink = Arc::new(Mutex::new(Vec::new()));

        fs.expect_exists().return_const(false);
        fs.expect_is_dir().return_const(false);
        fs.expect_open()
            .withf(|p, _| p == "/from")
            .returning(|_, _| Ok(Box::new(StubFile::reader(b"payload"))));
        fs.expect_open()
            .withf(|p, _| p == "/to")
            .returning(move |_, _| Ok(Box::new(StubFile::writer(sink.clone()))));
        fs.expect_remove()
            .withf(|p| p == "/from")
            .times(1)
            .returning(|_| Ok(()));

        move_file(&fs, "/from", "/to", false).expect("move should succeed");
    }
}
