// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Exercises the in-memory backend strictly through the backend contract,
//! the way a caller holding any `Filesystem` implementation would.

use std::io::{Read, Write};

use quayfs_api::{Filesystem, ListOptions, OpenOptions};
use quayfs_memory::MemoryFs;

fn backend() -> Box<dyn Filesystem> {
    Box::new(MemoryFs::new())
}

#[test]
fn full_session_through_the_trait_object() {
    let fs = backend();
    fs.make_dir("/store/inbox", true, false).expect("create tree");

    let mut file = fs.open("/store/inbox/msg", &OpenOptions::write()).expect("open for write");
    file.write_all(b"hello contract").expect("write");
    file.close().expect("close");

    let mut file = fs
        .open("/store/inbox/msg", &OpenOptions::from_mode("r"))
        .expect("open for read");
    let mut content = String::new();
    file.read_to_string(&mut content).expect("read");
    assert_eq!(content, "hello contract");
    drop(file);

    fs.set_xattr("/store/inbox/msg", "seen", b"false").expect("set xattr");
    fs.rename("/store/inbox/msg", "/store/inbox/msg-1").expect("rename");
    assert!(fs.is_file("/store/inbox/msg-1"));
    assert_eq!(
        fs.get_xattr("/store/inbox/msg-1", "seen").expect("get xattr"),
        Some(b"false".to_vec())
    );

    let names = fs.read_dir("/store/inbox", &ListOptions::default()).expect("list");
    assert_eq!(names, vec!["msg-1".to_string()]);

    fs.remove("/store/inbox/msg-1").expect("remove file");
    fs.remove_dir("/store/inbox", true, false).expect("remove directory chain");
    assert!(!fs.exists("/store"));
}

#[test]
fn generic_copy_defaults_apply_to_any_backend() {
    let fs = backend();
    fs.make_dir("/src", false, false).expect("make src");

    let mut file = fs.open("/src/a", &OpenOptions::write()).expect("open");
    file.write_all(b"generic bytes").expect("write");
    file.close().expect("close");

    fs.copy_dir("/src", "/dst", false).expect("copy tree");
    assert!(fs.is_file("/dst/a"));

    let mut copied = fs.open("/dst/a", &OpenOptions::from_mode("r")).expect("open copy");
    let mut content = Vec::new();
    copied.read_to_end(&mut content).expect("read copy");
    assert_eq!(content, b"generic bytes");
}
