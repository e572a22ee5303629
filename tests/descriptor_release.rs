//! Descriptor and mapping accounting for handle lifecycles.
//!
//! Kept in its own test binary with a single test so no concurrently running
//! test opens descriptors while they are being counted.
#![cfg(target_os = "linux")]

use rvfs::file_handler::{BackendKind, MapFn, Platform};
use rvfs::{AccessHints, AccessMode, FileHandle, OpenOptions};
use std::io;

fn open_descriptors() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .expect("Failed to list /proc/self/fd")
        .count()
}

fn is_mapped(path: &str) -> bool {
    std::fs::read_to_string("/proc/self/maps")
        .expect("Failed to read /proc/self/maps")
        .lines()
        .any(|line| line.contains(path))
}

fn refuse_mapping(_: &std::fs::File) -> io::Result<memmap2::Mmap> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "mapping disabled"))
}

#[test]
fn close_returns_every_descriptor_and_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().canonicalize().unwrap().join("fd.bin");
    let path = path.to_str().unwrap().to_string();

    let failing_map: MapFn = refuse_mapping;
    let fallback = OpenOptions {
        platform: Platform {
            mmap_supported: true,
            map: failing_map,
        },
        ..OpenOptions::default()
    };

    let cases = [
        ("buffered read", AccessMode::Read, AccessHints::empty(), OpenOptions::default(), BackendKind::Buffered),
        ("buffered write", AccessMode::ReadWrite, AccessHints::empty(), OpenOptions::default(), BackendKind::Buffered),
        ("unbuffered", AccessMode::Read, AccessHints::UNBUFFERED, OpenOptions::default(), BackendKind::Unbuffered),
        ("mapped", AccessMode::Read, AccessHints::MEMORY_MAP, OpenOptions::default(), BackendKind::MemoryMapped),
        ("mapping fallback", AccessMode::Read, AccessHints::MEMORY_MAP, fallback, BackendKind::Unbuffered),
    ];

    let baseline = open_descriptors();
    for (name, mode, hints, options, kind) in cases {
        std::fs::write(&path, vec![7u8; 64 * 1024]).unwrap();
        let mut handle = FileHandle::open_with(&path, mode, hints, &options).unwrap();
        assert_eq!(handle.backend_kind(), kind, "{name}");
        assert_eq!(open_descriptors(), baseline + 1, "{name} holds one descriptor");
        assert_eq!(is_mapped(&path), kind == BackendKind::MemoryMapped, "{name}");

        if mode.is_writable() {
            // Left pending in the scratch buffer until close
            assert_eq!(handle.write(b"dirty").unwrap(), 5, "{name}");
        } else {
            let mut buf = [0u8; 100];
            assert_eq!(handle.read(&mut buf).unwrap(), 100, "{name}");
        }

        handle.close().unwrap();
        assert_eq!(open_descriptors(), baseline, "{name} leaked a descriptor");
        assert!(!is_mapped(&path), "{name} left the file mapped");
    }

    // A failed open leaves nothing behind either
    let missing = dir.path().join("missing.bin");
    assert!(FileHandle::open(missing.to_str().unwrap(), AccessMode::Read, AccessHints::empty()).is_err());
    assert_eq!(open_descriptors(), baseline);
}
