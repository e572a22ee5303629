//! The file handle and its lifecycle.
//!
//! A handle is created by [`FileHandle::open`], which encodes the path, lets
//! the [`BackendSelector`] acquire one backend, and probes the file size once.
//! Resources are released by [`FileHandle::close`] or, failing that, on drop.

use crate::config::VfsConfig;
use crate::error::{Result, VfsError};
use crate::file_handler::backend::{Backend, BackendKind};
use crate::file_handler::seek::{self, Whence};
use crate::file_handler::selector::{BackendSelector, Platform};
use crate::file_handler::{AccessHints, AccessMode};
use crate::path_encoding::encode_path;
use log::{debug, trace};
use std::io;

/// Scratch buffer size for buffered streams (16 KiB).
pub const DEFAULT_SCRATCH_SIZE: usize = 0x4000;

/// Knobs for opening a handle beyond mode and hints.
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    pub platform: Platform,
    pub scratch_size: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            platform: Platform::native(),
            scratch_size: DEFAULT_SCRATCH_SIZE,
        }
    }
}

impl OpenOptions {
    pub fn from_config(config: &VfsConfig) -> Self {
        let platform = if config.allow_mmap {
            Platform::native()
        } else {
            Platform::without_mmap()
        };
        Self {
            platform,
            scratch_size: config.scratch_size,
        }
    }
}

/// An open file backed by a buffered stream, a raw descriptor, or a
/// read-only memory mapping.
///
/// The size is measured once at open and is not refreshed by later writes.
/// A handle is not synchronized; every operation that moves the cursor
/// takes `&mut self`.
#[derive(Debug)]
pub struct FileHandle {
    path: String,
    mode: AccessMode,
    hints: AccessHints,
    size: i64,
    backend: Backend,
}

impl FileHandle {
    /// Open `path` with the default options.
    ///
    /// # Errors
    /// * `PathEncoding` if the path has no native representation
    /// * `UnsupportedAccessMode` for [`AccessMode::UpdateExisting`]
    /// * `OpenFailed` if the stream or descriptor cannot be acquired or the
    ///   size probe fails
    pub fn open(path: &str, mode: AccessMode, hints: AccessHints) -> Result<Self> {
        Self::open_with(path, mode, hints, &OpenOptions::default())
    }

    /// Open `path` with explicit platform and buffer options.
    pub fn open_with(
        path: &str,
        mode: AccessMode,
        hints: AccessHints,
        options: &OpenOptions,
    ) -> Result<Self> {
        let native = encode_path(path)?;
        let selector = BackendSelector::new(options.platform, options.scratch_size);
        let (backend, hints) = selector.acquire(&native, path, mode, hints)?;

        // From here on, returning early drops `handle` and with it the backend
        let mut handle = Self {
            path: path.to_owned(),
            mode,
            hints,
            size: 0,
            backend,
        };
        handle.size = handle.probe_size().map_err(|e| VfsError::OpenFailed {
            path: path.to_owned(),
            message: format!("Failed to determine size: {e}"),
            source: Some(e.into_io_error()),
        })?;

        debug!(
            "Opened {} with {:?} backend, size {}",
            handle.path,
            handle.backend.kind(),
            handle.size
        );
        Ok(handle)
    }

    fn probe_size(&mut self) -> Result<i64> {
        self.seek(0, Whence::End)?;
        let end = self.tell()?;
        self.seek(0, Whence::Set)?;

        i64::try_from(end).map_err(|_| {
            VfsError::seek_rejected(0, Whence::End, format!("size {end} exceeds i64"))
        })
    }

    /// Release every resource held by the handle.
    ///
    /// Buffered data is flushed first; a flush failure is reported, but the
    /// descriptor and scratch buffer are released regardless.
    pub fn close(self) -> Result<()> {
        debug!("Closing {} ({:?})", self.path, self.backend.kind());
        self.backend.close()
    }

    /// Move the cursor and return its new absolute position.
    ///
    /// On failure the cursor is left unchanged.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        trace!("seek {} {:?} on {}", offset, whence, self.path);
        seek::seek(&mut self.backend, offset, whence)
    }

    /// Read into `buf`, returning the number of bytes read. A count shorter
    /// than `buf.len()` means end of file was reached.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.backend.read(buf)
    }

    /// Write `data`, returning the number of bytes accepted.
    ///
    /// Always fails for memory-mapped handles.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.backend.write(data)
    }

    /// Write a single byte.
    pub fn put_byte(&mut self, byte: u8) -> Result<()> {
        match self.backend.write(&[byte])? {
            1 => Ok(()),
            _ => Err(VfsError::write_rejected("byte was not accepted")),
        }
    }

    /// Current cursor position.
    pub fn tell(&mut self) -> Result<u64> {
        self.backend.tell()
    }

    /// File size as measured at open.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Push buffered writes to the OS. No-op for unbuffered and mapped handles.
    pub fn flush(&mut self) -> Result<()> {
        self.backend.flush()
    }

    /// Stream error indicator: non-zero after a failed buffered read or
    /// write, always 0 for the other backends.
    pub fn last_error(&self) -> i32 {
        self.backend.last_error()
    }

    /// The UTF-8 path the handle was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    /// Hints in effect after selection and any mapping fallback.
    pub fn hints(&self) -> AccessHints {
        self.hints
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }
}

/// Remove the file (or empty directory) at `path`.
///
/// Returns `true` iff the OS removal succeeded.
pub fn delete(path: &str) -> bool {
    let native = match encode_path(path) {
        Ok(native) => native,
        Err(e) => {
            debug!("Not deleting {:?}: {}", path, e);
            return false;
        }
    };

    let result = match std::fs::symlink_metadata(&native) {
        Ok(metadata) if metadata.is_dir() => std::fs::remove_dir(&native),
        _ => std::fs::remove_file(&native),
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            debug!("Failed to delete {}: {}", path, e);
            false
        }
    }
}

impl io::Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        FileHandle::read(self, buf).map_err(VfsError::into_io_error)
    }
}

impl io::Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        FileHandle::write(self, buf).map_err(VfsError::into_io_error)
    }

    fn flush(&mut self) -> io::Result<()> {
        FileHandle::flush(self).map_err(VfsError::into_io_error)
    }
}

impl io::Seek for FileHandle {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, whence) = Whence::from_seek_from(pos).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek offset exceeds i64")
        })?;
        FileHandle::seek(self, offset, whence).map_err(VfsError::into_io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memmap2::Mmap;
    use std::fs::File;
    use tempfile::TempDir;

    fn temp_path(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_str().unwrap().to_string()
    }

    fn write_file(path: &str, content: &[u8]) {
        std::fs::write(path, content).expect("Failed to write test file");
    }

    #[test]
    fn test_open_probes_size_and_rewinds() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "size.bin");
        write_file(&path, b"0123456789");

        for hints in [
            AccessHints::empty(),
            AccessHints::UNBUFFERED,
            AccessHints::MEMORY_MAP,
        ] {
            let mut handle = FileHandle::open(&path, AccessMode::Read, hints).unwrap();
            assert_eq!(handle.size(), 10);
            assert_eq!(handle.tell().unwrap(), 0);
            handle.close().unwrap();
        }
    }

    #[cfg(any(unix, windows))]
    #[test]
    fn test_mmap_hint_yields_mapped_backend() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "mapped.bin");
        write_file(&path, b"abc");

        let handle = FileHandle::open(&path, AccessMode::Read, AccessHints::MEMORY_MAP).unwrap();
        assert_eq!(handle.backend_kind(), BackendKind::MemoryMapped);
        assert!(handle.hints().contains(AccessHints::UNBUFFERED));
        handle.close().unwrap();
    }

    #[test]
    fn test_mapping_failure_falls_back_to_descriptor() {
        fn refuse(_file: &File) -> io::Result<Mmap> {
            Err(io::Error::new(io::ErrorKind::Other, "refused"))
        }

        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "fallback.bin");
        write_file(&path, b"hello");

        let options = OpenOptions {
            platform: Platform {
                mmap_supported: true,
                map: refuse,
            },
            scratch_size: DEFAULT_SCRATCH_SIZE,
        };
        let mut handle =
            FileHandle::open_with(&path, AccessMode::Read, AccessHints::MEMORY_MAP, &options)
                .unwrap();

        assert_eq!(handle.backend_kind(), BackendKind::Unbuffered);
        assert!(!handle.hints().contains(AccessHints::MEMORY_MAP));
        assert_eq!(handle.size(), 5);

        let mut buf = [0u8; 5];
        assert_eq!(handle.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn test_update_existing_does_not_open() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "reserved.bin");
        write_file(&path, b"keep");

        let err = FileHandle::open(&path, AccessMode::UpdateExisting, AccessHints::empty())
            .unwrap_err();
        assert!(matches!(err, VfsError::UnsupportedAccessMode { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"keep");
    }

    #[test]
    fn test_put_byte_and_path() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "bytes.bin");

        let mut handle = FileHandle::open(&path, AccessMode::Write, AccessHints::empty()).unwrap();
        assert_eq!(handle.path(), path);
        assert_eq!(handle.access_mode(), AccessMode::Write);
        handle.put_byte(b'o').unwrap();
        handle.put_byte(b'k').unwrap();
        handle.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"ok");
    }

    #[test]
    fn test_size_is_not_refreshed_by_writes() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "grow.bin");

        let mut handle =
            FileHandle::open(&path, AccessMode::ReadWrite, AccessHints::empty()).unwrap();
        assert_eq!(handle.size(), 0);
        handle.write(b"grown").unwrap();
        handle.flush().unwrap();
        assert_eq!(handle.size(), 0);
        assert_eq!(handle.tell().unwrap(), 5);
    }

    #[test]
    fn test_unbuffered_seek_reports_true_cursor() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "cursor.bin");
        write_file(&path, b"0123456789");

        let mut handle = FileHandle::open(&path, AccessMode::Read, AccessHints::UNBUFFERED).unwrap();
        assert_eq!(handle.seek(4, Whence::Set).unwrap(), 4);
        assert_eq!(handle.seek(2, Whence::Cur).unwrap(), 6);
        assert_eq!(handle.seek(-1, Whence::End).unwrap(), 9);
        assert!(handle.seek(-1, Whence::Set).is_err());
        assert_eq!(handle.tell().unwrap(), 9);
    }

    #[test]
    fn test_std_io_traits() {
        use std::io::{Read, Seek, SeekFrom, Write};

        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "traits.bin");

        let mut handle =
            FileHandle::open(&path, AccessMode::ReadWrite, AccessHints::empty()).unwrap();
        Write::write_all(&mut handle, b"through std::io").unwrap();
        Seek::seek(&mut handle, SeekFrom::Start(8)).unwrap();

        let mut rest = String::new();
        Read::read_to_string(&mut handle, &mut rest).unwrap();
        assert_eq!(rest, "std::io");
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "gone.bin");
        write_file(&path, b"x");

        assert!(delete(&path));
        assert!(!delete(&path));

        let sub = temp_path(&dir, "empty_dir");
        std::fs::create_dir(&sub).unwrap();
        assert!(delete(&sub));
        assert!(!delete(""));
    }
}
