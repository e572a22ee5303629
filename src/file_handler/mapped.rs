//! Read-only memory-mapped backend.
//!
//! The whole file extent is mapped once at open. Since a mapping has no OS
//! cursor, the region keeps a logical one that never leaves `0..=len`.

use crate::error::{Result, VfsError};
use crate::file_handler::seek::{mapped_target, Whence};
use log::trace;
use memmap2::Mmap;
use std::fs::File;
use std::io;

/// Creates the read-only mapping for an open descriptor.
pub type MapFn = fn(&File) -> io::Result<Mmap>;

/// Map the full extent of `file` read-only.
pub fn map_read_only(file: &File) -> io::Result<Mmap> {
    // SAFETY: the mapping is read-only and only handed out as `&[u8]` copies.
    // Concurrent truncation by another process is outside our control, as with
    // any file mapping.
    unsafe { Mmap::map(file) }
}

/// A mapped file with a logical cursor.
#[derive(Debug)]
pub struct MappedRegion {
    // Field order matters: the mapping is dropped before the descriptor.
    map: Mmap,
    file: File,
    cursor: u64,
}

impl MappedRegion {
    /// Map `file` with `map_fn`. On failure the descriptor is handed back so
    /// the caller can keep using it unmapped.
    pub fn map(file: File, map_fn: MapFn) -> std::result::Result<Self, (File, io::Error)> {
        let map = match map_fn(&file) {
            Ok(map) => map,
            Err(e) => return Err((file, e)),
        };

        #[cfg(unix)]
        {
            if let Err(e) = map.advise(memmap2::Advice::Sequential) {
                // Non-fatal
                log::warn!("Failed to set mmap advice: {}", e);
            }
        }

        Ok(Self {
            map,
            file,
            cursor: 0,
        })
    }

    /// Size of the mapped region in bytes.
    pub fn len(&self) -> u64 {
        self.map.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Copy from the cursor into `buf`, clamped to the end of the mapping.
    ///
    /// Reaching the end is not an error: a short count signals it.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.cursor > self.len() {
            return Err(VfsError::ReadFailed {
                message: format!(
                    "cursor {} is past the end of the mapping ({} bytes)",
                    self.cursor,
                    self.len()
                ),
                source: None,
            });
        }

        let start = self.cursor as usize;
        let n = buf.len().min(self.map.len() - start);
        buf[..n].copy_from_slice(&self.map[start..start + n]);
        self.cursor += n as u64;

        trace!("mapped read {} of {} bytes at {}", n, buf.len(), start);
        Ok(n)
    }

    /// Move the logical cursor; rejected moves leave it untouched.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let target = mapped_target(self.cursor, self.len(), offset, whence).ok_or_else(|| {
            VfsError::seek_rejected(
                offset,
                whence,
                format!(
                    "target outside mapped region of {} bytes (cursor {})",
                    self.len(),
                    self.cursor
                ),
            )
        })?;

        self.cursor = target;
        Ok(target)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.map[..]
    }

    /// Split into mapping and descriptor so they can be released in order.
    pub fn into_parts(self) -> (Mmap, File) {
        (self.map, self.file)
    }
}
