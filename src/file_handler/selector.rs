//! Backend selection for new handles.
//!
//! This module decides which backend a handle gets and acquires its OS
//! resources. The decision is a pure function of access mode, hints and the
//! platform's capabilities, so it can be tested without touching the disk.
//!
//! # Strategy Selection
//! - `MEMORY_MAP` + `Read` on a platform that maps: unbuffered descriptor with a
//!   read-only mapping on top
//! - `MEMORY_MAP` with any other mode: hint dropped
//! - `UNBUFFERED`: raw descriptor
//! - otherwise: buffered stream with an owned scratch buffer
//!
//! # Fallback
//! A mapping that cannot be created is not an open failure: the hint is
//! cleared and the handle carries on as a plain descriptor.

use crate::error::{Result, VfsError};
use crate::file_handler::backend::{Backend, BackendKind};
use crate::file_handler::buffered::BufferedStream;
use crate::file_handler::mapped::{map_read_only, MapFn, MappedRegion};
use crate::file_handler::{AccessHints, AccessMode};
use log::{debug, warn};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// What the running platform can do.
#[derive(Debug, Clone, Copy)]
pub struct Platform {
    /// Whether memory mapping is available at all
    pub mmap_supported: bool,
    /// How mappings are created
    pub map: MapFn,
}

impl Platform {
    pub fn native() -> Self {
        Self {
            mmap_supported: cfg!(any(unix, windows)),
            map: map_read_only,
        }
    }

    /// A platform without memory mapping.
    pub fn without_mmap() -> Self {
        Self {
            mmap_supported: false,
            ..Self::native()
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::native()
    }
}

/// Outcome of backend selection before any resource is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub kind: BackendKind,
    pub hints: AccessHints,
}

/// Chooses and opens the backend for a handle.
#[derive(Debug, Clone, Copy)]
pub struct BackendSelector {
    platform: Platform,
    scratch_size: usize,
}

impl BackendSelector {
    pub fn new(platform: Platform, scratch_size: usize) -> Self {
        Self {
            platform,
            scratch_size,
        }
    }

    /// Decide the backend and effective hints for `mode` and `requested`.
    ///
    /// # Errors
    /// * `UnsupportedAccessMode` for [`AccessMode::UpdateExisting`]
    pub fn select(&self, mode: AccessMode, requested: AccessHints) -> Result<Selection> {
        if mode == AccessMode::UpdateExisting {
            return Err(VfsError::UnsupportedAccessMode { mode });
        }

        let mut hints = requested;
        if hints.contains(AccessHints::MEMORY_MAP)
            && mode == AccessMode::Read
            && self.platform.mmap_supported
        {
            hints |= AccessHints::UNBUFFERED;
        } else {
            hints.remove(AccessHints::MEMORY_MAP);
        }

        let kind = if !hints.contains(AccessHints::UNBUFFERED) {
            BackendKind::Buffered
        } else if hints.contains(AccessHints::MEMORY_MAP) {
            BackendKind::MemoryMapped
        } else {
            BackendKind::Unbuffered
        };

        Ok(Selection { kind, hints })
    }

    /// Select a backend and acquire its resources.
    ///
    /// `display_path` is the caller's UTF-8 path, used in errors and logs.
    /// Returns the backend together with the hints actually in effect, which
    /// differ from the selection when mapping fell back.
    pub(crate) fn acquire(
        &self,
        path: &Path,
        display_path: &str,
        mode: AccessMode,
        requested: AccessHints,
    ) -> Result<(Backend, AccessHints)> {
        let Selection { kind, mut hints } = self.select(mode, requested)?;
        debug!(
            "Opening {} as {:?} ({:?}, hints {:?})",
            display_path, kind, mode, hints
        );

        let backend = match kind {
            BackendKind::Buffered => {
                let file = stream_options(mode).open(path).map_err(|e| {
                    VfsError::open_failed(display_path, "Failed to open stream", e)
                })?;
                Backend::Buffered(BufferedStream::with_capacity(
                    file,
                    self.scratch_size,
                    mode.is_writable(),
                ))
            }
            BackendKind::Unbuffered => Backend::Unbuffered(open_descriptor(path, display_path, mode)?),
            BackendKind::MemoryMapped => {
                let file = open_descriptor(path, display_path, mode)?;
                match MappedRegion::map(file, self.platform.map) {
                    Ok(region) => Backend::MemoryMapped(region),
                    Err((file, e)) => {
                        warn!(
                            "Memory mapping {} failed, falling back to unbuffered: {}",
                            display_path, e
                        );
                        hints.remove(AccessHints::MEMORY_MAP);
                        Backend::Unbuffered(file)
                    }
                }
            }
        };

        Ok((backend, hints))
    }
}

fn open_descriptor(path: &Path, display_path: &str, mode: AccessMode) -> Result<File> {
    descriptor_options(mode)
        .open(path)
        .map_err(|e| VfsError::open_failed(display_path, "Failed to open descriptor", e))
}

/// Stream modes: read, write-truncate, read/write-create-truncate.
fn stream_options(mode: AccessMode) -> OpenOptions {
    let mut options = OpenOptions::new();
    match mode {
        AccessMode::Read => {
            options.read(true);
        }
        AccessMode::Write => {
            options.write(true).create(true).truncate(true);
        }
        AccessMode::ReadWrite => {
            options.read(true).write(true).create(true).truncate(true);
        }
        AccessMode::UpdateExisting => {}
    }
    options
}

/// Descriptor flags: read-only, write/create/truncate, read-write.
fn descriptor_options(mode: AccessMode) -> OpenOptions {
    let mut options = OpenOptions::new();
    match mode {
        AccessMode::Read => {
            options.read(true);
        }
        AccessMode::Write => {
            options.write(true).create(true).truncate(true);
        }
        AccessMode::ReadWrite => {
            options.read(true).write(true);
        }
        AccessMode::UpdateExisting => {}
    }
    options
}
