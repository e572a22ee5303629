//! Read/write dispatch over the three backends.

use crate::error::{Result, VfsError};
use crate::file_handler::buffered::BufferedStream;
use crate::file_handler::mapped::MappedRegion;
use log::trace;
use std::fs::File;
use std::io::{Read, Seek, Write};

/// Which backend a handle ended up with after selection and fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Buffered,
    Unbuffered,
    MemoryMapped,
}

/// The resources of exactly one backend.
#[derive(Debug)]
pub(crate) enum Backend {
    Buffered(BufferedStream),
    Unbuffered(File),
    MemoryMapped(MappedRegion),
}

impl Backend {
    pub(crate) fn kind(&self) -> BackendKind {
        match self {
            Backend::Buffered(_) => BackendKind::Buffered,
            Backend::Unbuffered(_) => BackendKind::Unbuffered,
            Backend::MemoryMapped(_) => BackendKind::MemoryMapped,
        }
    }

    pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Backend::Buffered(stream) => stream.read(buf).map_err(VfsError::read_failed),
            Backend::Unbuffered(file) => {
                let n = file.read(buf).map_err(VfsError::read_failed)?;
                trace!("descriptor read {} of {} bytes", n, buf.len());
                Ok(n)
            }
            Backend::MemoryMapped(region) => region.read(buf),
        }
    }

    pub(crate) fn write(&mut self, data: &[u8]) -> Result<usize> {
        match self {
            Backend::Buffered(stream) => stream.write(data).map_err(VfsError::write_failed),
            Backend::Unbuffered(file) => {
                let n = file.write(data).map_err(VfsError::write_failed)?;
                trace!("descriptor write {} of {} bytes", n, data.len());
                Ok(n)
            }
            Backend::MemoryMapped(_) => Err(VfsError::write_rejected(
                "memory-mapped handles are read-only",
            )),
        }
    }

    pub(crate) fn tell(&mut self) -> Result<u64> {
        let result = match self {
            Backend::Buffered(stream) => stream.position(),
            Backend::Unbuffered(file) => file.stream_position(),
            Backend::MemoryMapped(region) => return Ok(region.cursor()),
        };

        result.map_err(|e| VfsError::SeekFailed {
            offset: 0,
            whence: crate::file_handler::Whence::Cur,
            message: format!("Failed to query position: {e}"),
            source: Some(e),
        })
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        match self {
            Backend::Buffered(stream) => stream
                .flush()
                .map_err(|source| VfsError::FlushFailed { source }),
            Backend::Unbuffered(_) | Backend::MemoryMapped(_) => Ok(()),
        }
    }

    /// Stream error indicator; always clear for the other backends.
    pub(crate) fn last_error(&self) -> i32 {
        match self {
            Backend::Buffered(stream) => i32::from(stream.error()),
            Backend::Unbuffered(_) | Backend::MemoryMapped(_) => 0,
        }
    }

    /// Release every resource. Each step runs even if an earlier one failed;
    /// the first failure is reported.
    pub(crate) fn close(self) -> Result<()> {
        match self {
            Backend::Buffered(stream) => stream.close().map_err(|e| VfsError::CloseFailed {
                message: format!("Failed to flush stream: {e}"),
                source: Some(e),
            }),
            Backend::Unbuffered(file) => {
                drop(file);
                Ok(())
            }
            Backend::MemoryMapped(region) => {
                let (map, file) = region.into_parts();
                drop(map);
                drop(file);
                Ok(())
            }
        }
    }
}
