//! Cursor movement for every backend.
//!
//! Streams and descriptors delegate to the OS, which already rejects negative
//! results. A mapped region has no OS cursor, so its arithmetic is done here
//! with checked operations: a wrapping sum or a target outside
//! `0..=mapped_size` is rejected and the cursor stays where it was.
//!
//! All three backends report the resulting absolute cursor on success.

use crate::error::{Result, VfsError};
use crate::file_handler::backend::Backend;
use std::io::{Seek, SeekFrom};

/// Origin for a seek offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Whence {
    /// From the start of the file
    Set,
    /// From the current cursor
    Cur,
    /// From the end of the file
    End,
}

impl Whence {
    /// Convert to the std representation, `None` for a negative absolute offset.
    pub fn to_seek_from(self, offset: i64) -> Option<SeekFrom> {
        match self {
            Whence::Set => u64::try_from(offset).ok().map(SeekFrom::Start),
            Whence::Cur => Some(SeekFrom::Current(offset)),
            Whence::End => Some(SeekFrom::End(offset)),
        }
    }

    /// Split a std seek position into offset and origin.
    pub fn from_seek_from(pos: SeekFrom) -> Option<(i64, Whence)> {
        match pos {
            SeekFrom::Start(n) => i64::try_from(n).ok().map(|n| (n, Whence::Set)),
            SeekFrom::Current(n) => Some((n, Whence::Cur)),
            SeekFrom::End(n) => Some((n, Whence::End)),
        }
    }
}

/// Resolve where a mapped cursor would land.
///
/// Returns `None` when the sum overflows `i64` or the target falls outside
/// `0..=mapped_size`.
pub fn mapped_target(cursor: u64, mapped_size: u64, offset: i64, whence: Whence) -> Option<u64> {
    let base = match whence {
        Whence::Set if offset < 0 => return None,
        Whence::Set => 0,
        Whence::Cur => i64::try_from(cursor).ok()?,
        Whence::End => i64::try_from(mapped_size).ok()?,
    };

    let target = u64::try_from(base.checked_add(offset)?).ok()?;
    (target <= mapped_size).then_some(target)
}

/// Move the cursor of whichever backend is active.
pub(crate) fn seek(backend: &mut Backend, offset: i64, whence: Whence) -> Result<u64> {
    let result = match backend {
        Backend::MemoryMapped(region) => return region.seek(offset, whence),
        Backend::Buffered(stream) => {
            let pos = to_os_position(offset, whence)?;
            stream.seek(pos)
        }
        Backend::Unbuffered(file) => {
            let pos = to_os_position(offset, whence)?;
            file.seek(pos)
        }
    };

    result.map_err(|e| VfsError::seek_failed(offset, whence, e))
}

fn to_os_position(offset: i64, whence: Whence) -> Result<SeekFrom> {
    whence
        .to_seek_from(offset)
        .ok_or_else(|| VfsError::seek_rejected(offset, whence, "negative absolute offset"))
}
