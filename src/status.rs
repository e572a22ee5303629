//! Status-code surface over [`FileHandle`].
//!
//! These functions mirror a C-style VFS table: a missing handle is `None`,
//! failures come back as `-1` (or `None`/`false`), and nothing panics. Callers
//! that can use `Result` should prefer the methods on [`FileHandle`].

use crate::error::VfsError;
use crate::file_handler::{self, AccessHints, AccessMode, FileHandle, Whence};
use log::debug;

/// Open `path`; `None` on any failure.
pub fn open(path: &str, mode: AccessMode, hints: AccessHints) -> Option<Box<FileHandle>> {
    match FileHandle::open(path, mode, hints) {
        Ok(handle) => Some(Box::new(handle)),
        Err(e) => {
            debug!("open({:?}) failed: {}", path, e);
            None
        }
    }
}

/// Release the handle. `0` on success, `-1` for a missing handle or when a
/// release step reported an error (every step still runs).
pub fn close(handle: Option<Box<FileHandle>>) -> i32 {
    let Some(handle) = handle else {
        return missing_handle("close");
    };
    match handle.close() {
        Ok(()) => 0,
        Err(e) => {
            debug!("close failed: {}", e);
            e.status_code()
        }
    }
}

/// New absolute cursor, or `-1`.
pub fn seek(handle: Option<&mut FileHandle>, offset: i64, whence: Whence) -> i64 {
    let Some(handle) = handle else {
        return i64::from(missing_handle("seek"));
    };
    match handle.seek(offset, whence) {
        Ok(pos) => to_status(pos),
        Err(e) => {
            debug!("seek failed: {}", e);
            i64::from(e.status_code())
        }
    }
}

/// Read `len` bytes into `buffer`. Bytes read, or `-1` for a missing handle or
/// buffer, a `len` larger than the buffer, or an I/O error.
pub fn read(handle: Option<&mut FileHandle>, buffer: Option<&mut [u8]>, len: u64) -> i64 {
    let Some(handle) = handle else {
        return i64::from(missing_handle("read"));
    };
    let Some(buffer) = buffer
        .zip(usize::try_from(len).ok())
        .and_then(|(buffer, len)| buffer.get_mut(..len))
    else {
        return -1;
    };
    match handle.read(buffer) {
        Ok(n) => n as i64,
        Err(e) => {
            debug!("read failed: {}", e);
            i64::from(e.status_code())
        }
    }
}

/// Write the first `len` bytes of `buffer`. Bytes written, or `-1`.
pub fn write(handle: Option<&mut FileHandle>, buffer: Option<&[u8]>, len: u64) -> i64 {
    let Some(handle) = handle else {
        return i64::from(missing_handle("write"));
    };
    let Some(buffer) = buffer
        .zip(usize::try_from(len).ok())
        .and_then(|(buffer, len)| buffer.get(..len))
    else {
        return -1;
    };
    match handle.write(buffer) {
        Ok(n) => n as i64,
        Err(e) => {
            debug!("write failed: {}", e);
            i64::from(e.status_code())
        }
    }
}

/// Write one byte. The byte value on success, `-1` otherwise.
pub fn put_byte(handle: Option<&mut FileHandle>, byte: u8) -> i32 {
    let Some(handle) = handle else {
        return missing_handle("put_byte");
    };
    match handle.put_byte(byte) {
        Ok(()) => i32::from(byte),
        Err(e) => e.status_code(),
    }
}

/// Current cursor, or `-1`.
pub fn tell(handle: Option<&mut FileHandle>) -> i64 {
    let Some(handle) = handle else {
        return i64::from(missing_handle("tell"));
    };
    match handle.tell() {
        Ok(pos) => to_status(pos),
        Err(e) => i64::from(e.status_code()),
    }
}

/// Size measured at open; `0` for a missing handle.
pub fn size(handle: Option<&FileHandle>) -> i64 {
    handle.map_or(0, FileHandle::size)
}

/// `0` on success, `-1` for a missing handle or a failed flush.
pub fn flush(handle: Option<&mut FileHandle>) -> i32 {
    let Some(handle) = handle else {
        return missing_handle("flush");
    };
    match handle.flush() {
        Ok(()) => 0,
        Err(e) => e.status_code(),
    }
}

/// Remove the file at `path`; `true` iff the OS removal succeeded.
pub fn delete(path: &str) -> bool {
    file_handler::delete(path)
}

/// Stream error indicator; `-1` for a missing handle.
pub fn last_error(handle: Option<&FileHandle>) -> i32 {
    handle.map_or_else(|| missing_handle("last_error"), FileHandle::last_error)
}

/// Path the handle was opened with.
pub fn get_path(handle: Option<&FileHandle>) -> Option<&str> {
    handle.map(FileHandle::path)
}

fn missing_handle(op: &str) -> i32 {
    let err = VfsError::InvalidHandle;
    debug!("{} failed: {}", op, err);
    err.status_code()
}

fn to_status(pos: u64) -> i64 {
    i64::try_from(pos).unwrap_or(-1)
}
