//! File handle abstraction over buffered, unbuffered and memory-mapped backends.
//!
//! A [`FileHandle`] owns exactly one backend, chosen once at open time by the
//! [`BackendSelector`] from the requested [`AccessMode`] and [`AccessHints`].
//! Every operation (seek, read, write, tell, flush, close) dispatches on that
//! backend, so callers see one contract regardless of how the bytes are reached.

pub mod backend;
pub mod buffered;
pub mod handle;
pub mod mapped;
pub mod seek;
pub mod selector;

pub use backend::BackendKind;
pub use buffered::BufferedStream;
pub use handle::{delete, FileHandle, OpenOptions, DEFAULT_SCRATCH_SIZE};
pub use mapped::{map_read_only, MapFn, MappedRegion};
pub use seek::Whence;
pub use selector::{BackendSelector, Platform, Selection};

use bitflags::bitflags;

/// How the caller intends to use the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Read an existing file
    Read,
    /// Create or truncate, then write
    Write,
    /// Read and write
    ReadWrite,
    /// Reserved; opening with this mode always fails
    UpdateExisting,
}

bitflags! {
    /// Caller preferences the selector may honor, ignore, or fall back from.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessHints: u32 {
        /// Map the file into memory when opened for reading
        const MEMORY_MAP = 1 << 0;
        /// Use a raw OS descriptor instead of a buffered stream
        const UNBUFFERED = 1 << 8;
    }
}

impl AccessMode {
    pub fn is_writable(self) -> bool {
        matches!(self, AccessMode::Write | AccessMode::ReadWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hints_are_empty() {
        assert!(AccessHints::default().is_empty());
    }

    #[test]
    fn test_writable_modes() {
        assert!(!AccessMode::Read.is_writable());
        assert!(AccessMode::Write.is_writable());
        assert!(AccessMode::ReadWrite.is_writable());
        assert!(!AccessMode::UpdateExisting.is_writable());
    }
}
