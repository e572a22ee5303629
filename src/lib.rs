//! # rvfs - one file handle, three backends
//!
//! A synchronous file-access layer that presents a single handle type and one
//! operation set over three structurally different mechanisms:
//!
//! - **Buffered stream**: a file with an owned 16 KiB scratch buffer
//! - **Unbuffered descriptor**: raw OS reads and writes
//! - **Memory mapping**: a read-only view with a logical cursor
//!
//! The backend is chosen once at open from the access mode and caller hints;
//! a mapping that cannot be created quietly degrades to a plain descriptor.
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`file_handler`] - Handle, backend selection, seek engine and backends
//! - [`path_encoding`] - UTF-8 to platform path conversion
//! - [`status`] - C-style status-code surface over the handle
//! - [`config`] - Runtime configuration
//!
//! ## Example
//!
//! ```no_run
//! use rvfs::{AccessHints, AccessMode, FileHandle};
//!
//! # fn main() -> rvfs::Result<()> {
//! let mut out = FileHandle::open("a.bin", AccessMode::Write, AccessHints::empty())?;
//! out.write(b"hello")?;
//! out.close()?;
//!
//! let mut input = FileHandle::open("a.bin", AccessMode::Read, AccessHints::UNBUFFERED)?;
//! assert_eq!(input.size(), 5);
//! let mut buf = [0u8; 5];
//! input.read(&mut buf)?;
//! input.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file_handler;
pub mod path_encoding;
pub mod status;

// Re-export commonly used types for convenience
pub use config::VfsConfig;
pub use error::{Result, VfsError};
pub use file_handler::{AccessHints, AccessMode, BackendKind, FileHandle, OpenOptions, Whence};
pub use path_encoding::{encode_path, PathEncoder};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
