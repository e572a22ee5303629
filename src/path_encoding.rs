//! UTF-8 to platform path conversion.
//!
//! The file handle only ever sees UTF-8 paths. Turning them into something the
//! OS accepts is delegated to a [`PathEncoder`]; which implementation is used
//! is fixed at build time by the target, never decided at runtime.

use crate::error::{Result, VfsError};
use std::path::PathBuf;

/// Converts a UTF-8 path into the platform-native representation.
pub trait PathEncoder {
    fn encode(&self, path: &str) -> Result<PathBuf>;
}

/// Byte-oriented encoder for platforms whose native paths are narrow strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct NarrowPathEncoder;

impl PathEncoder for NarrowPathEncoder {
    fn encode(&self, path: &str) -> Result<PathBuf> {
        check_encodable(path)?;
        Ok(PathBuf::from(path))
    }
}

/// UTF-16 encoder for Windows wide-character APIs.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct WidePathEncoder;

#[cfg(windows)]
impl PathEncoder for WidePathEncoder {
    fn encode(&self, path: &str) -> Result<PathBuf> {
        use std::ffi::OsString;
        use std::os::windows::ffi::OsStringExt;

        check_encodable(path)?;
        let wide: Vec<u16> = path.encode_utf16().collect();
        Ok(PathBuf::from(OsString::from_wide(&wide)))
    }
}

#[cfg(not(windows))]
pub type NativePathEncoder = NarrowPathEncoder;

#[cfg(windows)]
pub type NativePathEncoder = WidePathEncoder;

/// Encode with the encoder chosen for the build target.
pub fn encode_path(path: &str) -> Result<PathBuf> {
    NativePathEncoder::default().encode(path)
}

// Native APIs take NUL-terminated strings, so an interior NUL would silently
// truncate the path.
fn check_encodable(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(VfsError::PathEncoding {
            path: path.to_string(),
            reason: "path is empty".to_string(),
        });
    }
    if path.contains('\0') {
        return Err(VfsError::PathEncoding {
            path: path.to_string(),
            reason: "path contains an interior NUL byte".to_string(),
        });
    }
    Ok(())
}
