//! Runtime configuration.
//!
//! Defaults match the built-in behavior: 16 KiB scratch buffers, memory
//! mapping allowed, no hints. With the `config` feature the values can be
//! read from a TOML file, by default `<config_dir>/rvfs/config.toml`:
//!
//! ```toml
//! scratch_size = 65536
//! allow_mmap = true
//! prefer_mmap = false
//! unbuffered = false
//! ```

use crate::error::{Result, VfsError};
use crate::file_handler::{AccessHints, OpenOptions, DEFAULT_SCRATCH_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default, deny_unknown_fields))]
pub struct VfsConfig {
    /// Scratch buffer size for buffered streams, in bytes
    pub scratch_size: usize,
    /// Whether memory mapping may be used at all
    pub allow_mmap: bool,
    /// Request memory mapping by default (CLI)
    pub prefer_mmap: bool,
    /// Request unbuffered descriptors by default (CLI)
    pub unbuffered: bool,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            scratch_size: DEFAULT_SCRATCH_SIZE,
            allow_mmap: true,
            prefer_mmap: false,
            unbuffered: false,
        }
    }
}

impl VfsConfig {
    /// Hints the CLI requests when no flag overrides them.
    pub fn default_hints(&self) -> AccessHints {
        let mut hints = AccessHints::empty();
        hints.set(AccessHints::MEMORY_MAP, self.prefer_mmap);
        hints.set(AccessHints::UNBUFFERED, self.unbuffered);
        hints
    }

    pub fn open_options(&self) -> OpenOptions {
        OpenOptions::from_config(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scratch_size == 0 {
            return Err(VfsError::config("scratch_size must be greater than zero"));
        }
        Ok(())
    }

    /// Parse a TOML document.
    #[cfg(feature = "config")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| VfsError::config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse the TOML file at `path`.
    #[cfg(feature = "config")]
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VfsError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "config")]
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rvfs").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when the file
    /// does not exist.
    #[cfg(feature = "config")]
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                log::debug!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}
