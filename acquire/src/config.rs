use alloc::{
    format,
    string::{String, ToString},
};

use super::{Error, Result};

/// Staging buffer capacity: large enough to amortize per-write overhead, small enough
/// for pre-boot pool allocators.
pub const DEFAULT_CHUNK_SIZE: usize = 0x800_0000;

/// Per-file rollover threshold. FAT32 caps files at 4 GiB - 1 and a file can overshoot the
/// threshold by up to one chunk, so the threshold sits one default chunk below 4 GiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 0x1_0000_0000 - DEFAULT_CHUNK_SIZE as u64;

pub const DEFAULT_FILE_PREFIX: &str = "dump";

pub const DEFAULT_FILE_EXTENSION: &str = ".bin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpConfig {
    pub chunk_size: usize,
    pub max_file_size: u64,
    pub file_prefix: String,
    pub file_extension: String,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
        }
    }
}

impl DumpConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_file_name(mut self, prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self.file_extension = extension.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk size must be non-zero"));
        }
        if self.max_file_size == 0 {
            return Err(Error::Config("maximum file size must be non-zero"));
        }
        if self.file_prefix.is_empty() {
            return Err(Error::Config("file prefix must not be empty"));
        }
        Ok(())
    }

    /// Name of the output file with 1-based `index`, e.g. `dump3.bin`.
    #[inline]
    pub fn file_name(&self, index: u32) -> String {
        format!("{}{index}{}", self.file_prefix, self.file_extension)
    }
}
