//! Centralized configuration and builder for slobdict.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering constants.
//! - `SlobConfig::from_env()` reads the `SLOB_*` env vars on top of defaults.
//! - `SlobConfigBuilder` returns a `SlobConfig` consumed by the reader/writer.
//!
//! Open strategy:
//! - file_backed_threshold_bytes = 128 MiB. Files strictly larger than this are
//!   opened file-backed (bins are read from disk on first access); smaller files
//!   are loaded into memory at open time.
//!
//! Bin splitting (writer):
//! - max_bin_items = 32767, max_bin_bytes = 320 KiB. A new bin starts when the
//!   next entry would push the current bin past either limit.

use std::fmt;

use anyhow::Result;

use crate::consts::{
    DEFAULT_FILE_BACKED_THRESHOLD, DEFAULT_MAX_BIN_BYTES, DEFAULT_MAX_BIN_ITEMS,
    DEFAULT_SUGGESTION_LIMIT, DEFAULT_ZLIB_LEVEL, MAX_ITEMS_PER_BIN_FORMAT,
};
use crate::errors::SlobError;

/// Top-level configuration for slobdict (reader/writer/suggestions).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlobConfig {
    /// Files larger than this are opened file-backed.
    /// Env: SLOB_FILE_BACKED_THRESHOLD (bytes, default 128 MiB)
    pub file_backed_threshold_bytes: u64,

    /// Upper bound of entries per bin when writing.
    /// Env: SLOB_MAX_BIN_ITEMS (default 32767, max 65536)
    pub max_bin_items: usize,

    /// Upper bound of content bytes per bin when writing.
    /// Env: SLOB_MAX_BIN_BYTES (default 327680)
    pub max_bin_bytes: usize,

    /// zlib level for written bins (0..=9).
    /// Env: SLOB_ZLIB_LEVEL (default 6)
    pub zlib_level: u32,

    /// Serialize writers of the same file through an fs2 lock on `<file>.lock`.
    /// Env: SLOB_LOCK_FILES = 0|1|true|false (default true)
    pub lock_files: bool,

    /// How many best matches a suggestion run publishes.
    /// Env: SLOB_SUGGESTION_LIMIT (default 100)
    pub suggestion_limit: usize,
}

impl Default for SlobConfig {
    fn default() -> Self {
        Self {
            file_backed_threshold_bytes: DEFAULT_FILE_BACKED_THRESHOLD,
            max_bin_items: DEFAULT_MAX_BIN_ITEMS,
            max_bin_bytes: DEFAULT_MAX_BIN_BYTES,
            zlib_level: DEFAULT_ZLIB_LEVEL,
            lock_files: true,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

fn env_flag(s: &str) -> bool {
    let s = s.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "on" || s == "yes"
}

impl SlobConfig {
    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SLOB_FILE_BACKED_THRESHOLD") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.file_backed_threshold_bytes = n;
            }
        }

        if let Ok(v) = std::env::var("SLOB_MAX_BIN_ITEMS") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.max_bin_items = n;
            }
        }

        if let Ok(v) = std::env::var("SLOB_MAX_BIN_BYTES") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.max_bin_bytes = n;
            }
        }

        if let Ok(v) = std::env::var("SLOB_ZLIB_LEVEL") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.zlib_level = n;
            }
        }

        if let Ok(v) = std::env::var("SLOB_LOCK_FILES") {
            cfg.lock_files = env_flag(&v);
        }

        if let Ok(v) = std::env::var("SLOB_SUGGESTION_LIMIT") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.suggestion_limit = n;
            }
        }

        cfg
    }

    /// Fluent setters (builder-style) to override specific fields.

    pub fn with_file_backed_threshold(mut self, bytes: u64) -> Self {
        self.file_backed_threshold_bytes = bytes;
        self
    }

    pub fn with_max_bin_items(mut self, n: usize) -> Self {
        self.max_bin_items = n;
        self
    }

    pub fn with_max_bin_bytes(mut self, n: usize) -> Self {
        self.max_bin_bytes = n;
        self
    }

    pub fn with_zlib_level(mut self, level: u32) -> Self {
        self.zlib_level = level;
        self
    }

    pub fn with_lock_files(mut self, on: bool) -> Self {
        self.lock_files = on;
        self
    }

    pub fn with_suggestion_limit(mut self, n: usize) -> Self {
        self.suggestion_limit = n;
        self
    }

    /// Reject values the on-disk format or the codecs can not honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_bin_items == 0 || self.max_bin_items > MAX_ITEMS_PER_BIN_FORMAT {
            return Err(SlobError::InvalidConfig(format!(
                "max_bin_items must be in [1 .. {}], got {}",
                MAX_ITEMS_PER_BIN_FORMAT, self.max_bin_items
            ))
            .into());
        }
        if self.max_bin_bytes == 0 {
            return Err(SlobError::InvalidConfig("max_bin_bytes must be > 0".into()).into());
        }
        if self.zlib_level > 9 {
            return Err(SlobError::InvalidConfig(format!(
                "zlib_level must be in [0 .. 9], got {}",
                self.zlib_level
            ))
            .into());
        }
        Ok(())
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for SlobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SlobConfig {{ \
             file_backed_threshold_bytes: {}, \
             max_bin_items: {}, \
             max_bin_bytes: {}, \
             zlib_level: {}, \
             lock_files: {}, \
             suggestion_limit: {} \
             }}",
            self.file_backed_threshold_bytes,
            self.max_bin_items,
            self.max_bin_bytes,
            self.zlib_level,
            self.lock_files,
            self.suggestion_limit,
        )
    }
}

/// Lightweight builder that produces a SlobConfig.
#[derive(Clone, Debug)]
pub struct SlobConfigBuilder {
    cfg: SlobConfig,
}

impl Default for SlobConfigBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: SlobConfig::from_env(),
        }
    }
}

impl SlobConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: SlobConfig::default(),
        }
    }

    pub fn file_backed_threshold(mut self, bytes: u64) -> Self {
        self.cfg.file_backed_threshold_bytes = bytes;
        self
    }

    pub fn max_bin_items(mut self, n: usize) -> Self {
        self.cfg.max_bin_items = n;
        self
    }

    pub fn max_bin_bytes(mut self, n: usize) -> Self {
        self.cfg.max_bin_bytes = n;
        self
    }

    pub fn zlib_level(mut self, level: u32) -> Self {
        self.cfg.zlib_level = level;
        self
    }

    pub fn lock_files(mut self, on: bool) -> Self {
        self.cfg.lock_files = on;
        self
    }

    pub fn suggestion_limit(mut self, n: usize) -> Self {
        self.cfg.suggestion_limit = n;
        self
    }

    /// Finish the builder, validating the result.
    pub fn build(self) -> Result<SlobConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::slob_error;

    #[test]
    fn defaults_match_format_limits() {
        let cfg = SlobConfig::default();
        assert_eq!(cfg.max_bin_items, 32_767);
        assert_eq!(cfg.max_bin_bytes, 320 * 1024);
        assert_eq!(cfg.file_backed_threshold_bytes, 128 * 1024 * 1024);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_rejects_oversized_bins() {
        let err = SlobConfigBuilder::from_default()
            .max_bin_items(70_000)
            .build()
            .unwrap_err();
        assert!(matches!(slob_error(&err), Some(SlobError::InvalidConfig(_))));

        let ok = SlobConfigBuilder::from_default()
            .max_bin_items(65_536)
            .zlib_level(9)
            .build()
            .unwrap();
        assert_eq!(ok.max_bin_items, 65_536);
    }

    #[test]
    fn display_lists_all_fields() {
        let s = SlobConfig::default().with_lock_files(false).to_string();
        assert!(s.contains("lock_files: false"));
        assert!(s.contains("max_bin_items: 32767"));
    }
}
