//! Configuration for the NetCDF L3 writer.

use serde::{Deserialize, Serialize};

/// Storage options for exported daily files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Deflate level (0-9, 0 disables compression).
    pub compression_level: u8,

    /// Enable the byte shuffle filter ahead of deflate.
    pub shuffle: bool,

    /// Chunk edge on the horizontal axes, clamped to the grid dims.
    pub chunk_size: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
            shuffle: true,
            chunk_size: 100,
        }
    }
}

impl ExportConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("EXPORT_COMPRESSION_LEVEL") {
            if let Ok(level) = val.parse() {
                config.compression_level = level;
            }
        }

        if let Ok(val) = std::env::var("EXPORT_SHUFFLE") {
            config.shuffle = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("EXPORT_CHUNK_SIZE") {
            if let Ok(size) = val.parse() {
                config.chunk_size = size;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.compression_level > 9 {
            return Err("compression_level must be 0-9".to_string());
        }

        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }

        Ok(())
    }

    /// Chunk shape for a `Time x Longitude x Latitude` variable.
    pub fn chunk_shape(&self, xdim: usize, ydim: usize) -> [usize; 3] {
        [
            1,
            self.chunk_size.min(xdim).max(1),
            self.chunk_size.min(ydim).max(1),
        ]
    }
}
