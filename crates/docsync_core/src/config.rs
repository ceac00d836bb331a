//! Staging configuration.

use std::path::PathBuf;

/// Default copy chunk size (64 KiB).
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Where staged attachment bytes are held until commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingLocation {
    /// Keep staged bytes in memory.
    Memory,
    /// Write staged bytes to temporary files inside this directory.
    Directory(PathBuf),
}

impl Default for StagingLocation {
    fn default() -> Self {
        StagingLocation::Directory(std::env::temp_dir())
    }
}

/// Configuration for the attachment staging pipeline.
#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Where temporary storage is allocated.
    pub location: StagingLocation,

    /// Number of bytes copied from the input stream per read.
    pub buffer_size: usize,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            location: StagingLocation::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl StagingConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages attachments in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default().with_location(StagingLocation::Memory)
    }

    /// Sets the staging location.
    #[must_use]
    pub fn with_location(mut self, location: StagingLocation) -> Self {
        self.location = location;
        self
    }

    /// Stages attachments as temporary files in `dir`.
    #[must_use]
    pub fn with_directory(self, dir: impl Into<PathBuf>) -> Self {
        self.with_location(StagingLocation::Directory(dir.into()))
    }

    /// Sets the copy buffer size. Zero is raised to one byte.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StagingConfig::default();
        assert_eq!(config.buffer_size, 64 * 1024);
        assert_eq!(
            config.location,
            StagingLocation::Directory(std::env::temp_dir())
        );
    }

    #[test]
    fn config_builder() {
        let config = StagingConfig::in_memory().with_buffer_size(0);
        assert_eq!(config.location, StagingLocation::Memory);
        assert_eq!(config.buffer_size, 1);

        let config = StagingConfig::new().with_directory("/var/tmp/docsync");
        assert_eq!(
            config.location,
            StagingLocation::Directory(PathBuf::from("/var/tmp/docsync"))
        );
    }
}
