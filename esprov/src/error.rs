//! Error types for esprov.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for esprov operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for esprov operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations, process spawning).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The esptool program is not installed or not on PATH.
    #[error("esptool is not installed. Please install it with: pip install esptool")]
    EsptoolMissing,

    /// No firmware file matching the `v*.bin` pattern was found.
    #[error("No firmware files found matching 'v*.bin' in {}", .0.display())]
    FirmwareNotFound(PathBuf),

    /// The resolved or explicitly given firmware path does not exist.
    #[error("Firmware file '{}' not found", .0.display())]
    FirmwareMissing(PathBuf),

    /// No serial port passed ESP32 classification.
    #[error("Could not auto-detect an ESP32 port. Please specify --port")]
    PortNotFound,

    /// The esptool invocation exited with a non-zero status.
    #[error("Flashing failed with exit code {0}")]
    FlashFailed(i32),
}

impl Error {
    /// Exit code for the delegated flash operation, if this error carries one.
    ///
    /// Non-zero esptool exit codes are propagated to the process exit code
    /// instead of being collapsed into a generic failure.
    #[must_use]
    pub fn flash_exit_code(&self) -> Option<i32> {
        match self {
            Self::FlashFailed(code) => Some(*code),
            _ => None,
        }
    }
}
