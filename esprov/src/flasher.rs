//! Delegation of the flash write to the external esptool program.
//!
//! This crate never speaks the ESP32 ROM loader protocol itself. It builds
//! the esptool `write-flash` argument list from a [`FlashRequest`] and runs
//! the tool with inherited stdio so its progress output reaches the user
//! directly.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::error::{Error, Result};

/// Supported target chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chip {
    /// Original ESP32.
    Esp32,
    /// ESP32-S2.
    Esp32s2,
    /// ESP32-S3 (default).
    #[default]
    Esp32s3,
}

impl Chip {
    /// The chip name as esptool expects it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Esp32 => "esp32",
            Self::Esp32s2 => "esp32s2",
            Self::Esp32s3 => "esp32s3",
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reset method applied after flashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfterReset {
    /// Leave the chip in the loader.
    NoReset,
    /// Soft-reset into the application.
    SoftReset,
    /// Hard-reset via RTS (default).
    #[default]
    HardReset,
}

impl AfterReset {
    /// The reset mode name as esptool expects it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoReset => "no-reset",
            Self::SoftReset => "soft-reset",
            Self::HardReset => "hard-reset",
        }
    }
}

impl fmt::Display for AfterReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter set for one flash operation.
///
/// Constructed once per invocation from CLI input plus defaults; never
/// persisted.
#[derive(Debug, Clone)]
pub struct FlashRequest {
    /// Target chip.
    pub chip: Chip,
    /// Serial port device path.
    pub port: String,
    /// Baud rate for the transfer.
    pub baud: u32,
    /// Reset method before flashing (free-form, passed through to esptool).
    pub before: String,
    /// Reset method after flashing.
    pub after: AfterReset,
    /// Verify the flash contents after writing.
    pub verify: bool,
    /// Flash start address (hex string, passed through to esptool).
    pub address: String,
    /// Path to the firmware binary.
    pub firmware: PathBuf,
}

impl Default for FlashRequest {
    fn default() -> Self {
        Self {
            chip: Chip::default(),
            port: String::new(),
            baud: 115_200,
            before: "default-reset".to_string(),
            after: AfterReset::default(),
            verify: false,
            address: "0x0".to_string(),
            firmware: PathBuf::new(),
        }
    }
}

impl FlashRequest {
    /// Build the esptool argument list for this request.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--chip".to_string(),
            self.chip.as_str().to_string(),
            "--port".to_string(),
            self.port.clone(),
            "--baud".to_string(),
            self.baud.to_string(),
            "--before".to_string(),
            self.before.clone(),
            "--after".to_string(),
            self.after.as_str().to_string(),
            "write-flash".to_string(),
        ];
        if self.verify {
            args.push("--verify".to_string());
        }
        args.push(self.address.clone());
        args.push(self.firmware.display().to_string());
        args
    }
}

/// Handle to a located esptool installation.
#[derive(Debug, Clone)]
pub struct Esptool {
    program: String,
}

impl Esptool {
    /// Locate esptool on PATH, trying `esptool` then `esptool.py`.
    ///
    /// # Errors
    ///
    /// [`Error::EsptoolMissing`] when neither candidate responds to
    /// `version`.
    pub fn locate() -> Result<Self> {
        for candidate in ["esptool", "esptool.py"] {
            let responds = Command::new(candidate)
                .arg("version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false);
            if responds {
                debug!("Using flashing tool: {candidate}");
                return Ok(Self {
                    program: candidate.to_string(),
                });
            }
        }
        Err(Error::EsptoolMissing)
    }

    /// The program name this handle invokes.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run `write-flash` for the given request.
    ///
    /// Blocks until esptool exits. stdio is inherited, so esptool's own
    /// progress output is shown to the user.
    ///
    /// # Errors
    ///
    /// [`Error::FlashFailed`] carrying esptool's exit code on a non-zero
    /// exit, or [`Error::Io`] when the process cannot be spawned.
    pub fn flash(&self, request: &FlashRequest) -> Result<()> {
        let args = request.to_args();
        info!("Running {} {}", self.program, args.join(" "));

        let status = Command::new(&self.program).args(&args).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::FlashFailed(status.code().unwrap_or(1)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chip_names() {
        assert_eq!(Chip::Esp32.as_str(), "esp32");
        assert_eq!(Chip::Esp32s2.as_str(), "esp32s2");
        assert_eq!(Chip::Esp32s3.as_str(), "esp32s3");
        assert_eq!(Chip::default(), Chip::Esp32s3);
    }

    #[test]
    fn test_after_reset_names() {
        assert_eq!(AfterReset::NoReset.as_str(), "no-reset");
        assert_eq!(AfterReset::SoftReset.as_str(), "soft-reset");
        assert_eq!(AfterReset::HardReset.as_str(), "hard-reset");
        assert_eq!(AfterReset::default(), AfterReset::HardReset);
    }

    #[test]
    fn test_request_defaults() {
        let request = FlashRequest::default();
        assert_eq!(request.baud, 115_200);
        assert_eq!(request.before, "default-reset");
        assert_eq!(request.address, "0x0");
        assert!(!request.verify);
    }

    #[test]
    fn test_to_args_without_verify() {
        let request = FlashRequest {
            port: "/dev/ttyUSB0".to_string(),
            firmware: PathBuf::from("v1.0.0.2024.01.01.bin"),
            ..FlashRequest::default()
        };
        assert_eq!(
            request.to_args(),
            vec![
                "--chip",
                "esp32s3",
                "--port",
                "/dev/ttyUSB0",
                "--baud",
                "115200",
                "--before",
                "default-reset",
                "--after",
                "hard-reset",
                "write-flash",
                "0x0",
                "v1.0.0.2024.01.01.bin",
            ]
        );
    }

    #[test]
    fn test_to_args_with_verify_before_address() {
        let request = FlashRequest {
            chip: Chip::Esp32,
            port: "COM3".to_string(),
            baud: 460_800,
            before: "no-reset".to_string(),
            after: AfterReset::NoReset,
            verify: true,
            address: "0x1000".to_string(),
            firmware: PathBuf::from("app.bin"),
        };
        let args = request.to_args();
        let write_flash = args.iter().position(|a| a == "write-flash").unwrap();
        assert_eq!(args[write_flash + 1], "--verify");
        assert_eq!(args[write_flash + 2], "0x1000");
        assert_eq!(args[write_flash + 3], "app.bin");
        assert_eq!(args[1], "esp32");
        assert_eq!(args[5], "460800");
    }
}
