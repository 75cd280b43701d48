//! # esprov
//!
//! A library for provisioning ESP32 development boards over USB serial.
//!
//! This crate provides the host-side building blocks used by the `esp-detect`
//! and `esp-flash` command-line tools:
//!
//! - Serial port enumeration and ESP32 board classification (VID:PID table
//!   plus description/hardware-id keyword heuristics)
//! - Firmware image selection by semantic version and release date
//! - Delegation of the actual flash write to the external `esptool` program
//!
//! The crate deliberately implements no flashing protocol of its own: serial
//! enumeration is delegated to the `serialport` crate and device programming
//! to esptool.
//!
//! ## Example
//!
//! ```rust,no_run
//! use esprov::{detect_esp32_ports, select_firmware, Esptool, FlashRequest};
//!
//! fn main() -> esprov::Result<()> {
//!     let esptool = Esptool::locate()?;
//!     let firmware = select_firmware(std::path::Path::new("."), None)?;
//!
//!     let ports = detect_esp32_ports();
//!     let port = ports.first().ok_or(esprov::Error::PortNotFound)?;
//!
//!     let request = FlashRequest {
//!         port: port.name.clone(),
//!         firmware,
//!         ..FlashRequest::default()
//!     };
//!     esptool.flash(&request)
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod device;
pub mod error;
pub mod firmware;
pub mod flasher;

// Re-exports for convenience
pub use {
    device::{
        DriverInfo, PortInfo, detect_esp32_ports, detect_ports, driver_for, unknown_vid_pids,
    },
    error::{Error, Result},
    firmware::{VersionKey, select_firmware, version_key},
    flasher::{AfterReset, Chip, Esptool, FlashRequest},
};
