//! Serial port discovery and ESP32 board classification.
//!
//! ESP32 development boards reach the host through a small set of USB-to-UART
//! bridges:
//! - Silicon Labs CP210x (VID: 0x10C4, PID: 0xEA60)
//! - WCH CH340 (VID: 0x1A86, PID: 0x7523)
//! - FTDI FT-X (VID: 0x0403, PID: 0x6015)
//! - Espressif native USB (VID: 0x303A, PID: 0x1001)
//!
//! Classification checks the exact VID:PID first; ports without USB metadata
//! (or with an unlisted pair) fall back to keyword matching against the
//! description and hardware-id text.

use log::{debug, trace};

/// Human-readable driver information for a known USB-to-UART bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverInfo {
    /// Driver package name as published by the vendor.
    pub name: &'static str,
    /// Vendor download page.
    pub url: &'static str,
}

/// Known ESP32 USB-serial VID:PID pairs and their driver info.
///
/// Keys are lowercase `vvvv:pppp` strings, 4 hex digits each.
const ESP32_DRIVERS: &[(&str, DriverInfo)] = &[
    (
        "10c4:ea60",
        DriverInfo {
            name: "Silicon Labs CP210x USB to UART Bridge VCP Drivers",
            url: "https://www.silabs.com/developers/usb-to-uart-bridge-vcp-drivers",
        },
    ),
    (
        "1a86:7523",
        DriverInfo {
            name: "WCH CH340/CH341 Windows Drivers",
            url: "http://www.wch.cn/downloads/CH341SER_ZIP.html",
        },
    ),
    (
        "0403:6015",
        DriverInfo {
            name: "FTDI Virtual COM Port Drivers",
            url: "https://ftdichip.com/drivers/vcp-drivers/",
        },
    ),
    (
        "303a:1001",
        DriverInfo {
            name: "Espressif USB Driver",
            url: "https://docs.espressif.com/projects/esp-idf/en/latest/esp32/get-started/windows-setup.html#install-usb-driver",
        },
    ),
];

/// Keywords often found in the description or hardware-id of ESP32 devkits.
///
/// Matched case-insensitively, only when the VID:PID check is inconclusive.
const ESP32_KEYWORDS: &[&str] = &["cp210", "ch340", "ftdi", "usb-serial", "esp32"];

/// Look up driver info for a lowercase `vvvv:pppp` string.
#[must_use]
pub fn driver_for(vid_pid: &str) -> Option<&'static DriverInfo> {
    ESP32_DRIVERS
        .iter()
        .find(|(key, _)| *key == vid_pid)
        .map(|(_, info)| info)
}

/// One discovered serial port.
///
/// Produced solely by [`detect_ports`]; read-only and valid for a single
/// program invocation.
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Platform-specific device path (e.g. "/dev/ttyUSB0" or "COM3").
    pub name: String,
    /// USB Vendor ID (if available).
    pub vid: Option<u16>,
    /// USB Product ID (if available).
    pub pid: Option<u16>,
    /// Free-text device description (usually the USB product string).
    pub description: String,
    /// Free-text hardware identifier; may duplicate vendor/product info.
    pub hardware_id: String,
}

impl PortInfo {
    /// Format the USB IDs as a lowercase `vvvv:pppp` string.
    ///
    /// Returns `None` unless both vendor and product IDs are present.
    #[must_use]
    pub fn vid_pid(&self) -> Option<String> {
        match (self.vid, self.pid) {
            (Some(vid), Some(pid)) => Some(format!("{vid:04x}:{pid:04x}")),
            _ => None,
        }
    }

    /// Driver info for this port's VID:PID, if it is a known bridge.
    #[must_use]
    pub fn driver(&self) -> Option<&'static DriverInfo> {
        self.vid_pid().as_deref().and_then(driver_for)
    }

    /// Check whether this port looks like an ESP32 development board.
    ///
    /// An exact VID:PID table match wins immediately; otherwise the
    /// description and hardware-id are searched for the keyword list.
    /// Pure function over the port and the static tables.
    #[must_use]
    pub fn is_esp32_like(&self) -> bool {
        if let Some(vid_pid) = self.vid_pid() {
            if driver_for(&vid_pid).is_some() {
                return true;
            }
        }

        let desc = self.description.to_lowercase();
        let hwid = self.hardware_id.to_lowercase();
        ESP32_KEYWORDS
            .iter()
            .any(|key| desc.contains(key) || hwid.contains(key))
    }
}

/// Detect all available serial ports with USB metadata.
///
/// Reflects the live OS device list at call time; the result is never cached
/// and preserves the enumeration order reported by the platform.
pub fn detect_ports() -> Vec<PortInfo> {
    let mut result = Vec::new();

    match serialport::available_ports() {
        Ok(ports) => {
            for port_info in ports {
                let mut detected = PortInfo {
                    name: port_info.port_name.clone(),
                    vid: None,
                    pid: None,
                    description: String::new(),
                    hardware_id: String::new(),
                };

                if let serialport::SerialPortType::UsbPort(usb_info) = port_info.port_type {
                    detected.vid = Some(usb_info.vid);
                    detected.pid = Some(usb_info.pid);
                    detected.description = usb_info.product.unwrap_or_default();
                    detected.hardware_id = format_hardware_id(
                        usb_info.vid,
                        usb_info.pid,
                        usb_info.serial_number.as_deref(),
                    );

                    trace!(
                        "Found USB port: {} (VID: {:04X}, PID: {:04X})",
                        port_info.port_name,
                        usb_info.vid,
                        usb_info.pid
                    );
                }

                result.push(detected);
            }
        },
        Err(e) => {
            debug!("Failed to enumerate serial ports: {e}");
        },
    }

    result
}

/// Detect ports that are likely ESP32 development boards.
///
/// Order-preserving subset of [`detect_ports`].
pub fn detect_esp32_ports() -> Vec<PortInfo> {
    detect_ports()
        .into_iter()
        .filter(PortInfo::is_esp32_like)
        .collect()
}

/// Collect the VID:PIDs of attached USB serial devices that are not in the
/// known-driver table, deduplicated and sorted.
#[must_use]
pub fn unknown_vid_pids(ports: &[PortInfo]) -> Vec<String> {
    let mut unknown: Vec<String> = ports
        .iter()
        .filter_map(PortInfo::vid_pid)
        .filter(|vid_pid| driver_for(vid_pid).is_none())
        .collect();
    unknown.sort();
    unknown.dedup();
    unknown
}

/// Build a pyserial-style hardware-id string from USB metadata.
fn format_hardware_id(vid: u16, pid: u16, serial: Option<&str>) -> String {
    match serial {
        Some(serial) if !serial.is_empty() => {
            format!("USB VID:PID={vid:04X}:{pid:04X} SER={serial}")
        },
        _ => format!("USB VID:PID={vid:04X}:{pid:04X}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(vid: Option<u16>, pid: Option<u16>, description: &str, hardware_id: &str) -> PortInfo {
        PortInfo {
            name: "/dev/ttyUSB0".to_string(),
            vid,
            pid,
            description: description.to_string(),
            hardware_id: hardware_id.to_string(),
        }
    }

    #[test]
    fn test_vid_pid_formatting_zero_padded_lowercase() {
        let p = port(Some(0x10C4), Some(0xEA60), "", "");
        assert_eq!(p.vid_pid().as_deref(), Some("10c4:ea60"));

        let p = port(Some(0x0403), Some(0x6015), "", "");
        assert_eq!(p.vid_pid().as_deref(), Some("0403:6015"));
    }

    #[test]
    fn test_vid_pid_requires_both_ids() {
        assert!(port(Some(0x10C4), None, "", "").vid_pid().is_none());
        assert!(port(None, Some(0xEA60), "", "").vid_pid().is_none());
        assert!(port(None, None, "", "").vid_pid().is_none());
    }

    #[test]
    fn test_driver_for_known_pairs() {
        assert!(driver_for("10c4:ea60").is_some());
        assert!(driver_for("1a86:7523").is_some());
        assert!(driver_for("0403:6015").is_some());
        assert!(driver_for("303a:1001").is_some());
        assert!(driver_for("1234:5678").is_none());
    }

    #[test]
    fn test_known_vid_pid_matches_regardless_of_text() {
        // Table hit must win even with an empty or misleading description.
        let p = port(Some(0x10C4), Some(0xEA60), "", "");
        assert!(p.is_esp32_like());

        let p = port(Some(0x303A), Some(0x1001), "Some Random Gadget", "PCI\\thing");
        assert!(p.is_esp32_like());
    }

    #[test]
    fn test_keyword_fallback_in_description() {
        let p = port(None, None, "CP2102N USB to UART Bridge Controller", "");
        assert!(p.is_esp32_like());

        let p = port(None, None, "USB-SERIAL CH340 (COM3)", "");
        assert!(p.is_esp32_like());
    }

    #[test]
    fn test_keyword_fallback_in_hardware_id() {
        let p = port(None, None, "", "FTDIBUS\\VID_0403+PID_6001");
        assert!(p.is_esp32_like());

        let p = port(None, None, "n/a", "usb-serial adapter rev2");
        assert!(p.is_esp32_like());
    }

    #[test]
    fn test_keyword_fallback_is_case_insensitive() {
        let p = port(None, None, "ESP32-S3 DevKitC", "");
        assert!(p.is_esp32_like());

        let p = port(None, None, "esp32 module", "");
        assert!(p.is_esp32_like());
    }

    #[test]
    fn test_unlisted_vid_pid_falls_back_to_keywords() {
        // VID:PID present but not in the table; description still matches.
        let p = port(Some(0x067B), Some(0x2303), "CH340 clone", "");
        assert!(p.is_esp32_like());
    }

    #[test]
    fn test_no_match_returns_false() {
        let p = port(None, None, "Standard Serial over Bluetooth link", "BTHENUM\\local");
        assert!(!p.is_esp32_like());

        let p = port(Some(0x067B), Some(0x2303), "Prolific PL2303", "");
        assert!(!p.is_esp32_like());
    }

    #[test]
    fn test_port_driver_lookup() {
        let p = port(Some(0x1A86), Some(0x7523), "", "");
        let driver = p.driver().expect("CH340 is in the driver table");
        assert!(driver.name.contains("CH340"));
        assert!(driver.url.starts_with("http"));

        assert!(port(None, None, "esp32", "").driver().is_none());
    }

    #[test]
    fn test_unknown_vid_pids_dedup_and_skip_known() {
        let ports = vec![
            port(Some(0x067B), Some(0x2303), "", ""),
            port(Some(0x067B), Some(0x2303), "", ""),
            port(Some(0x10C4), Some(0xEA60), "", ""),
            port(None, None, "", ""),
        ];
        assert_eq!(unknown_vid_pids(&ports), vec!["067b:2303".to_string()]);
    }

    #[test]
    fn test_format_hardware_id() {
        assert_eq!(
            format_hardware_id(0x10C4, 0xEA60, Some("0001")),
            "USB VID:PID=10C4:EA60 SER=0001"
        );
        assert_eq!(
            format_hardware_id(0x1A86, 0x7523, None),
            "USB VID:PID=1A86:7523"
        );
    }

    #[test]
    fn test_detect_ports_does_not_panic() {
        // Just make sure enumeration doesn't panic on the host.
        let _ = detect_ports();
    }
}
