//! esp-flash - flash firmware to an ESP32 board via esptool.
//!
//! Detects an ESP32 serial port (unless given), selects the newest versioned
//! `v*.bin` in the current directory (unless given), confirms, and delegates
//! the actual write to esptool.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::style;
use dialoguer::{Input, theme::ColorfulTheme};
use env_logger::Env;
use esprov::{
    AfterReset, Chip, Esptool, FlashRequest, PortInfo, detect_ports, select_firmware,
    unknown_vid_pids,
};
use log::debug;

/// Flash firmware to an ESP32 board via esptool (auto-detects the port).
///
/// Environment variables:
///   ESPROV_PORT - Default serial port
///   ESPROV_BAUD - Default baud rate (default: 115200)
///   ESPROV_CHIP - Default chip type (esp32, esp32s2, esp32s3)
#[derive(Parser)]
#[command(name = "esp-flash")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Serial port (e.g. COM3 or /dev/ttyUSB0; auto-detected if not given).
    #[arg(short, long, env = "ESPROV_PORT")]
    port: Option<String>,

    /// Baud rate.
    #[arg(short, long, default_value_t = 115_200, env = "ESPROV_BAUD")]
    baud: u32,

    /// Target chip.
    #[arg(short, long, value_enum, default_value_t = ChipArg::Esp32s3, env = "ESPROV_CHIP")]
    chip: ChipArg,

    /// Flash start address.
    #[arg(short, long, default_value = "0x0")]
    address: String,

    /// Verify flash after writing.
    #[arg(long)]
    verify: bool,

    /// Reset method before flashing.
    #[arg(long, default_value = "default-reset")]
    before: String,

    /// Reset method after flashing.
    #[arg(long, value_enum, default_value_t = AfterArg::HardReset)]
    after: AfterArg,

    /// Path to the firmware binary (newest v*.bin here if not given).
    firmware: Option<PathBuf>,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress log output).
    #[arg(short, long)]
    quiet: bool,
}

/// Supported chip types.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChipArg {
    /// Original ESP32.
    Esp32,
    /// ESP32-S2.
    Esp32s2,
    /// ESP32-S3 (default).
    Esp32s3,
}

impl From<ChipArg> for Chip {
    fn from(chip: ChipArg) -> Self {
        match chip {
            ChipArg::Esp32 => Chip::Esp32,
            ChipArg::Esp32s2 => Chip::Esp32s2,
            ChipArg::Esp32s3 => Chip::Esp32s3,
        }
    }
}

/// Reset methods applied after flashing.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum AfterArg {
    /// Leave the chip in the loader.
    NoReset,
    /// Soft-reset into the application.
    SoftReset,
    /// Hard-reset via RTS (default).
    HardReset,
}

impl From<AfterArg> for AfterReset {
    fn from(after: AfterArg) -> Self {
        match after {
            AfterArg::NoReset => AfterReset::NoReset,
            AfterArg::SoftReset => AfterReset::SoftReset,
            AfterArg::HardReset => AfterReset::HardReset,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(&cli) {
        eprintln!("{} {err:#}", style("Error:").red().bold());
        std::process::exit(exit_code(&err));
    }
}

/// Map failures to process exit codes: esptool's own exit code is
/// propagated, everything else is 1.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<esprov::Error>()
        .and_then(esprov::Error::flash_exit_code)
        .unwrap_or(1)
}

fn run(cli: &Cli) -> Result<()> {
    // Dependency check comes first: without esptool there is nothing to do.
    let esptool = Esptool::locate()?;
    debug!("Flashing tool: {}", esptool.program());

    let search_dir = std::env::current_dir().context("failed to get current directory")?;
    let firmware = select_firmware(&search_dir, cli.firmware.as_deref())?;

    let ports = detect_ports();
    suggest_drivers(&ports);

    let port = match &cli.port {
        Some(port) => port.clone(),
        None => resolve_port(&ports)?,
    };

    // Advisory: name the driver for the chosen port if we recognize it.
    if let Some(info) = ports.iter().find(|p| p.name == port) {
        if let (Some(vid_pid), Some(driver)) = (info.vid_pid(), info.driver()) {
            eprintln!("Detected ESP32 port {port} uses VID:PID {vid_pid}.");
            eprintln!("Suggested driver: {} ({})\n", driver.name, driver.url);
        }
    }

    let request = FlashRequest {
        chip: cli.chip.into(),
        port,
        baud: cli.baud,
        before: cli.before.clone(),
        after: cli.after.into(),
        verify: cli.verify,
        address: cli.address.clone(),
        firmware,
    };

    print_summary(&request);
    if !cli.yes && !confirm()? {
        eprintln!("Flashing aborted.");
        return Ok(());
    }

    esptool.flash(&request)?;
    eprintln!(
        "{} Flashing completed successfully.",
        style("✓").green().bold()
    );
    Ok(())
}

/// Print a driver-suggestion notice for attached USB serial devices with a
/// VID:PID outside the known table. Advisory only, never blocks.
fn suggest_drivers(ports: &[PortInfo]) {
    let unknown = unknown_vid_pids(ports);
    if unknown.is_empty() {
        return;
    }

    eprintln!("\nDetected USB serial devices with unrecognized VID:PID:");
    for vid_pid in &unknown {
        eprintln!("  {vid_pid}");
    }
    eprintln!(
        "If your ESP32 board isn't recognized, install the appropriate vendor driver and reconnect the device.\n"
    );
}

/// Classify ports and pick the target.
///
/// Exactly one match is used directly; with several, the candidates are
/// listed and the first in enumeration order is taken (documented default,
/// not a prompt); with none the user must pass `--port`.
fn resolve_port(ports: &[PortInfo]) -> Result<String, esprov::Error> {
    let candidates: Vec<&PortInfo> = ports.iter().filter(|p| p.is_esp32_like()).collect();
    match candidates.as_slice() {
        [] => Err(esprov::Error::PortNotFound),
        [only] => Ok(only.name.clone()),
        many => {
            eprintln!("Multiple ESP32-like ports found:");
            for (idx, port) in many.iter().enumerate() {
                eprintln!("  {}: {}", idx + 1, port.name);
            }
            eprintln!("Using the first one by default.");
            Ok(many[0].name.clone())
        },
    }
}

/// Human-readable summary of the pending operation.
fn print_summary(request: &FlashRequest) {
    eprintln!(
        "About to flash '{}' to {} ({} @ {}bps, address {}).",
        style(request.firmware.display()).cyan(),
        style(&request.port).cyan(),
        request.chip,
        request.baud,
        request.address
    );
    eprintln!(
        "Reset before: {}, reset after: {}.",
        request.before, request.after
    );
    if request.verify {
        eprintln!("Flash will be verified after writing.");
    }
}

/// Interactive confirmation. An empty reply counts as yes.
fn confirm() -> Result<bool> {
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Proceed? [Y/n]")
        .allow_empty(true)
        .interact_text()
        .context("confirmation prompt failed")?;
    Ok(is_affirmative(&answer))
}

/// Whether a confirmation reply means "go ahead".
fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

fn init_logging(verbose: u8, quiet: bool) {
    let log_level = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(false)
        .format_timestamp(None)
        .init();
}
