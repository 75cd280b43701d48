//! esp-detect - list serial ports and call out likely ESP32 dev boards.
//!
//! Informational tool: prints every serial port the OS reports, then the
//! subset that classifies as ESP32-like. Always exits 0.

use clap::Parser;
use console::style;
use env_logger::Env;
use esprov::{PortInfo, detect_ports};

/// List serial ports and flag likely ESP32 development boards.
#[derive(Parser)]
#[command(name = "esp-detect")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output the port list as JSON to stdout.
    #[arg(long)]
    json: bool,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress log output).
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let ports = detect_ports();

    if cli.json {
        print_json(&ports);
        return;
    }

    println!("All serial ports:\n");
    for port in &ports {
        let vid_pid = port.vid_pid().unwrap_or_else(|| "----".to_string());
        println!("  {:<10} {:<9} {}", port.name, vid_pid, port.description);
    }

    let likely: Vec<&PortInfo> = ports.iter().filter(|p| p.is_esp32_like()).collect();
    if likely.is_empty() {
        println!("\nNo ESP32-like ports detected.");
    } else {
        println!("\nLikely ESP32 port(s):");
        for port in likely {
            println!(
                "  {} {} ({})",
                style("→").green(),
                style(&port.name).cyan(),
                port.description
            );
        }
    }
}

/// Structured port list on stdout, one record per port.
fn print_json(ports: &[PortInfo]) {
    let rows: Vec<serde_json::Value> = ports
        .iter()
        .map(|port| {
            serde_json::json!({
                "name": port.name,
                "vid": port.vid,
                "pid": port.pid,
                "vid_pid": port.vid_pid(),
                "description": port.description,
                "hardware_id": port.hardware_id,
                "esp32_like": port.is_esp32_like(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
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

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_command_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["esp-detect"]).unwrap();
        assert!(!cli.json);
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_json_flag() {
        let cli = Cli::try_parse_from(["esp-detect", "--json"]).unwrap();
        assert!(cli.json);
    }
}
