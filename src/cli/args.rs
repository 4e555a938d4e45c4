//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// HVAC stability management tool for the Kumo Cloud API
#[derive(Parser, Debug)]
#[command(name = "hvac-stability")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Show log output of the Kumo Cloud client
    #[arg(long, global = true)]
    pub cloud_logging: bool,

    /// Settings file (default: ~/.config/hvac-stability/config.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in to Kumo Cloud and store the credentials
    Login {
        /// Account username (default: stored, then KUMO_AUTH_USERNAME, then prompt)
        username: Option<String>,
        /// Account password (default: stored, then KUMO_AUTH_PASSWORD, then prompt)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List devices
    List {
        /// Show telemetry and stored IP per device
        #[arg(short, long)]
        verbose: bool,
    },

    /// Store the local IP address of a device
    #[command(name = "store_device_ip", visible_alias = "store-device-ip")]
    StoreDeviceIp {
        /// Listing number, serial or name (prompted when omitted)
        device_identifier: Option<String>,
        /// IPv4 address, e.g. 192.168.1.20 (prompted when omitted)
        ip_address: Option<String>,
    },

    /// Check a device's settings (not implemented yet)
    #[command(name = "check_device_settings", visible_alias = "check-device-settings")]
    CheckDeviceSettings {
        /// Device name or serial
        name_or_serial: String,
    },

    /// Return a device to its schedule (not implemented yet)
    #[command(
        name = "reset_device_to_scheduled",
        visible_alias = "reset-device-to-scheduled"
    )]
    ResetDeviceToScheduled {
        /// Device name or serial
        name_or_serial: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings (password masked)
    Show,

    /// Show config and data file paths
    Path,
}
