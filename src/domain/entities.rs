//! Domain entities: core data structures

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Longest serial accepted as an override key.
pub const MAX_SERIAL_LEN: usize = 64;

/// Kumo Cloud account credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// A device as reported by the cloud, after local overrides were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Unique identifier assigned by the cloud platform
    pub serial: String,
    /// Display name (the cloud "label")
    pub name: String,
    /// Address used for local network communication
    pub address: Option<String>,
}

/// A single telemetry value, or the marker shown when it could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    Value(String),
    Unavailable,
}

impl Reading {
    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Value(_))
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => f.write_str(v),
            Reading::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// One row of the verbose device listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReport {
    pub name: String,
    pub serial: String,
    pub temperature: Reading,
    pub mode: Reading,
    pub fan_speed: Reading,
    pub run_state: Reading,
    pub wifi_signal: Reading,
    pub ip_address: Reading,
}

/// How the user referred to a device on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    /// 1-based position in the listing
    Index(usize),
    /// Serial or name
    Identifier(String),
}

impl DeviceSelector {
    /// Parse user input. All-digit input is a listing position.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = input.parse::<usize>() {
                return DeviceSelector::Index(n);
            }
        }
        DeviceSelector::Identifier(input.to_string())
    }

    /// The raw text, used for fallback lookups and error messages.
    pub fn as_text(&self) -> String {
        match self {
            DeviceSelector::Index(n) => n.to_string(),
            DeviceSelector::Identifier(s) => s.clone(),
        }
    }
}

/// Validate a dotted-quad IPv4 address (four decimal octets, each 0-255).
///
/// Leading zeros are rejected, so the stored text always equals the input.
pub fn validate_ip_address(input: &str) -> Result<Ipv4Addr, DomainError> {
    let invalid = || DomainError::InvalidIpAddress(input.to_string());

    let octets: Vec<&str> = input.split('.').collect();
    if octets.len() != 4 {
        return Err(invalid());
    }
    let mut parsed = [0u8; 4];
    for (slot, octet) in parsed.iter_mut().zip(&octets) {
        if octet.is_empty() || octet.len() > 3 || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if octet.len() > 1 && octet.starts_with('0') {
            return Err(invalid());
        }
        *slot = octet.parse::<u8>().map_err(|_| invalid())?;
    }
    Ok(Ipv4Addr::from(parsed))
}

/// Check that a serial is usable as an override key.
pub fn validate_serial(serial: &str) -> Result<(), DomainError> {
    let ok = !serial.is_empty()
        && serial.len() <= MAX_SERIAL_LEN
        && serial
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(DomainError::InvalidSerial(serial.to_string()))
    }
}

/// Expand environment variables in a path string.
///
/// Supports `$VAR`, `${VAR}` and `~` for the home directory.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
