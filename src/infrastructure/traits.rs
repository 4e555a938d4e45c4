//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations (local files, interactive
//! prompts and the Kumo Cloud), allowing services to be tested with mock
//! implementations.

use std::io;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::domain::Credentials;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;

    /// Replace `path` with `content` via temp file + rename in the same directory.
    ///
    /// With `owner_only` the temp file gets mode 0600 before the rename, so the
    /// target never exists with wider permissions.
    fn write_atomic(&self, path: &Path, content: &str, owner_only: bool) -> io::Result<()>;
}

/// Interactive terminal prompts.
pub trait Prompter: Send + Sync {
    /// Ask for a line of text.
    fn input(&self, prompt: &str) -> io::Result<String>;

    /// Ask for a secret without echoing it.
    fn password(&self, prompt: &str) -> io::Result<String>;
}

/// Errors returned across the cloud collaborator boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    #[error("credentials rejected: {0}")]
    Unauthorized(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("not available: {0}")]
    Unavailable(String),
}

pub type CloudResult<T> = Result<T, CloudError>;

/// Entry point to the Kumo Cloud.
pub trait KumoCloud: Send + Sync {
    /// Log in; the returned account is used for every further call.
    fn authenticate(&self, credentials: &Credentials) -> CloudResult<Box<dyn CloudAccount>>;
}

/// An authenticated cloud account.
pub trait CloudAccount {
    /// Indoor units registered to the account, in cloud order.
    fn list_devices(&self) -> CloudResult<Vec<Box<dyn DeviceHandle>>>;
}

/// A single indoor unit. Every accessor may fail independently.
pub trait DeviceHandle {
    fn serial(&self) -> CloudResult<String>;
    fn name(&self) -> CloudResult<String>;

    /// Address used for local communication, if known.
    fn address(&self) -> Option<String>;
    fn set_address(&mut self, address: &str);

    /// Fetch fresh status; telemetry accessors read what this fetched.
    fn refresh_status(&mut self) -> CloudResult<()>;

    /// Room temperature in degrees Celsius.
    fn temperature(&self) -> CloudResult<f64>;
    fn mode(&self) -> CloudResult<String>;
    fn fan_speed(&self) -> CloudResult<String>;
    fn run_state(&self) -> CloudResult<String>;
    /// WiFi RSSI in dBm.
    fn wifi_signal(&self) -> CloudResult<i64>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn write_atomic(&self, path: &Path, content: &str, owner_only: bool) -> io::Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;

        // tempfile creates 0600 on unix; widen it back for ordinary files
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = if owner_only { 0o600 } else { 0o644 };
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(mode))?;
        }
        #[cfg(not(unix))]
        let _ = owner_only;

        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Real prompter using dialoguer.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&self, prompt: &str) -> io::Result<String> {
        dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn password(&self, prompt: &str) -> io::Result<String> {
        dialoguer::Password::new()
            .with_prompt(prompt)
            .interact()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}
