//! Device directory service
//!
//! Fetches the account's devices from the cloud and merges the locally stored
//! overrides (`devices.json`) onto them by serial.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    apply_overrides, validate_ip_address, validate_serial, Device, DeviceReport, DeviceSelector,
    OverrideFile, Reading,
};
use crate::infrastructure::traits::{CloudAccount, CloudResult, DeviceHandle, FileSystem};

/// Name shown for a device whose label cannot be read.
pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Cloud devices with local overrides applied.
///
/// `devices[i]` and `handles[i]` always describe the same unit.
pub struct DeviceDirectory {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    devices: Vec<Device>,
    handles: Vec<Box<dyn DeviceHandle>>,
    overrides: OverrideFile,
}

impl DeviceDirectory {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self {
            fs,
            settings,
            devices: Vec::new(),
            handles: Vec::new(),
            overrides: OverrideFile::default(),
        }
    }

    pub fn overrides_path(&self) -> PathBuf {
        self.settings.devices_file()
    }

    /// Fetch devices (cloud order kept), read overrides, merge.
    #[instrument(skip_all)]
    pub fn load(&mut self, account: &dyn CloudAccount) -> ApplicationResult<()> {
        let handles = account.list_devices()?;
        debug!("load: cloud reported {} device(s)", handles.len());

        self.devices.clear();
        self.handles.clear();
        for handle in handles {
            let serial = match handle.serial() {
                Ok(s) => s,
                Err(e) => {
                    warn!("skipping device without readable serial: {}", e);
                    continue;
                }
            };
            let name = handle.name().unwrap_or_else(|e| {
                warn!("device {}: name unavailable: {}", serial, e);
                UNKNOWN_DEVICE.to_string()
            });
            self.devices.push(Device {
                serial,
                name,
                address: handle.address(),
            });
            self.handles.push(handle);
        }

        self.overrides = self.read_overrides();
        self.merge();
        Ok(())
    }

    fn merge(&mut self) {
        let applied = apply_overrides(&mut self.devices, &self.overrides);
        for (device, handle) in self.devices.iter().zip(self.handles.iter_mut()) {
            if let Some(ip) = self.overrides.ip_for(&device.serial) {
                handle.set_address(ip);
            }
        }
        debug!("merge: applied {} override(s)", applied);
    }

    /// Read `devices.json`; absent or malformed files count as empty.
    fn read_overrides(&self) -> OverrideFile {
        let path = self.overrides_path();
        if !self.fs.exists(&path) {
            return OverrideFile::default();
        }
        let content = match self.fs.read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("ignoring unreadable overrides file {}: {}", path.display(), e);
                return OverrideFile::default();
            }
        };
        match OverrideFile::parse(&content) {
            Ok(mut file) => {
                for key in file.retain_valid() {
                    warn!("ignoring override with invalid serial {:?}", key);
                }
                file
            }
            Err(e) => {
                warn!("ignoring malformed overrides file {}: {}", path.display(), e);
                OverrideFile::default()
            }
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn overrides(&self) -> &OverrideFile {
        &self.overrides
    }

    pub fn find_by_serial(&self, serial: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.serial == serial)
    }

    /// Case-insensitive exact match; the first of several same-named devices wins.
    pub fn find_by_name(&self, name: &str) -> Option<&Device> {
        let wanted = name.to_lowercase();
        self.devices.iter().find(|d| d.name.to_lowercase() == wanted)
    }

    /// Listing position first, then serial, then name.
    pub fn resolve(&self, selector: &DeviceSelector) -> ApplicationResult<&Device> {
        if let DeviceSelector::Index(n) = selector {
            if let Some(device) = n.checked_sub(1).and_then(|i| self.devices.get(i)) {
                return Ok(device);
            }
        }
        let text = selector.as_text();
        self.find_by_serial(&text)
            .or_else(|| self.find_by_name(&text))
            .ok_or(ApplicationError::DeviceNotFound(text))
    }

    /// Validate and upsert the IP override for `serial`, rewriting the whole file.
    #[instrument(skip(self))]
    pub fn store_override(&mut self, serial: &str, ip_address: &str) -> ApplicationResult<PathBuf> {
        let ip = validate_ip_address(ip_address.trim())?.to_string();
        validate_serial(serial)?;

        let path = self.overrides_path();
        let mut file = self.read_overrides();
        file.upsert_ip(serial, &ip);
        let content = file.to_json().map_err(|e| ApplicationError::OperationFailed {
            context: "serialize overrides".into(),
            source: Box::new(e),
        })?;

        self.fs
            .ensure_parent(&path)
            .with_path_context("create data directory", &path)?;
        self.fs
            .write_atomic(&path, &content, false)
            .with_path_context("write overrides", &path)?;
        debug!("store_override: {} -> {} in {}", serial, ip, path.display());

        self.overrides = file;
        self.merge();
        Ok(path)
    }

    /// Telemetry rows for the verbose listing.
    ///
    /// The IP column is the locally stored override, not the cloud address.
    ///
    /// Each field degrades to `Reading::Unavailable` on its own; a failed
    /// status refresh is logged and the accessors still run.
    pub fn reports(&mut self) -> Vec<DeviceReport> {
        let mut rows = Vec::with_capacity(self.devices.len());
        for (device, handle) in self.devices.iter().zip(self.handles.iter_mut()) {
            if let Err(e) = handle.refresh_status() {
                warn!("device {}: status refresh failed: {}", device.serial, e);
            }
            let serial = device.serial.as_str();
            rows.push(DeviceReport {
                name: device.name.clone(),
                serial: serial.to_string(),
                temperature: reading(serial, "temperature", handle.temperature(), |t| {
                    format!("{t:.1}°C")
                }),
                mode: reading(serial, "mode", handle.mode(), |m| m),
                fan_speed: reading(serial, "fan_speed", handle.fan_speed(), |f| f),
                run_state: reading(serial, "run_state", handle.run_state(), |s| s),
                wifi_signal: reading(serial, "wifi_signal", handle.wifi_signal(), |r| {
                    format!("{r} dBm")
                }),
                ip_address: self
                    .overrides
                    .ip_for(serial)
                    .map(|ip| Reading::Value(ip.to_string()))
                    .unwrap_or(Reading::Unavailable),
            });
        }
        rows
    }
}

fn reading<T>(
    serial: &str,
    field: &str,
    value: CloudResult<T>,
    render: impl FnOnce(T) -> String,
) -> Reading {
    match value {
        Ok(v) => Reading::Value(render(v)),
        Err(e) => {
            debug!("device {}: {} unavailable: {}", serial, field, e);
            Reading::Unavailable
        }
    }
}
