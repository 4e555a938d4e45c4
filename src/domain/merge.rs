//! Local device overrides and the merge onto cloud-reported devices.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entities::{validate_serial, Device};

/// Contents of `devices.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideFile {
    #[serde(default)]
    pub devices: BTreeMap<String, OverrideEntry>,
}

/// Locally stored fields for one device.
///
/// Keys other than `ip_address` are kept as-is so hand edits survive a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl OverrideFile {
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Pretty JSON with sorted keys and a trailing newline.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Drop entries whose key is not a valid serial; returns the dropped keys.
    pub fn retain_valid(&mut self) -> Vec<String> {
        let invalid: Vec<String> = self
            .devices
            .keys()
            .filter(|k| validate_serial(k).is_err())
            .cloned()
            .collect();
        for key in &invalid {
            self.devices.remove(key);
        }
        invalid
    }

    /// Insert or update the IP address for `serial`, keeping other fields.
    pub fn upsert_ip(&mut self, serial: &str, ip_address: &str) {
        self.devices
            .entry(serial.to_string())
            .or_default()
            .ip_address = Some(ip_address.to_string());
    }

    pub fn ip_for(&self, serial: &str) -> Option<&str> {
        self.devices
            .get(serial)
            .and_then(|e| e.ip_address.as_deref())
    }
}

/// Apply override addresses to matching devices.
///
/// Devices without an override keep their cloud address; overrides without a
/// live device are ignored. Returns the number of devices updated.
pub fn apply_overrides(devices: &mut [Device], overrides: &OverrideFile) -> usize {
    let mut applied = 0;
    for device in devices.iter_mut() {
        if let Some(ip) = overrides.ip_for(&device.serial) {
            device.address = Some(ip.to_string());
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(serial: &str, address: Option<&str>) -> Device {
        Device {
            serial: serial.to_string(),
            name: format!("unit {serial}"),
            address: address.map(str::to_string),
        }
    }

    #[test]
    fn given_matching_override_when_merging_then_address_is_replaced() {
        let overrides =
            OverrideFile::parse(r#"{"devices":{"SN123":{"ip_address":"10.0.0.5"}}}"#).unwrap();
        let mut devices = vec![device("SN123", Some("192.168.1.9"))];

        let applied = apply_overrides(&mut devices, &overrides);

        assert_eq!(applied, 1);
        assert_eq!(devices[0].address.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn given_unmatched_entries_when_merging_then_devices_untouched() {
        let overrides =
            OverrideFile::parse(r#"{"devices":{"OFFLINE":{"ip_address":"10.0.0.7"}}}"#).unwrap();
        let mut devices = vec![device("SN1", Some("192.168.1.9")), device("SN2", None)];

        let applied = apply_overrides(&mut devices, &overrides);

        assert_eq!(applied, 0);
        assert_eq!(devices[0].address.as_deref(), Some("192.168.1.9"));
        assert_eq!(devices[1].address, None);
    }

    #[test]
    fn given_entry_without_ip_when_merging_then_address_kept() {
        let overrides =
            OverrideFile::parse(r#"{"devices":{"SN1":{"note":"upstairs"}}}"#).unwrap();
        let mut devices = vec![device("SN1", Some("192.168.1.9"))];

        apply_overrides(&mut devices, &overrides);

        assert_eq!(devices[0].address.as_deref(), Some("192.168.1.9"));
    }

    #[test]
    fn given_same_inputs_when_merging_twice_then_assignment_is_stable() {
        let overrides = OverrideFile::parse(
            r#"{"devices":{"A":{"ip_address":"10.0.0.1"},"C":{"ip_address":"10.0.0.3"}}}"#,
        )
        .unwrap();
        let mut devices = vec![device("A", None), device("B", Some("1.1.1.1")), device("C", None)];

        apply_overrides(&mut devices, &overrides);
        let first = devices.clone();
        apply_overrides(&mut devices, &overrides);

        assert_eq!(devices, first);
    }

    #[test]
    fn given_extra_keys_when_upserting_then_they_survive_rewrite() {
        let mut file = OverrideFile::parse(
            r#"{"devices":{"SN1":{"ip_address":"10.0.0.1","note":"upstairs"}}}"#,
        )
        .unwrap();

        file.upsert_ip("SN1", "10.0.0.9");
        file.upsert_ip("SN2", "10.0.0.2");
        let reparsed = OverrideFile::parse(&file.to_json().unwrap()).unwrap();

        assert_eq!(reparsed.ip_for("SN1"), Some("10.0.0.9"));
        assert_eq!(reparsed.ip_for("SN2"), Some("10.0.0.2"));
        assert_eq!(
            reparsed.devices["SN1"].extra.get("note"),
            Some(&Value::String("upstairs".into()))
        );
    }

    #[test]
    fn given_invalid_keys_when_retaining_then_they_are_dropped() {
        let mut file = OverrideFile::parse(
            r#"{"devices":{"SN1":{"ip_address":"10.0.0.1"},"bad key":{"ip_address":"10.0.0.2"}}}"#,
        )
        .unwrap();

        let dropped = file.retain_valid();

        assert_eq!(dropped, vec!["bad key".to_string()]);
        assert!(file.devices.contains_key("SN1"));
    }

    #[test]
    fn given_empty_object_when_parsing_then_no_devices() {
        let file = OverrideFile::parse("{}").unwrap();
        assert!(file.devices.is_empty());
    }
}
