//! Kumo Cloud HTTP adapter
//!
//! Logs in with account credentials and reads the indoor units (and their
//! last reported condition) from the account snapshot the cloud returns.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{StatusCode, Url};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::domain::Credentials;
use crate::infrastructure::traits::{
    CloudAccount, CloudError, CloudResult, DeviceHandle, KumoCloud,
};

/// Default Kumo Cloud endpoint.
pub const DEFAULT_CLOUD_URL: &str = "https://geo-c.kumocloud.com";

/// Log target of this adapter; muted unless `--cloud-logging` is given.
pub const LOG_TARGET: &str = module_path!();

const APP_VERSION: &str = "2.2.0";
const USER_AGENT: &str = concat!("hvac-stability/", env!("CARGO_PKG_VERSION"));

/// Account snapshots younger than this are reused by status refreshes.
pub const DEFAULT_STATUS_MAX_AGE: Duration = Duration::from_secs(10);

/// Real `KumoCloud` implementation over blocking HTTP.
#[derive(Debug, Clone)]
pub struct KumoCloudClient {
    http: Client,
    login_url: Url,
    status_max_age: Duration,
}

impl KumoCloudClient {
    /// Every request, including per-device status refreshes, is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> CloudResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| CloudError::Transport(format!("parsing cloud url {base_url}: {e}")))?;
        let login_url = base
            .join("login")
            .map_err(|e| CloudError::Transport(format!("joining login path: {e}")))?;
        let http = Client::builder()
            .user_agent(HeaderValue::from_static(USER_AGENT))
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(|e| CloudError::Transport(format!("building HTTP client: {e}")))?;

        Ok(Self {
            http,
            login_url,
            status_max_age: DEFAULT_STATUS_MAX_AGE,
        })
    }

    /// How long one account snapshot serves the status refreshes of all devices.
    pub fn with_status_max_age(mut self, max_age: Duration) -> Self {
        self.status_max_age = max_age;
        self
    }
}

impl KumoCloud for KumoCloudClient {
    fn authenticate(&self, credentials: &Credentials) -> CloudResult<Box<dyn CloudAccount>> {
        let session = Arc::new(Session {
            http: self.http.clone(),
            login_url: self.login_url.clone(),
            credentials: credentials.clone(),
            status_max_age: self.status_max_age,
            snapshot: Mutex::new(None),
        });
        let units = session.fetch_units()?;
        debug!(target: LOG_TARGET, "authenticated, {} unit(s) in account", units.len());
        Ok(Box::new(KumoAccount { session, units }))
    }
}

#[derive(Debug)]
struct Session {
    http: Client,
    login_url: Url,
    credentials: Credentials,
    status_max_age: Duration,
    snapshot: Mutex<Option<(Instant, Vec<UnitRecord>)>>,
}

impl Session {
    /// Latest snapshot when still fresh, otherwise a new login round trip.
    fn current_units(&self) -> CloudResult<Vec<UnitRecord>> {
        if let Ok(cached) = self.snapshot.lock() {
            if let Some((fetched, units)) = cached.as_ref() {
                if fetched.elapsed() < self.status_max_age {
                    trace!(target: LOG_TARGET, "reusing account snapshot");
                    return Ok(units.clone());
                }
            }
        }
        self.fetch_units()
    }

    /// One login round trip; returns every unit in the account snapshot.
    fn fetch_units(&self) -> CloudResult<Vec<UnitRecord>> {
        debug!(target: LOG_TARGET, "POST {}", self.login_url);
        let body = json!({
            "username": self.credentials.username,
            "password": self.credentials.password,
            "appVersion": APP_VERSION,
        });
        let response = self
            .http
            .post(self.login_url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(&body)
            .send()
            .map_err(|e| CloudError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CloudError::Unauthorized(format!(
                "cloud answered HTTP {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(CloudError::Transport(format!(
                "cloud answered HTTP {}",
                status.as_u16()
            )));
        }

        let text = response
            .text()
            .map_err(|e| CloudError::Transport(format!("reading response body: {e}")))?;
        trace!(target: LOG_TARGET, "login response: {} bytes", text.len());
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| CloudError::Protocol(format!("response is not JSON: {e}")))?;
        let units = parse_units(&value)?;
        if let Ok(mut cached) = self.snapshot.lock() {
            *cached = Some((Instant::now(), units.clone()));
        }
        Ok(units)
    }
}

/// Raw unit entry from a `zoneTable`.
#[derive(Debug, Clone, PartialEq)]
struct UnitRecord {
    serial: String,
    label: Option<String>,
    address: Option<String>,
    condition: Option<Value>,
    rssi: Option<i64>,
}

/// Walk the account tree (element 2 of the login response) for `zoneTable` units.
fn parse_units(response: &Value) -> CloudResult<Vec<UnitRecord>> {
    let root = response
        .as_array()
        .and_then(|a| a.get(2))
        .ok_or_else(|| CloudError::Protocol("missing account tree in login response".into()))?;
    let mut units = Vec::new();
    collect_units(root, &mut units);
    Ok(units)
}

fn collect_units(node: &Value, out: &mut Vec<UnitRecord>) {
    if let Some(zones) = node.get("zoneTable").and_then(Value::as_object) {
        for (key, unit) in zones {
            out.push(unit_record(key, unit));
        }
    }
    if let Some(children) = node.get("children").and_then(Value::as_array) {
        for child in children {
            collect_units(child, out);
        }
    }
}

fn unit_record(key: &str, unit: &Value) -> UnitRecord {
    let text = |field: &str| unit.get(field).and_then(Value::as_str).map(str::to_string);
    // reportedCondition arrives either as an object or as a JSON-encoded string
    let condition = match unit.get("reportedCondition") {
        Some(Value::String(s)) => serde_json::from_str(s).ok(),
        Some(v @ Value::Object(_)) => Some(v.clone()),
        _ => None,
    };
    let rssi = unit
        .get("rssi")
        .and_then(Value::as_i64)
        .or_else(|| condition.as_ref().and_then(|c| c.get("rssi")).and_then(Value::as_i64));

    UnitRecord {
        serial: text("serial").unwrap_or_else(|| key.to_string()),
        label: text("label"),
        address: text("address").filter(|a| !a.is_empty()),
        condition,
        rssi,
    }
}

struct KumoAccount {
    session: Arc<Session>,
    units: Vec<UnitRecord>,
}

impl CloudAccount for KumoAccount {
    fn list_devices(&self) -> CloudResult<Vec<Box<dyn DeviceHandle>>> {
        Ok(self
            .units
            .iter()
            .map(|unit| {
                Box::new(KumoDevice {
                    session: Arc::clone(&self.session),
                    address: unit.address.clone(),
                    unit: unit.clone(),
                    status: None,
                }) as Box<dyn DeviceHandle>
            })
            .collect())
    }
}

struct KumoDevice {
    session: Arc<Session>,
    unit: UnitRecord,
    address: Option<String>,
    status: Option<UnitRecord>,
}

impl KumoDevice {
    fn condition(&self, field: &str) -> CloudResult<&Value> {
        let status = self
            .status
            .as_ref()
            .ok_or_else(|| CloudError::Unavailable("status not refreshed".into()))?;
        status
            .condition
            .as_ref()
            .and_then(|c| c.get(field))
            .filter(|v| !v.is_null())
            .ok_or_else(|| CloudError::Unavailable(format!("{field} not reported")))
    }

    fn condition_text(&self, field: &str) -> CloudResult<String> {
        match self.condition(field)? {
            Value::String(s) => Ok(s.clone()),
            other => Ok(other.to_string()),
        }
    }
}

impl DeviceHandle for KumoDevice {
    fn serial(&self) -> CloudResult<String> {
        Ok(self.unit.serial.clone())
    }

    fn name(&self) -> CloudResult<String> {
        self.unit
            .label
            .clone()
            .ok_or_else(|| CloudError::Unavailable("unit has no label".into()))
    }

    fn address(&self) -> Option<String> {
        self.address.clone()
    }

    fn set_address(&mut self, address: &str) {
        self.address = Some(address.to_string());
    }

    fn refresh_status(&mut self) -> CloudResult<()> {
        let units = self.session.current_units()?;
        let unit = units
            .into_iter()
            .find(|u| u.serial == self.unit.serial)
            .ok_or_else(|| CloudError::Unavailable("unit no longer reported".into()))?;
        self.status = Some(unit);
        Ok(())
    }

    fn temperature(&self) -> CloudResult<f64> {
        self.condition("room_temp")?
            .as_f64()
            .ok_or_else(|| CloudError::Protocol("room_temp is not a number".into()))
    }

    fn mode(&self) -> CloudResult<String> {
        self.condition_text("operation_mode")
    }

    fn fan_speed(&self) -> CloudResult<String> {
        self.condition_text("fan_speed")
    }

    fn run_state(&self) -> CloudResult<String> {
        self.condition_text("run_state")
    }

    fn wifi_signal(&self) -> CloudResult<i64> {
        self.status
            .as_ref()
            .ok_or_else(|| CloudError::Unavailable("status not refreshed".into()))?
            .rssi
            .ok_or_else(|| CloudError::Unavailable("rssi not reported".into()))
    }
}
