//! Fakes for the cloud and prompt boundaries, shared by integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use hvac_stability::config::Settings;
use hvac_stability::domain::Credentials;
use hvac_stability::infrastructure::di::ServiceContainer;
use hvac_stability::infrastructure::traits::{
    CloudAccount, CloudError, CloudResult, DeviceHandle, KumoCloud, Prompter, RealFileSystem,
};
use hvac_stability::util::testing;

/// Settings rooted in a temp directory, no environment credentials.
pub fn settings_in(dir: &Path) -> Settings {
    testing::init_test_setup();
    Settings {
        data_path: dir.to_path_buf(),
        ..Settings::default()
    }
}

/// A unit whose every accessor succeeds unless overridden.
#[derive(Clone, Debug)]
pub struct FakeDevice {
    pub serial: CloudResult<String>,
    pub name: CloudResult<String>,
    pub address: Option<String>,
    pub refresh: CloudResult<()>,
    pub temperature: CloudResult<f64>,
    pub mode: CloudResult<String>,
    pub fan_speed: CloudResult<String>,
    pub run_state: CloudResult<String>,
    pub wifi_signal: CloudResult<i64>,
}

impl FakeDevice {
    pub fn new(serial: &str, name: &str) -> Self {
        Self {
            serial: Ok(serial.to_string()),
            name: Ok(name.to_string()),
            address: None,
            refresh: Ok(()),
            temperature: Ok(21.5),
            mode: Ok("heat".into()),
            fan_speed: Ok("auto".into()),
            run_state: Ok("normal".into()),
            wifi_signal: Ok(-55),
        }
    }
}

pub fn unavailable(what: &str) -> CloudError {
    CloudError::Unavailable(what.to_string())
}

impl DeviceHandle for FakeDevice {
    fn serial(&self) -> CloudResult<String> {
        self.serial.clone()
    }
    fn name(&self) -> CloudResult<String> {
        self.name.clone()
    }
    fn address(&self) -> Option<String> {
        self.address.clone()
    }
    fn set_address(&mut self, address: &str) {
        self.address = Some(address.to_string());
    }
    fn refresh_status(&mut self) -> CloudResult<()> {
        self.refresh.clone()
    }
    fn temperature(&self) -> CloudResult<f64> {
        self.temperature.clone()
    }
    fn mode(&self) -> CloudResult<String> {
        self.mode.clone()
    }
    fn fan_speed(&self) -> CloudResult<String> {
        self.fan_speed.clone()
    }
    fn run_state(&self) -> CloudResult<String> {
        self.run_state.clone()
    }
    fn wifi_signal(&self) -> CloudResult<i64> {
        self.wifi_signal.clone()
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeAccount {
    pub devices: Vec<FakeDevice>,
    pub list_error: Option<CloudError>,
}

impl FakeAccount {
    pub fn with(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices,
            list_error: None,
        }
    }
}

impl CloudAccount for FakeAccount {
    fn list_devices(&self) -> CloudResult<Vec<Box<dyn DeviceHandle>>> {
        if let Some(e) = &self.list_error {
            return Err(e.clone());
        }
        Ok(self
            .devices
            .iter()
            .cloned()
            .map(|d| Box::new(d) as Box<dyn DeviceHandle>)
            .collect())
    }
}

/// Accepts one account (or any, when `accepted` is `None`) and records logins.
#[derive(Default)]
pub struct FakeCloud {
    pub account: FakeAccount,
    pub accepted: Option<Credentials>,
    pub logins: Mutex<Vec<Credentials>>,
}

impl FakeCloud {
    pub fn accepting(username: &str, password: &str, account: FakeAccount) -> Self {
        Self {
            account,
            accepted: Some(Credentials::new(username, password)),
            logins: Mutex::new(Vec::new()),
        }
    }

    pub fn logins(&self) -> Vec<Credentials> {
        self.logins.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl KumoCloud for FakeCloud {
    fn authenticate(&self, credentials: &Credentials) -> CloudResult<Box<dyn CloudAccount>> {
        if let Ok(mut logins) = self.logins.lock() {
            logins.push(credentials.clone());
        }
        match &self.accepted {
            Some(ok) if ok != credentials => Err(CloudError::Unauthorized("bad password".into())),
            _ => Ok(Box::new(self.account.clone())),
        }
    }
}

/// Answers prompts from a script; runs dry with an EOF error.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn next(&self, prompt: &str) -> io::Result<String> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(prompt.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut a| a.pop_front())
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer"))
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, prompt: &str) -> io::Result<String> {
        self.next(prompt)
    }
    fn password(&self, prompt: &str) -> io::Result<String> {
        self.next(prompt)
    }
}

/// Container over a fresh temp dir with the given fakes.
pub fn container(
    temp: &TempDir,
    cloud: Arc<FakeCloud>,
    prompter: Arc<ScriptedPrompter>,
) -> ServiceContainer {
    ServiceContainer::with_deps(
        settings_in(temp.path()),
        Arc::new(RealFileSystem),
        prompter,
        cloud,
    )
}
