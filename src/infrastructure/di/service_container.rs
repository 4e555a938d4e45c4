//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{CredentialStore, DeviceDirectory};
use crate::config::Settings;
use crate::infrastructure::kumo::KumoCloudClient;
use crate::infrastructure::traits::{
    FileSystem, KumoCloud, Prompter, RealFileSystem, TerminalPrompter,
};
use crate::infrastructure::InfraResult;

/// Container holding the settings and I/O boundaries every command needs.
///
/// Built once at process start; services are created per command from it.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Interactive prompts
    pub prompter: Arc<dyn Prompter>,

    /// Kumo Cloud collaborator
    pub cloud: Arc<dyn KumoCloud>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let timeout = Duration::from_secs(settings.request_timeout_secs);
        let cloud = KumoCloudClient::new(&settings.cloud_url, timeout)
            .map_err(crate::application::ApplicationError::from)?;
        Ok(Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(TerminalPrompter),
            Arc::new(cloud),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        prompter: Arc<dyn Prompter>,
        cloud: Arc<dyn KumoCloud>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            prompter,
            cloud,
        }
    }

    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(Arc::clone(&self.fs), Arc::clone(&self.settings))
    }

    /// An empty directory; call `load` to fetch devices.
    pub fn device_directory(&self) -> DeviceDirectory {
        DeviceDirectory::new(Arc::clone(&self.fs), Arc::clone(&self.settings))
    }
}
