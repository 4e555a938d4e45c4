//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, Prompter, CloudAccount)
//! but are themselves concrete structs, not traits.

mod credentials;
mod directory;

pub use credentials::CredentialStore;
pub use directory::{DeviceDirectory, UNKNOWN_DEVICE};
