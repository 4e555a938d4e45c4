//! Command dispatch
//!
//! Each command resolves credentials, builds a `DeviceDirectory` from the
//! container, performs one action and renders the result.

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::services::DeviceDirectory;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::domain::{validate_ip_address, DeviceSelector};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Login { username, password }) => {
            cmd_login(container, username.as_deref(), password.as_deref())
        }
        Some(Commands::List { verbose }) => cmd_list(container, *verbose),
        Some(Commands::StoreDeviceIp {
            device_identifier,
            ip_address,
        }) => cmd_store_device_ip(
            container,
            device_identifier.as_deref(),
            ip_address.as_deref(),
        ),
        Some(Commands::CheckDeviceSettings { name_or_serial }) => {
            not_implemented("check_device_settings", name_or_serial)
        }
        Some(Commands::ResetDeviceToScheduled { name_or_serial }) => {
            not_implemented("reset_device_to_scheduled", name_or_serial)
        }
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => cmd_config_show(container),
            ConfigCommands::Path => cmd_config_path(container),
        },
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        None => Err(CliError::Usage(
            "no command given, see `hvac-stability --help`".into(),
        )),
    }
}

/// Log in with the given account and store the credentials.
#[instrument(skip(container, password))]
pub fn cmd_login(
    container: &ServiceContainer,
    username: Option<&str>,
    password: Option<&str>,
) -> CliResult<()> {
    let store = container.credential_store();
    let credentials = store.resolve_for_login(username, password, container.prompter.as_ref())?;
    debug!("login: authenticating {}", credentials.username);

    container
        .cloud
        .authenticate(&credentials)
        .map_err(ApplicationError::from)?;
    output::success("Login successful!");

    let path = store.store(&credentials)?;
    output::success(&format!("Credentials stored in {}", path.display()));
    Ok(())
}

#[instrument(skip(container))]
pub fn cmd_list(container: &ServiceContainer, verbose: bool) -> CliResult<()> {
    let mut directory = open_directory(container)?;

    if directory.is_empty() {
        output::warning("No devices found.");
        return Ok(());
    }

    if verbose {
        output::header("HVAC Devices - Detailed View");
        let reports = directory.reports();
        print!("{}", output::device_table(&reports));
    } else {
        output::info(&format!("Found {} device(s):", directory.devices().len()));
        print!("{}", output::device_list(directory.devices()));
    }
    Ok(())
}

#[instrument(skip(container))]
pub fn cmd_store_device_ip(
    container: &ServiceContainer,
    device_identifier: Option<&str>,
    ip_address: Option<&str>,
) -> CliResult<()> {
    // fail before any network traffic when the address is already known to be bad
    if let Some(ip) = ip_address {
        validate_ip_address(ip.trim()).map_err(ApplicationError::from)?;
    }

    let mut directory = open_directory(container)?;
    if directory.is_empty() {
        return Err(ApplicationError::DeviceNotFound("account has no devices".into()).into());
    }

    let identifier = match device_identifier {
        Some(id) => id.to_string(),
        None => {
            output::header("Devices:");
            print!("{}", output::device_list(directory.devices()));
            prompt(container, "Device number, serial or name")?
        }
    };
    let device = directory
        .resolve(&DeviceSelector::parse(&identifier))?
        .clone();
    debug!("store_device_ip: selected {} ({})", device.name, device.serial);

    let ip = match ip_address {
        Some(ip) => ip.trim().to_string(),
        None => prompt(container, &format!("IP address for {}", device.name))?,
    };

    let path = directory.store_override(&device.serial, &ip)?;
    let stored = directory.overrides().ip_for(&device.serial).unwrap_or(ip.trim());
    output::success(&format!(
        "Stored IP {} for {} ({})",
        stored, device.name, device.serial
    ));
    debug!("store_device_ip: overrides at {}", path.display());
    Ok(())
}

fn not_implemented(command: &str, name_or_serial: &str) -> CliResult<()> {
    output::warning(&format!(
        "{command} is not implemented yet (device: {name_or_serial})"
    ));
    Ok(())
}

fn cmd_config_show(container: &ServiceContainer) -> CliResult<()> {
    print!("{}", container.settings.to_toml()?);
    Ok(())
}

fn cmd_config_path(container: &ServiceContainer) -> CliResult<()> {
    let settings = &container.settings;
    let global = crate::config::global_config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unavailable)".into());
    output::info(&format!("config:      {global}"));
    output::info(&format!("data:        {}", settings.data_path.display()));
    output::info(&format!("credentials: {}", settings.credentials_file().display()));
    output::info(&format!("devices:     {}", settings.devices_file().display()));
    Ok(())
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

/// Authenticate with the effective credentials and load the device directory.
fn open_directory(container: &ServiceContainer) -> CliResult<DeviceDirectory> {
    let credentials = container
        .credential_store()
        .effective()
        .ok_or(ApplicationError::CredentialsMissing)?;
    let account = container
        .cloud
        .authenticate(&credentials)
        .map_err(ApplicationError::from)?;

    let mut directory = container.device_directory();
    directory.load(account.as_ref())?;
    Ok(directory)
}

fn prompt(container: &ServiceContainer, label: &str) -> CliResult<String> {
    let answer = container
        .prompter
        .input(label)
        .map_err(|e| InfraError::Prompt {
            message: e.to_string(),
        })?;
    Ok(answer.trim().to_string())
}
