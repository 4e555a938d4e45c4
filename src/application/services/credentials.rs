//! Credential storage and resolution
//!
//! Credentials are stored as base64 of a small JSON document. This keeps
//! them away from casual eyes; it is not encryption.

use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::Credentials;
use crate::infrastructure::traits::{FileSystem, Prompter};

/// Reads, writes and resolves account credentials.
pub struct CredentialStore {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl CredentialStore {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    pub fn path(&self) -> PathBuf {
        self.settings.credentials_file()
    }

    /// Read the stored credentials.
    ///
    /// Missing, unreadable or corrupt files yield `None`; a broken credentials
    /// file must never stop the CLI.
    pub fn load(&self) -> Option<Credentials> {
        let path = self.path();
        if !self.fs.exists(&path) {
            debug!("load: no credentials file at {}", path.display());
            return None;
        }
        let encoded = match self.fs.read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                warn!("ignoring unreadable credentials file {}: {}", path.display(), e);
                return None;
            }
        };
        match decode(encoded.trim()) {
            Ok(creds) => Some(creds),
            Err(reason) => {
                warn!("ignoring malformed credentials file {}: {}", path.display(), reason);
                None
            }
        }
    }

    /// Persist credentials with owner-only permissions, replacing any previous file.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub fn store(&self, credentials: &Credentials) -> ApplicationResult<PathBuf> {
        let path = self.path();
        let payload = encode(credentials)?;
        self.fs
            .ensure_parent(&path)
            .with_path_context("create data directory", &path)?;
        self.fs
            .write_atomic(&path, &payload, true)
            .with_path_context("write credentials", &path)?;
        debug!("store: wrote {}", path.display());
        Ok(path)
    }

    /// Credentials for commands other than `login`.
    ///
    /// Environment (both variables set) wins over the stored file.
    pub fn effective(&self) -> Option<Credentials> {
        if let Some((username, password)) = self.settings.env_credentials() {
            debug!("effective: using credentials from environment");
            return Some(Credentials::new(username, password));
        }
        self.load()
    }

    /// Credentials for `login`, resolved field by field.
    ///
    /// Username: argument, stored file, environment, prompt.
    /// Password: option, stored file, environment, hidden prompt.
    pub fn resolve_for_login(
        &self,
        username_arg: Option<&str>,
        password_arg: Option<&str>,
        prompter: &dyn Prompter,
    ) -> ApplicationResult<Credentials> {
        let needs_stored = non_empty(username_arg).is_none() || non_empty(password_arg).is_none();
        let stored = if needs_stored { self.load() } else { None };

        let username = match non_empty(username_arg)
            .map(str::to_string)
            .or_else(|| stored.as_ref().map(|c| c.username.clone()))
            .filter(|u| !u.is_empty())
            .or_else(|| self.settings.auth_username.clone())
        {
            Some(u) => u,
            None => prompter
                .input("Username")
                .map_err(|e| prompt_err("username", e))?,
        };

        let password = match non_empty(password_arg)
            .map(str::to_string)
            .or_else(|| stored.as_ref().map(|c| c.password.clone()))
            .filter(|p| !p.is_empty())
            .or_else(|| self.settings.auth_password.clone())
        {
            Some(p) => p,
            None => prompter
                .password("Password")
                .map_err(|e| prompt_err("password", e))?,
        };

        if username.trim().is_empty() || password.is_empty() {
            return Err(ApplicationError::CredentialsMissing);
        }
        Ok(Credentials::new(username.trim(), password))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn prompt_err(what: &str, e: std::io::Error) -> ApplicationError {
    ApplicationError::OperationFailed {
        context: format!("prompt for {what}"),
        source: Box::new(e),
    }
}

fn encode(credentials: &Credentials) -> ApplicationResult<String> {
    let json = serde_json::to_vec(credentials).map_err(|e| ApplicationError::OperationFailed {
        context: "serialize credentials".into(),
        source: Box::new(e),
    })?;
    Ok(STANDARD.encode(json))
}

fn decode(encoded: &str) -> Result<Credentials, String> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| format!("not base64: {e}"))?;
    let text = String::from_utf8(bytes).map_err(|e| format!("not UTF-8: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("not a credentials document: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_credentials_when_encoding_then_decodes_back() {
        let creds = Credentials::new("a \"quoted\" user", "pässwörd with spaces");
        assert_eq!(decode(&encode(&creds).unwrap()).unwrap(), creds);
    }

    #[test]
    fn given_known_payload_when_decoding_then_matches_wire_format() {
        // base64 of {"username": "u", "password": "p"}
        let encoded = STANDARD.encode(r#"{"username": "u", "password": "p"}"#);
        assert_eq!(decode(&encoded).unwrap(), Credentials::new("u", "p"));
    }

    #[test]
    fn given_garbage_when_decoding_then_reports_reason() {
        assert!(decode("!!!not base64!!!").unwrap_err().contains("base64"));
        let not_json = STANDARD.encode("just text");
        assert!(decode(&not_json).unwrap_err().contains("credentials document"));
    }
}
