//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::traits::CloudError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("no credentials found; run `hvac-stability login` first")]
    CredentialsMissing,

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("cloud request failed: {0}")]
    Cloud(CloudError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<CloudError> for ApplicationError {
    fn from(e: CloudError) -> Self {
        match e {
            CloudError::Unauthorized(msg) => ApplicationError::AuthenticationFailed(msg),
            other => ApplicationError::Cloud(other),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
