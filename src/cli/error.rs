//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::{ApiError, ApplicationError};
use crate::domain::DomainError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("no entry matches '{0}'")]
    NotFound(String),
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::Application(e.into())
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::NotFound(_) => crate::exitcode::NOT_FOUND,
            CliError::Application(e) => match e {
                ApplicationError::Domain(DomainError::InvalidKind(_))
                | ApplicationError::Domain(DomainError::InvalidRevision(_)) => crate::exitcode::USAGE,
                ApplicationError::Domain(_) => crate::exitcode::SOFTWARE,
                ApplicationError::Io { .. } => crate::exitcode::IOERR,
                ApplicationError::SourceNotFound(_) => crate::exitcode::NOINPUT,
                ApplicationError::Xml { .. }
                | ApplicationError::Csv { .. }
                | ApplicationError::SourceFormat { .. } => crate::exitcode::DATAERR,
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                ApplicationError::Api(ApiError::Http { .. }) => crate::exitcode::UNAVAILABLE,
                ApplicationError::Api(ApiError::Payload(_)) => crate::exitcode::DATAERR,
            },
        }
    }
}
