//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Failures of the external description APIs.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed with status {status}")]
    Http { status: u16 },

    #[error("unexpected response payload: {0}")]
    Payload(String),
}

/// Application errors wrap domain errors and add source-format context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in {path}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed CSV in {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("inconsistent source data in {path}: {message}")]
    SourceFormat { path: PathBuf, message: String },

    #[error("no source file at {0}")]
    SourceNotFound(PathBuf),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Api(#[from] ApiError),
}

impl ApplicationError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn source_format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SourceFormat {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
