use thiserror::Error;
use std::io;

/// Unified error type for the schemaforge library.
///
/// Every variant produced by the engine names the record (and, where one is
/// involved, the field) that caused it.
#[derive(Error, Debug)]
pub enum Error {
    /// A field or record declaration is malformed (raised while resolving).
    #[error("Configuration Error in {}: {reason}", location(.record, .field))]
    ConfigurationError {
        record: String,
        field: Option<String>,
        reason: String,
    },

    /// A resolved record graph is inconsistent for schema purposes (raised while building).
    #[error("Schema Error in {}: {reason}", location(.record, .field))]
    SchemaError {
        record: String,
        field: Option<String>,
        reason: String,
    },

    /// The record graph cannot be satisfied by the generator (raised while generating).
    #[error("Generation Error in {}: {reason}", location(.record, .field))]
    GenerationError {
        record: String,
        field: Option<String>,
        reason: String,
    },

    /// No record with this name is registered or provided.
    #[error("Unknown record '{0}'")]
    UnknownRecord(String),

    /// A model document could not be interpreted.
    #[error("Model Error at {location}: {reason}")]
    ModelError { location: String, reason: String },

    /// Error reading a model document.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

/// Flat classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Schema,
    Generation,
    UnknownRecord,
    Model,
    Io,
}

/// A specialized `Result` type for schemaforge operations.
pub type Result<T> = std::result::Result<T, Error>;

fn location(record: &str, field: &Option<String>) -> String {
    match field {
        Some(field) => format!("'{}.{}'", record, field),
        None => format!("'{}'", record),
    }
}

impl Error {
    pub(crate) fn configuration(record: &str, field: Option<&str>, reason: impl Into<String>) -> Self {
        Error::ConfigurationError {
            record: record.to_string(),
            field: field.map(str::to_string),
            reason: reason.into(),
        }
    }

    pub(crate) fn schema(record: &str, field: Option<&str>, reason: impl Into<String>) -> Self {
        Error::SchemaError {
            record: record.to_string(),
            field: field.map(str::to_string),
            reason: reason.into(),
        }
    }

    pub(crate) fn generation(record: &str, field: Option<&str>, reason: impl Into<String>) -> Self {
        Error::GenerationError {
            record: record.to_string(),
            field: field.map(str::to_string),
            reason: reason.into(),
        }
    }

    pub(crate) fn model(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ModelError {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConfigurationError { .. } => ErrorKind::Configuration,
            Error::SchemaError { .. } => ErrorKind::Schema,
            Error::GenerationError { .. } => ErrorKind::Generation,
            Error::UnknownRecord(_) => ErrorKind::UnknownRecord,
            Error::ModelError { .. } => ErrorKind::Model,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns the offending record name, if the error concerns one.
    pub fn record(&self) -> Option<&str> {
        match self {
            Error::ConfigurationError { record, .. }
            | Error::SchemaError { record, .. }
            | Error::GenerationError { record, .. } => Some(record),
            Error::UnknownRecord(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the offending field name, if the error concerns one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::ConfigurationError { field, .. }
            | Error::SchemaError { field, .. }
            | Error::GenerationError { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

/*
Error policy:

Every error in this crate comes from a structural defect in the model (or from
reading a model file), never from a transient condition, so nothing is retried.
Builders and generators return the first error unmodified and never hand back a
partially built schema or a partially populated instance.
*/
