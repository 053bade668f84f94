use std::path::PathBuf;
use thiserror::Error;

/// Why a settings blob could not be turned into a JSON object
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,
}

/// Errors raised by the settings store and its storage backends
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The blob already in storage could not be read back
    #[error("stored settings are malformed ({0})")]
    MalformedPersistedSettings(BlobError),

    /// A user supplied settings file could not be read back
    #[error("invalid settings file ({0})")]
    MalformedImportedFile(BlobError),

    #[error("unable to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}
