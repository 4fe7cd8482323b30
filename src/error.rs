//! Typed errors shared by the command handlers.
//!
//! Handlers return `anyhow::Result` so context can be layered on freely, but
//! every failure that a user can trigger on purpose starts life as one of the
//! variants below.  Tests match on these variants via
//! [`anyhow::Error::downcast_ref`].

use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// A required flag was not passed.
    #[error("{flag} is required")]
    Validation { flag: &'static str },

    /// The `snapshot databases` builder style is not one we know.
    #[error("unknown or invalid template type {0:?}")]
    UnknownTemplate(String),

    /// A preset name that has no built-in targets.
    #[error("unknown targets preset {0:?}")]
    UnknownPreset(String),

    /// A custom targets file could not be opened or parsed.
    #[error("invalid targets file {:?}", .path.display().to_string())]
    TargetsFile {
        path: PathBuf,
        #[source]
        source: FileError,
    },

    /// The config file exists but could not be read or parsed.
    #[error("invalid config file {}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: FileError,
    },

    /// The HTTP request failed before a GraphQL response was received.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("error: {status}\n\n{body}")]
    Status { status: u16, body: String },

    /// The request could not be encoded or the response was not JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The server answered, but reported GraphQL errors.
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),
}

/// Underlying cause of an [`Error::TargetsFile`] or [`Error::Config`].
#[derive(Debug, ThisError)]
pub enum FileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
