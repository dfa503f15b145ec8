//! Error types for delta jobs.

use std::path::PathBuf;

use kql_delta_core::{ParseScriptError, ReconcileError};

/// Errors that can occur while loading parameters or running a job.
#[derive(Debug, thiserror::Error)]
pub enum DeltaError {
    /// The parameter file is well-formed YAML but describes an invalid job.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// An override isn't of the form `path=value`.
    #[error("Invalid override '{0}': expected 'path=value'")]
    InvalidOverride(String),

    /// Failed to read the parameter file.
    #[error("Failed to parse parameter file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error (reading scripts, writing delta files).
    #[error("IO error on '{path}': {source}")]
    Io {
        /// File or folder being accessed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A script file contains an unsupported or malformed command.
    #[error("Script '{origin}' is invalid: {source}")]
    Script {
        /// File path or cluster/database the script came from.
        origin: String,
        #[source]
        source: ParseScriptError,
    },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// A cluster is used but no token provider is configured.
    #[error("No token provider is configured to connect to {0}")]
    NoTokenProvider(String),

    #[error("No token was provided for {0}")]
    NoToken(String),

    /// The delta would drop data while `failIfDataLoss` is set.
    #[error("Job '{job}' would lose data: {}", .commands.join(", "))]
    DataLoss {
        /// Job name.
        job: String,
        /// Friendly names of the offending commands.
        commands: Vec<String>,
    },

    /// The cluster could not be reached.
    #[error("Gateway error on {cluster}: {message}")]
    Gateway {
        /// Cluster URI.
        cluster: String,
        /// Error message.
        message: String,
    },

    /// A pushed command was rejected by the cluster.
    #[error("Command failed on {cluster}: {diagnostic}\n{command}")]
    CommandFailed {
        /// Cluster URI.
        cluster: String,
        /// The rendered command.
        command: String,
        /// Diagnostic reported by the cluster.
        diagnostic: String,
    },
}

impl DeltaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for delta jobs.
pub type Result<T> = std::result::Result<T, DeltaError>;
