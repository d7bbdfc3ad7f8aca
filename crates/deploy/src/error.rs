//! Error taxonomy for the deployment core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the deployment core.
///
/// Every operation returns its error to the immediate caller; nothing is
/// swallowed or retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// Ambiguous or missing RPC target. Fatal before any deployment attempt.
    #[error("rpc target: {0}")]
    Config(String),

    /// The contracts repository exists but cannot be read or parsed.
    #[error("contracts repository {}: {message}", path.display())]
    File { path: PathBuf, message: String },

    /// The contract name is already bound to a confirmed record.
    /// Recoverable by re-invoking with overwrite.
    #[error("contract {name} is already deployed; pass overwrite to replace it")]
    AlreadyExists { name: String },

    /// A `$Name` placeholder referenced a contract not present in the
    /// repository. Fatal for the current deployment only.
    #[error("unknown address reference: {name}")]
    UnknownReference { name: String },

    /// Deploy options rejected by the backend before submission.
    #[error("deploy options: {0}")]
    Options(String),

    /// The creation transaction was included but its execution was rejected
    /// by the chain. Deterministic; resubmitting the same deployment fails
    /// the same way.
    #[error("contract {name} creation failed on chain: {reason}")]
    Execution { name: String, reason: String },

    /// Transport failure or an error reported by the backend RPC.
    /// Retryable at the caller's discretion; never retried here.
    #[error("rpc: {message}")]
    Rpc {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The backend answered with an unexpected response shape. Not
    /// retryable; signals version skew with the node.
    #[error("unexpected backend response: {0}")]
    Protocol(String),
}

impl Error {
    /// An RPC-level failure reported by the backend (as opposed to a
    /// transport failure, which converts from [`reqwest::Error`]).
    pub fn rpc(message: impl Into<String>) -> Self {
        Error::Rpc {
            message: message.into(),
            source: None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Rpc {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
