//! Error types for the racerd bridge.
//!
//! One crate-wide taxonomy: construction-time configuration failures are
//! fatal, per-request failures surface to the caller without retry.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the bridge.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing racerd binary or rust source path at construction.
    /// Fatal: the completer cannot load without both.
    #[error("{0}")]
    Config(String),

    /// The subprocess failed to report a usable listen address.
    #[error("racerd startup failed: {0}")]
    Startup(String),

    /// Non-2xx HTTP status from racerd.
    #[error("racerd returned HTTP {status}")]
    Transport {
        /// The exact status code observed.
        status: u16,
    },

    /// The HTTP exchange exceeded the request deadline.
    #[error("racerd request timed out")]
    Timeout,

    /// Unknown or missing subcommand. Carries the help message
    /// enumerating the valid commands.
    #[error("{help}")]
    Usage {
        /// Help text listing the valid subcommands.
        help: String,
    },

    /// Go-to-definition failed. The display string is the user-facing
    /// message; the underlying cause stays on the source chain.
    #[error("Can't jump to definition.")]
    Navigation(#[source] Box<Error>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Wraps any error into a [`Error::Navigation`], leaving an existing
    /// navigation error untouched so causes are never double-wrapped.
    #[must_use]
    pub fn into_navigation(self) -> Self {
        match self {
            Self::Navigation(_) => self,
            other => Self::Navigation(Box::new(other)),
        }
    }
}
