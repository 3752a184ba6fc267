//! Unified error type.

use crate::config::ConfigError;
use crate::method::Method;

/// The error type returned by steep's fallible setup and serving operations.
///
/// Application-level failures (400, 404, 500, …) are expressed as HTTP
/// values, see [`ApiError`](crate::ApiError), not as `Error`s. This type
/// surfaces what must stop the process: a route table or middleware chain
/// that cannot be built, bad settings, or failing to bind the listener.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("route `{method} {path}` is already registered: {reason}")]
    DuplicateRoute {
        method: Method,
        path: String,
        reason: String,
    },

    #[error("invalid route `{path}`: {reason}")]
    InvalidRoute { path: String, reason: String },

    #[error("middleware `{name}` at position {index}: {reason}")]
    MiddlewareOrder {
        name: &'static str,
        index: usize,
        reason: &'static str,
    },

    #[error("config: {0}")]
    Config(#[from] ConfigError),
}
