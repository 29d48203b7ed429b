//! Error types for the Parkwatch server binary.
//!
//! [`AppError`] wraps every failure that can stop the process during
//! startup or while serving.

/// Top-level error for the Parkwatch server binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: parkwatch_core::ConfigError,
    },

    /// The HTTP server failed to bind or stopped with an error.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: parkwatch_observer::ServerError,
    },
}
