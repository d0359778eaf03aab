//! Configuration error types.

/// Errors that can occur when locating, loading, or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine a configuration directory; pass --config")]
    NoConfigDir,

    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// The config file is not valid RON for [`crate::Config`].
    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize config to RON.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),
}
