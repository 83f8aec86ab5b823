//! Configuration errors.

use thiserror::Error;

/// Errors raised while building the adjacent-server configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A port variable holds something that is not a usable TCP port.
    #[error("Invalid value for {var}: {value:?} is not a valid port")]
    InvalidPort { var: &'static str, value: String },

    /// `ROOT_PATH` or `EXTERNAL_ROOT_PATH` is not an absolute path.
    #[error("Invalid value for {var}: {value:?} must be empty or start with '/'")]
    InvalidRootPath { var: &'static str, value: String },

    /// Two descriptors would be mounted under the same public path.
    #[error("Path prefix /{0} is claimed by more than one service")]
    DuplicatePrefix(String),
}
