//! Unified error type.

use crate::config::ConfigError;

/// The error type returned by sitedrop's startup and serving operations.
///
/// Request-level failures (bad bundle, wrong token) are expressed as HTTP
/// [`Response`](crate::Response) values, and extraction failures as
/// [`ExtractError`](crate::ExtractError). This type covers what stops the
/// process: bad configuration, or a socket or site directory we cannot use.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
