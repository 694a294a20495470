//! Startup configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `AUTH_TOKEN` | required |
//! | `SITE_DIR` | `./site` |
//! | `BIND_ADDR` | `0.0.0.0:80` |
//! | `UPLOAD_PATH` | `/_theres_no_way_you_have_this_in_your_static_site` |
//! | `BUNDLE_LAYOUT` | `prefix:dist` |
//! | `MAX_UPLOAD_BYTES` | `268435456` |

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::extract::{Layout, ParseLayoutError};
use crate::server::DEFAULT_MAX_BODY;

pub const DEFAULT_UPLOAD_PATH: &str = "/_theres_no_way_you_have_this_in_your_static_site";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("AUTH_TOKEN environment variable not set")]
    MissingToken,

    #[error("BIND_ADDR '{0}' is not a host:port socket address")]
    BindAddr(String),

    #[error("UPLOAD_PATH '{0}' must start with '/' and name a route other than '/'")]
    UploadPath(String),

    #[error("BUNDLE_LAYOUT: {0}")]
    Layout(#[from] ParseLayoutError),

    #[error("MAX_UPLOAD_BYTES '{0}' is not a positive integer")]
    MaxUpload(String),
}

/// Everything the binary needs to start.
#[derive(Clone, Debug)]
pub struct Config {
    pub auth_token: String,
    pub site_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub upload_path: String,
    pub layout: Layout,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key → value source. Empty values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let auth_token = get("AUTH_TOKEN").ok_or(ConfigError::MissingToken)?;

        let site_dir = get("SITE_DIR").map_or_else(|| PathBuf::from("./site"), PathBuf::from);

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::BindAddr(raw))?,
            None => SocketAddr::from(([0, 0, 0, 0], 80)),
        };

        let upload_path = get("UPLOAD_PATH").unwrap_or_else(|| DEFAULT_UPLOAD_PATH.to_owned());
        if !upload_path.starts_with('/') || upload_path == "/" || upload_path.contains(['{', '}']) {
            return Err(ConfigError::UploadPath(upload_path));
        }

        let layout = match get("BUNDLE_LAYOUT") {
            Some(raw) => raw.parse()?,
            None => Layout::default(),
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::MaxUpload(raw)),
            },
            None => DEFAULT_MAX_BODY,
        };

        Ok(Self { auth_token, site_dir, bind_addr, upload_path, layout, max_upload_bytes })
    }
}
