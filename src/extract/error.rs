use std::io;
use std::path::PathBuf;

use http::StatusCode;

/// Why a bundle could not be deployed.
///
/// Every variant is reported back to the uploader; none of them stops the
/// server. [`status`](ExtractError::status) says whose fault it was.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("archive is unreadable: {source}")]
    ArchiveUnreadable {
        #[source]
        source: zip::result::ZipError,
    },

    #[error("entry '{entry}' escapes the site root")]
    PathTraversal { entry: String },

    #[error("bundle has no content under '{prefix}/'")]
    RequiredContentMissing { prefix: String },

    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExtractError {
    /// `400` for a bad bundle, `500` when the disk let us down.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ArchiveUnreadable { .. }
            | Self::PathTraversal { .. }
            | Self::RequiredContentMissing { .. } => StatusCode::BAD_REQUEST,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn unreadable(source: impl Into<zip::result::ZipError>) -> Self {
        Self::ArchiveUnreadable { source: source.into() }
    }

    pub(crate) fn traversal(entry: &str) -> Self {
        Self::PathTraversal { entry: entry.to_owned() }
    }

    /// Adapter for `map_err` on filesystem calls.
    pub(crate) fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
