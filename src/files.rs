//! Static file serving with a single-page-app fallback.
//!
//! A request path that names a regular file under the site root gets that
//! file. Anything else (unknown paths, directories) gets the root
//! `index.html`, so client-side routers see every URL. With no index
//! deployed the answer is `404`.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use http::header::{ALLOW, HeaderValue};
use http::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use tracing::warn;

use crate::handler::Handler;
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::site::Site;

/// Builds the static handler for `site`.
pub fn handler(site: Arc<Site>) -> impl Handler {
    move |req: Request| {
        let site = Arc::clone(&site);
        async move { serve(&site, &req).await }
    }
}

async fn serve(site: &Site, req: &Request) -> Response {
    if *req.method() != Method::GET && *req.method() != Method::HEAD {
        return Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(ALLOW, HeaderValue::from_static("GET, HEAD"))
            .text("Only GET and HEAD allowed");
    }

    let Some(relative) = relative_path(req.path()) else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .text("invalid URL path");
    };

    let candidate = site.root().join(&relative);
    let is_file = tokio::fs::metadata(&candidate).await.is_ok_and(|m| m.is_file());
    let target = if is_file { candidate } else { site.index_path() };

    match tokio::fs::read(&target).await {
        Ok(body) => Response::builder().bytes(ContentType::from_path(&target), body),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Response::status(StatusCode::NOT_FOUND),
        Err(e) => {
            warn!(path = %target.display(), "failed to read static file: {e}");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Maps a URL path onto a relative filesystem path. `None` for paths that
/// are not valid UTF-8 once decoded or that try to climb with `..`.
fn relative_path(url_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(url_path).decode_utf8().ok()?;
    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['\\', '\0']) => return None,
            s => {
                let mut components = Path::new(s).components();
                if !matches!((components.next(), components.next()), (Some(Component::Normal(_)), None)) {
                    return None;
                }
                relative.push(s);
            }
        }
    }
    Some(relative)
}
