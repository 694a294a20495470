//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Handlers build a [`Response`] and return it. Application failures (bad
//! bundle, wrong token) are responses with an error status, never `Err`s.

use std::path::Path;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content types the static handler knows how to label.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Css,          // text/css; charset=utf-8
    Gif,          // image/gif
    Html,         // text/html; charset=utf-8
    Icon,         // image/x-icon
    Javascript,   // text/javascript; charset=utf-8
    Jpeg,         // image/jpeg
    Json,         // application/json
    Manifest,     // application/manifest+json
    OctetStream,  // application/octet-stream
    Pdf,          // application/pdf
    Png,          // image/png
    Svg,          // image/svg+xml
    Text,         // text/plain; charset=utf-8
    Wasm,         // application/wasm
    Webp,         // image/webp
    Woff,         // font/woff
    Woff2,        // font/woff2
    Xml,          // application/xml
}

impl ContentType {
    const ALL: [Self; 18] = [
        Self::Css, Self::Gif, Self::Html, Self::Icon, Self::Javascript, Self::Jpeg,
        Self::Json, Self::Manifest, Self::OctetStream, Self::Pdf, Self::Png, Self::Svg,
        Self::Text, Self::Wasm, Self::Webp, Self::Woff, Self::Woff2, Self::Xml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Css         => "text/css; charset=utf-8",
            Self::Gif         => "image/gif",
            Self::Html        => "text/html; charset=utf-8",
            Self::Icon        => "image/x-icon",
            Self::Javascript  => "text/javascript; charset=utf-8",
            Self::Jpeg        => "image/jpeg",
            Self::Json        => "application/json",
            Self::Manifest    => "application/manifest+json",
            Self::OctetStream => "application/octet-stream",
            Self::Pdf         => "application/pdf",
            Self::Png         => "image/png",
            Self::Svg         => "image/svg+xml",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Wasm        => "application/wasm",
            Self::Webp        => "image/webp",
            Self::Woff        => "font/woff",
            Self::Woff2       => "font/woff2",
            Self::Xml         => "application/xml",
        }
    }

    /// Guesses from the file extension; unknown extensions are binary.
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Self::OctetStream;
        };
        match ext.to_ascii_lowercase().as_str() {
            "css"                => Self::Css,
            "gif"                => Self::Gif,
            "htm" | "html"       => Self::Html,
            "ico"                => Self::Icon,
            "js" | "mjs"         => Self::Javascript,
            "jpg" | "jpeg"       => Self::Jpeg,
            "json" | "map"       => Self::Json,
            "webmanifest"        => Self::Manifest,
            "pdf"                => Self::Pdf,
            "png"                => Self::Png,
            "svg"                => Self::Svg,
            "txt"                => Self::Text,
            "wasm"               => Self::Wasm,
            "webp"               => Self::Webp,
            "woff"               => Self::Woff,
            "woff2"              => Self::Woff2,
            "xml"                => Self::Xml,
            _                    => Self::OctetStream,
        }
    }

    /// Reverse of [`as_str`](Self::as_str), for header values this crate set.
    pub fn from_mime(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ct| ct.as_str() == value)
    }

    /// Whether gzip is likely to shrink a body of this type.
    pub fn is_compressible(&self) -> bool {
        matches!(
            self,
            Self::Css
                | Self::Html
                | Self::Javascript
                | Self::Json
                | Self::Manifest
                | Self::Svg
                | Self::Text
                | Self::Wasm
                | Self::Xml
        )
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use sitedrop::{ContentType, Response};
/// use http::StatusCode;
///
/// Response::text("Site uploaded successfully!");
/// Response::status(StatusCode::NOT_FOUND);
///
/// Response::builder()
///     .status(StatusCode::BAD_REQUEST)
///     .text("bundle has no content under 'dist/'");
///
/// Response::builder().bytes(ContentType::Html, b"<!doctype html>".to_vec());
/// ```
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Response {
    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { status: StatusCode::OK, headers: HeaderMap::new() }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`]. Defaults to `200 OK`; finished by one of
/// the body methods.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseBuilder {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a plain-text body.
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(ContentType::Text, Bytes::from(body.into()))
    }

    /// Terminate with a typed body.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type, body.into())
    }

    fn finish(mut self, content_type: ContentType, body: Bytes) -> Response {
        self.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
        Response { status: self.status, headers: self.headers, body }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Bare status with its canonical reason as the body: `return StatusCode::UNAUTHORIZED`.
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        Response::builder()
            .status(self)
            .text(self.canonical_reason().unwrap_or_default())
    }
}
