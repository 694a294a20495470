//! Incoming HTTP request type.

use std::net::SocketAddr;

use bytes::Bytes;
use http::{HeaderMap, Method, request::Parts};

/// An incoming request with its body already buffered.
///
/// The server collects the body (up to the configured cap) before the handler
/// runs, so handlers never deal with streaming or size limits.
pub struct Request {
    parts: Parts,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    pub(crate) fn new(
        parts: Parts,
        body: Bytes,
        remote_addr: Option<SocketAddr>,
    ) -> Self {
        Self { parts, body, remote_addr }
    }

    pub fn method(&self) -> &Method { &self.parts.method }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }
    pub fn body(&self) -> &Bytes { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// Method, URI and headers without the body.
    pub(crate) fn head(&self) -> &Parts { &self.parts }

    /// Takes the body, leaving the request headers readable.
    pub fn take_body(&mut self) -> Bytes {
        std::mem::take(&mut self.body)
    }

    /// Header value as text. Case-insensitive; `None` if absent or not ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name)?.to_str().ok()
    }
}

#[cfg(test)]
impl Request {
    /// Builds a request without a connection behind it.
    pub(crate) fn test(method: Method, uri: &str, headers: &[(&str, &str)], body: &[u8]) -> Self {
        let mut builder = http::Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        Self::new(parts, Bytes::copy_from_slice(body), None)
    }
}
