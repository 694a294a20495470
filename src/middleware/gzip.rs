//! Response compression.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use http::HeaderValue;
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, VARY};
use tracing::debug;

use crate::handler::Handler;
use crate::request::Request;
use crate::response::{ContentType, Response};

/// Bodies smaller than this are sent as-is; the gzip header alone is 18 bytes.
const MIN_LEN: usize = 256;

/// Whether the client listed gzip in `accept-encoding`.
pub fn accepts_gzip(req: &Request) -> bool {
    req.headers()
        .get_all(ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|coding| {
            let mut params = coding.split(';').map(str::trim);
            let name = params.next().unwrap_or_default();
            let refused = params.any(|p| p.replace(' ', "") == "q=0");
            (name.eq_ignore_ascii_case("gzip") || name == "*") && !refused
        })
}

/// Gzips `res` in place when it is worth it. Leaves it untouched if the
/// body is small, already encoded, or of a type that does not compress.
pub fn compress(mut res: Response) -> Response {
    if res.body.len() < MIN_LEN || res.headers.contains_key(CONTENT_ENCODING) {
        return res;
    }
    let compressible = res.headers.get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(ContentType::from_mime)
        .is_some_and(|ct| ct.is_compressible());
    if !compressible {
        return res;
    }

    let mut encoder = GzEncoder::new(Vec::with_capacity(res.body.len() / 2), Compression::default());
    if let Err(e) = encoder.write_all(&res.body) {
        debug!("gzip failed, sending identity: {e}");
        return res;
    }
    let encoded = match encoder.finish() {
        Ok(encoded) => encoded,
        Err(e) => {
            debug!("gzip failed, sending identity: {e}");
            return res;
        }
    };

    res.body = encoded.into();
    res.headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    res.headers.remove(CONTENT_LENGTH);
    res.headers.append(VARY, HeaderValue::from_static("accept-encoding"));
    res
}

/// Compresses the wrapped handler's responses for clients that accept gzip.
pub fn gzip(handler: impl Handler) -> impl Handler {
    let inner = handler.into_boxed_handler();
    move |req: Request| {
        let accepted = accepts_gzip(&req);
        let fut = inner.respond(req);
        async move {
            let res = fut.await;
            if accepted { compress(res) } else { res }
        }
    }
}
