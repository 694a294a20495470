//! The deployment endpoint.
//!
//! Method and token checks happen before this handler runs (router `405`,
//! [`middleware::bearer`](crate::middleware::bearer) `401`). What is left:
//! pull the `site` field out of the multipart form, spool it to a temporary
//! file, hand that file to [`Site::deploy`], and translate the outcome.

use std::convert::Infallible;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;
use crate::site::Site;

/// Multipart field carrying the zipped bundle.
pub const FIELD: &str = "site";

#[derive(Debug, thiserror::Error)]
enum UploadError {
    #[error("Failed to read file: expected a multipart/form-data body")]
    NotMultipart,

    #[error("Failed to read file: no '{FIELD}' field in the form")]
    MissingField,

    #[error("Failed to read file: {0}")]
    Form(#[from] multer::Error),

    #[error("Failed to save file: {0}")]
    Spool(#[from] io::Error),
}

impl UploadError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotMultipart | Self::MissingField | Self::Form(_) => StatusCode::BAD_REQUEST,
            Self::Spool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Builds the upload handler for `site`.
pub fn handler(site: Arc<Site>) -> impl Handler {
    move |req: Request| {
        let site = Arc::clone(&site);
        async move { receive(&site, req).await }
    }
}

async fn receive(site: &Site, mut req: Request) -> Response {
    let peer = req.remote_addr();
    let archive = match spool(&mut req).await {
        Ok(archive) => archive,
        Err(e) => {
            warn!(?peer, "upload rejected: {e}");
            return Response::builder().status(e.status()).text(e.to_string());
        }
    };

    // `archive` is deleted when it drops at the end of this function,
    // whichever way the deployment went.
    match site.deploy(archive.path()).await {
        Ok(report) => {
            info!(
                ?peer,
                files = report.files,
                directories = report.directories,
                skipped = report.skipped,
                bytes = report.bytes,
                "site deployed"
            );
            Response::text(format!("Site uploaded successfully! ({report})"))
        }
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                error!(?peer, "deploy failed: {e}");
            } else {
                warn!(?peer, "deploy rejected: {e}");
            }
            Response::builder().status(status).text(format!("Failed to unzip: {e}"))
        }
    }
}

/// Copies the bundle field into a fresh temporary file.
async fn spool(req: &mut Request) -> Result<NamedTempFile, UploadError> {
    let boundary = req.header(CONTENT_TYPE.as_str())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(UploadError::NotMultipart)?;

    let body = req.take_body();
    let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut form = multer::Multipart::new(stream, boundary);

    while let Some(mut field) = form.next_field().await? {
        if field.name() != Some(FIELD) {
            continue;
        }

        let (archive, file) = tokio::task::spawn_blocking(create_spool_file)
            .await
            .map_err(io::Error::other)??;
        let mut out = tokio::fs::File::from_std(file);
        while let Some(chunk) = field.chunk().await? {
            out.write_all(&chunk).await?;
        }
        out.flush().await?;
        return Ok(archive);
    }

    Err(UploadError::MissingField)
}

/// A named temporary file plus a second handle for writing to it.
fn create_spool_file() -> io::Result<(NamedTempFile, std::fs::File)> {
    let archive = tempfile::Builder::new()
        .prefix("sitedrop-upload-")
        .suffix(".zip")
        .tempfile()?;
    let file = archive.reopen()?;
    Ok((archive, file))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use http::Method;
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::extract::Layout;

    const BOUNDARY: &str = "sitedrop-test-boundary";

    fn bundle(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn form(field: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        write!(
            body,
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"site.zip\"\r\n\
             Content-Type: application/zip\r\n\r\n"
        )
        .unwrap();
        body.extend_from_slice(payload);
        write!(body, "\r\n--{BOUNDARY}--\r\n").unwrap();
        body
    }

    fn upload(body: &[u8]) -> Request {
        let ct = format!("multipart/form-data; boundary={BOUNDARY}");
        Request::test(Method::POST, "/up", &[("content-type", &ct)], body)
    }

    fn site() -> (tempfile::TempDir, Arc<Site>) {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::open(dir.path().join("site"), Layout::default()).unwrap();
        (dir, Arc::new(site))
    }

    #[tokio::test]
    async fn deploys_a_valid_bundle() {
        let (_dir, site) = site();
        let zip = bundle(&[("dist/index.html", "hello"), ("dist/assets/app.js", "x")]);

        let res = receive(&site, upload(&form(FIELD, &zip))).await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"Site uploaded successfully! (2 files, 6 bytes)");
        assert_eq!(std::fs::read_to_string(site.index_path()).unwrap(), "hello");
    }

    #[tokio::test]
    async fn missing_prefix_is_client_error() {
        let (_dir, site) = site();
        let zip = bundle(&[("readme.txt", "hi")]);

        let res = receive(&site, upload(&form(FIELD, &zip))).await;

        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert!(String::from_utf8_lossy(res.body()).contains("no content under 'dist/'"));
    }

    #[tokio::test]
    async fn wrong_field_name_is_bad_request() {
        let (_dir, site) = site();
        let res = receive(&site, upload(&form("file", b"irrelevant"))).await;
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_multipart_body_is_bad_request() {
        let (_dir, site) = site();
        let req = Request::test(Method::POST, "/up", &[("content-type", "application/zip")], b"PK");
        let res = receive(&site, req).await;
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn garbage_payload_is_bad_request() {
        let (_dir, site) = site();
        let res = receive(&site, upload(&form(FIELD, b"definitely not a zip"))).await;
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert!(String::from_utf8_lossy(res.body()).starts_with("Failed to unzip"));
    }

    #[tokio::test]
    async fn temp_archive_is_removed_after_spooling() {
        let mut req = upload(&form(FIELD, b"payload"));
        let archive = spool(&mut req).await.unwrap();
        let path = archive.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
        drop(archive);
        assert!(!path.exists());
    }
}
