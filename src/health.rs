//! Health-check handlers.
//!
//! | Probe | Path | Answer |
//! |---|---|---|
//! | **Liveness** | `/healthz` | `200 ok` while the process can answer HTTP |
//! | **Readiness** | `/readyz` | `200 ready` once an `index.html` is live, `503` before |
//!
//! A fresh instance with an empty site directory is alive but not ready:
//! it would only answer `404` until the first upload lands.

use std::sync::Arc;

use http::StatusCode;

use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;
use crate::site::Site;

/// Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// Readiness gated on a deployed index document.
pub fn readiness(site: Arc<Site>) -> impl Handler {
    move |_req: Request| {
        let site = Arc::clone(&site);
        async move {
            if site.is_deployed().await {
                Response::text("ready")
            } else {
                Response::builder()
                    .status(StatusCode::SERVICE_UNAVAILABLE)
                    .text("no site deployed")
            }
        }
    }
}
