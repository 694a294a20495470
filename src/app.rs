//! Route table for the deployment receiver.

use std::sync::Arc;

use http::Method;

use crate::config::Config;
use crate::router::Router;
use crate::site::Site;
use crate::{files, health, middleware, upload};

/// Wires every endpoint onto one router:
///
/// - `POST <upload_path>`: bearer-protected bundle upload
/// - `GET /healthz`, `GET /readyz`: probes
/// - anything else: the deployed site, gzip-compressed when accepted
pub fn router(config: &Config, site: Arc<Site>) -> Router {
    let token: Arc<str> = Arc::from(config.auth_token.as_str());

    Router::new()
        .on(Method::POST, &config.upload_path, middleware::bearer(token, upload::handler(Arc::clone(&site))))
        .on(Method::GET,  "/healthz", health::liveness)
        .on(Method::GET,  "/readyz",  health::readiness(Arc::clone(&site)))
        .fallback(middleware::gzip(files::handler(site)))
}
