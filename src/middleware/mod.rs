//! Handler wrappers for cross-cutting concerns.
//!
//! Each wrapper takes a handler and returns a handler, so they nest:
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use http::Method;
//! # use sitedrop::{Request, Response, Router, middleware};
//! # async fn upload(_: Request) -> Response { Response::text("") }
//! # async fn files(_: Request) -> Response { Response::text("") }
//! let token: Arc<str> = Arc::from("s3cret");
//! Router::new()
//!     .on(Method::POST, "/upload", middleware::bearer(token, upload))
//!     .fallback(middleware::gzip(files));
//! ```

mod auth;
mod gzip;

pub use auth::{bearer, is_authorized};
pub use gzip::{accepts_gzip, compress, gzip};
