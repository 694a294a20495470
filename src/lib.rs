//! # sitedrop
//!
//! Push a zipped static site over HTTP; serve it.
//!
//! ## The contract
//!
//! A build job zips its output and POSTs it:
//!
//! ```text
//! curl -H "Authorization: Bearer $AUTH_TOKEN" \
//!      -F site=@bundle.zip \
//!      https://example.com/_theres_no_way_you_have_this_in_your_static_site
//! ```
//!
//! sitedrop unpacks the bundle's `dist/` folder (see [`Layout`]) into a
//! scratch directory next to the live one and renames it into place. Every
//! other request is answered from that directory, with `index.html` as the
//! fallback so client-side routing works.
//!
//! What it does not do: TLS, caching headers, range requests, rate limiting.
//! Put it behind a proxy that does.
//!
//! ## Pieces
//!
//! - [`extract`]: zip → directory, with zip-slip protection
//! - [`Site`]: the served directory, deployment lock and swap
//! - [`Router`] / [`Server`]: hyper plumbing, graceful shutdown
//! - [`middleware`]: bearer token, gzip
//!
//! ## Embedding
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sitedrop::{Config, Server, Site, app};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sitedrop::Error> {
//!     let config = Config::from_env()?;
//!     let site = Arc::new(Site::open(&config.site_dir, config.layout.clone())?);
//!     Server::bind(config.bind_addr)
//!         .max_body(config.max_upload_bytes)
//!         .serve(app::router(&config, site))
//!         .await
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod app;
pub mod config;
pub mod extract;
pub mod files;
pub mod health;
pub mod middleware;
pub mod site;
pub mod upload;

pub use config::{Config, ConfigError};
pub use error::Error;
pub use extract::{ExtractError, ExtractReport, Layout, extract};
pub use handler::Handler;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use site::Site;
