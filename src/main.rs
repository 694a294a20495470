//! sitedrop binary.
//!
//! Run with:
//!   AUTH_TOKEN=s3cret BIND_ADDR=127.0.0.1:3000 RUST_LOG=info cargo run
//!
//! Deploy:
//!   (cd my-app && zip -r ../bundle.zip dist)
//!   curl -H 'Authorization: Bearer s3cret' -F site=@bundle.zip \
//!        http://localhost:3000/_theres_no_way_you_have_this_in_your_static_site

use std::process::ExitCode;
use std::sync::Arc;

use sitedrop::{Config, Error, Server, Site, app};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;
    let site = Arc::new(Site::open(&config.site_dir, config.layout.clone())?);

    info!(
        root = %site.root().display(),
        layout = %site.layout(),
        upload_path = %config.upload_path,
        max_upload_bytes = config.max_upload_bytes,
        "site ready"
    );

    Server::bind(config.bind_addr)
        .max_body(config.max_upload_bytes)
        .serve(app::router(&config, site))
        .await
}
