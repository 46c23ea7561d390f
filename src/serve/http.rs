// src/serve/http.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;

/// Bind the HTTP listener for the development server.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("binding HTTP server on {host}:{port}"))
}

/// Serve `dir` as static files until the process exits.
pub async fn serve_dir(listener: TcpListener, dir: PathBuf) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(url = %format!("http://{addr}/"), dir = %dir.display(), "serving output directory");

    let router = Router::new().fallback_service(ServeDir::new(dir));
    axum::serve(listener, router).await?;

    Ok(())
}
