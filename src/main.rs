use anyhow::Result;
use axum::Router;
use clap::Parser;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod db;
mod errors;
mod handlers;
mod media;
mod models;
mod routes;
mod services;

use config::{AppConfig, Cli, ClientConfig, Command, ServeArgs};
use db::gateway::Gateway;
use services::image_service::ImageService;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::List(args) => client::run_list(&ClientConfig::from_env_and_args(&args)).await,
        Command::Upload { client: args, path } => {
            client::run_upload(&ClientConfig::from_env_and_args(&args), &path).await
        }
        Command::Comment {
            client: args,
            image_id,
            text,
        } => client::run_comment(&ClientConfig::from_env_and_args(&args), &image_id, &text).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    // --- Config; both database values are required ---
    let cfg = AppConfig::from_env_and_args(&args)?;
    tracing::info!("Starting image-gallery with config: {:?}", cfg);

    // --- Gateway connects lazily on first request ---
    let gateway = Arc::new(Gateway::new(cfg.database.clone()));

    // --- Handle migration mode ---
    if args.migrate {
        gateway.connect().await?;
        tracing::info!("Database migration complete.");
        return Ok(());
    }

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(ImageService::new(gateway));

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
