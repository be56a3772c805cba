use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use inkstone::config::Config;
use inkstone::http;
use inkstone::store::Store;

/// Serves a file-backed blog content store over HTTP.
#[derive(Parser)]
#[command(name = "inkstone", version)]
struct Args {
    /// Directory from which to search for `inkstone.yaml` (defaults to the
    /// current directory; parents are searched too).
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Address to listen on; overrides the project file.
    #[arg(long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config_dir = match args.config_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config = Config::from_directory(&config_dir)?;
    let listen = args.listen.unwrap_or(config.listen);

    let store = Arc::new(Store::new(config.posts_directory, config.drafts_directory));
    let app = http::router(store);

    info!(%listen, "serving blog content store");
    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
