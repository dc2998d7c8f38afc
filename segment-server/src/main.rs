mod capability;
mod error;
mod handler;
mod pcm;
mod query;
mod session;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use clap::Parser;
use segment_annotator::EarshotAnnotator;
use segment_core::Annotator;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "segment-server")]
struct Args {
    #[arg(
        short = 'a',
        long,
        env = "SERVER_ADDRESS",
        default_value = "::",
        help = "address to listen on"
    )]
    server_address: String,

    #[arg(
        short = 'p',
        long,
        env = "SERVER_PORT",
        default_value = "8080",
        help = "port to listen on"
    )]
    server_port: u16,

    #[arg(
        short = 'c',
        long,
        env = "CAPABILITIES",
        value_delimiter = ',',
        required = true,
        help = "enabled capability names"
    )]
    capabilities: Vec<String>,

    #[arg(
        short = 'l',
        long,
        env = "LOG_LEVEL",
        default_value = "info",
        help = "log level"
    )]
    log_level: String,

    #[arg(
        long,
        env = "CAPABILITY_FILE",
        default_value = "capabilities.json",
        help = "path to the capability registry file"
    )]
    capability_file: PathBuf,

    #[arg(
        long,
        env = "ANNOTATOR_WORKERS",
        help = "max blocking threads for annotator dispatch (default: tokio's own default)"
    )]
    annotator_workers: Option<usize>,
}

#[derive(Clone)]
pub struct AppState {
    annotator: Arc<dyn Annotator>,
    enabled_capabilities: Arc<Vec<String>>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(args.log_level.clone()))
        .init();

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(workers) = args.annotator_workers {
        builder.max_blocking_threads(workers);
    }
    let runtime = builder.build().context("failed to build tokio runtime")?;

    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let capability_set = capability::CapabilitySet::load(&args.capability_file)
        .context("failed to load capability registry")?;
    let module_capabilities = capability_set.module_capabilities("server/segment");

    let enabled: Vec<String> = args
        .capabilities
        .iter()
        .filter(|name| module_capabilities.contains_key(name.as_str()))
        .cloned()
        .collect();

    if enabled.is_empty() {
        info!("no enabled segmentation capabilities matched the registry; all requests will be rejected");
    }

    let state = AppState {
        annotator: Arc::new(EarshotAnnotator::default()),
        enabled_capabilities: Arc::new(enabled),
    };

    let app = Router::new()
        .route("/segment", get(handler::segment_ws))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.server_address, args.server_port)
        .parse()
        .context("invalid server address/port")?;

    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server loop failed")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received shutdown signal");
}
