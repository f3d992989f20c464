//! HTTP server for sighting location resolution.
//!
//! Exposes the catalog for manual subdivision selection and resolves the
//! location of a report from its photo bytes and any client-side fix.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sighting_locator::config::Config;
use sighting_locator::geocoder::NominatimClient;
use sighting_locator::{LocationResolver, SubdivisionCatalog};

mod handlers;
use handlers::{health_handler, resolve_handler, subdivisions_handler};

/// Photos larger than this are rejected before parsing
const MAX_PHOTO_BYTES: usize = 32 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "locate-server")]
#[command(about = "Sighting location resolution server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address (overrides the config file)
    #[arg(short, long)]
    listen: Option<String>,

    /// Never call the reverse geocoder
    #[arg(long)]
    offline: bool,
}

/// Application state shared across handlers
pub struct AppState {
    pub resolver: LocationResolver<NominatimClient>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if args.offline {
        config.geocoder.enabled = false;
    }
    let listen = args.listen.unwrap_or_else(|| config.server.listen.clone());

    info!("Sighting Locator Server");

    let catalog = SubdivisionCatalog::builtin();
    let resolver = LocationResolver::from_config(&config, catalog)
        .context("Failed to set up reverse geocoder")?;

    if config.geocoder.enabled {
        info!("Remote fallback via {}", config.geocoder.endpoint);
    } else {
        info!("Remote fallback disabled");
    }
    info!(
        "Pending location: {} ({})",
        config.sentinel.coordinate, config.sentinel.label
    );

    let state = Arc::new(AppState { resolver });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/subdivisions", get(subdivisions_handler))
        .route("/v1/resolve", post(resolve_handler))
        .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
