// Framework bootstrap for the fleet battle server runtime.

use crate::domain::MapBounds;
use crate::domain::ports::CatalogSource;
use crate::frameworks::config;
use crate::interface_adapters::clients::{DirectoryCatalog, HttpCatalog};
use crate::interface_adapters::http::{list_rooms_handler, not_found_handler};
use crate::interface_adapters::hub::SessionHub;
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{RoomRegistry, RoomSettings, ShipCatalog};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Routes served by the process: player sockets and the room directory.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/rooms", get(list_rooms_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state()?;
    let app = app(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::http_host(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Result<Arc<AppState>> {
    let catalog = Arc::new(build_catalog()?);
    let map_bounds = MapBounds::new(config::map_width(), config::map_height());
    tracing::debug!(
        map_width = map_bounds.width,
        map_height = map_bounds.height,
        "room settings"
    );

    let settings = RoomSettings {
        map_bounds,
        ..RoomSettings::default()
    };
    let registry = Arc::new(RoomRegistry::new(settings, catalog));

    Ok(Arc::new(AppState {
        registry,
        hub: Arc::new(SessionHub::new()),
        outbox_capacity: config::OUTBOX_CAPACITY,
    }))
}

// The URL wins over the directory; with neither, every ship uses its class stats.
fn build_catalog() -> Result<ShipCatalog> {
    if let Some(base_url) = config::catalog_url() {
        let timeout = config::catalog_timeout();
        let client = HttpCatalog::new(base_url.clone(), timeout).map_err(|e| {
            std::io::Error::other(format!("failed to initialize catalog client: {e}"))
        })?;
        tracing::debug!(
            catalog_url = %base_url,
            catalog_timeout_ms = timeout.as_millis(),
            "http catalog configured"
        );
        let source: Arc<dyn CatalogSource> = Arc::new(client);
        return Ok(ShipCatalog::new(source));
    }

    if let Some(dir) = config::catalog_dir() {
        tracing::debug!(catalog_dir = %dir.display(), "directory catalog configured");
        let source: Arc<dyn CatalogSource> = Arc::new(DirectoryCatalog::new(dir));
        return Ok(ShipCatalog::new(source));
    }

    tracing::info!("no ship catalog configured; using class stats");
    Ok(ShipCatalog::class_stats_only())
}
