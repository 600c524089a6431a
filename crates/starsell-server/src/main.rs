mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::sync::Semaphore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use starsell_api::state::{AppState, AppStateInner};
use starsell_api::{health, ppv};
use starsell_flow::FlowTimeouts;
use starsell_telegram::{PersonaSwitcher, UpdateRouter, run_update_loop, session};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "starsell_server=info,starsell_api=info,starsell_flow=info,starsell_telegram=info,tower_http=info".into()
            }),
        )
        .init();

    // Config: the process never becomes ready with a broken environment.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e:#}");
            eprintln!("       Set the STARSELL_* environment variables and restart.");
            std::process::exit(1);
        }
    };

    // One long-lived authorized client; startup fails if the session is
    // stale so the operator regenerates it with `starsell-login`.
    let client = match session::connect(config.api_id, &config.api_hash, &config.session).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("FATAL: telegram startup failed: {e:#}");
            eprintln!("       Run `starsell-login` to generate a fresh STARSELL_SESSION.");
            std::process::exit(1);
        }
    };

    // The router's update loop is the only consumer of the update stream.
    let router = UpdateRouter::new();
    tokio::spawn(run_update_loop(client.clone(), router.clone()));

    let switcher = PersonaSwitcher::new(
        client.clone(),
        config.seller_bot.clone(),
        config.primary_bot.clone(),
    );

    let state: AppState = Arc::new(AppStateInner {
        client,
        router,
        switcher,
        seller_bot: config.seller_bot.clone(),
        timeouts: FlowTimeouts::from_reply(config.reply_timeout),
        download_timeout: config.download_timeout,
        flow_gate: Arc::new(Semaphore::new(1)),
    });

    // Routes
    let app = Router::new()
        .route("/send-ppv", post(ppv::send_ppv))
        .route("/health", get(health::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("starsell listening on {}", addr);
    info!(seller_bot = %config.seller_bot, primary_bot = %config.primary_bot, "personas configured");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The telegram client disconnects when the last handle drops.
    info!("starsell stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
