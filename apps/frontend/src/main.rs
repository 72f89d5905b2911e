use std::{net::SocketAddr, sync::Arc};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use clap::Parser;
use client_core::{HttpConferenceApi, SignupGate, REGISTRATION_PATH};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

mod app_state;
mod config;
mod error;
mod gate;
mod identity;
mod pages;
mod render;

use app_state::AppState;
use config::Args;
use identity::IdentityKeys;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let args = Args::parse();
    args.validate()?;

    let api = HttpConferenceApi::new(&args.api_url, args.request_timeout())?;
    info!(api_url = %api.base_url(), "using conference api");

    let state = AppState {
        api: Arc::new(api),
        gate: SignupGate::new(&args.exempt_paths, REGISTRATION_PATH),
        identity: IdentityKeys::new(&args.identity_secret, args.identity_ttl_seconds),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = args.bind.parse()?;
    info!(%addr, "conference front end listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

/// Every page route sits behind the sign-up gate; `/healthz` does not.
fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/Session/:session_id", get(pages::session))
        .route("/Speakers", get(pages::speakers))
        .route("/Speaker/:speaker_id", get(pages::speaker))
        .route("/Search", get(pages::search))
        .route("/MyAgenda", get(pages::my_agenda))
        .route("/agenda/add", post(pages::agenda_add))
        .route("/agenda/remove", post(pages::agenda_remove))
        .route("/Welcome", get(pages::welcome).post(pages::welcome_submit))
        .route(
            "/Account/Login",
            get(pages::login).post(pages::login_submit),
        )
        .route("/Account/Logout", post(pages::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_registration,
        ))
        .route("/healthz", get(pages::healthz))
        .fallback(pages::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
