use crate::auth::Authenticator;
use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use typeshift_convert::{ConversionRouter, ScratchDir};

pub mod auth;
pub mod error;
pub mod routes_convert;

pub use error::ApiError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub auth: Arc<Authenticator>,
    pub router: Arc<ConversionRouter>,
    pub scratch: Arc<ScratchDir>,
}

impl AppContext {
    /// Build the context from configuration, creating the scratch directory.
    pub fn from_config(config: Config) -> Result<Self> {
        let scratch = match config.scratch.dir.as_deref() {
            Some(dir) => ScratchDir::new(dir)
                .with_context(|| format!("Failed to create scratch directory {:?}", dir))?,
            None => ScratchDir::system(),
        };
        tracing::info!("Scratch files under {:?}", scratch.path());

        Ok(Self {
            auth: Arc::new(Authenticator::from_config(&config.server.auth)),
            router: Arc::new(ConversionRouter::new(config.conversion.options())),
            scratch: Arc::new(scratch),
            config: Arc::new(config),
        })
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/", get(routes_convert::root))
        .route("/formats", get(routes_convert::formats))
        .route("/register", post(auth::register))
        .route("/token", post(auth::token));

    // Identity lookup needs a user regardless of the auth switch
    let identity_routes = Router::new()
        .route("/users/me", get(auth::users_me))
        .route_layer(middleware::from_fn_with_state(ctx.clone(), auth::require_auth));

    let convert_routes = Router::new().route("/convert", post(routes_convert::convert));
    let convert_routes = if ctx.config.server.auth.enabled {
        convert_routes.route_layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::require_auth,
        ))
    } else {
        tracing::warn!("Authentication disabled for /convert");
        convert_routes
    };

    let body_limit = ctx.config.server.max_upload_bytes();

    public_routes
        .merge(identity_routes)
        .merge(convert_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::from_config(config)?;
    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
