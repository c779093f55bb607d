//! Match-sheet backend entrypoint: picks a storage backend, supervises it and
//! serves the REST API.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planilla_back::{
    config::AppConfig,
    dao::{
        league_store::{LeagueStore, memory::MemoryLeagueStore},
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

/// Storage backend chosen through `STORE_BACKEND`.
#[derive(Debug, Clone, Copy)]
enum Backend {
    #[cfg(feature = "mongo-store")]
    Mongo,
    #[cfg(feature = "couch-store")]
    Couch,
    Memory,
}

impl Backend {
    fn from_env() -> anyhow::Result<Self> {
        let raw = env::var("STORE_BACKEND").unwrap_or_else(|_| default_backend().into());
        match raw.trim().to_ascii_lowercase().as_str() {
            #[cfg(feature = "mongo-store")]
            "mongo" | "mongodb" => Ok(Backend::Mongo),
            #[cfg(feature = "couch-store")]
            "couch" | "couchdb" => Ok(Backend::Couch),
            "memory" => Ok(Backend::Memory),
            other => bail!("unsupported STORE_BACKEND `{other}` for this build"),
        }
    }
}

fn default_backend() -> &'static str {
    if cfg!(feature = "mongo-store") {
        "mongo"
    } else {
        "memory"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let backend = Backend::from_env()?;
    let app_state = AppState::new(AppConfig::load());
    if app_state.config().reviewers().is_empty() {
        warn!("no reviewers configured; admin routes will reject every request");
    }

    info!(?backend, "starting storage supervisor");
    tokio::spawn(supervise(app_state.clone(), backend));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Run the storage supervisor with a connector for the selected backend.
async fn supervise(state: SharedState, backend: Backend) {
    match backend {
        #[cfg(feature = "mongo-store")]
        Backend::Mongo => {
            use planilla_back::dao::league_store::mongodb::{MongoConfig, MongoLeagueStore};

            storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoLeagueStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn LeagueStore>)
            })
            .await
        }
        #[cfg(feature = "couch-store")]
        Backend::Couch => {
            use planilla_back::dao::league_store::couchdb::{CouchConfig, CouchLeagueStore};

            storage_supervisor::run(state, || async {
                let config = CouchConfig::from_env()?;
                let store = CouchLeagueStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn LeagueStore>)
            })
            .await
        }
        Backend::Memory => {
            warn!("using the in-memory league store; data is lost on restart");
            let store = MemoryLeagueStore::new();
            storage_supervisor::run(state, move || {
                let store = store.clone();
                async move { Ok::<_, StorageError>(Arc::new(store) as Arc<dyn LeagueStore>) }
            })
            .await
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                error!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
