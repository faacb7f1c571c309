#[cfg(feature = "postgres")]
mod database;
mod errors;
mod handlers;
mod http;
mod setup;
mod user;

#[cfg(feature = "postgres")]
mod impls {
    pub type UserRepo = crate::user::postgres_repository::PostgresUserRepository;
}

#[cfg(not(feature = "postgres"))]
mod impls {
    pub type UserRepo = crate::user::memory_repository::InMemoryUserRepository;
}

use crate::{impls::*, setup::JsonPanicHandler, user::handlers::UserHandlers};
use axum::{extract::Request, ServiceExt};
use std::{error::Error, net::SocketAddr};
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::{catch_panic::CatchPanicLayer, normalize_path::NormalizePathLayer};
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

pub type BoxedError = Box<dyn Error + Send + Sync>;

pub const ENCODING_FAILED_BODY: &[u8] =
    br#"{"message":"Failed to encode the response body","error_code":50000}"#;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = e.to_string(), "Failed to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn serve(user_repo: UserRepo, port: u16) -> Result<(), BoxedError> {
    let app = handlers::router(UserHandlers::new(user_repo))
        .layer(CatchPanicLayer::custom(JsonPanicHandler));

    #[cfg(feature = "http-trace")]
    let app = app.layer(tower_http::trace::TraceLayer::new_for_http());
    #[cfg(feature = "http-cors")]
    let app = setup::setup_app_cors(app);

    // Must wrap the router itself, otherwise it runs after route matching.
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    tracing::info!(port, "Server listening");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn body() -> Result<(), BoxedError> {
    #[cfg(feature = "dotenv")]
    dotenvy::dotenv().map_err(|_| crate::setup::VarError::DotenvFileNotFound)?;

    #[cfg(feature = "json-log")]
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()?;

    #[cfg(not(feature = "json-log"))]
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()?;

    let port = setup::env_param_or("APP_PORT", 8080_u16)?;

    #[cfg(feature = "postgres")]
    let res = {
        use crate::database::{Database, DatabaseConfig};

        let config = DatabaseConfig::from_env()?;
        let db = Database::init(&config).await?;

        let res = serve(UserRepo::new(&db), port).await;
        db.close().await;

        res
    };

    #[cfg(not(feature = "postgres"))]
    let res = {
        tracing::warn!("Running on the in-memory user repository, data will not persist");

        serve(UserRepo::new(), port).await
    };

    res
}

fn main() -> Result<(), BoxedError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed building the Runtime")
        .block_on(body())
}
