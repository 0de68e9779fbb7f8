//! Stockroom API Server
//!
//! REST API for the product catalog: registration/login plus authenticated
//! product CRUD. Every successful write publishes a product event to the
//! queue the notifier consumes.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SR_API_PORT` | `8080` | HTTP API port |
//! | `SR_DATABASE_URL` | - | Postgres connection URL (required) |
//! | `SR_AMQP_URL` | - | RabbitMQ connection URL (required) |
//! | `SR_QUEUE_NAME` | `product_events` | Events queue name |
//! | `SR_JWT_SECRET` | - | HS256 signing secret (required) |
//! | `RUST_LOG` | `info` | Log level |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use sr_common::DEFAULT_EVENTS_QUEUE;
use sr_platform::api::{self, ApiDoc, AppState};
use sr_platform::repository::{PgProductRepository, PgUserRepository};
use sr_platform::service::{AuthConfig, AuthService, ProductService};
use sr_queue::RabbitClient;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_required(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("{} environment variable is required", key))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Stockroom API server");

    let api_port: u16 = env_or_parse("SR_API_PORT", 8080);
    let database_url = env_required("SR_DATABASE_URL")?;
    let amqp_url = env_required("SR_AMQP_URL")?;
    let queue_name = env_or("SR_QUEUE_NAME", DEFAULT_EVENTS_QUEUE);
    let jwt_secret = env_required("SR_JWT_SECRET")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    let product_repo = PgProductRepository::new(pool.clone());
    product_repo.init_schema().await?;
    let user_repo = PgUserRepository::new(pool.clone());
    user_repo.init_schema().await?;
    info!("database schema ready");

    let rabbit = Arc::new(RabbitClient::connect(&amqp_url).await?);
    rabbit.declare_queue(&queue_name).await?;
    info!(queue = %queue_name, "events queue declared");

    let state = AppState {
        products: Arc::new(ProductService::new(
            Arc::new(product_repo),
            rabbit.clone(),
            queue_name,
        )),
        auth: Arc::new(AuthService::new(
            Arc::new(user_repo),
            AuthConfig::new(jwt_secret),
        )),
    };

    let app = api::router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], api_port));
    let listener = TcpListener::bind(addr).await?;
    info!("API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    rabbit.close().await.ok();
    info!("Stockroom API server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
