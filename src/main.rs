//! Wellpay service binary.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use wellpay::adapters::http::{payment_routes, AppState, HealthSnapshot};
use wellpay::adapters::phonepe::{FallbackGatewayClient, MockGatewayClient, PhonePeClient};
use wellpay::adapters::postgres::{PostgresOrderStore, PostgresSubscriptionStore};
use wellpay::config::{AppConfig, GatewayMode};
use wellpay::domain::subscription::SubscriptionLifecycle;
use wellpay::ports::{GatewayClient, SystemClock};

const WEBHOOK_PATH: &str = "/webhook";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let orders = Arc::new(PostgresOrderStore::new(pool.clone()));
    let subscriptions = Arc::new(PostgresSubscriptionStore::new(pool));
    let clock = Arc::new(SystemClock);
    let lifecycle = Arc::new(SubscriptionLifecycle::new(
        subscriptions.clone(),
        clock.clone(),
    ));

    let gateway: Arc<dyn GatewayClient> = match config.gateway.mode {
        GatewayMode::Mock => {
            tracing::warn!("serving orders from the mock gateway");
            Arc::new(MockGatewayClient::new())
        }
        GatewayMode::Real => {
            let real = Arc::new(PhonePeClient::new(config.gateway.clone())?);
            if config.gateway.mock_fallback {
                Arc::new(FallbackGatewayClient::new(
                    real,
                    Arc::new(MockGatewayClient::new()),
                ))
            } else {
                real
            }
        }
    };

    let state = AppState {
        orders,
        gateway,
        lifecycle,
        clock,
        codec: config.gateway.codec(),
        webhook_path: WEBHOOK_PATH.to_string(),
        health: HealthSnapshot {
            environment: config.server.environment.as_str().to_string(),
            gateway_mode: config.gateway.mode.as_str().to_string(),
            merchant_id: config.gateway.merchant_id.clone(),
        },
    };

    let cors = build_cors(&config.server.cors_origins_list())?;
    let app = payment_routes()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors)
        .with_state(state);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, environment = config.server.environment.as_str(), "wellpay listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_cors(origins: &[String]) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    if origins.is_empty() {
        return Ok(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
    }
    let mut values = Vec::with_capacity(origins.len());
    for origin in origins {
        values.push(origin.parse::<HeaderValue>()?);
    }
    Ok(CorsLayer::new().allow_origin(values))
}
