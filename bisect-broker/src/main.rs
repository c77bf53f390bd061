use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bisect_broker::api;
use bisect_broker::store::JobStore;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bisect_broker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting bisect broker...");

    // All state lives in memory for the process lifetime
    let store = Arc::new(JobStore::new());

    // Build router with all API endpoints
    let app = api::create_router(store);

    // Get bind address
    let addr = std::env::var("BROKER_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:9090".to_string());

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
