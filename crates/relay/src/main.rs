use std::env;
use std::net::SocketAddr;

use tracing::info;

use database::Database;
use ingest::Ingestor;
use relay::{router, AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let addr = env::var("MESA_RELAY_ADDR").unwrap_or_else(|_| "127.0.0.1:8900".to_string());
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:mesa.db?mode=rwc".to_string());

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");
    db.migrate().await.expect("Failed to run migrations");

    let state = AppState {
        ingestor: Ingestor::new(db.clone()),
    };
    let app = router(state);

    let addr: SocketAddr = addr.parse().expect("Invalid MESA_RELAY_ADDR");
    info!(%addr, "Mesa relay listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    db.close().await;
    info!("Relay stopped");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");
    info!("Shutdown signal received, stopping relay");
}
