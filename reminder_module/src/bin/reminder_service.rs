//! HTTP entry point: upload a roster, preview today's reminders, send them.

use reminder_module::service::{run_server, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let config = ServiceConfig::from_env()?;
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for shutdown signal: {}", err);
        }
    };

    run_server(config, shutdown).await
}
