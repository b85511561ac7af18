use anyhow::Context;

use stockwise_api::config::ServerConfig;
use stockwise_infra::InventoryConfig;
use stockwise_observability::LogConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockwise_observability::init(&LogConfig::from_env()?);

    let inventory = InventoryConfig::from_env()?;
    let server = ServerConfig::from_env()?;
    tracing::info!(
        overdraw = ?inventory.overdraw_policy,
        min_stock_alert = inventory.default_min_stock_alert,
        "inventory configured"
    );

    let app = stockwise_api::app::build_app(&inventory);

    let listener = tokio::net::TcpListener::bind(server.bind)
        .await
        .with_context(|| format!("failed to bind {}", server.bind))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
