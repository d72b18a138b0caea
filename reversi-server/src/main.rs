use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use protocol::NetworkConfig;
use reversi_server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("reversi_server=debug".parse()?))
        .init();

    info!("黑白棋服务端启动中...");

    let config = NetworkConfig::from_env()?;
    let server = Server::bind(&config).await?;
    server.run().await
}
