use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use seven_half_core::DEFAULT_PORT;
use seven_half_server::cli::{self, Args};
use seven_half_server::{bind, Coordinator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let players = cli::player_count(&args).await;

    let listener = bind(DEFAULT_PORT).await?;
    info!("服务器正在监听 {}，等待 {} 名玩家", DEFAULT_PORT, players);
    let coordinator = Coordinator::accept_sessions(&listener, players).await?;
    // 人齐之后不再接受新连接
    drop(listener);

    let report = coordinator.run_rounds().await?;
    info!(rounds = report.rounds, "牌桌关闭");
    Ok(())
}
