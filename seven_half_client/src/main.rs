mod connection;
mod ui;

use clap::Parser;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use seven_half_core::DEFAULT_PORT;

use connection::Event;
use ui::Terminal;

/// 七点半终端客户端
#[derive(Parser, Debug)]
#[command(name = "seven_half_client", version)]
struct Args {
    /// 服务器地址
    #[arg(default_value = "127.0.0.1")]
    address: String,
    /// 服务器端口，无效时使用 7000
    port: Option<String>,
}

/// 解析端口文本，无效时回退到默认端口
fn resolve_port(text: Option<&str>) -> u16 {
    text.and_then(|t| t.trim().parse().ok()).unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let port = resolve_port(args.port.as_deref());

    println!("正在连接到: {}:{}", args.address, port);
    let stream = match TcpStream::connect((args.address.as_str(), port)).await {
        Ok(stream) => stream,
        Err(e) => anyhow::bail!("无法连接到服务器 {}:{}: {}", args.address, port, e),
    };
    stream.set_nodelay(true)?;
    println!("连接成功!");

    let (event_tx, event_rx) = mpsc::channel::<Event>(32);
    let (reply_tx, mut reply_rx) = mpsc::channel(1);

    // 网络任务独占连接，界面只通过通道和它交流
    let network = tokio::spawn(async move {
        if let Err(e) = connection::play(stream, &event_tx, &mut reply_rx).await {
            let _ = event_tx.send(Event::Disconnected(e.to_string())).await;
        }
    });

    Terminal::new().run(event_rx, reply_tx).await;
    network.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_port_reverts_to_default() {
        assert_eq!(resolve_port(Some("7100")), 7100);
        assert_eq!(resolve_port(Some("seven")), DEFAULT_PORT);
        assert_eq!(resolve_port(Some("70000")), DEFAULT_PORT);
        assert_eq!(resolve_port(None), DEFAULT_PORT);
    }

    #[test]
    fn test_address_defaults_to_localhost() {
        let args = Args::parse_from(["seven_half_client"]);
        assert_eq!(args.address, "127.0.0.1");
        assert!(args.port.is_none());
    }
}
